/*
 * Copyright 2026 The kivfs authors.
 *
 * This file is part of kivfs.
 *
 * kivfs is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * kivfs is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * kivfs. If not, see <https://www.gnu.org/licenses/>.
 */

//! Growth and shrink engine: adds or releases data clusters (and the indirect pointer pages that
//! address them) as an inode's size changes, plus whole-inode allocation.
//!
//! Growth always proceeds direct, then indirect1, then indirect2, allocating a tier's pointer
//! page before any data cluster it addresses. If any allocation within a `grow` call fails, every
//! cluster and page claimed during that call is released and the inode is left exactly as it was
//! found — partial growth is never observed by a caller.

use crate::cluster::{read_ptr_page, write_ptr_page};
use crate::config::{DIRECT_COUNT, UNUSED};
use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::inode::{Inode, InodeType, MutableInode};
use crate::superblock::Superblock;

/// The pair of bitmaps and their volume offsets needed to allocate/release inodes and clusters.
pub struct Allocator<'a> {
	pub device: &'a mut dyn BlockDevice,
	pub sb: &'a Superblock,
}

impl<'a> Allocator<'a> {
	fn cluster_bitmap(&self) -> crate::bitmap::Bitmap {
		crate::bitmap::Bitmap::new(
			self.sb.cluster_bitmap_start,
			self.sb.cluster_count,
			self.sb.inode_bitmap_start,
		)
	}

	fn inode_bitmap(&self) -> crate::bitmap::Bitmap {
		crate::bitmap::Bitmap::new(
			self.sb.inode_bitmap_start,
			self.sb.inode_count,
			self.sb.inodes_start,
		)
	}

	/// Claims one free cluster, zeroes it, and returns its index.
	fn alloc_cluster(&mut self) -> Result<u32> {
		let bm = self.cluster_bitmap();
		let idx = bm.find_free(self.device, Error::NoFreeClusterAvailable)?;
		bm.occupy(self.device, idx)?;
		let zero = vec![0u8; self.sb.cluster_size as usize];
		self.device
			.write_bytes(self.sb.cluster_to_volume_ptr(idx), &zero)?;
		Ok(idx)
	}

	/// Releases a cluster back to the free pool. Content is left as-is; a future allocation
	/// zeroes it again before handing it out.
	fn free_cluster(&mut self, idx: u32) -> Result<()> {
		self.cluster_bitmap().free(self.device, idx)
	}

	/// Allocates a fresh inode of the given type and returns its index.
	pub fn allocate_inode(&mut self, kind: InodeType) -> Result<u32> {
		let bm = self.inode_bitmap();
		let idx = bm.find_free(self.device, Error::NoFreeInodeAvailable)?;
		bm.occupy(self.device, idx)?;
		crate::inode::write_inode(self.device, self.sb, idx, &Inode::new(kind))?;
		Ok(idx)
	}

	/// Releases an inode's index bit. Callers are responsible for having already shrunk the
	/// inode to zero clusters first.
	pub fn free_inode(&mut self, idx: u32) -> Result<()> {
		self.inode_bitmap().free(self.device, idx)
	}

	/// Grows `handle`'s inode by `additional_clusters` logical clusters, allocating whatever
	/// direct slots and indirect pages are needed to reach the new count. On any failure, every
	/// cluster and page claimed during this call is released and `handle.inode` is restored to
	/// its pre-call state.
	pub fn grow(&mut self, handle: &mut MutableInode, additional_clusters: u32) -> Result<()> {
		let before = handle.inode.clone();
		let mut claimed = Vec::new();
		match self.grow_inner(&mut handle.inode, additional_clusters, &mut claimed) {
			Ok(()) => Ok(()),
			Err(e) => {
				for c in claimed {
					// Best-effort rollback: a failure here would mean the free bitmap itself is
					// unreadable, which is unrecoverable anyway.
					let _ = self.free_cluster(c);
				}
				handle.inode = before;
				Err(e)
			}
		}
	}

	fn grow_inner(&mut self, inode: &mut Inode, additional: u32, claimed: &mut Vec<u32>) -> Result<()> {
		let p = self.sb.ptrs_per_cluster();
		let mut remaining = additional;
		let mut target = inode.allocated_clusters;

		while remaining > 0 {
			if target < DIRECT_COUNT as u32 {
				let c = self.alloc_cluster()?;
				claimed.push(c);
				inode.direct[target as usize] = c;
			} else if target < DIRECT_COUNT as u32 + p {
				if inode.indirect1 == UNUSED {
					let page = self.alloc_cluster()?;
					claimed.push(page);
					inode.indirect1 = page;
					write_ptr_page(self.device, self.sb, page, &vec![UNUSED; p as usize])?;
				}
				let mut page = read_ptr_page(self.device, self.sb, inode.indirect1)?;
				let c = self.alloc_cluster()?;
				claimed.push(c);
				page[(target - DIRECT_COUNT as u32) as usize] = c;
				write_ptr_page(self.device, self.sb, inode.indirect1, &page)?;
			} else if target < DIRECT_COUNT as u32 + p + p * p {
				if inode.indirect2 == UNUSED {
					let page = self.alloc_cluster()?;
					claimed.push(page);
					inode.indirect2 = page;
					write_ptr_page(self.device, self.sb, page, &vec![UNUSED; p as usize])?;
				}
				let r = target - DIRECT_COUNT as u32 - p;
				let top_idx = (r / p) as usize;
				let mut top = read_ptr_page(self.device, self.sb, inode.indirect2)?;
				if top[top_idx] == UNUSED {
					let page = self.alloc_cluster()?;
					claimed.push(page);
					top[top_idx] = page;
					write_ptr_page(self.device, self.sb, page, &vec![UNUSED; p as usize])?;
					write_ptr_page(self.device, self.sb, inode.indirect2, &top)?;
				}
				let mut second = read_ptr_page(self.device, self.sb, top[top_idx])?;
				let c = self.alloc_cluster()?;
				claimed.push(c);
				second[(r % p) as usize] = c;
				write_ptr_page(self.device, self.sb, top[top_idx], &second)?;
			} else {
				return Err(Error::ClusterIndexOutOfRange { index: target });
			}

			target += 1;
			remaining -= 1;
		}

		inode.allocated_clusters = target;
		Ok(())
	}

	/// Shrinks `handle`'s inode to `target_clusters` logical clusters, releasing the
	/// highest-index logical cluster first. An indirect page is released as soon as every
	/// cluster it addresses has been released.
	pub fn shrink(&mut self, handle: &mut MutableInode, target_clusters: u32) -> Result<()> {
		let inode = &mut handle.inode;
		let p = self.sb.ptrs_per_cluster();

		while inode.allocated_clusters > target_clusters {
			let last = inode.allocated_clusters - 1;

			if last < DIRECT_COUNT as u32 {
				let c = inode.direct[last as usize];
				self.free_cluster(c)?;
				inode.direct[last as usize] = UNUSED;
			} else if last < DIRECT_COUNT as u32 + p {
				let slot = (last - DIRECT_COUNT as u32) as usize;
				let mut page = read_ptr_page(self.device, self.sb, inode.indirect1)?;
				self.free_cluster(page[slot])?;
				page[slot] = UNUSED;
				if page.iter().all(|&ptr| ptr == UNUSED) {
					self.free_cluster(inode.indirect1)?;
					inode.indirect1 = UNUSED;
				} else {
					write_ptr_page(self.device, self.sb, inode.indirect1, &page)?;
				}
			} else {
				let r = last - DIRECT_COUNT as u32 - p;
				let top_idx = (r / p) as usize;
				let mut top = read_ptr_page(self.device, self.sb, inode.indirect2)?;
				let mut second = read_ptr_page(self.device, self.sb, top[top_idx])?;
				let slot = (r % p) as usize;
				self.free_cluster(second[slot])?;
				second[slot] = UNUSED;
				if second.iter().all(|&ptr| ptr == UNUSED) {
					self.free_cluster(top[top_idx])?;
					top[top_idx] = UNUSED;
					if top.iter().all(|&ptr| ptr == UNUSED) {
						self.free_cluster(inode.indirect2)?;
						inode.indirect2 = UNUSED;
					} else {
						write_ptr_page(self.device, self.sb, inode.indirect2, &top)?;
					}
				} else {
					write_ptr_page(self.device, self.sb, top[top_idx], &second)?;
				}
			}

			inode.allocated_clusters = last;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	fn setup(cluster_count: u32) -> (MemDevice, Superblock) {
		let sb = Superblock::new(64, cluster_count, 16, crate::inode::ENCODED_SIZE);
		let mut dev = MemDevice::new(sb.volume_size);
		sb.write(&mut dev).unwrap();
		(dev, sb)
	}

	#[test]
	fn grows_direct_only() {
		let (mut dev, sb) = setup(64);
		let mut handle = MutableInode {
			ptr: 0,
			inode: Inode::new(InodeType::Regular),
		};
		let mut alloc = Allocator {
			device: &mut dev,
			sb: &sb,
		};
		alloc.grow(&mut handle, 3).unwrap();
		assert_eq!(handle.inode.allocated_clusters, 3);
		assert!(handle.inode.direct[..3].iter().all(|&p| p != UNUSED));
		assert_eq!(handle.inode.indirect1, UNUSED);
	}

	#[test]
	fn grows_into_indirect1() {
		let (mut dev, sb) = setup(64);
		let mut handle = MutableInode {
			ptr: 0,
			inode: Inode::new(InodeType::Regular),
		};
		let mut alloc = Allocator {
			device: &mut dev,
			sb: &sb,
		};
		alloc.grow(&mut handle, DIRECT_COUNT as u32 + 2).unwrap();
		assert_ne!(handle.inode.indirect1, UNUSED);
		assert_eq!(handle.inode.allocated_clusters, DIRECT_COUNT as u32 + 2);
	}

	#[test]
	fn shrink_to_zero_reclaims_everything() {
		let (mut dev, sb) = setup(64);
		let mut handle = MutableInode {
			ptr: 0,
			inode: Inode::new(InodeType::Regular),
		};
		{
			let mut alloc = Allocator {
				device: &mut dev,
				sb: &sb,
			};
			alloc.grow(&mut handle, DIRECT_COUNT as u32 + 3).unwrap();
			alloc.shrink(&mut handle, 0).unwrap();
		}
		assert_eq!(handle.inode.allocated_clusters, 0);
		assert_eq!(handle.inode.indirect1, UNUSED);
		assert!(handle.inode.direct.iter().all(|&p| p == UNUSED));

		let bm = crate::bitmap::Bitmap::new(sb.cluster_bitmap_start, sb.cluster_count, sb.inode_bitmap_start);
		for i in 0..sb.cluster_count {
			assert!(bm.is_free(&mut dev, i).unwrap(), "cluster {i} should be free");
		}
	}

	#[test]
	fn failed_grow_rolls_back() {
		let (mut dev, sb) = setup(3);
		let mut handle = MutableInode {
			ptr: 0,
			inode: Inode::new(InodeType::Regular),
		};
		let before = handle.inode.clone();
		let mut alloc = Allocator {
			device: &mut dev,
			sb: &sb,
		};
		let err = alloc.grow(&mut handle, 10);
		assert!(err.is_err());
		assert_eq!(handle.inode, before);

		let bm = crate::bitmap::Bitmap::new(sb.cluster_bitmap_start, sb.cluster_count, sb.inode_bitmap_start);
		for i in 0..sb.cluster_count {
			assert!(bm.is_free(&mut dev, i).unwrap());
		}
	}
}
