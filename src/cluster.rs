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

//! Cluster address resolver: maps `(inode, logical_cluster_index)` to a physical cluster
//! pointer, walking the direct, single-indirect and double-indirect tiers as needed.

use crate::config::{CLUSTER_PTR_SIZE, DIRECT_COUNT};
use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::inode::Inode;
use crate::superblock::Superblock;

/// Reads an indirect page (an array of `ptrs_per_cluster` cluster pointers) at `cluster`.
pub fn read_ptr_page(device: &mut dyn BlockDevice, sb: &Superblock, cluster: u32) -> Result<Vec<u32>> {
	let off = sb.cluster_to_volume_ptr(cluster);
	let mut buf = vec![0u8; sb.cluster_size as usize];
	device.read_bytes(off, &mut buf)?;
	let n = sb.ptrs_per_cluster() as usize;
	let mut ptrs = Vec::with_capacity(n);
	for i in 0..n {
		let start = i * CLUSTER_PTR_SIZE;
		ptrs.push(u32::from_le_bytes(
			buf[start..start + CLUSTER_PTR_SIZE].try_into().unwrap(),
		));
	}
	Ok(ptrs)
}

/// Writes an indirect page at `cluster`, padding with trailing bytes untouched if `ptrs` is
/// shorter than a full page (callers always pass a full page in practice).
pub fn write_ptr_page(
	device: &mut dyn BlockDevice,
	sb: &Superblock,
	cluster: u32,
	ptrs: &[u32],
) -> Result<()> {
	let off = sb.cluster_to_volume_ptr(cluster);
	let mut buf = Vec::with_capacity(ptrs.len() * CLUSTER_PTR_SIZE);
	for ptr in ptrs {
		buf.extend_from_slice(&ptr.to_le_bytes());
	}
	device.write_bytes(off, &buf)
}

/// Resolves the logical cluster index `logical_idx` of `inode` to a physical cluster pointer.
///
/// Fails with [`Error::ClusterIndexOutOfRange`] both when `logical_idx` is structurally beyond
/// what direct + indirect1 + indirect2 can address, and — just as importantly — when
/// `logical_idx >= inode.allocated_clusters`. The latter case is what the write path in
/// [`crate::io::write`] uses as the trigger to grow the inode.
pub fn resolve(device: &mut dyn BlockDevice, sb: &Superblock, inode: &Inode, logical_idx: u32) -> Result<u32> {
	if logical_idx >= inode.allocated_clusters {
		return Err(Error::ClusterIndexOutOfRange { index: logical_idx });
	}

	let direct_count = DIRECT_COUNT as u32;
	if logical_idx < direct_count {
		return Ok(inode.direct[logical_idx as usize]);
	}

	let p = sb.ptrs_per_cluster();
	let indirect1_end = direct_count + p;
	if logical_idx < indirect1_end {
		let page = read_ptr_page(device, sb, inode.indirect1)?;
		return Ok(page[(logical_idx - direct_count) as usize]);
	}

	let indirect2_end = indirect1_end + p * p;
	if logical_idx < indirect2_end {
		let r = logical_idx - indirect1_end;
		let top = read_ptr_page(device, sb, inode.indirect2)?;
		let second = read_ptr_page(device, sb, top[(r / p) as usize])?;
		return Ok(second[(r % p) as usize]);
	}

	Err(Error::ClusterIndexOutOfRange { index: logical_idx })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::UNUSED;
	use crate::device::MemDevice;
	use crate::inode::InodeType;

	#[test]
	fn resolves_direct() {
		let mut dev = MemDevice::new(1 << 16);
		let sb = Superblock::new(1024, 512, 16, 41);
		let mut inode = Inode::new(InodeType::Regular);
		inode.direct[2] = 9;
		inode.allocated_clusters = 3;
		assert_eq!(resolve(&mut dev, &sb, &inode, 2).unwrap(), 9);
	}

	#[test]
	fn fails_past_allocated_clusters() {
		let mut dev = MemDevice::new(1 << 16);
		let sb = Superblock::new(1024, 512, 16, 41);
		let inode = Inode::new(InodeType::Regular);
		assert!(matches!(
			resolve(&mut dev, &sb, &inode, 0),
			Err(Error::ClusterIndexOutOfRange { index: 0 })
		));
	}

	#[test]
	fn resolves_indirect1() {
		let mut dev = MemDevice::new(1 << 20);
		let sb = Superblock::new(1024, 512, 16, 41);
		let p = sb.ptrs_per_cluster();
		let mut inode = Inode::new(InodeType::Regular);
		inode.indirect1 = 10;
		inode.allocated_clusters = 5 + p;
		let mut page = vec![UNUSED; p as usize];
		page[(p - 1) as usize] = 77;
		write_ptr_page(&mut dev, &sb, 10, &page).unwrap();
		assert_eq!(resolve(&mut dev, &sb, &inode, 5 + p - 1).unwrap(), 77);
	}

	#[test]
	fn resolves_indirect2() {
		let mut dev = MemDevice::new(1 << 22);
		let sb = Superblock::new(1024, 512, 16, 41);
		let p = sb.ptrs_per_cluster();
		let mut inode = Inode::new(InodeType::Regular);
		inode.indirect2 = 20;
		inode.allocated_clusters = 5 + p + 1;
		let mut top = vec![UNUSED; p as usize];
		top[0] = 21;
		write_ptr_page(&mut dev, &sb, 20, &top).unwrap();
		let mut second = vec![UNUSED; p as usize];
		second[0] = 99;
		write_ptr_page(&mut dev, &sb, 21, &second).unwrap();
		assert_eq!(resolve(&mut dev, &sb, &inode, 5 + p).unwrap(), 99);
	}
}
