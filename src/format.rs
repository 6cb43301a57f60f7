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

//! Formats a raw device into a fresh, empty kivfs volume.

use crate::alloc_engine::Allocator;
use crate::config::ROOT_INODE_PTR;
use crate::device::BlockDevice;
use crate::dirent;
use crate::error::Result;
use crate::inode::{self, InodeType, MutableInode};
use crate::path::Filesystem;
use crate::superblock::Superblock;
use log::info;

/// Lays out and writes a fresh superblock, zeroes both bitmaps and the inode table, and seeds
/// the root directory, returning a mounted [`Filesystem`] ready for use.
///
/// `device` must already be at least as large as the computed [`Superblock::volume_size`] — the
/// caller sizes it (see [`crate::device::FileDevice::open`]).
pub fn format<D: BlockDevice>(mut device: D, cluster_size: u32, cluster_count: u32, inode_count: u32) -> Result<Filesystem<D>> {
	let sb = Superblock::new(cluster_size, cluster_count, inode_count, inode::ENCODED_SIZE);
	info!(
		"formatting volume: {} clusters of {} bytes, {} inodes, {} bytes total",
		cluster_count, cluster_size, inode_count, sb.volume_size
	);
	sb.write(&mut device)?;

	let cluster_bitmap_len = (sb.inode_bitmap_start - sb.cluster_bitmap_start) as usize;
	device.write_bytes(sb.cluster_bitmap_start, &vec![0u8; cluster_bitmap_len])?;
	let inode_bitmap_len = (sb.inodes_start - sb.inode_bitmap_start) as usize;
	device.write_bytes(sb.inode_bitmap_start, &vec![0u8; inode_bitmap_len])?;
	let inodes_len = (sb.clusters_start - sb.inodes_start) as usize;
	device.write_bytes(sb.inodes_start, &vec![0u8; inodes_len])?;

	let root_ptr = {
		let mut alloc = Allocator { device: &mut device, sb: &sb };
		alloc.allocate_inode(InodeType::Root)?
	};
	debug_assert_eq!(root_ptr, ROOT_INODE_PTR);

	let mut root = MutableInode::load(&mut device, &sb, root_ptr)?;
	dirent::seed_dot_entries(&mut device, &sb, &mut root, root_ptr)?;

	Ok(Filesystem::from_parts(device, sb))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::MemDevice;

	#[test]
	fn format_seeds_root_with_dot_entries() {
		crate::init_test_logging();
		let mut fs = format(MemDevice::new(1 << 20), 64, 64, 32).unwrap();
		let mut root = fs.open("/", false).unwrap();
		let entries = root.read_dir().unwrap();
		assert_eq!(entries.len(), 2);
		assert!(entries.iter().any(|e| e.name == "."));
		assert!(entries.iter().any(|e| e.name == ".."));
	}
}
