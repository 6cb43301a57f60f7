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

//! Offset-based byte I/O over an inode's content, built on top of the cluster resolver and the
//! growth engine.

use crate::alloc_engine::Allocator;
use crate::cluster::resolve;
use crate::device::BlockDevice;
use crate::error::Result;
use crate::inode::MutableInode;
use crate::superblock::Superblock;

/// Reads up to `buf.len()` bytes of `handle`'s content starting at `offset`, returning the
/// number of bytes actually read (fewer than `buf.len()` at end-of-file).
pub fn read(
	device: &mut dyn BlockDevice,
	sb: &Superblock,
	handle: &MutableInode,
	offset: u64,
	buf: &mut [u8],
) -> Result<usize> {
	if offset >= handle.inode.size {
		return Ok(0);
	}
	let to_read = buf.len().min((handle.inode.size - offset) as usize);
	let cluster_size = sb.cluster_size as u64;
	let mut done = 0;

	while done < to_read {
		let pos = offset + done as u64;
		let logical = (pos / cluster_size) as u32;
		let within = (pos % cluster_size) as usize;
		let chunk = (to_read - done).min(cluster_size as usize - within);

		let phys = resolve(device, sb, &handle.inode, logical)?;
		let mut cluster_buf = vec![0u8; cluster_size as usize];
		device.read_bytes(sb.cluster_to_volume_ptr(phys), &mut cluster_buf)?;
		buf[done..done + chunk].copy_from_slice(&cluster_buf[within..within + chunk]);
		done += chunk;
	}

	Ok(done)
}

/// Reads the entire content of `handle` into a freshly allocated buffer.
pub fn read_all(device: &mut dyn BlockDevice, sb: &Superblock, handle: &MutableInode) -> Result<Vec<u8>> {
	let mut buf = vec![0u8; handle.inode.size as usize];
	read(device, sb, handle, 0, &mut buf)?;
	Ok(buf)
}

/// Writes `buf` into `handle`'s content starting at `offset`, growing the inode (and `size`) as
/// needed. Does not truncate: writing stops exactly at `offset + buf.len()`, leaving any existing
/// tail beyond that point untouched.
pub fn write(
	device: &mut dyn BlockDevice,
	sb: &Superblock,
	handle: &mut MutableInode,
	offset: u64,
	buf: &[u8],
) -> Result<()> {
	let cluster_size = sb.cluster_size as u64;
	let end = offset + buf.len() as u64;
	let needed_clusters = end.div_ceil(cluster_size) as u32;
	if needed_clusters > handle.inode.allocated_clusters {
		let mut alloc = Allocator { device: &mut *device, sb };
		alloc.grow(handle, needed_clusters - handle.inode.allocated_clusters)?;
	}

	let mut done = 0;
	while done < buf.len() {
		let pos = offset + done as u64;
		let logical = (pos / cluster_size) as u32;
		let within = (pos % cluster_size) as usize;
		let chunk = (buf.len() - done).min(cluster_size as usize - within);

		let phys = resolve(device, sb, &handle.inode, logical)?;
		device.write_bytes(
			sb.cluster_to_volume_ptr(phys) + within as u64,
			&buf[done..done + chunk],
		)?;
		done += chunk;
	}

	if end > handle.inode.size {
		handle.inode.size = end;
	}
	handle.save(device, sb)
}

/// Appends `buf` to the end of `handle`'s content.
pub fn append(device: &mut dyn BlockDevice, sb: &Superblock, handle: &mut MutableInode, buf: &[u8]) -> Result<()> {
	let offset = handle.inode.size;
	write(device, sb, handle, offset, buf)
}

/// Truncates `handle`'s content to `new_size` bytes, releasing any clusters no longer needed.
pub fn truncate(device: &mut dyn BlockDevice, sb: &Superblock, handle: &mut MutableInode, new_size: u64) -> Result<()> {
	let cluster_size = sb.cluster_size as u64;
	let needed_clusters = new_size.div_ceil(cluster_size) as u32;
	if needed_clusters < handle.inode.allocated_clusters {
		let mut alloc = Allocator { device: &mut *device, sb };
		alloc.shrink(handle, needed_clusters)?;
	}
	handle.inode.size = new_size;
	handle.save(device, sb)
}
