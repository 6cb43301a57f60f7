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

//! An inode represents one file or directory in the filesystem.
//!
//! The name of the file is not part of the inode; it lives in the directory entry that points
//! to it, since the on-disk layout in this specification never needs more than one entry to
//! point at the same inode.

use crate::config::{DIRECT_COUNT, UNUSED};
use crate::device::BlockDevice;
use crate::error::Result;
use crate::superblock::Superblock;

/// The fixed encoded size of an inode record.
pub const ENCODED_SIZE: u64 = 1 + 8 + 4 + (DIRECT_COUNT as u64) * 4 + 4 + 4;

/// The type of file an inode describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
	/// A regular file.
	Regular,
	/// A directory.
	Directory,
	/// The filesystem's root directory. There is exactly one.
	Root,
}

impl InodeType {
	fn to_byte(self) -> u8 {
		match self {
			InodeType::Regular => 0,
			InodeType::Directory => 1,
			InodeType::Root => 2,
		}
	}

	fn from_byte(b: u8) -> Self {
		match b {
			1 => InodeType::Directory,
			2 => InodeType::Root,
			_ => InodeType::Regular,
		}
	}

	/// Whether this type denotes a directory (including the root).
	pub fn is_dir(self) -> bool {
		matches!(self, InodeType::Directory | InodeType::Root)
	}
}

/// An inode's fixed-layout record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
	/// The kind of file this inode describes.
	pub kind: InodeType,
	/// Size of the file's content in bytes.
	pub size: u64,
	/// Number of data clusters currently reachable through this inode's chains.
	pub allocated_clusters: u32,
	/// Direct cluster pointers.
	pub direct: [u32; DIRECT_COUNT],
	/// Single-indirect pointer page.
	pub indirect1: u32,
	/// Double-indirect pointer page.
	pub indirect2: u32,
}

impl Inode {
	/// Builds a fresh, empty inode of the given type: all pointers `UNUSED`, zero size.
	pub fn new(kind: InodeType) -> Self {
		Self {
			kind,
			size: 0,
			allocated_clusters: 0,
			direct: [UNUSED; DIRECT_COUNT],
			indirect1: UNUSED,
			indirect2: UNUSED,
		}
	}

	/// Encodes the inode into its fixed on-disk representation.
	pub fn encode(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(ENCODED_SIZE as usize);
		buf.push(self.kind.to_byte());
		buf.extend_from_slice(&self.size.to_le_bytes());
		buf.extend_from_slice(&self.allocated_clusters.to_le_bytes());
		for ptr in &self.direct {
			buf.extend_from_slice(&ptr.to_le_bytes());
		}
		buf.extend_from_slice(&self.indirect1.to_le_bytes());
		buf.extend_from_slice(&self.indirect2.to_le_bytes());
		debug_assert_eq!(buf.len() as u64, ENCODED_SIZE);
		buf
	}

	/// Decodes an inode from its fixed on-disk representation.
	pub fn decode(buf: &[u8]) -> Self {
		let kind = InodeType::from_byte(buf[0]);
		let mut off = 1;
		let size = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
		off += 8;
		let allocated_clusters = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
		off += 4;
		let mut direct = [0u32; DIRECT_COUNT];
		for slot in &mut direct {
			*slot = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
			off += 4;
		}
		let indirect1 = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
		off += 4;
		let indirect2 = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
		Self {
			kind,
			size,
			allocated_clusters,
			direct,
			indirect1,
			indirect2,
		}
	}
}

/// Reads the inode at index `ptr` from the inode table.
pub fn read_inode(device: &mut dyn BlockDevice, sb: &Superblock, ptr: u32) -> Result<Inode> {
	let off = sb.inode_to_volume_ptr(ptr, ENCODED_SIZE);
	let mut buf = vec![0u8; ENCODED_SIZE as usize];
	device.read_bytes(off, &mut buf)?;
	Ok(Inode::decode(&buf))
}

/// Writes `inode` at index `ptr` in the inode table.
pub fn write_inode(
	device: &mut dyn BlockDevice,
	sb: &Superblock,
	ptr: u32,
	inode: &Inode,
) -> Result<()> {
	let off = sb.inode_to_volume_ptr(ptr, ENCODED_SIZE);
	device.write_bytes(off, &inode.encode())
}

/// A loaded inode paired with its index, so callers can mutate it in memory and write it back
/// without having to thread the index separately.
#[derive(Debug, Clone)]
pub struct MutableInode {
	/// The inode's index in the inode table.
	pub ptr: u32,
	/// The in-memory copy of the inode's record.
	pub inode: Inode,
}

impl MutableInode {
	/// Loads the inode at `ptr` from the inode table.
	pub fn load(device: &mut dyn BlockDevice, sb: &Superblock, ptr: u32) -> Result<Self> {
		Ok(Self {
			ptr,
			inode: read_inode(device, sb, ptr)?,
		})
	}

	/// Writes the in-memory record back to the inode table.
	pub fn save(&self, device: &mut dyn BlockDevice, sb: &Superblock) -> Result<()> {
		write_inode(device, sb, self.ptr, &self.inode)
	}

	/// Reloads the in-memory record from the inode table, discarding unsaved changes.
	pub fn reload(&mut self, device: &mut dyn BlockDevice, sb: &Superblock) -> Result<()> {
		self.inode = read_inode(device, sb, self.ptr)?;
		Ok(())
	}
}
