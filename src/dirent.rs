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

//! Directory entries: a directory's content is nothing more than a flat array of fixed-size
//! `(name, inode_ptr)` records, read and written through the ordinary byte-I/O path.

use crate::config::NAME_LEN;
use crate::device::BlockDevice;
use crate::error::{Error, Result};
use crate::inode::MutableInode;
use crate::io;
use crate::superblock::Superblock;

/// The fixed encoded size of one directory entry.
pub const ENCODED_SIZE: usize = NAME_LEN + 4;

/// One `(name, inode_ptr)` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
	/// The entry's name, already validated to fit in [`NAME_LEN`] bytes including the NUL.
	pub name: String,
	/// The inode this name points at.
	pub inode_ptr: u32,
}

impl DirectoryEntry {
	fn encode(&self) -> Result<[u8; ENCODED_SIZE]> {
		let bytes = self.name.as_bytes();
		if bytes.len() >= NAME_LEN {
			return Err(Error::InvalidArgument(format!(
				"name {:?} does not fit in {} bytes",
				self.name, NAME_LEN
			)));
		}
		let mut buf = [0u8; ENCODED_SIZE];
		buf[..bytes.len()].copy_from_slice(bytes);
		buf[NAME_LEN..].copy_from_slice(&self.inode_ptr.to_le_bytes());
		Ok(buf)
	}

	fn decode(buf: &[u8]) -> Self {
		let nul = buf[..NAME_LEN].iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
		let name = String::from_utf8_lossy(&buf[..nul]).into_owned();
		let inode_ptr = u32::from_le_bytes(buf[NAME_LEN..NAME_LEN + 4].try_into().unwrap());
		Self { name, inode_ptr }
	}
}

/// Reads every entry of a directory inode, in on-disk order.
pub fn read_all(device: &mut dyn BlockDevice, sb: &Superblock, dir: &MutableInode) -> Result<Vec<DirectoryEntry>> {
	let raw = io::read_all(device, sb, dir)?;
	Ok(raw
		.chunks_exact(ENCODED_SIZE)
		.map(DirectoryEntry::decode)
		.collect())
}

/// Looks up `name` in `dir`, failing with [`Error::DirectoryEntryNotFound`] if absent.
pub fn find_by_name(device: &mut dyn BlockDevice, sb: &Superblock, dir: &MutableInode, name: &str) -> Result<DirectoryEntry> {
	read_all(device, sb, dir)?
		.into_iter()
		.find(|e| e.name == name)
		.ok_or_else(|| Error::DirectoryEntryNotFound { name: name.to_string() })
}

/// Looks up the entry pointing at `inode_ptr`, failing with [`Error::DirectoryEntryNotFound`] if
/// absent. A directory only ever has one entry pointing at a given inode in this filesystem (no
/// hard links), so the first match is returned.
pub fn find_by_inode_ptr(device: &mut dyn BlockDevice, sb: &Superblock, dir: &MutableInode, inode_ptr: u32) -> Result<DirectoryEntry> {
	read_all(device, sb, dir)?
		.into_iter()
		.find(|e| e.inode_ptr == inode_ptr)
		.ok_or_else(|| Error::DirectoryEntryNotFound {
			name: format!("<inode {inode_ptr}>"),
		})
}

/// Appends a new `(name, inode_ptr)` entry to `dir`, failing with
/// [`Error::DuplicateDirectoryEntry`] if `name` is already present.
pub fn append_entry(device: &mut dyn BlockDevice, sb: &Superblock, dir: &mut MutableInode, name: &str, inode_ptr: u32) -> Result<()> {
	if read_all(device, sb, dir)?.iter().any(|e| e.name == name) {
		return Err(Error::DuplicateDirectoryEntry { name: name.to_string() });
	}
	let entry = DirectoryEntry {
		name: name.to_string(),
		inode_ptr,
	};
	io::append(device, sb, dir, &entry.encode()?)
}

/// Removes the entry named `name` from `dir` by swapping it with the last entry and truncating
/// one record off the end, per the allocator's compaction rule. Refuses to remove `.` or `..`.
pub fn remove_entry(device: &mut dyn BlockDevice, sb: &Superblock, dir: &mut MutableInode, name: &str) -> Result<DirectoryEntry> {
	if name == "." || name == ".." {
		return Err(Error::InvalidArgument(format!("cannot remove {name:?}")));
	}
	let mut entries = read_all(device, sb, dir)?;
	let idx = entries
		.iter()
		.position(|e| e.name == name)
		.ok_or_else(|| Error::DirectoryEntryNotFound { name: name.to_string() })?;
	let removed = entries.swap_remove(idx);

	let mut raw = Vec::with_capacity(entries.len() * ENCODED_SIZE);
	for e in &entries {
		raw.extend_from_slice(&e.encode()?);
	}
	io::truncate(device, sb, dir, 0)?;
	io::write(device, sb, dir, 0, &raw)?;
	Ok(removed)
}

/// Seeds a freshly allocated directory with its mandatory `.` and `..` entries.
pub fn seed_dot_entries(device: &mut dyn BlockDevice, sb: &Superblock, dir: &mut MutableInode, parent_ptr: u32) -> Result<()> {
	append_entry(device, sb, dir, ".", dir.ptr)?;
	append_entry(device, sb, dir, "..", parent_ptr)
}

/// Whether `dir` contains only its two mandatory entries.
pub fn is_empty(device: &mut dyn BlockDevice, sb: &Superblock, dir: &MutableInode) -> Result<bool> {
	Ok(read_all(device, sb, dir)?.len() == 2)
}
