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

//! Path resolution and the mounted [`Filesystem`] handle, tying together the superblock,
//! allocator, byte-I/O and directory-entry layers into the operations a caller actually uses:
//! `open`, `mkdir`, `remove`, `rename`, `chdir`.

use crate::alloc_engine::Allocator;
use crate::config::ROOT_INODE_PTR;
use crate::device::BlockDevice;
use crate::dirent;
use crate::error::{Error, Result};
use crate::inode::{InodeType, MutableInode};
use crate::io;
use crate::superblock::Superblock;

/// A mounted volume: a device, its superblock, and a current-directory context.
///
/// Path resolution is relative to `current_ptr` for relative paths, and to `root_ptr` for
/// absolute ones (paths starting with `/`). Both are ordinary inode pointers; there is nothing
/// privileged about the root beyond being the one [`crate::format::format`] seeds `..` to point
/// at itself.
pub struct Filesystem<D> {
	device: D,
	sb: Superblock,
	root_ptr: u32,
	current_ptr: u32,
}

impl<D: BlockDevice> Filesystem<D> {
	/// Mounts an already-formatted volume: reads the superblock and starts the current directory
	/// at the root.
	pub fn mount(mut device: D) -> Result<Self> {
		let sb = Superblock::read(&mut device)?;
		Ok(Self {
			device,
			sb,
			root_ptr: ROOT_INODE_PTR,
			current_ptr: ROOT_INODE_PTR,
		})
	}

	/// Builds a handle directly from an already-known superblock, used right after
	/// [`crate::format::format`] writes one.
	pub fn from_parts(device: D, sb: Superblock) -> Self {
		Self {
			device,
			sb,
			root_ptr: ROOT_INODE_PTR,
			current_ptr: ROOT_INODE_PTR,
		}
	}

	fn allocator(&mut self) -> Allocator<'_> {
		Allocator {
			device: &mut self.device,
			sb: &self.sb,
		}
	}

	/// Splits `path` into the starting inode to resolve from and its non-empty segments.
	fn split(&self, path: &str) -> (u32, Vec<&str>) {
		let start = if path.starts_with('/') { self.root_ptr } else { self.current_ptr };
		let segments = path.split('/').filter(|s| !s.is_empty()).collect();
		(start, segments)
	}

	/// The entry's own name as it appears in its parent directory, or `/` for the root.
	fn leaf_name(&self, path: &str) -> String {
		let (_, segments) = self.split(path);
		segments.last().map(|s| s.to_string()).unwrap_or_else(|| "/".to_string())
	}

	/// Resolves `path` to an inode pointer, failing with [`Error::DirectoryEntryNotFound`] or
	/// [`Error::NotADirectory`] as appropriate.
	pub fn resolve(&mut self, path: &str) -> Result<u32> {
		let (mut ptr, segments) = self.split(path);
		if segments.is_empty() {
			return Ok(ptr);
		}
		for (i, seg) in segments.iter().enumerate() {
			let dir = MutableInode::load(&mut self.device, &self.sb, ptr)?;
			if !dir.inode.kind.is_dir() {
				return Err(Error::NotADirectory);
			}
			let entry = dirent::find_by_name(&mut self.device, &self.sb, &dir, seg)?;
			ptr = entry.inode_ptr;
			let _ = i;
		}
		Ok(ptr)
	}

	/// Resolves `path` to `(parent_ptr, leaf_name)`, without requiring the leaf itself to exist.
	fn resolve_parent<'p>(&mut self, path: &'p str) -> Result<(u32, &'p str)> {
		let (start, segments) = self.split(path);
		let leaf = *segments
			.last()
			.ok_or_else(|| Error::InvalidArgument("path has no final component".to_string()))?;
		let mut ptr = start;
		for seg in &segments[..segments.len() - 1] {
			let dir = MutableInode::load(&mut self.device, &self.sb, ptr)?;
			if !dir.inode.kind.is_dir() {
				return Err(Error::NotADirectory);
			}
			ptr = dirent::find_by_name(&mut self.device, &self.sb, &dir, seg)?.inode_ptr;
		}
		Ok((ptr, leaf))
	}

	/// Whether `path` resolves to an existing entry.
	pub fn exists(&mut self, path: &str) -> Result<bool> {
		match self.resolve(path) {
			Ok(_) => Ok(true),
			Err(Error::DirectoryEntryNotFound { .. }) => Ok(false),
			Err(e) => Err(e),
		}
	}

	/// Opens `path`, creating a regular file there if `create` is true and it does not yet exist.
	pub fn open(&mut self, path: &str, create: bool) -> Result<File<'_, D>> {
		let name = self.leaf_name(path);
		let ptr = match self.resolve(path) {
			Ok(ptr) => ptr,
			Err(Error::DirectoryEntryNotFound { .. }) if create => {
				let (parent_ptr, name) = self.resolve_parent(path)?;
				let ptr = self.allocator().allocate_inode(InodeType::Regular)?;
				let mut parent = MutableInode::load(&mut self.device, &self.sb, parent_ptr)?;
				dirent::append_entry(&mut self.device, &self.sb, &mut parent, name, ptr)?;
				ptr
			}
			Err(e) => return Err(e),
		};
		let handle = MutableInode::load(&mut self.device, &self.sb, ptr)?;
		Ok(File { fs: self, handle, name })
	}

	/// Creates a directory at `path`, seeded with `.` and `..`.
	pub fn mkdir(&mut self, path: &str) -> Result<()> {
		let (parent_ptr, name) = self.resolve_parent(path)?;
		let mut parent = MutableInode::load(&mut self.device, &self.sb, parent_ptr)?;
		match dirent::find_by_name(&mut self.device, &self.sb, &parent, name) {
			Ok(_) => return Err(Error::DuplicateDirectoryEntry { name: name.to_string() }),
			Err(Error::DirectoryEntryNotFound { .. }) => {}
			Err(e) => return Err(e),
		}

		let ptr = self.allocator().allocate_inode(InodeType::Directory)?;
		let mut dir = MutableInode::load(&mut self.device, &self.sb, ptr)?;
		dirent::seed_dot_entries(&mut self.device, &self.sb, &mut dir, parent_ptr)?;
		dirent::append_entry(&mut self.device, &self.sb, &mut parent, name, ptr)
	}

	/// Removes the entry at `path`. Refuses to remove `.`, `..`, the root, the current directory,
	/// or a non-empty directory.
	pub fn remove(&mut self, path: &str) -> Result<()> {
		let (parent_ptr, name) = self.resolve_parent(path)?;
		if name == "." || name == ".." {
			return Err(Error::InvalidArgument(format!("cannot remove {name:?}")));
		}
		let mut parent = MutableInode::load(&mut self.device, &self.sb, parent_ptr)?;
		let entry = dirent::find_by_name(&mut self.device, &self.sb, &parent, name)?;
		if entry.inode_ptr == self.root_ptr {
			return Err(Error::InvalidArgument("cannot remove the root directory".to_string()));
		}
		if entry.inode_ptr == self.current_ptr {
			return Err(Error::InvalidArgument("cannot remove the current directory".to_string()));
		}

		let mut target = MutableInode::load(&mut self.device, &self.sb, entry.inode_ptr)?;
		if target.inode.kind.is_dir() && !dirent::is_empty(&mut self.device, &self.sb, &target)? {
			return Err(Error::DirectoryIsNotEmpty { name: name.to_string() });
		}

		io::truncate(&mut self.device, &self.sb, &mut target, 0)?;
		self.allocator().free_inode(entry.inode_ptr)?;
		dirent::remove_entry(&mut self.device, &self.sb, &mut parent, name)?;
		Ok(())
	}

	/// Moves the entry at `old_path` to `new_path`, preserving its content. If the entry is a
	/// directory and its parent changes, its `..` entry is updated to the new parent.
	pub fn rename(&mut self, old_path: &str, new_path: &str) -> Result<()> {
		let (old_parent_ptr, old_name) = self.resolve_parent(old_path)?;
		if old_name == "." || old_name == ".." {
			return Err(Error::InvalidArgument(format!("cannot rename {old_name:?}")));
		}
		let (new_parent_ptr, new_name) = self.resolve_parent(new_path)?;

		let mut old_parent = MutableInode::load(&mut self.device, &self.sb, old_parent_ptr)?;
		let entry = dirent::find_by_name(&mut self.device, &self.sb, &old_parent, old_name)?;

		let mut new_parent = MutableInode::load(&mut self.device, &self.sb, new_parent_ptr)?;
		dirent::append_entry(&mut self.device, &self.sb, &mut new_parent, new_name, entry.inode_ptr)?;
		dirent::remove_entry(&mut self.device, &self.sb, &mut old_parent, old_name)?;

		if old_parent_ptr != new_parent_ptr {
			let moved = MutableInode::load(&mut self.device, &self.sb, entry.inode_ptr)?;
			if moved.inode.kind.is_dir() {
				let mut moved = moved;
				dirent::remove_entry(&mut self.device, &self.sb, &mut moved, "..")?;
				dirent::append_entry(&mut self.device, &self.sb, &mut moved, "..", new_parent_ptr)?;
			}
		}
		Ok(())
	}

	/// Changes the current directory to `path`, failing with [`Error::NotADirectory`] if it is
	/// not one.
	pub fn chdir(&mut self, path: &str) -> Result<()> {
		let ptr = self.resolve(path)?;
		let inode = MutableInode::load(&mut self.device, &self.sb, ptr)?;
		if !inode.inode.kind.is_dir() {
			return Err(Error::NotADirectory);
		}
		self.current_ptr = ptr;
		Ok(())
	}

	/// Reconstructs the absolute path of `path`. A directory is resolved and walked via its own
	/// `..` chain; a regular file is resolved to its parent directory (which is walked the same
	/// way) with the file's own leaf name appended, since a file's content cannot be read as
	/// directory entries.
	pub fn abs(&mut self, path: &str) -> Result<String> {
		let ptr = self.resolve(path)?;
		let inode = MutableInode::load(&mut self.device, &self.sb, ptr)?;
		if inode.inode.kind.is_dir() {
			return self.abs_dir(ptr);
		}

		let (parent_ptr, leaf) = self.resolve_parent(path)?;
		let leaf = leaf.to_string();
		let parent_abs = self.abs_dir(parent_ptr)?;
		Ok(if parent_abs == "/" {
			format!("/{leaf}")
		} else {
			format!("{parent_abs}/{leaf}")
		})
	}

	/// Walks `..` from `ptr` back to the root, recording each step's own name along the way.
	fn abs_dir(&mut self, mut ptr: u32) -> Result<String> {
		let mut segments = Vec::new();
		while ptr != self.root_ptr {
			let dir = MutableInode::load(&mut self.device, &self.sb, ptr)?;
			let parent_entry = dirent::find_by_name(&mut self.device, &self.sb, &dir, "..")?;
			let parent = MutableInode::load(&mut self.device, &self.sb, parent_entry.inode_ptr)?;
			let named = dirent::find_by_inode_ptr(&mut self.device, &self.sb, &parent, ptr)?;
			segments.push(named.name);
			ptr = parent_entry.inode_ptr;
		}
		segments.reverse();
		Ok(format!("/{}", segments.join("/")))
	}

	/// The inode pointer of the current directory.
	pub fn current_ptr(&self) -> u32 {
		self.current_ptr
	}

	/// The inode pointer of the root directory.
	pub fn root_ptr(&self) -> u32 {
		self.root_ptr
	}
}

/// A cursor over one open file or directory's content.
pub struct File<'a, D> {
	fs: &'a mut Filesystem<D>,
	handle: MutableInode,
	name: String,
}

impl<'a, D: BlockDevice> File<'a, D> {
	/// Reads up to `buf.len()` bytes starting at `offset`, returning the number read.
	pub fn read(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
		io::read(&mut self.fs.device, &self.fs.sb, &self.handle, offset, buf)
	}

	/// Reads the file's entire content.
	pub fn read_all(&mut self) -> Result<Vec<u8>> {
		io::read_all(&mut self.fs.device, &self.fs.sb, &self.handle)
	}

	/// Writes `buf` starting at `offset`, growing the file as needed.
	pub fn write(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
		io::write(&mut self.fs.device, &self.fs.sb, &mut self.handle, offset, buf)
	}

	/// Appends `buf` to the end of the file.
	pub fn append(&mut self, buf: &[u8]) -> Result<()> {
		io::append(&mut self.fs.device, &self.fs.sb, &mut self.handle, buf)
	}

	/// Truncates the file to `new_size` bytes.
	pub fn truncate(&mut self, new_size: u64) -> Result<()> {
		io::truncate(&mut self.fs.device, &self.fs.sb, &mut self.handle, new_size)
	}

	/// Lists this directory's entries, failing with [`Error::NotADirectory`] if this is a file.
	pub fn read_dir(&mut self) -> Result<Vec<dirent::DirectoryEntry>> {
		if !self.handle.inode.kind.is_dir() {
			return Err(Error::NotADirectory);
		}
		dirent::read_all(&mut self.fs.device, &self.fs.sb, &self.handle)
	}

	/// Whether this handle refers to a directory.
	pub fn is_dir(&self) -> bool {
		self.handle.inode.kind.is_dir()
	}

	/// The content size in bytes.
	pub fn size(&self) -> u64 {
		self.handle.inode.size
	}

	/// This entry's own name, as it appears in its parent directory (`/` for the root).
	pub fn name(&self) -> &str {
		&self.name
	}

	/// This entry's inode pointer.
	pub fn inode_ptr(&self) -> u32 {
		self.handle.ptr
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::format::format;

	fn mounted() -> Filesystem<crate::device::MemDevice> {
		format(crate::device::MemDevice::new(1 << 20), 64, 64, 32).unwrap()
	}

	#[test]
	fn root_exists_and_is_a_directory() {
		let mut fs = mounted();
		assert!(fs.exists("/").unwrap());
		let mut root = fs.open("/", false).unwrap();
		assert!(root.is_dir());
	}

	#[test]
	fn create_and_read_back_a_file() {
		let mut fs = mounted();
		{
			let mut f = fs.open("/greeting.txt", true).unwrap();
			f.write(0, b"hi").unwrap();
		}
		let mut f = fs.open("/greeting.txt", false).unwrap();
		assert_eq!(f.read_all().unwrap(), b"hi");
	}

	#[test]
	fn mkdir_then_chdir_then_relative_open() {
		let mut fs = mounted();
		fs.mkdir("/sub").unwrap();
		fs.chdir("/sub").unwrap();
		{
			let mut f = fs.open("inner.txt", true).unwrap();
			f.write(0, b"x").unwrap();
		}
		assert!(fs.exists("inner.txt").unwrap());
		assert!(fs.exists("/sub/inner.txt").unwrap());
	}

	#[test]
	fn remove_nonempty_directory_fails() {
		let mut fs = mounted();
		fs.mkdir("/sub").unwrap();
		fs.open("/sub/file.txt", true).unwrap();
		assert!(matches!(
			fs.remove("/sub"),
			Err(Error::DirectoryIsNotEmpty { .. })
		));
	}

	#[test]
	fn rename_preserves_content() {
		let mut fs = mounted();
		{
			let mut f = fs.open("/a.txt", true).unwrap();
			f.write(0, b"payload").unwrap();
		}
		fs.rename("/a.txt", "/b.txt").unwrap();
		assert!(!fs.exists("/a.txt").unwrap());
		let mut f = fs.open("/b.txt", false).unwrap();
		assert_eq!(f.read_all().unwrap(), b"payload");
	}

	#[test]
	fn abs_reconstructs_path() {
		let mut fs = mounted();
		fs.mkdir("/sub").unwrap();
		assert_eq!(fs.abs("/sub").unwrap(), "/sub");
	}

	#[test]
	fn abs_on_a_file_appends_its_leaf_name() {
		let mut fs = mounted();
		fs.mkdir("/sub").unwrap();
		fs.open("/sub/file.txt", true).unwrap();
		assert_eq!(fs.abs("/sub/file.txt").unwrap(), "/sub/file.txt");
	}

	#[test]
	fn abs_on_a_root_level_file() {
		let mut fs = mounted();
		fs.open("/top.txt", true).unwrap();
		assert_eq!(fs.abs("/top.txt").unwrap(), "/top.txt");
	}

	#[test]
	fn open_reports_its_own_name() {
		let mut fs = mounted();
		let f = fs.open("/greeting.txt", true).unwrap();
		assert_eq!(f.name(), "greeting.txt");
	}

	#[test]
	fn mkdir_twice_fails_duplicate_without_leaking() {
		let mut fs = mounted();
		fs.mkdir("/d").unwrap();
		assert!(matches!(
			fs.mkdir("/d"),
			Err(Error::DuplicateDirectoryEntry { .. })
		));

		// The rejected mkdir must not have left a second, bitmap-occupied-but-unreachable inode
		// or cluster behind: the root should still have exactly one "d" entry, and allocating
		// fresh inodes/clusters afterwards must still succeed.
		let root_entries = fs.open("/", false).unwrap().read_dir().unwrap();
		assert_eq!(root_entries.iter().filter(|e| e.name == "d").count(), 1);
		fs.mkdir("/e").unwrap();
		fs.open("/e/f.txt", true).unwrap().write(0, b"ok").unwrap();
	}

	#[test]
	fn rename_refuses_dot_and_dotdot() {
		let mut fs = mounted();
		fs.mkdir("/sub").unwrap();
		assert!(matches!(
			fs.rename("/sub/..", "/alias"),
			Err(Error::InvalidArgument(_))
		));
		assert!(!fs.exists("/alias").unwrap());
		assert!(matches!(
			fs.rename("/sub/.", "/alias2"),
			Err(Error::InvalidArgument(_))
		));
		assert!(!fs.exists("/alias2").unwrap());
	}
}
