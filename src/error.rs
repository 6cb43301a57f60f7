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

//! Error types returned by every public operation of the filesystem.

use std::io;

/// The unified error type for the whole crate.
///
/// Every public operation returns `Result<T, Error>`. [`Error::ClusterIndexOutOfRange`] is the
/// only variant ever recovered from internally (by the growth engine, see
/// [`crate::alloc_engine::Allocator::grow`]); every other variant is meant to reach the caller
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The inode bitmap has no free bit left.
	#[error("no free inode is available")]
	NoFreeInodeAvailable,
	/// The cluster bitmap has no free bit left.
	#[error("no free cluster is available")]
	NoFreeClusterAvailable,
	/// A positioned access landed outside of the region it targets.
	#[error("offset {offset} is out of range (limit {limit})")]
	OutOfRange {
		/// The offset that was accessed.
		offset: u64,
		/// The last valid offset for the region.
		limit: u64,
	},
	/// The resolver was asked for a logical cluster index the inode does not own.
	///
	/// During a write, this is caught and turned into a call to
	/// [`crate::alloc_engine::Allocator::grow`]; it only escapes to a caller when something
	/// outside the write path asked for an index the inode genuinely never had.
	#[error("cluster index {index} is out of range for this inode")]
	ClusterIndexOutOfRange {
		/// The offending logical index.
		index: u32,
	},
	/// No entry with this name exists in the directory being searched.
	#[error("directory entry {name:?} not found")]
	DirectoryEntryNotFound {
		/// The name that was looked up.
		name: String,
	},
	/// An entry with this name already exists in the directory.
	#[error("directory entry {name:?} already exists")]
	DuplicateDirectoryEntry {
		/// The conflicting name.
		name: String,
	},
	/// Removal of a non-empty directory was attempted.
	#[error("directory {name:?} is not empty")]
	DirectoryIsNotEmpty {
		/// The path that was targeted.
		name: String,
	},
	/// A path segment expected to be a directory was not one.
	#[error("not a directory")]
	NotADirectory,
	/// Caller input could not be honored (an empty path, a name that doesn't fit the fixed
	/// field, an attempt to remove `.` or `..`, etc.)
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	/// The underlying block device failed.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
