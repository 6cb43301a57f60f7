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

//! Constants describing the on-disk layout.

/// Number of direct cluster pointers held in every inode.
pub const DIRECT_COUNT: usize = 5;

/// Reserved cluster-pointer value meaning "no cluster here".
pub const UNUSED: u32 = 0xFFFF_FFFF;

/// The size in bytes of a single encoded cluster pointer, as stored in indirect pages.
pub const CLUSTER_PTR_SIZE: usize = 4;

/// Maximum length of a directory entry name, NUL terminator included.
pub const NAME_LEN: usize = 32;

/// Default cluster size used by [`crate::format`] when the caller doesn't need anything
/// unusual.
pub const DEFAULT_CLUSTER_SIZE: u32 = 1024;

/// Inode pointer of the root directory; always the first inode allocated by `format`.
pub const ROOT_INODE_PTR: u32 = 0;

/// Magic bytes identifying a kivfs volume, stored in the superblock signature field.
pub const SIGNATURE: &[u8; 8] = b"KIVFS001";
