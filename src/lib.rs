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

//! kivfs is a single-volume, Unix-style educational filesystem implemented on top of a
//! byte-addressable block device.
//!
//! A volume is a superblock, a cluster bitmap, an inode bitmap, an inode table and a region of
//! data clusters, laid out back to back in that order ([`superblock`]). Every inode addresses
//! its data through five direct pointers plus a single- and a double-indirect pointer
//! ([`inode`], [`cluster`]). Space is claimed and released through a first-fit bitmap allocator
//! ([`bitmap`]), and a growth/shrink engine keeps an inode's pointer tiers consistent as its
//! size changes ([`alloc_engine`]). Directories are regular files whose content is an array of
//! fixed-size name/inode records ([`dirent`]). [`path::Filesystem`] ties all of this together
//! into path resolution and the handful of operations a caller actually uses.
//!
//! ```
//! use kivfs::device::MemDevice;
//! use kivfs::format::format;
//!
//! let mut fs = format(MemDevice::new(1 << 20), 1024, 64, 32).unwrap();
//! let mut file = fs.open("/hello.txt", true).unwrap();
//! file.write(0, b"hello, volume").unwrap();
//! assert_eq!(file.read_all().unwrap(), b"hello, volume");
//! ```

pub mod alloc_engine;
pub mod bitmap;
pub mod cluster;
pub mod config;
pub mod device;
pub mod dirent;
pub mod error;
pub mod format;
pub mod inode;
pub mod io;
pub mod path;
pub mod superblock;

pub use device::BlockDevice;
pub use error::{Error, Result};
pub use format::format;
pub use path::{File, Filesystem};

/// Initializes `env_logger` once for the test binary, so `log::info!`/`log::debug!` calls made
/// by the code under test (e.g. [`format::format`]) are visible with `RUST_LOG` set. Safe to call
/// from multiple tests; only the first call takes effect.
#[cfg(test)]
pub(crate) fn init_test_logging() {
	let _ = env_logger::try_init();
}
