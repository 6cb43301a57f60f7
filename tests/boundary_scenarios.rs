use kivfs::device::{FileDevice, MemDevice};
use kivfs::error::Error;
use kivfs::format::format;

fn temp_device(len: u64) -> FileDevice {
	let file = tempfile::tempfile().expect("create temp file");
	file.set_len(len).expect("size temp file");
	FileDevice::new(file, len)
}

#[test]
fn direct_only_write_and_read_round_trip() {
	let mut fs = format(MemDevice::new(1 << 16), 64, 32, 16).unwrap();
	let mut f = fs.open("/small.bin", true).unwrap();
	f.write(0, b"five clusters or fewer").unwrap();
	assert_eq!(f.read_all().unwrap(), b"five clusters or fewer");
}

#[test]
fn write_exhausts_direct_into_indirect1() {
	let mut fs = format(MemDevice::new(1 << 20), 16, 512, 32).unwrap();
	let mut f = fs.open("/big.bin", true).unwrap();
	// 5 direct clusters hold 80 bytes; push well past that into indirect1.
	let data = vec![0x5Au8; 400];
	f.write(0, &data).unwrap();
	assert_eq!(f.read_all().unwrap(), data);
}

#[test]
fn write_reaches_indirect2() {
	let mut fs = format(MemDevice::new(1 << 22), 16, 4096, 32).unwrap();
	let mut f = fs.open("/huge.bin", true).unwrap();
	// ptrs_per_cluster = 16/4 = 4. indirect1 covers indices 5..9, indirect2 starts at 9.
	// Index 10 (byte offset 160) lands inside the double-indirect tier.
	let data = vec![0x42u8; 200];
	f.write(0, &data).unwrap();
	assert_eq!(f.read_all().unwrap(), data);
}

#[test]
fn shrink_to_zero_reclaims_every_cluster() {
	let mut fs = format(MemDevice::new(1 << 20), 16, 512, 32).unwrap();
	{
		let mut f = fs.open("/scratch.bin", true).unwrap();
		f.write(0, &vec![1u8; 300]).unwrap();
		f.truncate(0).unwrap();
		assert_eq!(f.size(), 0);
	}
	// A second large write must succeed, proving the clusters actually came back to the pool.
	let mut f2 = fs.open("/scratch2.bin", true).unwrap();
	f2.write(0, &vec![2u8; 300]).unwrap();
	assert_eq!(f2.read_all().unwrap(), vec![2u8; 300]);
}

#[test]
fn directory_rejects_duplicates_and_survives_remove() {
	let mut fs = format(MemDevice::new(1 << 20), 64, 64, 32).unwrap();
	fs.open("/dup.txt", true).unwrap();
	// Opening again with create=true must find the existing entry rather than duplicate it.
	fs.open("/dup.txt", true).unwrap();
	let root_entries = fs.open("/", false).unwrap().read_dir().unwrap();
	assert_eq!(root_entries.iter().filter(|e| e.name == "dup.txt").count(), 1);

	fs.remove("/dup.txt").unwrap();
	assert!(!fs.exists("/dup.txt").unwrap());
	assert!(matches!(fs.remove("/dup.txt"), Err(Error::DirectoryEntryNotFound { .. })));
}

#[test]
fn rename_preserves_content_across_directories() {
	let mut fs = format(MemDevice::new(1 << 20), 64, 64, 32).unwrap();
	fs.mkdir("/dst").unwrap();
	{
		let mut f = fs.open("/src.txt", true).unwrap();
		f.write(0, b"payload").unwrap();
	}
	fs.rename("/src.txt", "/dst/src.txt").unwrap();
	assert!(!fs.exists("/src.txt").unwrap());
	let mut f = fs.open("/dst/src.txt", false).unwrap();
	assert_eq!(f.read_all().unwrap(), b"payload");
}

#[test]
fn out_of_space_write_leaves_no_partial_growth() {
	let mut fs = format(MemDevice::new(1 << 14), 16, 6, 8).unwrap();
	let mut f = fs.open("/too_big.bin", true).unwrap();
	let before_size = f.size();
	let result = f.write(0, &vec![0u8; 1 << 20]);
	assert!(result.is_err());
	assert_eq!(f.size(), before_size);
}

#[test]
fn works_against_a_host_file_device() {
	let sb_device = temp_device(1 << 20);
	let mut fs = format(sb_device, 64, 64, 32).unwrap();
	{
		let mut f = fs.open("/on_disk.txt", true).unwrap();
		f.write(0, b"persisted").unwrap();
	}
	let mut f = fs.open("/on_disk.txt", false).unwrap();
	assert_eq!(f.read_all().unwrap(), b"persisted");
}
