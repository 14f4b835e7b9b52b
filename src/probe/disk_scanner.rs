// Volume, physical disk and partition enumeration for the storage page

use crate::models::{DriveInfo, DriveKind};
use crate::probe::partition_table::{PartitionEntry, read_partitions};
use std::fs::File;
use sysinfo::Disks;

/// Produces the full list of storage rows. Implementations never fail as a
/// whole; anything that cannot be queried is left out.
pub trait DriveEnumerator: Send + Sync {
    fn enumerate(&self) -> Vec<DriveInfo>;
}

/// Enumerates the drives of the running machine.
#[derive(Default)]
pub struct SystemDriveEnumerator;

impl DriveEnumerator for SystemDriveEnumerator {
    fn enumerate(&self) -> Vec<DriveInfo> {
        let mut out = scan_volumes();
        out.extend(scan_physical_disks());
        tracing::debug!(rows = out.len(), "storage enumeration finished");
        out
    }
}

/// Lists mounted volumes with filesystem, label and capacity.
pub fn scan_volumes() -> Vec<DriveInfo> {
    let disks = Disks::new_with_refreshed_list();
    let mut out: Vec<DriveInfo> = disks
        .iter()
        .map(|disk| DriveInfo {
            name: disk.mount_point().display().to_string(),
            kind: DriveKind::Volume,
            filesystem: disk.file_system().to_string_lossy().into_owned(),
            label: volume_label(disk),
            total_bytes: disk.total_space(),
            free_bytes: disk.available_space(),
        })
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

// sysinfo reports the volume label as the disk name on Windows and the
// device node elsewhere
#[cfg(windows)]
fn volume_label(disk: &sysinfo::Disk) -> String {
    disk.name().to_string_lossy().into_owned()
}

#[cfg(not(windows))]
fn volume_label(_disk: &sysinfo::Disk) -> String {
    String::new()
}

/// Lists physical disks, each followed by its partitions.
pub fn scan_physical_disks() -> Vec<DriveInfo> {
    let mut out = Vec::new();
    for device in platform::physical_devices() {
        let mut file = match File::open(&device.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(device = %device.path, error = %e, "skipping disk");
                continue;
            }
        };
        let total = device
            .length_bytes
            .or_else(|| platform::device_length(&file))
            .unwrap_or(0);
        out.push(DriveInfo::raw(&device.path, DriveKind::PhysicalDisk, total));

        match read_partitions(&mut file, device.sector_size) {
            Ok(entries) => out.extend(partition_rows(&device.path, &entries)),
            Err(e) => tracing::debug!(device = %device.path, error = %e, "no partition table"),
        }
    }
    out
}

/// Turns table entries into rows named `<disk> part<N>`.
pub fn partition_rows(disk_path: &str, entries: &[PartitionEntry]) -> Vec<DriveInfo> {
    entries
        .iter()
        .map(|p| {
            DriveInfo::raw(
                format!("{} part{}", disk_path, p.index),
                p.marker.classify(),
                p.length_bytes(),
            )
        })
        .collect()
}

/// Whether a `/sys/block` entry is a real disk rather than a virtual device.
pub fn is_physical_block_name(name: &str) -> bool {
    const VIRTUAL_PREFIXES: [&str; 7] = ["loop", "ram", "zram", "sr", "fd", "dm-", "nbd"];
    !name.is_empty() && !VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// A raw device path with whatever the OS told us about its geometry.
struct RawDevice {
    path: String,
    sector_size: u64,
    length_bytes: Option<u64>,
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{RawDevice, is_physical_block_name};
    use std::fs;
    use std::path::Path;

    fn read_u64(path: &Path) -> Option<u64> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    pub fn physical_devices() -> Vec<RawDevice> {
        let entries = match fs::read_dir("/sys/block") {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("failed to read /sys/block: {}", e);
                return Vec::new();
            }
        };
        let mut out: Vec<RawDevice> = entries
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| is_physical_block_name(name))
            .map(|name| {
                let sys = Path::new("/sys/block").join(&name);
                RawDevice {
                    path: format!("/dev/{}", name),
                    sector_size: read_u64(&sys.join("queue/logical_block_size")).unwrap_or(512),
                    // sysfs always counts 512-byte units
                    length_bytes: read_u64(&sys.join("size")).map(|s| s * 512),
                }
            })
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    pub fn device_length(_file: &fs::File) -> Option<u64> {
        None
    }
}

#[cfg(windows)]
mod platform {
    use super::RawDevice;
    use std::fs::File;
    use std::mem::{size_of, zeroed};
    use std::os::windows::io::AsRawHandle;
    use std::ptr::{null, null_mut};
    use windows_sys::Win32::System::IO::DeviceIoControl;
    use windows_sys::Win32::System::Ioctl::{
        DISK_GEOMETRY, GET_LENGTH_INFORMATION, IOCTL_DISK_GET_DRIVE_GEOMETRY,
        IOCTL_DISK_GET_LENGTH_INFO,
    };

    const MAX_PHYSICAL_DRIVES: u32 = 16;

    pub fn physical_devices() -> Vec<RawDevice> {
        (0..MAX_PHYSICAL_DRIVES)
            .map(|i| format!(r"\\.\PhysicalDrive{}", i))
            .filter_map(|path| {
                let file = File::open(&path).ok()?;
                Some(RawDevice {
                    sector_size: sector_size(&file).unwrap_or(512),
                    length_bytes: device_length(&file),
                    path,
                })
            })
            .collect()
    }

    fn query<T>(file: &File, code: u32) -> Option<T> {
        let mut out: T = unsafe { zeroed() };
        let mut returned = 0u32;
        let ok = unsafe {
            DeviceIoControl(
                file.as_raw_handle(),
                code,
                null(),
                0,
                &mut out as *mut T as *mut _,
                size_of::<T>() as u32,
                &mut returned,
                null_mut(),
            )
        };
        (ok != 0).then_some(out)
    }

    fn sector_size(file: &File) -> Option<u64> {
        query::<DISK_GEOMETRY>(file, IOCTL_DISK_GET_DRIVE_GEOMETRY)
            .map(|g| u64::from(g.BytesPerSector))
            .filter(|&s| s > 0)
    }

    pub fn device_length(file: &File) -> Option<u64> {
        query::<GET_LENGTH_INFORMATION>(file, IOCTL_DISK_GET_LENGTH_INFO)
            .and_then(|info| u64::try_from(info.Length).ok())
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use super::RawDevice;

    pub fn physical_devices() -> Vec<RawDevice> {
        Vec::new()
    }

    pub fn device_length(_file: &std::fs::File) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::partition_table::{LINUX_FILESYSTEM_GUID, LINUX_MBR_TYPE, PartitionMarker};
    use uuid::Uuid;

    fn entry(index: usize, marker: PartitionMarker, sectors: u64) -> PartitionEntry {
        PartitionEntry {
            index,
            marker,
            start_lba: 2048,
            sector_count: sectors,
            sector_size: 512,
        }
    }

    #[test]
    fn partitions_are_named_after_their_disk() {
        let rows = partition_rows(
            "/dev/sda",
            &[
                entry(1, PartitionMarker::Mbr(0x07), 2048),
                entry(2, PartitionMarker::Mbr(LINUX_MBR_TYPE), 4096),
                entry(5, PartitionMarker::Mbr(0x0B), 8),
            ],
        );
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["/dev/sda part1", "/dev/sda part2", "/dev/sda part5"]);
        assert_eq!(rows[0].kind, DriveKind::Mbr);
        assert_eq!(rows[1].kind, DriveKind::LinuxMbr);
        assert_eq!(rows[1].total_bytes, 4096 * 512);
        assert!(rows.iter().all(|r| r.free_bytes == 0 && r.filesystem.is_empty()));
    }

    #[test]
    fn gpt_partitions_are_classified() {
        let rows = partition_rows(
            r"\\.\PhysicalDrive0",
            &[
                entry(1, PartitionMarker::Gpt(LINUX_FILESYSTEM_GUID), 1),
                entry(2, PartitionMarker::Gpt(Uuid::from_u128(0xEBD0A0A2_B9E5_4433_87C0_68B6B72699C7)), 1),
                entry(3, PartitionMarker::Raw, 1),
            ],
        );
        assert_eq!(rows[0].name, r"\\.\PhysicalDrive0 part1");
        assert_eq!(rows[0].kind, DriveKind::LinuxGpt);
        assert_eq!(rows[1].kind, DriveKind::Gpt);
        assert_eq!(rows[2].kind, DriveKind::Unknown);
    }

    #[test]
    fn virtual_block_devices_are_skipped() {
        for name in ["sda", "nvme0n1", "mmcblk0", "vda", "hdb"] {
            assert!(is_physical_block_name(name), "{name}");
        }
        for name in ["loop0", "ram1", "zram0", "sr0", "fd0", "dm-3", "nbd0", ""] {
            assert!(!is_physical_block_name(name), "{name}");
        }
    }
}
