// Data models for info rows, drives and partition classification

use std::fmt;

/// One label/value pair displayed in an info page.
/// Rows are rebuilt on every poll; their order is the display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoRow {
    /// Property name shown in the left column
    pub label: String,
    /// Formatted value shown in the right column
    pub value: String,
    /// True when the value changes between polls (usage, frequency, temperature)
    pub is_dynamic: bool,
}

impl InfoRow {
    /// Creates a row whose value does not change while the program runs.
    pub fn fixed(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            is_dynamic: false,
        }
    }

    /// Creates a row that is expected to change on every poll.
    pub fn dynamic(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            is_dynamic: true,
        }
    }
}

/// Category of a storage row.
/// Display strings are the ones shown in the "Type" column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriveKind {
    /// Mounted filesystem (drive letter or mount point)
    Volume,
    /// Whole physical device
    PhysicalDisk,
    /// MBR partition of a non-Linux type
    Mbr,
    /// GPT partition of a non-Linux type
    Gpt,
    /// MBR partition with type byte 0x83
    LinuxMbr,
    /// GPT partition with the Linux filesystem data GUID
    LinuxGpt,
    /// Partition whose table style could not be determined
    Unknown,
}

impl DriveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveKind::Volume => "Volume",
            DriveKind::PhysicalDisk => "Physical Disk",
            DriveKind::Mbr => "MBR",
            DriveKind::Gpt => "GPT",
            DriveKind::LinuxMbr => "Linux (MBR)",
            DriveKind::LinuxGpt => "Linux (GPT)",
            DriveKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DriveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the storage page: a volume, a physical disk or a partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveInfo {
    /// Mount point, volume GUID path, device path or "<device> partN"
    pub name: String,
    /// Row category
    pub kind: DriveKind,
    /// Filesystem type (empty for disks and partitions)
    pub filesystem: String,
    /// Volume label (empty when unknown)
    pub label: String,
    /// Capacity in bytes
    pub total_bytes: u64,
    /// Free space in bytes (0 for disks and partitions)
    pub free_bytes: u64,
}

impl DriveInfo {
    /// Creates a row for a raw device or partition.
    /// Filesystem, label and free space are not known for these.
    pub fn raw(name: impl Into<String>, kind: DriveKind, total_bytes: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            filesystem: String::new(),
            label: String::new(),
            total_bytes,
            free_bytes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_kind_display_strings() {
        assert_eq!(DriveKind::PhysicalDisk.to_string(), "Physical Disk");
        assert_eq!(DriveKind::LinuxMbr.to_string(), "Linux (MBR)");
        assert_eq!(DriveKind::LinuxGpt.to_string(), "Linux (GPT)");
        assert_eq!(DriveKind::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn raw_rows_have_no_free_space() {
        let d = DriveInfo::raw("/dev/sda", DriveKind::PhysicalDisk, 512);
        assert_eq!(d.free_bytes, 0);
        assert!(d.filesystem.is_empty());
        assert!(d.label.is_empty());
    }
}
