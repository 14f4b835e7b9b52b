// Raw MBR / GPT partition table reader and partition classification

use crate::models::DriveKind;
use std::io::{self, Read, Seek, SeekFrom};
use thiserror::Error;
use uuid::Uuid;

/// MBR partition type byte used for Linux native filesystems
pub const LINUX_MBR_TYPE: u8 = 0x83;

/// GPT partition type GUID for Linux filesystem data
pub const LINUX_FILESYSTEM_GUID: Uuid = Uuid::from_u128(0x0FC63DAF_8483_4772_8E79_3D69D8477DE4);

const PROTECTIVE_MBR_TYPE: u8 = 0xEE;
const EXTENDED_TYPES: [u8; 3] = [0x05, 0x0F, 0x85];
const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];
const MBR_TABLE_OFFSET: usize = 446;
const MBR_ENTRY_SIZE: usize = 16;
const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
const MAX_EBR_HOPS: usize = 128;
const MAX_GPT_ENTRIES: u32 = 256;
const PROBED_SECTOR_SIZES: [u64; 2] = [512, 4096];

/// Type marker stored in a partition table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionMarker {
    /// MBR partition type byte
    Mbr(u8),
    /// GPT partition type GUID
    Gpt(Uuid),
    /// Slot of a protective MBR whose GPT could not be read
    Raw,
}

impl PartitionMarker {
    /// Maps the table marker to the category shown in the storage page.
    pub fn classify(&self) -> DriveKind {
        match self {
            PartitionMarker::Mbr(LINUX_MBR_TYPE) => DriveKind::LinuxMbr,
            PartitionMarker::Mbr(_) => DriveKind::Mbr,
            PartitionMarker::Gpt(guid) if *guid == LINUX_FILESYSTEM_GUID => DriveKind::LinuxGpt,
            PartitionMarker::Gpt(_) => DriveKind::Gpt,
            PartitionMarker::Raw => DriveKind::Unknown,
        }
    }
}

/// One partition found in the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionEntry {
    /// 1-based partition number
    pub index: usize,
    /// Type marker from the table
    pub marker: PartitionMarker,
    /// First logical block
    pub start_lba: u64,
    /// Length in logical blocks
    pub sector_count: u64,
    /// Logical block size the table was read with
    pub sector_size: u64,
}

impl PartitionEntry {
    pub fn length_bytes(&self) -> u64 {
        self.sector_count.saturating_mul(self.sector_size)
    }
}

#[derive(Debug, Error)]
pub enum PartitionTableError {
    #[error("I/O error reading partition table: {0}")]
    Io(#[from] io::Error),

    #[error("no MBR boot signature")]
    NoSignature,

    #[error("malformed GPT header: {0}")]
    MalformedGpt(&'static str),
}

/// Reads the partition table of a raw block device.
///
/// All reads are whole sectors at sector-aligned offsets, which raw device
/// handles require on Windows.
///
/// # Arguments
/// * `dev` - the opened device (or any image implementing Read + Seek)
/// * `sector_size` - logical block size reported by the OS, 512 if unknown
pub fn read_partitions<R: Read + Seek>(
    dev: &mut R,
    sector_size: u64,
) -> Result<Vec<PartitionEntry>, PartitionTableError> {
    let sector_size = if sector_size == 0 { 512 } else { sector_size };
    let mbr = read_sectors(dev, 0, 1, sector_size)?;
    if mbr[510..512] != MBR_SIGNATURE {
        return Err(PartitionTableError::NoSignature);
    }

    let primaries: Vec<MbrSlot> = (0..4).map(|i| MbrSlot::parse(&mbr, i)).collect();
    if primaries.iter().any(|p| p.kind == PROTECTIVE_MBR_TYPE) {
        return read_gpt(dev, sector_size, &primaries);
    }

    let mut out = Vec::new();
    for slot in primaries.iter().filter(|p| !p.is_empty()) {
        if EXTENDED_TYPES.contains(&slot.kind) {
            read_logical_partitions(dev, u64::from(slot.start), sector_size, &mut out);
        } else {
            out.push(PartitionEntry {
                index: out.len() + 1,
                marker: PartitionMarker::Mbr(slot.kind),
                start_lba: u64::from(slot.start),
                sector_count: u64::from(slot.sectors),
                sector_size,
            });
        }
    }
    Ok(out)
}

struct MbrSlot {
    kind: u8,
    start: u32,
    sectors: u32,
}

impl MbrSlot {
    fn parse(sector: &[u8], slot: usize) -> Self {
        let e = &sector[MBR_TABLE_OFFSET + slot * MBR_ENTRY_SIZE..][..MBR_ENTRY_SIZE];
        Self {
            kind: e[4],
            start: le_u32(&e[8..12]),
            sectors: le_u32(&e[12..16]),
        }
    }

    fn is_empty(&self) -> bool {
        self.kind == 0 || self.sectors == 0
    }
}

/// Walks the EBR chain of an extended partition. A broken link ends the
/// walk; partitions found so far are kept.
fn read_logical_partitions<R: Read + Seek>(
    dev: &mut R,
    extended_start: u64,
    sector_size: u64,
    out: &mut Vec<PartitionEntry>,
) {
    let mut ebr_lba = extended_start;
    for _ in 0..MAX_EBR_HOPS {
        let Ok(ebr) = read_sectors(dev, ebr_lba, 1, sector_size) else {
            break;
        };
        if ebr[510..512] != MBR_SIGNATURE {
            break;
        }

        let logical = MbrSlot::parse(&ebr, 0);
        if !logical.is_empty() {
            out.push(PartitionEntry {
                index: out.len() + 1,
                marker: PartitionMarker::Mbr(logical.kind),
                start_lba: ebr_lba + u64::from(logical.start),
                sector_count: u64::from(logical.sectors),
                sector_size,
            });
        }

        // Second slot links to the next EBR, relative to the extended partition
        let link = MbrSlot::parse(&ebr, 1);
        if link.kind == 0 || link.start == 0 {
            break;
        }
        ebr_lba = extended_start + u64::from(link.start);
    }
}

/// Reads the GPT behind a protective MBR. Without a GPT header the table
/// style is undetermined and the MBR slots are reported as [`PartitionMarker::Raw`].
fn read_gpt<R: Read + Seek>(
    dev: &mut R,
    sector_size: u64,
    primaries: &[MbrSlot],
) -> Result<Vec<PartitionEntry>, PartitionTableError> {
    let mut candidates = vec![sector_size];
    candidates.extend(PROBED_SECTOR_SIZES.iter().filter(|s| **s != sector_size));

    for ss in candidates {
        let Ok(header) = read_sectors(dev, 1, 1, ss) else {
            continue;
        };
        if &header[0..8] != GPT_SIGNATURE {
            continue;
        }
        return read_gpt_entries(dev, &header, ss);
    }

    tracing::debug!("protective MBR without a GPT header");
    Ok(primaries
        .iter()
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, p)| PartitionEntry {
            index: i + 1,
            marker: PartitionMarker::Raw,
            start_lba: u64::from(p.start),
            sector_count: u64::from(p.sectors),
            sector_size,
        })
        .collect())
}

fn read_gpt_entries<R: Read + Seek>(
    dev: &mut R,
    header: &[u8],
    sector_size: u64,
) -> Result<Vec<PartitionEntry>, PartitionTableError> {
    let entries_lba = le_u64(&header[72..80]);
    let count = le_u32(&header[80..84]).min(MAX_GPT_ENTRIES) as usize;
    let entry_size = le_u32(&header[84..88]) as usize;
    if entry_size < 128 || entry_size % 8 != 0 || entry_size > sector_size as usize {
        return Err(PartitionTableError::MalformedGpt("partition entry size"));
    }
    if entries_lba < 2 {
        return Err(PartitionTableError::MalformedGpt("partition entry LBA"));
    }

    let table_bytes = (count * entry_size) as u64;
    let sectors = table_bytes.div_ceil(sector_size).max(1);
    let table = read_sectors(dev, entries_lba, sectors, sector_size)?;

    let mut out = Vec::new();
    for (slot, entry) in table.chunks_exact(entry_size).take(count).enumerate() {
        let mut type_bytes = [0u8; 16];
        type_bytes.copy_from_slice(&entry[0..16]);
        if type_bytes == [0u8; 16] {
            continue;
        }
        let first = le_u64(&entry[32..40]);
        let last = le_u64(&entry[40..48]);
        out.push(PartitionEntry {
            index: slot + 1,
            marker: PartitionMarker::Gpt(Uuid::from_bytes_le(type_bytes)),
            start_lba: first,
            sector_count: if last >= first { last - first + 1 } else { 0 },
            sector_size,
        });
    }
    Ok(out)
}

fn read_sectors<R: Read + Seek>(
    dev: &mut R,
    lba: u64,
    count: u64,
    sector_size: u64,
) -> io::Result<Vec<u8>> {
    let offset = lba
        .checked_mul(sector_size)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "sector offset overflow"))?;
    dev.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; (count * sector_size) as usize];
    dev.read_exact(&mut buf)?;
    Ok(buf)
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u64(b: &[u8]) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(&b[..8]);
    u64::from_le_bytes(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    const EFI_SYSTEM_GUID: Uuid = Uuid::from_u128(0xC12A7328_F81F_11D2_BA4B_00A0C93EC93B);

    fn put_mbr_slot(sector: &mut [u8], slot: usize, kind: u8, start: u32, sectors: u32) {
        let e = MBR_TABLE_OFFSET + slot * MBR_ENTRY_SIZE;
        sector[e + 4] = kind;
        sector[e + 8..e + 12].copy_from_slice(&start.to_le_bytes());
        sector[e + 12..e + 16].copy_from_slice(&sectors.to_le_bytes());
        sector[510..512].copy_from_slice(&MBR_SIGNATURE);
    }

    fn gpt_image(sector_size: usize, entries: &[(Uuid, u64, u64)]) -> Vec<u8> {
        let entry_size = 128;
        let mut img = vec![0u8; sector_size * 2 + sector_size.max(entries.len() * entry_size)];
        put_mbr_slot(&mut img[..512], 0, PROTECTIVE_MBR_TYPE, 1, u32::MAX);

        let h = sector_size;
        img[h..h + 8].copy_from_slice(GPT_SIGNATURE);
        img[h + 72..h + 80].copy_from_slice(&2u64.to_le_bytes());
        img[h + 80..h + 84].copy_from_slice(&(entries.len() as u32).to_le_bytes());
        img[h + 84..h + 88].copy_from_slice(&(entry_size as u32).to_le_bytes());

        for (i, (guid, first, last)) in entries.iter().enumerate() {
            let e = sector_size * 2 + i * entry_size;
            img[e..e + 16].copy_from_slice(&guid.to_bytes_le());
            img[e + 32..e + 40].copy_from_slice(&first.to_le_bytes());
            img[e + 40..e + 48].copy_from_slice(&last.to_le_bytes());
        }
        img
    }

    #[test]
    fn linux_guid_matches_the_published_value() {
        assert_eq!(
            LINUX_FILESYSTEM_GUID.to_string().to_uppercase(),
            "0FC63DAF-8483-4772-8E79-3D69D8477DE4"
        );
    }

    #[test]
    fn classification_lookup() {
        assert_eq!(PartitionMarker::Mbr(0x83).classify(), DriveKind::LinuxMbr);
        assert_eq!(PartitionMarker::Mbr(0x07).classify(), DriveKind::Mbr);
        assert_eq!(
            PartitionMarker::Gpt(LINUX_FILESYSTEM_GUID).classify(),
            DriveKind::LinuxGpt
        );
        assert_eq!(PartitionMarker::Gpt(EFI_SYSTEM_GUID).classify(), DriveKind::Gpt);
        assert_eq!(PartitionMarker::Raw.classify(), DriveKind::Unknown);
    }

    proptest! {
        #[test]
        fn non_linux_mbr_types_are_generic(kind in any::<u8>().prop_filter("linux", |k| *k != 0x83)) {
            prop_assert_eq!(PartitionMarker::Mbr(kind).classify(), DriveKind::Mbr);
        }

        #[test]
        fn non_linux_gpt_types_are_generic(raw in any::<u128>()) {
            let guid = Uuid::from_u128(raw);
            prop_assume!(guid != LINUX_FILESYSTEM_GUID);
            prop_assert_eq!(PartitionMarker::Gpt(guid).classify(), DriveKind::Gpt);
        }
    }

    #[test]
    fn reads_primary_mbr_partitions() {
        let mut img = vec![0u8; 512];
        put_mbr_slot(&mut img, 0, 0x83, 2048, 1000);
        put_mbr_slot(&mut img, 1, 0x07, 4096, 2000);

        let parts = read_partitions(&mut Cursor::new(img), 512).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].marker.classify(), DriveKind::LinuxMbr);
        assert_eq!(parts[0].start_lba, 2048);
        assert_eq!(parts[0].length_bytes(), 1000 * 512);
        assert_eq!(parts[1].index, 2);
        assert_eq!(parts[1].marker, PartitionMarker::Mbr(0x07));
    }

    #[test]
    fn follows_extended_partition_chain() {
        let mut img = vec![0u8; 1501 * 512];
        put_mbr_slot(&mut img[..512], 0, 0x83, 63, 100);
        put_mbr_slot(&mut img[..512], 1, 0x05, 1000, 5000);

        // First EBR: logical partition plus link to the next EBR
        let ebr1 = 1000 * 512;
        put_mbr_slot(&mut img[ebr1..ebr1 + 512], 0, 0x83, 63, 200);
        put_mbr_slot(&mut img[ebr1..ebr1 + 512], 1, 0x05, 500, 300);

        // Second EBR ends the chain
        let ebr2 = 1500 * 512;
        put_mbr_slot(&mut img[ebr2..ebr2 + 512], 0, 0x07, 63, 100);

        let parts = read_partitions(&mut Cursor::new(img), 512).unwrap();
        let markers: Vec<_> = parts.iter().map(|p| p.marker).collect();
        assert_eq!(
            markers,
            vec![
                PartitionMarker::Mbr(0x83),
                PartitionMarker::Mbr(0x83),
                PartitionMarker::Mbr(0x07)
            ]
        );
        assert_eq!(parts[1].start_lba, 1063);
        assert_eq!(parts[2].start_lba, 1563);
        assert_eq!(parts[2].index, 3);
    }

    #[test]
    fn reads_gpt_behind_protective_mbr() {
        let img = gpt_image(
            512,
            &[
                (EFI_SYSTEM_GUID, 34, 2047),
                (Uuid::nil(), 0, 0),
                (LINUX_FILESYSTEM_GUID, 2048, 4095),
            ],
        );
        let parts = read_partitions(&mut Cursor::new(img), 512).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].marker.classify(), DriveKind::Gpt);
        assert_eq!(parts[1].index, 3);
        assert_eq!(parts[1].marker.classify(), DriveKind::LinuxGpt);
        assert_eq!(parts[1].length_bytes(), 2048 * 512);
    }

    #[test]
    fn probes_4k_sector_gpt() {
        let img = gpt_image(4096, &[(LINUX_FILESYSTEM_GUID, 256, 511)]);
        let parts = read_partitions(&mut Cursor::new(img), 512).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].sector_size, 4096);
        assert_eq!(parts[0].length_bytes(), 256 * 4096);
    }

    #[test]
    fn blank_disk_has_no_signature() {
        let err = read_partitions(&mut Cursor::new(vec![0u8; 1024]), 512).unwrap_err();
        assert!(matches!(err, PartitionTableError::NoSignature));
    }

    #[test]
    fn protective_mbr_without_header_is_unknown() {
        let mut img = vec![0u8; 8192 * 2];
        put_mbr_slot(&mut img[..512], 0, PROTECTIVE_MBR_TYPE, 1, 1000);
        let parts = read_partitions(&mut Cursor::new(img), 512).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].marker, PartitionMarker::Raw);
        assert_eq!(parts[0].marker.classify(), DriveKind::Unknown);
        assert_eq!(parts[0].length_bytes(), 1000 * 512);
    }
}
