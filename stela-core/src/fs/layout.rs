//! On-disk layout
//!
//! Record format:
//! - NAME (16 bytes): entry name, NUL-padded
//! - KIND (1 byte): see [`RecordKind`]; values picked so an erased slot
//!   reads as Free and a single program turns a live record into a
//!   Tombstone without erasing its page
//! - FIRST (4 bytes LE): first block of the extent; for Header records,
//!   first block of the parent directory
//! - COUNT (4 bytes LE): extent length in blocks
//! - PAD (7 bytes): left erased
//!
//! Record 0 of a directory's first block is a Header record carrying the
//! directory's own name and its parent link; the root's parent is itself.
//!
//! Superblock (block 0 of the region): MAGIC "STLA", format version u16
//! LE, root first block u32 LE, root extent length u32 LE, allocation
//! cursor u32 LE. Everything else stays erased.

use heapless::String;

use super::FsError;
use crate::geometry::BLOCK_SIZE;

/// Block index of the superblock within the region
pub const SUPERBLOCK_INDEX: u32 = 0;

/// Maximum entry name length in bytes
pub const NAME_LEN: usize = 16;

pub(super) const RECORD_SIZE: usize = 32;
pub(super) const RECORDS_PER_BLOCK: usize = BLOCK_SIZE / RECORD_SIZE;

/// Byte offset of the kind field within a record
pub(super) const KIND_OFFSET: usize = NAME_LEN;

const FIRST_OFFSET: usize = KIND_OFFSET + 1;
const COUNT_OFFSET: usize = FIRST_OFFSET + 4;

const MAGIC: [u8; 4] = *b"STLA";
const FORMAT_VERSION: u16 = 1;

/// Directory record kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RecordKind {
    /// Slot never written (erased)
    Free = 0xFF,
    /// Slot held an entry that was removed
    Tombstone = 0x00,
    /// Entry names a directory extent
    Directory = 0x44,
    /// Entry names a file extent
    File = 0x46,
    /// Record 0 of a directory: its own name and parent link
    Header = 0x48,
}

impl RecordKind {
    /// Get the kind as its on-disk byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a kind from its on-disk byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0xFF => Some(RecordKind::Free),
            0x00 => Some(RecordKind::Tombstone),
            0x44 => Some(RecordKind::Directory),
            0x46 => Some(RecordKind::File),
            0x48 => Some(RecordKind::Header),
            _ => None,
        }
    }

    /// Kind byte of an encoded record
    pub(super) fn of(record: &[u8]) -> Option<Self> {
        Self::from_u8(record[KIND_OFFSET])
    }
}

/// A decoded directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Record {
    pub name: String<NAME_LEN>,
    pub kind: RecordKind,
    pub first_block: u32,
    pub block_count: u32,
}

impl Record {
    pub fn new(
        name: &str,
        kind: RecordKind,
        first_block: u32,
        block_count: u32,
    ) -> Result<Self, FsError> {
        let mut owned = String::new();
        owned.push_str(name).map_err(|_| FsError::NameTooLong)?;
        Ok(Self {
            name: owned,
            kind,
            first_block,
            block_count,
        })
    }

    /// Encode into exactly [`RECORD_SIZE`] bytes
    pub fn encode(&self, out: &mut [u8]) {
        out[..NAME_LEN].fill(0);
        out[..self.name.len()].copy_from_slice(self.name.as_bytes());
        out[KIND_OFFSET] = self.kind.as_u8();
        out[FIRST_OFFSET..FIRST_OFFSET + 4].copy_from_slice(&self.first_block.to_le_bytes());
        out[COUNT_OFFSET..COUNT_OFFSET + 4].copy_from_slice(&self.block_count.to_le_bytes());
        out[COUNT_OFFSET + 4..RECORD_SIZE].fill(stela_hal::ERASED);
    }

    /// Decode a live record; the caller has already checked the kind byte
    pub fn decode(bytes: &[u8]) -> Result<Self, FsError> {
        let kind = RecordKind::of(bytes).ok_or(FsError::Corrupted)?;
        let name_len = bytes[..NAME_LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_LEN);
        let name_str =
            core::str::from_utf8(&bytes[..name_len]).map_err(|_| FsError::Corrupted)?;
        let mut name = String::new();
        name.push_str(name_str).map_err(|_| FsError::Corrupted)?;
        Ok(Self {
            name,
            kind,
            first_block: u32::from_le_bytes(
                bytes[FIRST_OFFSET..FIRST_OFFSET + 4]
                    .try_into()
                    .map_err(|_| FsError::Corrupted)?,
            ),
            block_count: u32::from_le_bytes(
                bytes[COUNT_OFFSET..COUNT_OFFSET + 4]
                    .try_into()
                    .map_err(|_| FsError::Corrupted)?,
            ),
        })
    }
}

/// Decoded superblock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Superblock {
    pub root_first: u32,
    pub root_blocks: u32,
    /// First block never handed out by the allocator
    pub alloc_cursor: u32,
}

impl Superblock {
    /// Encode into the head of an erased block buffer
    pub fn encode(&self, block: &mut [u8]) {
        block[0..4].copy_from_slice(&MAGIC);
        block[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        block[8..12].copy_from_slice(&self.root_first.to_le_bytes());
        block[12..16].copy_from_slice(&self.root_blocks.to_le_bytes());
        block[16..20].copy_from_slice(&self.alloc_cursor.to_le_bytes());
    }

    pub fn decode(block: &[u8]) -> Result<Self, FsError> {
        if block[0..4] != MAGIC {
            return Err(FsError::Corrupted);
        }
        let version = u16::from_le_bytes(block[4..6].try_into().map_err(|_| FsError::Corrupted)?);
        if version != FORMAT_VERSION {
            return Err(FsError::Corrupted);
        }
        Ok(Self {
            root_first: u32::from_le_bytes(block[8..12].try_into().map_err(|_| FsError::Corrupted)?),
            root_blocks: u32::from_le_bytes(
                block[12..16].try_into().map_err(|_| FsError::Corrupted)?,
            ),
            alloc_cursor: u32::from_le_bytes(
                block[16..20].try_into().map_err(|_| FsError::Corrupted)?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stela_hal::ERASED;

    #[test]
    fn test_record_round_trip() {
        let record = Record::new("startup", RecordKind::File, 42, 3).unwrap();
        let mut bytes = [ERASED; RECORD_SIZE];
        record.encode(&mut bytes);
        let decoded = Record::decode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_record_name_at_capacity() {
        let name = "sixteen-byte-nam";
        assert_eq!(name.len(), NAME_LEN);
        let record = Record::new(name, RecordKind::Directory, 1, 1).unwrap();
        let mut bytes = [ERASED; RECORD_SIZE];
        record.encode(&mut bytes);
        assert_eq!(Record::decode(&bytes).unwrap().name.as_str(), name);
    }

    #[test]
    fn test_record_name_too_long() {
        assert_eq!(
            Record::new("seventeen-bytes-x", RecordKind::File, 0, 1),
            Err(FsError::NameTooLong)
        );
    }

    #[test]
    fn test_erased_slot_reads_as_free() {
        let bytes = [ERASED; RECORD_SIZE];
        assert_eq!(RecordKind::of(&bytes), Some(RecordKind::Free));
    }

    #[test]
    fn test_tombstone_is_a_pure_bit_clear() {
        // every live kind byte can be programmed to the tombstone value
        // without an erase
        for kind in [RecordKind::Directory, RecordKind::File, RecordKind::Header] {
            assert_eq!(kind.as_u8() & RecordKind::Tombstone.as_u8(), 0x00);
        }
    }

    #[test]
    fn test_superblock_round_trip() {
        let sb = Superblock {
            root_first: 1,
            root_blocks: 1,
            alloc_cursor: 2,
        };
        let mut block = [ERASED; BLOCK_SIZE];
        sb.encode(&mut block);
        assert_eq!(Superblock::decode(&block).unwrap(), sb);
    }

    #[test]
    fn test_superblock_rejects_bad_magic() {
        let block = [ERASED; BLOCK_SIZE];
        assert_eq!(Superblock::decode(&block), Err(FsError::Corrupted));

        let sb = Superblock {
            root_first: 1,
            root_blocks: 1,
            alloc_cursor: 2,
        };
        let mut block = [ERASED; BLOCK_SIZE];
        sb.encode(&mut block);
        block[5] = 0x7F; // wrong version
        assert_eq!(Superblock::decode(&block), Err(FsError::Corrupted));
    }
}
