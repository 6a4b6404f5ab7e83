//! # File Header Definitions
//!
//! Type-safe, zerocopy-based structs for the on-disk layout of an index file.
//!
//! ## File Layout
//!
//! ```text
//! offset 0    magic      [u8; 8]   b"avlfile\0"
//! offset 8    root       u64       byte offset of the root record, 0 = empty
//! offset 16   records    append-only sequence of node records
//! ```
//!
//! ## Record Layout
//!
//! ```text
//! Offset  Size  Description
//! ------  ----  -------------------------------------------
//! 0       4     height: u32
//! 4       8     left child offset: u64 (0 = none)
//! 12      8     right child offset: u64 (0 = none)
//! 20      4     key length: u32
//! 24      4     value length: u32
//! 28      n     encoded key bytes
//! 28+n    m     encoded value bytes
//! ```
//!
//! The first 20 bytes (`RecordLinks`) are the only part of a record that is
//! ever rewritten in place; key and value bytes are append-only. Child offset
//! 0 means "no child"; offset 0 always holds the file magic, never a record.
//!
//! ## Endianness
//!
//! Every multi-byte field is little-endian, and the magic is plain ASCII
//! bytes. The whole file uses one encoding; there is no version tag.
//!
//! ## Zerocopy Safety
//!
//! All structs derive `FromBytes`/`IntoBytes`/`Immutable`/`KnownLayout`/
//! `Unaligned`, so they can be read from and written as raw bytes without
//! copies, at any alignment. Sizes are checked at compile time.

use eyre::{ensure, Result};
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const FILE_MAGIC: &[u8; 8] = b"avlfile\0";

pub const FILE_HEADER_SIZE: usize = 16;
pub const RECORD_LINKS_SIZE: usize = 20;
pub const RECORD_HEADER_SIZE: usize = 28;

/// Byte offset of the root slot within the file header.
pub const ROOT_SLOT_OFFSET: u64 = 8;

/// Leading file header: magic plus the root-record offset slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FileHeader {
    magic: [u8; 8],
    root: U64,
}

const _: () = assert!(std::mem::size_of::<FileHeader>() == FILE_HEADER_SIZE);

impl FileHeader {
    pub fn new() -> Self {
        Self {
            magic: *FILE_MAGIC,
            root: U64::new(0),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= FILE_HEADER_SIZE,
            "buffer too small for FileHeader: {} < {}",
            bytes.len(),
            FILE_HEADER_SIZE
        );

        let header = Self::ref_from_bytes(&bytes[..FILE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse FileHeader: {:?}", e))?;

        ensure!(
            &header.magic == FILE_MAGIC,
            "invalid magic bytes in index file"
        );

        Ok(header)
    }

    pub fn root(&self) -> u64 {
        self.root.get()
    }

    pub fn set_root(&mut self, root: u64) {
        self.root = U64::new(root);
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// The in-place rewritable prefix of a node record: height and child offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RecordLinks {
    height: U32,
    left: U64,
    right: U64,
}

const _: () = assert!(std::mem::size_of::<RecordLinks>() == RECORD_LINKS_SIZE);

impl RecordLinks {
    pub fn new(height: u32, left: u64, right: u64) -> Self {
        Self {
            height: U32::new(height),
            left: U64::new(left),
            right: U64::new(right),
        }
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }

    pub fn left(&self) -> u64 {
        self.left.get()
    }

    pub fn right(&self) -> u64 {
        self.right.get()
    }
}

/// Full fixed-size record header, as written once at allocation time.
///
/// `RecordLinks` is its leading 20 bytes; the length fields behind it are
/// never rewritten after allocation.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RecordHeader {
    height: U32,
    left: U64,
    right: U64,
    key_len: U32,
    value_len: U32,
}

const _: () = assert!(std::mem::size_of::<RecordHeader>() == RECORD_HEADER_SIZE);
const _: () = assert!(RECORD_LINKS_SIZE + 8 == RECORD_HEADER_SIZE);

impl RecordHeader {
    pub fn new(height: u32, left: u64, right: u64, key_len: u32, value_len: u32) -> Self {
        Self {
            height: U32::new(height),
            left: U64::new(left),
            right: U64::new(right),
            key_len: U32::new(key_len),
            value_len: U32::new(value_len),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= RECORD_HEADER_SIZE,
            "buffer too small for RecordHeader: {} < {}",
            bytes.len(),
            RECORD_HEADER_SIZE
        );

        Self::ref_from_bytes(&bytes[..RECORD_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse RecordHeader: {:?}", e))
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }

    pub fn left(&self) -> u64 {
        self.left.get()
    }

    pub fn right(&self) -> u64 {
        self.right.get()
    }

    pub fn key_len(&self) -> u32 {
        self.key_len.get()
    }

    pub fn value_len(&self) -> u32 {
        self.value_len.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn file_header_round_trips_through_bytes() {
        let mut header = FileHeader::new();
        header.set_root(4096);

        let parsed = FileHeader::from_bytes(header.as_bytes()).unwrap();
        assert_eq!(parsed.root(), 4096);
    }

    #[test]
    fn file_header_rejects_bad_magic() {
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        bytes[..8].copy_from_slice(b"notatree");

        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("invalid magic"));
    }

    #[test]
    fn file_header_rejects_short_buffer() {
        assert!(FileHeader::from_bytes(&[0u8; 4]).is_err());
    }

    #[test]
    fn record_header_round_trips_through_bytes() {
        let header = RecordHeader::new(3, 16, 72, 4, 11);
        let parsed = RecordHeader::from_bytes(header.as_bytes()).unwrap();

        assert_eq!(parsed.height(), 3);
        assert_eq!(parsed.left(), 16);
        assert_eq!(parsed.right(), 72);
        assert_eq!(parsed.key_len(), 4);
        assert_eq!(parsed.value_len(), 11);
    }

    #[test]
    fn record_links_are_the_record_header_prefix() {
        let header = RecordHeader::new(2, 100, 200, 8, 8);
        let links = RecordLinks::new(2, 100, 200);

        assert_eq!(links.as_bytes(), &header.as_bytes()[..RECORD_LINKS_SIZE]);
    }
}
