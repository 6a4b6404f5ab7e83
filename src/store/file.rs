//! # File-Backed Node Store
//!
//! Stores every node as a fixed-header record in a single random-access
//! file. A `NodeId` is the byte offset of the record.
//!
//! ## Access Pattern
//!
//! - `allocate` appends a record at the current end of file, writing the
//!   16-byte file header first if the file is empty. The key and value
//!   regions of a record are written once and never moved or resized.
//! - `persist` rewrites only the 20-byte height/left/right prefix in place.
//! - `load` reads the record header and the key; the value region is skipped.
//! - `read_value` re-reads and re-decodes the value region on every call.
//!   Values are never cached here; callers decide what to retain.
//! - `replace_root` overwrites the root slot in the file header.
//!
//! ## Locking
//!
//! All operations serialize on one `parking_lot::Mutex` around the backing
//! `File`. That rules out torn single-field reads and writes, but provides no
//! cross-record transaction: a reader running concurrently with a builder may
//! observe the gap between two writebacks of one rotation. The builder is
//! single-writer by construction (`&mut self`).
//!
//! ## Failure Model
//!
//! I/O errors surface as `eyre` errors carrying the file path and offset and
//! abort the in-flight operation only. There is no recovery for a rotation
//! interrupted between writebacks; restore the file from a backup.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use eyre::{ensure, Result, WrapErr};
use parking_lot::Mutex;
use zerocopy::little_endian::U64;
use zerocopy::IntoBytes;

use super::headers::{
    FileHeader, RecordHeader, RecordLinks, FILE_HEADER_SIZE, RECORD_HEADER_SIZE, ROOT_SLOT_OFFSET,
};
use super::NodeStore;
use crate::codec::Codec;
use crate::node::{Node, NodeId, Side};

/// Node store backed by a single random-access file.
#[derive(Debug)]
pub struct FileStore<K, V> {
    file: Mutex<File>,
    path: PathBuf,
    _codec: PhantomData<fn() -> (K, V)>,
}

impl<K, V> FileStore<K, V> {
    /// Create a fresh index file, truncating anything already at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create index file '{}'", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            _codec: PhantomData,
        })
    }

    /// Open an index file, creating it if absent.
    ///
    /// A non-empty file must begin with the index magic; anything else is
    /// rejected before any record is touched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open index file '{}'", path.display()))?;

        let store = Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            _codec: PhantomData,
        };

        let mut file = store.file.lock();
        if Self::file_len(&file, &store.path)? > 0 {
            Self::read_file_header(&mut file, &store.path)?;
        }
        drop(file);

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_len(file: &File, path: &Path) -> Result<u64> {
        let metadata = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat index file '{}'", path.display()))?;
        Ok(metadata.len())
    }

    fn read_file_header(file: &mut File, path: &Path) -> Result<FileHeader> {
        file.seek(SeekFrom::Start(0))
            .wrap_err_with(|| format!("failed to seek to header of '{}'", path.display()))?;

        let mut buf = [0u8; FILE_HEADER_SIZE];
        file.read_exact(&mut buf)
            .wrap_err_with(|| format!("failed to read header of '{}'", path.display()))?;

        let header = FileHeader::from_bytes(&buf)
            .wrap_err_with(|| format!("corrupt header in '{}'", path.display()))?;
        Ok(*header)
    }

    fn read_record_header(file: &mut File, id: NodeId, path: &Path) -> Result<RecordHeader> {
        file.seek(SeekFrom::Start(id.raw())).wrap_err_with(|| {
            format!("failed to seek to record {} in '{}'", id.raw(), path.display())
        })?;

        let mut buf = [0u8; RECORD_HEADER_SIZE];
        file.read_exact(&mut buf).wrap_err_with(|| {
            format!(
                "failed to read record header at offset {} in '{}'",
                id.raw(),
                path.display()
            )
        })?;

        let header = RecordHeader::from_bytes(&buf)?;
        Ok(*header)
    }
}

impl<K: Codec, V: Codec> NodeStore for FileStore<K, V> {
    type Key = K;
    type Value = V;

    fn find_root(&self) -> Result<Option<NodeId>> {
        let mut file = self.file.lock();
        if Self::file_len(&file, &self.path)? < FILE_HEADER_SIZE as u64 {
            return Ok(None);
        }

        let header = Self::read_file_header(&mut file, &self.path)?;
        match header.root() {
            0 => Ok(None),
            offset => Ok(Some(NodeId::new(offset))),
        }
    }

    fn replace_root(&mut self, root: NodeId) -> Result<()> {
        let mut file = self.file.lock();
        ensure!(
            Self::file_len(&file, &self.path)? >= FILE_HEADER_SIZE as u64,
            "index file '{}' has no header to update",
            self.path.display()
        );

        file.seek(SeekFrom::Start(ROOT_SLOT_OFFSET)).wrap_err_with(|| {
            format!("failed to seek to root slot of '{}'", self.path.display())
        })?;

        let slot = U64::new(root.raw());
        file.write_all(slot.as_bytes())
            .wrap_err_with(|| format!("failed to rewrite root slot of '{}'", self.path.display()))
    }

    fn allocate(&mut self, key: K, value: V) -> Result<Node<K>> {
        let key_bytes = key.encode();
        let value_bytes = value.encode();
        ensure!(
            key_bytes.len() <= u32::MAX as usize,
            "encoded key of {} bytes exceeds the record limit",
            key_bytes.len()
        );
        ensure!(
            value_bytes.len() <= u32::MAX as usize,
            "encoded value of {} bytes exceeds the record limit",
            value_bytes.len()
        );

        let mut file = self.file.lock();
        let mut offset = file
            .seek(SeekFrom::End(0))
            .wrap_err_with(|| format!("failed to seek to end of '{}'", self.path.display()))?;

        if offset == 0 {
            file.write_all(FileHeader::new().as_bytes())
                .wrap_err_with(|| format!("failed to write header of '{}'", self.path.display()))?;
            offset = FILE_HEADER_SIZE as u64;
        }

        let header = RecordHeader::new(1, 0, 0, key_bytes.len() as u32, value_bytes.len() as u32);
        let mut record = Vec::with_capacity(RECORD_HEADER_SIZE + key_bytes.len() + value_bytes.len());
        record.extend_from_slice(header.as_bytes());
        record.extend_from_slice(&key_bytes);
        record.extend_from_slice(&value_bytes);

        file.write_all(&record).wrap_err_with(|| {
            format!(
                "failed to append record at offset {} in '{}'",
                offset,
                self.path.display()
            )
        })?;

        Ok(Node::new(NodeId::new(offset), key))
    }

    fn load(&self, id: NodeId) -> Result<Node<K>> {
        let mut file = self.file.lock();
        let header = Self::read_record_header(&mut file, id, &self.path)?;

        let mut key_bytes = vec![0u8; header.key_len() as usize];
        file.read_exact(&mut key_bytes).wrap_err_with(|| {
            format!(
                "failed to read key at offset {} in '{}'",
                id.raw(),
                self.path.display()
            )
        })?;
        let key = K::decode(&key_bytes)?;

        let left = match header.left() {
            0 => None,
            offset => Some(NodeId::new(offset)),
        };
        let right = match header.right() {
            0 => None,
            offset => Some(NodeId::new(offset)),
        };

        Ok(Node::with_parts(id, key, header.height(), left, right))
    }

    fn persist(&mut self, node: &Node<K>) -> Result<()> {
        let links = RecordLinks::new(
            node.height(),
            node.child(Side::Left).map_or(0, NodeId::raw),
            node.child(Side::Right).map_or(0, NodeId::raw),
        );

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(node.id().raw())).wrap_err_with(|| {
            format!(
                "failed to seek to record {} in '{}'",
                node.id().raw(),
                self.path.display()
            )
        })?;

        file.write_all(links.as_bytes()).wrap_err_with(|| {
            format!(
                "failed to rewrite record links at offset {} in '{}'",
                node.id().raw(),
                self.path.display()
            )
        })
    }

    fn read_value(&self, id: NodeId) -> Result<V> {
        let mut file = self.file.lock();
        let header = Self::read_record_header(&mut file, id, &self.path)?;

        file.seek(SeekFrom::Current(i64::from(header.key_len())))
            .wrap_err_with(|| {
                format!(
                    "failed to seek past key at offset {} in '{}'",
                    id.raw(),
                    self.path.display()
                )
            })?;

        let mut value_bytes = vec![0u8; header.value_len() as usize];
        file.read_exact(&mut value_bytes).wrap_err_with(|| {
            format!(
                "failed to read value at offset {} in '{}'",
                id.raw(),
                self.path.display()
            )
        })?;

        V::decode(&value_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::super::headers::FILE_MAGIC;
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_store() -> (FileStore<i32, String>, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let store = FileStore::create(file.path()).unwrap();
        (store, file)
    }

    #[test]
    fn first_allocation_writes_the_file_header() {
        let (mut store, file) = temp_store();

        let node = store.allocate(7, "seven".to_string()).unwrap();
        assert_eq!(node.id().raw(), FILE_HEADER_SIZE as u64);

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(&bytes[..8], FILE_MAGIC);
        assert_eq!(&bytes[8..16], &[0u8; 8]);
    }

    #[test]
    fn allocate_then_load_round_trips_the_node() {
        let (mut store, _file) = temp_store();

        let node = store.allocate(413, "Node 413".to_string()).unwrap();
        let loaded = store.load(node.id()).unwrap();

        assert_eq!(*loaded.key(), 413);
        assert_eq!(loaded.height(), 1);
        assert_eq!(loaded.child(Side::Left), None);
        assert_eq!(loaded.child(Side::Right), None);
        assert_eq!(store.read_value(node.id()).unwrap(), "Node 413");
    }

    #[test]
    fn persist_rewrites_links_without_touching_payload() {
        let (mut store, _file) = temp_store();

        let mut parent = store.allocate(10, "ten".to_string()).unwrap();
        let left = store.allocate(5, "five".to_string()).unwrap();
        let right = store.allocate(15, "fifteen".to_string()).unwrap();

        parent.set_child(Side::Left, Some(left.id()));
        parent.set_child(Side::Right, Some(right.id()));
        parent.set_height(2);
        store.persist(&parent).unwrap();

        let reloaded = store.load(parent.id()).unwrap();
        assert_eq!(reloaded.height(), 2);
        assert_eq!(reloaded.child(Side::Left), Some(left.id()));
        assert_eq!(reloaded.child(Side::Right), Some(right.id()));
        assert_eq!(*reloaded.key(), 10);
        assert_eq!(store.read_value(parent.id()).unwrap(), "ten");
    }

    #[test]
    fn replace_root_survives_reopen() {
        let file = NamedTempFile::new().unwrap();

        let mut store = FileStore::<i32, String>::create(file.path()).unwrap();
        let node = store.allocate(1, "one".to_string()).unwrap();
        store.replace_root(node.id()).unwrap();
        drop(store);

        let reopened = FileStore::<i32, String>::open(file.path()).unwrap();
        assert_eq!(reopened.find_root().unwrap(), Some(node.id()));
        assert_eq!(*reopened.load(node.id()).unwrap().key(), 1);
    }

    #[test]
    fn find_root_is_none_for_fresh_or_rootless_files() {
        let (store, _file) = temp_store();
        assert_eq!(store.find_root().unwrap(), None);
    }

    #[test]
    fn open_rejects_foreign_files() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not an index file").unwrap();

        let err = FileStore::<i32, String>::open(file.path()).unwrap_err();
        assert!(err.to_string().contains("corrupt header"));
    }

    #[test]
    fn load_rejects_offsets_past_the_end() {
        let (store, _file) = temp_store();
        assert!(store.load(NodeId::new(4096)).is_err());
    }

    #[test]
    fn read_value_reflects_the_current_file_contents() {
        let (mut store, file) = temp_store();
        let node = store.allocate(1, "AAAA".to_string()).unwrap();

        let mut bytes = std::fs::read(file.path()).unwrap();
        let value_start = bytes.len() - 4;
        bytes[value_start..].copy_from_slice(b"BBBB");
        std::fs::write(file.path(), &bytes).unwrap();

        assert_eq!(store.read_value(node.id()).unwrap(), "BBBB");
    }
}
