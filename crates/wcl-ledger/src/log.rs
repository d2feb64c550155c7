//! # Block Logs
//!
//! Persistence backends beneath the Chain Store. A [`BlockLog`] only moves
//! blocks to and from durable storage; it never checks chain invariants.
//!
//! ## JSON-lines layout
//!
//! [`JsonlLog`] keeps one block per line in `<data_dir>/chain.jsonl`, in
//! chain order. Every append writes the full record plus its newline and
//! calls `sync_data` before returning. A record is acknowledged only after
//! that sync, so bytes after the last newline on open belong to a write
//! that never returned and are truncated away.
//!
//! A complete line that does not decode into a block is not a storage
//! failure. Loading stops there and hands back the decodable prefix plus an
//! [`UnreadableRecord`], which the Chain Store reports through verification.
//!
//! The file is held under an exclusive advisory lock for as long as the
//! [`JsonlLog`] lives, so a second process opening the same data directory
//! fails with [`StorageError::Locked`] instead of interleaving appends.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::block::Block;
use crate::error::StorageError;

/// A persisted record that could not be decoded into a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableRecord {
    /// Chain position the record occupies.
    pub position: u64,
    /// 1-based line number in the backing file.
    pub line: usize,
    /// Decoder message.
    pub reason: String,
}

/// What a [`BlockLog`] holds: the decodable prefix, and the record that
/// ended it when loading stopped early.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedChain {
    /// Blocks decoded in order, up to the first unreadable record.
    pub blocks: Vec<Block>,
    /// The first record that failed to decode.
    pub unreadable: Option<UnreadableRecord>,
}

impl LoadedChain {
    /// A fully decoded chain.
    pub fn intact(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            unreadable: None,
        }
    }
}

/// A durable, append-only sequence of blocks.
pub trait BlockLog: Send + fmt::Debug {
    /// Read every persisted block in order.
    fn load(&mut self) -> Result<LoadedChain, StorageError>;

    /// Durably persist one block after the current end.
    ///
    /// On error nothing is persisted.
    fn append(&mut self, block: &Block) -> Result<(), StorageError>;

    /// Remove every persisted block.
    fn purge(&mut self) -> Result<(), StorageError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Volatile backend for tests and embedded use.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    blocks: Vec<Block>,
}

impl MemoryLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A log pre-populated with `blocks`, unchecked.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}

impl BlockLog for MemoryLog {
    fn load(&mut self) -> Result<LoadedChain, StorageError> {
        Ok(LoadedChain::intact(self.blocks.clone()))
    }

    fn append(&mut self, block: &Block) -> Result<(), StorageError> {
        self.blocks.push(block.clone());
        Ok(())
    }

    fn purge(&mut self) -> Result<(), StorageError> {
        self.blocks.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// File-backed JSON-lines log.
#[derive(Debug)]
pub struct JsonlLog {
    path: PathBuf,
    file: File,
}

impl JsonlLog {
    /// File name used inside a data directory.
    pub const FILE_NAME: &'static str = "chain.jsonl";

    /// Open (creating if needed) the log at `path` and lock it.
    ///
    /// Fails with [`StorageError::Locked`] while another log holds the file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(StorageError::Locked { path });
            }
            return Err(StorageError::io(&path, e));
        }
        Ok(Self { path, file })
    }

    /// Open the log inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open(data_dir.as_ref().join(Self::FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn truncate_to(&self, len: u64) -> Result<(), StorageError> {
        self.file
            .set_len(len)
            .and_then(|()| self.file.sync_all())
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

impl BlockLog for JsonlLog {
    fn load(&mut self) -> Result<LoadedChain, StorageError> {
        let mut bytes = Vec::new();
        let mut reader = &self.file;
        reader
            .seek(SeekFrom::Start(0))
            .and_then(|_| reader.read_to_end(&mut bytes))
            .map_err(|e| StorageError::io(&self.path, e))?;

        let complete = match bytes.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => 0,
        };
        if complete < bytes.len() {
            tracing::warn!(
                path = %self.path.display(),
                discarded_bytes = bytes.len() - complete,
                "discarding torn trailing record"
            );
            self.truncate_to(complete as u64)?;
        }

        let mut blocks = Vec::new();
        for (i, line) in bytes[..complete].split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Block>(line) {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    let unreadable = UnreadableRecord {
                        position: blocks.len() as u64,
                        line: i + 1,
                        reason: e.to_string(),
                    };
                    tracing::error!(
                        path = %self.path.display(),
                        line = unreadable.line,
                        reason = %unreadable.reason,
                        "unreadable record; loading stopped"
                    );
                    return Ok(LoadedChain {
                        blocks,
                        unreadable: Some(unreadable),
                    });
                }
            }
        }
        Ok(LoadedChain::intact(blocks))
    }

    fn append(&mut self, block: &Block) -> Result<(), StorageError> {
        let mut record = serde_json::to_vec(block).map_err(|source| StorageError::Encode {
            index: block.index,
            source,
        })?;
        record.push(b'\n');

        let before = self
            .file
            .metadata()
            .map_err(|e| StorageError::io(&self.path, e))?
            .len();

        let written = self
            .file
            .write_all(&record)
            .and_then(|()| self.file.sync_data());
        if let Err(e) = written {
            if let Err(rollback) = self.truncate_to(before) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "failed to roll back partial append"
                );
            }
            return Err(StorageError::io(&self.path, e));
        }
        Ok(())
    }

    fn purge(&mut self) -> Result<(), StorageError> {
        self.truncate_to(0)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
