//! Journal Writer: append-only store journal with checksums
//!
//! Every change to the store (an author created, a batch of books inserted)
//! is appended as one entry. A batch therefore reaches disk atomically: the
//! reader either sees the whole entry or a truncated tail it discards.
//!
//! # Binary Format (per entry)
//! ```text
//! [body_len:  u32]
//! [sequence:  u64]
//! [timestamp: i64]   // Unix millis
//! [kind_len:  u16][kind: bytes]
//! [payload_len: u32][payload: bytes]
//! [checksum:  u32]   // CRC32C over sequence+timestamp+kind+payload
//! ```

use crc32c::crc32c;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, warn};

const FILE_PREFIX: &str = "journal-";
const FILE_SUFFIX: &str = ".bin";

/// Fixed part of an entry body: seq + ts + kind_len + payload_len + crc.
const FIXED_BODY_LEN: usize = 8 + 8 + 2 + 4 + 4;

/// Bodies larger than this are treated as corruption rather than allocated.
const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Incomplete entry: need {needed} bytes, have {available}")]
    Incomplete { needed: usize, available: usize },

    #[error("Sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },

    #[error("Journal writer disabled after a failed rollback")]
    Poisoned,
}

// ── Journal Entry ───────────────────────────────────────────────────

/// One journaled store change.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Gapless sequence number, starting at 1
    pub sequence: u64,
    /// Unix millis at which the change was written
    pub timestamp: i64,
    /// Change kind, e.g. "AuthorCreated"
    pub kind: String,
    /// Bincode-encoded change
    pub payload: Vec<u8>,
    pub checksum: u32,
}

impl JournalEntry {
    pub fn new(sequence: u64, timestamp: i64, kind: impl Into<String>, payload: Vec<u8>) -> Self {
        let kind = kind.into();
        let checksum = Self::compute_checksum(sequence, timestamp, &kind, &payload);
        Self {
            sequence,
            timestamp,
            kind,
            payload,
            checksum,
        }
    }

    pub fn compute_checksum(sequence: u64, timestamp: i64, kind: &str, payload: &[u8]) -> u32 {
        let mut buf = Vec::with_capacity(16 + kind.len() + payload.len());
        buf.extend_from_slice(&sequence.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.extend_from_slice(kind.as_bytes());
        buf.extend_from_slice(payload);
        crc32c(&buf)
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == Self::compute_checksum(self.sequence, self.timestamp, &self.kind, &self.payload)
    }

    /// Encode to the on-disk frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = FIXED_BODY_LEN + self.kind.len() + self.payload.len();

        let mut buf = Vec::with_capacity(4 + body_len);
        buf.extend_from_slice(&(body_len as u32).to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&(self.kind.len() as u16).to_le_bytes());
        buf.extend_from_slice(self.kind.as_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Decode one frame from the front of `data`.
    ///
    /// Returns the entry and the number of bytes it occupied. The checksum is
    /// not verified here; see [`JournalEntry::verify_checksum`].
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        let mut frame = Frame { data, pos: 0 };

        let body_len = frame.u32()? as usize;
        if body_len > MAX_BODY_LEN {
            return Err(JournalError::Malformed(format!(
                "implausible body length {}",
                body_len
            )));
        }
        if body_len < FIXED_BODY_LEN {
            return Err(JournalError::Malformed(format!(
                "body of {} bytes is shorter than the fixed header",
                body_len
            )));
        }
        let total = 4 + body_len;
        if data.len() < total {
            return Err(JournalError::Incomplete {
                needed: total,
                available: data.len(),
            });
        }

        let entry = Self::decode_body(&data[4..total]).map_err(|e| match e {
            // a complete frame whose fields overrun it is corrupt, not torn
            JournalError::Incomplete { .. } => {
                JournalError::Malformed("entry fields overrun the frame".into())
            }
            other => other,
        })?;
        Ok((entry, total))
    }

    fn decode_body(data: &[u8]) -> Result<Self, JournalError> {
        let mut body = Frame { data, pos: 0 };
        let sequence = body.u64()?;
        let timestamp = body.u64()? as i64;
        let kind_len = body.u16()? as usize;
        let kind = String::from_utf8(body.take(kind_len)?.to_vec())
            .map_err(|e| JournalError::Malformed(e.to_string()))?;
        let payload_len = body.u32()? as usize;
        let payload = body.take(payload_len)?.to_vec();
        let checksum = body.u32()?;

        Ok(Self {
            sequence,
            timestamp,
            kind,
            payload,
            checksum,
        })
    }
}

struct Frame<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Frame<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], JournalError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(JournalError::Incomplete {
                needed: end,
                available: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u16(&mut self) -> Result<u16, JournalError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, JournalError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, JournalError> {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(out))
    }
}

// ── Fsync Policy ────────────────────────────────────────────────────

/// Controls when `fsync` (durable write) is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FsyncPolicy {
    /// Fsync after every entry.
    EveryWrite,
    /// Fsync only on file rotation and explicit `sync`.
    OnRotation,
}

// ── Journal Writer Configuration ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory for journal files.
    pub dir: PathBuf,
    /// Maximum file size in bytes before rotation (default 16 MiB).
    pub max_file_size: u64,
    pub fsync_policy: FsyncPolicy,
}

impl JournalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: 16 * 1024 * 1024,
            fsync_policy: FsyncPolicy::EveryWrite,
        }
    }
}

// ── Journal Writer ──────────────────────────────────────────────────

/// Append-only journal writer with checksums and size-based rotation.
///
/// Each frame goes out in a single `write_all`. A failed append is rolled
/// back by truncating the file to its previous length, so a rejected change
/// never reaches disk. If the rollback itself fails the writer refuses all
/// further appends.
pub struct JournalWriter {
    config: JournalConfig,
    file: File,
    current_file: PathBuf,
    /// Length of the valid prefix of `current_file`
    current_file_size: u64,
    file_index: u64,
    next_sequence: u64,
    poisoned: bool,
    #[cfg(test)]
    short_write: Option<usize>,
}

impl JournalWriter {
    /// Open the journal in `config.dir`, appending to the newest file.
    ///
    /// `next_sequence` is the sequence the next entry must carry, i.e. one
    /// past the last entry replayed from disk.
    pub fn open(config: JournalConfig, next_sequence: u64) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;

        let file_index = journal_files(&config.dir)?
            .last()
            .map(|(index, _)| *index)
            .unwrap_or(0);
        let current_file = journal_path(&config.dir, file_index);
        let file = open_append(&current_file)?;
        let current_file_size = file.metadata()?.len();

        Ok(Self {
            config,
            file,
            current_file,
            current_file_size,
            file_index,
            next_sequence,
            poisoned: false,
            #[cfg(test)]
            short_write: None,
        })
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn current_file_path(&self) -> &Path {
        &self.current_file
    }

    /// Append an entry. The entry must carry the next expected sequence.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        if self.poisoned {
            return Err(JournalError::Poisoned);
        }
        if entry.sequence != self.next_sequence {
            return Err(JournalError::SequenceError {
                expected: self.next_sequence,
                got: entry.sequence,
            });
        }

        if self.current_file_size >= self.config.max_file_size {
            self.rotate()?;
        }

        let bytes = entry.to_bytes();
        if let Err(e) = self.write_frame(&bytes) {
            self.rollback();
            return Err(e.into());
        }

        self.current_file_size += bytes.len() as u64;
        self.next_sequence += 1;
        Ok(())
    }

    /// Build the next entry for `kind`/`payload` and append it.
    pub fn write_change(
        &mut self,
        timestamp: i64,
        kind: &str,
        payload: Vec<u8>,
    ) -> Result<JournalEntry, JournalError> {
        let entry = JournalEntry::new(self.next_sequence, timestamp, kind, payload);
        self.append(&entry)?;
        Ok(entry)
    }

    /// Force fsync.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.file.sync_all()?;
        Ok(())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if let Some(limit) = self.short_write.take() {
            self.file.write_all(&bytes[..limit.min(bytes.len())])?;
            return Err(io::Error::other("short write"));
        }

        self.file.write_all(bytes)?;
        if self.config.fsync_policy == FsyncPolicy::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the current file back to its last complete frame.
    fn rollback(&mut self) {
        let restored = self
            .file
            .set_len(self.current_file_size)
            .and_then(|_| self.file.sync_data());
        match restored {
            Ok(()) => warn!(
                file = %self.current_file.display(),
                len = self.current_file_size,
                "Journal append rolled back"
            ),
            Err(e) => {
                error!(file = %self.current_file.display(), error = %e, "Journal rollback failed");
                self.poisoned = true;
            }
        }
    }

    /// Make the next frame write stop after `limit` bytes and fail.
    #[cfg(test)]
    pub(crate) fn fail_next_write_after(&mut self, limit: usize) {
        self.short_write = Some(limit);
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.sync()?;
        self.file_index += 1;
        self.current_file = journal_path(&self.config.dir, self.file_index);
        self.file = open_append(&self.current_file)?;
        self.current_file_size = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub(crate) fn journal_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{}{:06}{}", FILE_PREFIX, index, FILE_SUFFIX))
}

/// Journal files in `dir`, sorted by index. A missing directory has none.
pub(crate) fn journal_files(dir: &Path) -> Result<Vec<(u64, PathBuf)>, JournalError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<(u64, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let index = name
                .strip_prefix(FILE_PREFIX)?
                .strip_suffix(FILE_SUFFIX)?
                .parse::<u64>()
                .ok()?;
            Some((index, e.path()))
        })
        .collect();
    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

// ── Tests ───────────────────────────────────────────────────────────
