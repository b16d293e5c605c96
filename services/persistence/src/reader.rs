//! Journal Reader: sequential replay with corruption detection
//!
//! - CRC32C checksum validation on every entry
//! - Gapless sequence validation across files
//! - A truncated final entry (crash mid-write) is discarded, not an error
//! - Damage anywhere else stops the replay with the byte offset

use crate::journal::{journal_files, JournalEntry, JournalError};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch at byte offset {offset} of {file}: entry seq={sequence}")]
    ChecksumMismatch {
        file: String,
        offset: u64,
        sequence: u64,
    },

    #[error("Corruption at byte offset {offset} of {file}: {detail}")]
    Corruption {
        file: String,
        offset: u64,
        detail: String,
    },

    #[error("Sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },
}

/// Partial entry left at the end of the newest file by an interrupted write.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedTail {
    pub file: PathBuf,
    /// Length of the valid prefix.
    pub valid_len: u64,
    pub dropped: usize,
}

/// Outcome of reading a journal directory.
#[derive(Debug, Default)]
pub struct Replay {
    /// Valid entries in sequence order.
    pub entries: Vec<JournalEntry>,
    pub truncated_tail: Option<TruncatedTail>,
}

impl Replay {
    /// Sequence the next appended entry must carry.
    pub fn next_sequence(&self) -> u64 {
        self.entries.last().map(|e| e.sequence + 1).unwrap_or(1)
    }

    /// Cut a truncated tail off so new entries are not appended after it.
    pub fn repair_tail(&self) -> Result<(), ReaderError> {
        if let Some(tail) = &self.truncated_tail {
            let file = OpenOptions::new().write(true).open(&tail.file)?;
            file.set_len(tail.valid_len)?;
            file.sync_all()?;
            warn!(file = %tail.file.display(), dropped = tail.dropped, "Journal tail repaired");
        }
        Ok(())
    }
}

/// Read every entry in `dir`, validating checksums and sequence continuity.
pub fn read_journal(dir: &Path) -> Result<Replay, ReaderError> {
    let files = journal_files(dir)?;
    let mut replay = Replay::default();
    let mut expected = 1u64;

    for (position, (_, path)) in files.iter().enumerate() {
        let is_newest = position + 1 == files.len();
        let file = path.display().to_string();
        let data = fs::read(path)?;
        let mut offset = 0usize;

        while offset < data.len() {
            let (entry, consumed) = match JournalEntry::from_bytes(&data[offset..]) {
                Ok(decoded) => decoded,
                Err(JournalError::Incomplete { .. }) if is_newest => {
                    let dropped = data.len() - offset;
                    warn!(file = %file, offset, dropped, "Discarding truncated journal tail");
                    replay.truncated_tail = Some(TruncatedTail {
                        file: path.clone(),
                        valid_len: offset as u64,
                        dropped,
                    });
                    break;
                }
                Err(e) => {
                    return Err(ReaderError::Corruption {
                        file,
                        offset: offset as u64,
                        detail: e.to_string(),
                    });
                }
            };

            if !entry.verify_checksum() {
                return Err(ReaderError::ChecksumMismatch {
                    file,
                    offset: offset as u64,
                    sequence: entry.sequence,
                });
            }
            if entry.sequence != expected {
                return Err(ReaderError::SequenceGap {
                    expected,
                    got: entry.sequence,
                });
            }

            expected += 1;
            offset += consumed;
            replay.entries.push(entry);
        }
    }

    Ok(replay)
}

// ── Tests ───────────────────────────────────────────────────────────
