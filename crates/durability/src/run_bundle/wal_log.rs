//! WAL.runlog reader and writer
//!
//! This module handles the binary format for run-scoped WAL entries
//! within a RunBundle archive.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Magic: "STRATA_WAL" (10 bytes)                                  │
//! │ Version: u16 (2 bytes, LE)                                      │
//! │ Entry Count: u32 (4 bytes, LE)                                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Entries (variable)                                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ For each entry:                                                 │
//! │   Length: u32 (4 bytes, LE)                                     │
//! │   Data: [u8; length] (bincode-serialized WALEntry)              │
//! │   CRC32: u32 (4 bytes, LE)                                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use crate::run_bundle::error::{RunBundleError, RunBundleResult};
use crate::run_bundle::types::{xxh3_hex, WAL_RUNLOG_MAGIC, WAL_RUNLOG_VERSION};
use crate::wal::WALEntry;
use strata_core::types::RunId;
use std::io::{Read, Write};

/// Header size in bytes: magic (10) + version (2) + count (4)
const HEADER_SIZE: usize = 16;

// =============================================================================
// WAL Filtering
// =============================================================================

/// Filter WAL entries to only include those belonging to a specific run
///
/// This filters out:
/// - Checkpoint entries (they don't belong to any single run)
/// - Entries belonging to other runs
pub fn filter_wal_for_run(entries: &[WALEntry], run_id: &RunId) -> Vec<WALEntry> {
    entries
        .iter()
        .filter(|entry| entry.run_id() == Some(*run_id))
        .cloned()
        .collect()
}

// =============================================================================
// Writer
// =============================================================================

/// Information about written WAL log
#[derive(Debug, Clone)]
pub struct WalLogInfo {
    /// Number of entries written
    pub entry_count: u64,
    /// Total bytes written (including header and per-entry overhead)
    pub bytes_written: u64,
    /// xxh3 checksum of the entire file content
    pub checksum: String,
}

/// Writer for WAL.runlog format
pub struct WalLogWriter;

impl WalLogWriter {
    /// Write WAL entries to a writer in .runlog format
    ///
    /// Returns information about the written data including checksum.
    pub fn write<W: Write>(entries: &[WALEntry], mut writer: W) -> RunBundleResult<WalLogInfo> {
        let mut buffer = Vec::new();

        // Write header
        buffer.extend_from_slice(WAL_RUNLOG_MAGIC);
        buffer.extend_from_slice(&WAL_RUNLOG_VERSION.to_le_bytes());
        buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());

        // Write entries
        for entry in entries {
            // Serialize entry with bincode
            let entry_data = bincode::serialize(entry)
                .map_err(|e| RunBundleError::serialization(format!("bincode encode: {}", e)))?;

            // Calculate CRC32 of entry data
            let crc = crc32fast::hash(&entry_data);

            // Write: length + data + crc
            buffer.extend_from_slice(&(entry_data.len() as u32).to_le_bytes());
            buffer.extend_from_slice(&entry_data);
            buffer.extend_from_slice(&crc.to_le_bytes());
        }

        // Calculate checksum of entire buffer
        let checksum = xxh3_hex(&buffer);

        // Write to output
        let bytes_written = buffer.len() as u64;
        writer
            .write_all(&buffer)
            .map_err(RunBundleError::from)?;

        Ok(WalLogInfo {
            entry_count: entries.len() as u64,
            bytes_written,
            checksum,
        })
    }

    /// Write WAL entries to a Vec<u8>
    ///
    /// Convenience method for testing and in-memory operations.
    pub fn write_to_vec(entries: &[WALEntry]) -> RunBundleResult<(Vec<u8>, WalLogInfo)> {
        let mut buffer = Vec::new();
        let info = Self::write(entries, &mut buffer)?;
        Ok((buffer, info))
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Reader for WAL.runlog format
pub struct WalLogReader;

impl WalLogReader {
    /// Read all WAL entries from a reader
    ///
    /// Validates the header and CRC32 of each entry.
    pub fn read<R: Read>(mut reader: R) -> RunBundleResult<Vec<WALEntry>> {
        // Read header
        let mut header = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|e| RunBundleError::invalid_bundle(format!("failed to read header: {}", e)))?;

        // Validate magic
        if &header[0..10] != WAL_RUNLOG_MAGIC {
            return Err(RunBundleError::invalid_bundle(format!(
                "invalid magic: expected {:?}, got {:?}",
                WAL_RUNLOG_MAGIC,
                &header[0..10]
            )));
        }

        // Parse version
        let version = u16::from_le_bytes([header[10], header[11]]);
        if version != WAL_RUNLOG_VERSION {
            return Err(RunBundleError::UnsupportedVersion {
                version: version as u32,
            });
        }

        // Parse entry count
        let entry_count = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        // Read entries
        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count {
            // Read length
            let mut len_bytes = [0u8; 4];
            reader.read_exact(&mut len_bytes).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read length: {}", e),
                }
            })?;
            let len = u32::from_le_bytes(len_bytes) as usize;

            // Sanity check on length
            if len > 100 * 1024 * 1024 {
                // 100MB max per entry
                return Err(RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("entry length {} exceeds maximum", len),
                });
            }

            // Read entry data
            let mut data = vec![0u8; len];
            reader.read_exact(&mut data).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read data: {}", e),
                }
            })?;

            // Read and verify CRC32
            let mut crc_bytes = [0u8; 4];
            reader.read_exact(&mut crc_bytes).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read crc: {}", e),
                }
            })?;
            let expected_crc = u32::from_le_bytes(crc_bytes);
            let actual_crc = crc32fast::hash(&data);

            if expected_crc != actual_crc {
                return Err(RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!(
                        "CRC mismatch: expected {:08x}, got {:08x}",
                        expected_crc, actual_crc
                    ),
                });
            }

            // Deserialize entry
            let entry: WALEntry = bincode::deserialize(&data).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("bincode decode: {}", e),
                }
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read WAL entries from a byte slice
    ///
    /// Convenience method for testing and in-memory operations.
    pub fn read_from_slice(data: &[u8]) -> RunBundleResult<Vec<WALEntry>> {
        Self::read(std::io::Cursor::new(data))
    }

    /// Validate a WAL.runlog without fully parsing entries
    ///
    /// Checks header and entry CRCs without deserializing entry contents.
    /// Returns the entry count if valid.
    pub fn validate<R: Read>(mut reader: R) -> RunBundleResult<u32> {
        // Read header
        let mut header = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|e| RunBundleError::invalid_bundle(format!("failed to read header: {}", e)))?;

        // Validate magic
        if &header[0..10] != WAL_RUNLOG_MAGIC {
            return Err(RunBundleError::invalid_bundle("invalid magic"));
        }

        // Parse version
        let version = u16::from_le_bytes([header[10], header[11]]);
        if version != WAL_RUNLOG_VERSION {
            return Err(RunBundleError::UnsupportedVersion {
                version: version as u32,
            });
        }

        // Parse entry count
        let entry_count = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        // Validate each entry's CRC without deserializing
        for i in 0..entry_count {
            // Read length
            let mut len_bytes = [0u8; 4];
            reader.read_exact(&mut len_bytes).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read length: {}", e),
                }
            })?;
            let len = u32::from_le_bytes(len_bytes) as usize;

            // Sanity check
            if len > 100 * 1024 * 1024 {
                return Err(RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("entry length {} exceeds maximum", len),
                });
            }

            // Read entry data
            let mut data = vec![0u8; len];
            reader.read_exact(&mut data).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read data: {}", e),
                }
            })?;

            // Read and verify CRC32
            let mut crc_bytes = [0u8; 4];
            reader.read_exact(&mut crc_bytes).map_err(|e| {
                RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!("failed to read crc: {}", e),
                }
            })?;
            let expected_crc = u32::from_le_bytes(crc_bytes);
            let actual_crc = crc32fast::hash(&data);

            if expected_crc != actual_crc {
                return Err(RunBundleError::InvalidWalEntry {
                    index: i as usize,
                    reason: format!(
                        "CRC mismatch: expected {:08x}, got {:08x}",
                        expected_crc, actual_crc
                    ),
                });
            }
        }

        Ok(entry_count)
    }

    /// Get header info without reading entries
    ///
    /// Returns (version, entry_count) if header is valid.
    pub fn read_header<R: Read>(mut reader: R) -> RunBundleResult<(u16, u32)> {
        let mut header = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut header)
            .map_err(|e| RunBundleError::invalid_bundle(format!("failed to read header: {}", e)))?;

        // Validate magic
        if &header[0..10] != WAL_RUNLOG_MAGIC {
            return Err(RunBundleError::invalid_bundle("invalid magic"));
        }

        let version = u16::from_le_bytes([header[10], header[11]]);
        let entry_count = u32::from_le_bytes([header[12], header[13], header[14], header[15]]);

        Ok((version, entry_count))
    }
}

// =============================================================================
// Streaming Reader (for large files)
// =============================================================================

/// Iterator over WAL entries for streaming reads
pub struct WalLogIterator<R: Read> {
    reader: R,
    remaining: u32,
    index: usize,
}

impl<R: Read> WalLogIterator<R> {
    /// Create a new iterator from a reader
    ///
    /// Reads and validates the header, then returns an iterator over entries.
    pub fn new(mut reader: R) -> RunBundleResult<Self> {
        let (version, entry_count) = WalLogReader::read_header(&mut reader)?;

        if version != WAL_RUNLOG_VERSION {
            return Err(RunBundleError::UnsupportedVersion {
                version: version as u32,
            });
        }

        Ok(Self {
            reader,
            remaining: entry_count,
            index: 0,
        })
    }

    /// Get the total number of entries
    pub fn entry_count(&self) -> u32 {
        self.remaining + self.index as u32
    }
}

impl<R: Read> Iterator for WalLogIterator<R> {
    type Item = RunBundleResult<WALEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let result = read_single_entry(&mut self.reader, self.index);
        self.remaining -= 1;
        self.index += 1;

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

/// Read a single entry from a reader
fn read_single_entry<R: Read>(reader: &mut R, index: usize) -> RunBundleResult<WALEntry> {
    // Read length
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).map_err(|e| {
        RunBundleError::InvalidWalEntry {
            index,
            reason: format!("failed to read length: {}", e),
        }
    })?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    // Sanity check
    if len > 100 * 1024 * 1024 {
        return Err(RunBundleError::InvalidWalEntry {
            index,
            reason: format!("entry length {} exceeds maximum", len),
        });
    }

    // Read data
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).map_err(|e| {
        RunBundleError::InvalidWalEntry {
            index,
            reason: format!("failed to read data: {}", e),
        }
    })?;

    // Read and verify CRC
    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes).map_err(|e| {
        RunBundleError::InvalidWalEntry {
            index,
            reason: format!("failed to read crc: {}", e),
        }
    })?;
    let expected_crc = u32::from_le_bytes(crc_bytes);
    let actual_crc = crc32fast::hash(&data);

    if expected_crc != actual_crc {
        return Err(RunBundleError::InvalidWalEntry {
            index,
            reason: format!(
                "CRC mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            ),
        });
    }

    // Deserialize
    bincode::deserialize(&data).map_err(|e| RunBundleError::InvalidWalEntry {
        index,
        reason: format!("bincode decode: {}", e),
    })
}
