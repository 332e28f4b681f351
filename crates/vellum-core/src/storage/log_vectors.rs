//! Log-structured vector storage.
//!
//! Stores vectors in an append-only log file with an in-memory index
//! rebuilt by replay on open. The latest entry for a key wins.
//!
//! # Log Entry Format
//!
//! ```text
//! [marker=1: 1B] [key_len: 4B LE] [len: 4B LE] [crc32: 4B LE] [key: key_len B] [vector: len B]
//! ```
//!
//! The vector is stored as little-endian f32 values. The CRC32 (IEEE 802.3)
//! covers key and vector bytes and is checked on replay and on every read.
//! A torn or corrupt tail found during replay is truncated away.
//!
//! Entries are encoded into one buffer and written with a single
//! `write_all`. A write that fails partway is cut back off the file before
//! the error is returned, so offsets of later entries stay exact.

use super::traits::VectorStore;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Name of the log file inside the store directory.
pub const LOG_FILE_NAME: &str = "vectors.log";

const STORE_MARKER: u8 = 1;
const HEADER_LEN: u64 = 1 + 4 + 4 + 4;

/// Simple CRC32 implementation (IEEE 802.3 polynomial).
#[inline]
#[allow(clippy::cast_possible_truncation)] // Table index always 0-255
fn crc32_hash(parts: &[&[u8]]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for part in parts {
        for &byte in *part {
            let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
            crc = (crc >> 8) ^ CRC32_TABLE[idx];
        }
    }
    !crc
}

/// Appends one encoded entry to `buf` and returns its size in bytes.
fn encode_entry(buf: &mut Vec<u8>, key: &str, vector: &[f32]) -> io::Result<u64> {
    let key_len = u32::try_from(key.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Key too large"))?;
    let payload: Vec<u8> = vector.iter().flat_map(|x| x.to_le_bytes()).collect();
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Vector too large"))?;
    let crc = crc32_hash(&[key.as_bytes(), &payload]);

    buf.push(STORE_MARKER);
    buf.extend_from_slice(&key_len.to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&crc.to_le_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(&payload);

    Ok(HEADER_LEN + u64::from(key_len) + u64::from(len))
}

/// Append side of the log.
pub(super) trait LogWriter: Write + Send + Sync {
    /// Cuts the log back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogWriter for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// A decoded entry: key, vector and encoded size.
type Entry = (String, Vec<f32>, u64);

/// Reads one entry of at most `available` bytes. `Ok(None)` means the entry
/// is torn or corrupt.
fn decode_entry<R: Read>(reader: &mut R, available: u64) -> io::Result<Option<Entry>> {
    let mut header = [0u8; 13];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    if header[0] != STORE_MARKER {
        return Ok(None);
    }

    let key_len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    let len = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);
    let stored_crc = u32::from_le_bytes([header[9], header[10], header[11], header[12]]);
    let size = HEADER_LEN + u64::from(key_len) + u64::from(len);
    if len % 4 != 0 || size > available {
        return Ok(None);
    }

    let mut body = vec![0u8; key_len as usize + len as usize];
    match reader.read_exact(&mut body) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let (key_bytes, payload) = body.split_at(key_len as usize);
    if crc32_hash(&[key_bytes, payload]) != stored_crc {
        return Ok(None);
    }
    let Ok(key) = String::from_utf8(key_bytes.to_vec()) else {
        return Ok(None);
    };

    let vector = payload
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(Some((key, vector, size)))
}

/// Durable vector store backed by an append-only log.
#[allow(clippy::module_name_repetitions)]
pub struct LogVectorStore {
    /// Directory path for storage files
    path: PathBuf,
    /// In-memory index: key -> offset of the entry in the log
    index: FxHashMap<String, u64>,
    /// Log writer (append-only)
    wal: Box<dyn LogWriter>,
    /// Independent file handle for reading, protected for seeking
    reader: Mutex<File>,
    /// Current log length in bytes
    position: u64,
    /// Set when a failed write could not be cut back; the file may hold
    /// stray bytes past `position` until the next `clear` or reopen.
    broken: bool,
}

impl LogVectorStore {
    /// Opens the store in `path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if file operations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        let log_path = path.join(LOG_FILE_NAME);

        let writer_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let file_len = writer_file.metadata()?.len();

        let (index, valid_len) = Self::replay(&log_path, file_len)?;
        if valid_len < file_len {
            tracing::warn!(
                path = %log_path.display(),
                valid_len,
                file_len,
                "Truncating corrupt tail of vector log"
            );
            writer_file.set_len(valid_len)?;
        }

        let reader = File::open(&log_path)?;
        tracing::info!(path = %path.display(), vectors = index.len(), "Vector log opened");

        Ok(Self {
            path,
            index,
            wal: Box::new(writer_file),
            reader: Mutex::new(reader),
            position: valid_len,
            broken: false,
        })
    }

    /// Replays the log, returning the index and the length of the valid prefix.
    fn replay(log_path: &Path, end_pos: u64) -> io::Result<(FxHashMap<String, u64>, u64)> {
        let mut index = FxHashMap::default();
        let mut reader = BufReader::new(File::open(log_path)?);
        let mut pos = 0;

        while pos < end_pos {
            let Some((key, _, size)) = decode_entry(&mut reader, end_pos - pos)? else {
                break;
            };
            index.insert(key, pos);
            pos += size;
        }

        Ok((index, pos))
    }

    /// Directory of this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(super) fn replace_writer(&mut self, writer: Box<dyn LogWriter>) {
        self.wal = writer;
    }

    /// Appends pre-encoded entries with a single write, then indexes them.
    ///
    /// On error nothing is indexed and the file is cut back to `position`.
    fn append(&mut self, buf: &[u8], entries: Vec<(String, u64)>) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::other(format!(
                "Vector log {} has an unrecovered partial write, reopen the store",
                self.path.display()
            )));
        }

        if let Err(e) = self.wal.write_all(buf).and_then(|()| self.wal.flush()) {
            if let Err(rollback) = self.wal.truncate(self.position) {
                tracing::error!(
                    error = %rollback,
                    position = self.position,
                    "Cannot cut failed write off the vector log"
                );
                self.broken = true;
            }
            return Err(e);
        }

        for (key, size) in entries {
            self.index.insert(key, self.position);
            self.position += size;
        }
        Ok(())
    }
}

impl VectorStore for LogVectorStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<f32>>> {
        let Some(&offset) = self.index.get(key) else {
            return Ok(None);
        };

        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(offset))?;
        match decode_entry(&mut *reader, self.position.saturating_sub(offset))? {
            Some((stored_key, vector, _)) if stored_key == key => Ok(Some(vector)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Vector log entry for {key} at offset {offset} is corrupt"),
            )),
        }
    }

    fn put(&mut self, key: &str, vector: &[f32]) -> io::Result<()> {
        let mut buf = Vec::new();
        let size = encode_entry(&mut buf, key, vector)?;
        self.append(&buf, vec![(key.to_string(), size)])
    }

    fn bulk_put(&mut self, entries: &[(&str, &[f32])]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        let mut sizes = Vec::with_capacity(entries.len());
        for (key, vector) in entries {
            let size = encode_entry(&mut buf, key, vector)?;
            sizes.push(((*key).to_string(), size));
        }
        self.append(&buf, sizes)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.wal.truncate(0)?;
        self.index.clear();
        self.position = 0;
        self.broken = false;
        Ok(())
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
