//! Bounded binary file reading.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::BITS_PER_BYTE;

/// Raw bytes taken from the start of a file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("byte limit must be greater than zero")]
    InvalidLimit,
}

impl ByteBuffer {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn bit_count(&self) -> usize {
        self.bytes.len() * BITS_PER_BYTE
    }

    /// All bytes as `0`/`1` characters, MSB first.
    #[must_use]
    pub fn bit_string(&self) -> String {
        let mut out = String::with_capacity(self.bit_count());
        for byte in &self.bytes {
            out.push_str(&format!("{byte:08b}"));
        }
        out
    }

    /// The first `max_bits` characters of [`Self::bit_string`].
    #[must_use]
    pub fn bit_preview(&self, max_bits: usize) -> String {
        let needed = max_bits.div_ceil(BITS_PER_BYTE).min(self.bytes.len());
        let mut bits = Self::new(self.bytes[..needed].to_vec()).bit_string();
        bits.truncate(max_bits);
        bits
    }
}

/// Read at most `max_bytes` bytes from the start of `path`.
///
/// Shorter files yield fewer bytes; the file is never modified and the handle
/// is closed before returning.
pub fn read_prefix(path: impl AsRef<Path>, max_bytes: usize) -> Result<ByteBuffer, ReadError> {
    if max_bytes == 0 {
        return Err(ReadError::InvalidLimit);
    }
    let path = path.as_ref();
    let io_err = |source: std::io::Error| ReadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ReadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => io_err(e),
    })?;

    let mut bytes = Vec::with_capacity(max_bytes.min(64 * 1024));
    file.take(max_bytes as u64)
        .read_to_end(&mut bytes)
        .map_err(io_err)?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), max_bytes, "read file prefix");
    Ok(ByteBuffer::new(bytes))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{ByteBuffer, ReadError, read_prefix};

    fn tmp_file(name: &str, contents: &[u8]) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let p = std::env::temp_dir().join(format!("bitmorse-reader-{name}-{nanos}"));
        std::fs::write(&p, contents).expect("write fixture");
        p
    }

    #[test]
    fn reads_whole_file_when_shorter_than_limit() {
        let p = tmp_file("short", &[1, 2, 3]);
        let buf = read_prefix(&p, 50).expect("read");
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
        std::fs::remove_file(p).expect("cleanup");
    }

    #[test]
    fn stops_at_limit() {
        let data: Vec<u8> = (0..=255).collect();
        let p = tmp_file("long", &data);
        let buf = read_prefix(&p, 10).expect("read");
        assert_eq!(buf.as_bytes(), &data[..10]);
        std::fs::remove_file(p).expect("cleanup");
    }

    #[test]
    fn empty_file_reads_nothing() {
        let p = tmp_file("empty", &[]);
        let buf = read_prefix(&p, 8).expect("read");
        assert!(buf.is_empty());
        assert_eq!(buf.bit_string(), "");
        std::fs::remove_file(p).expect("cleanup");
    }

    #[test]
    fn missing_file_is_not_found() {
        let p = std::env::temp_dir().join("bitmorse-reader-does-not-exist.bin");
        let err = read_prefix(&p, 8).expect_err("missing file");
        assert!(matches!(err, ReadError::NotFound { path } if path == p));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = read_prefix("anything", 0).expect_err("zero limit");
        assert!(matches!(err, ReadError::InvalidLimit));
    }

    #[test]
    fn bit_preview_is_msb_first_and_clipped() {
        let buf = ByteBuffer::new(vec![0xA5, 0x01, 0xFF]);
        assert_eq!(buf.bit_string(), "101001010000000111111111");
        assert_eq!(buf.bit_preview(10), "1010010100");
        assert_eq!(buf.bit_preview(64), buf.bit_string());
        assert_eq!(buf.bit_count(), 24);
    }
}
