// Deflate primitive used by the chunked container and the delta wire format.
//
// Provides a pluggable `DeflateBackend` trait with the built-in zlib
// implementation (via flate2). The zlib wrapper makes every stream
// self-describing and checksummed, so corrupt input fails loudly instead of
// inflating to garbage.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{CodecError, Result};

/// Default zlib compression level.
pub const DEFAULT_LEVEL: u32 = 6;

// ---------------------------------------------------------------------------
// DeflateBackend trait
// ---------------------------------------------------------------------------

/// A reversible byte-buffer compressor.
///
/// # Implementing a custom backend
///
/// ```no_run
/// use polypack::deflate::DeflateBackend;
/// use polypack::error::Result;
///
/// struct Identity;
///
/// impl DeflateBackend for Identity {
///     fn name(&self) -> &'static str { "identity" }
///     fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.to_vec())
///     }
///     fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
///         Ok(data.to_vec())
///     }
/// }
/// ```
pub trait DeflateBackend: Send + Sync {
    /// Short name for logs and CLI output.
    fn name(&self) -> &'static str;

    /// Compress a whole buffer.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress a buffer produced by `compress()`.
    ///
    /// Must fail with [`CodecError::DecompressionFailure`] on corrupt input.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Zlib backend
// ---------------------------------------------------------------------------

/// Zlib/Deflate compressor (deflate + zlib header and Adler-32 trailer).
#[derive(Debug, Clone, Copy)]
pub struct ZlibBackend {
    level: Compression,
}

impl ZlibBackend {
    /// Create a zlib backend with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for ZlibBackend {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl DeflateBackend for ZlibBackend {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        // A stream that stops before its Adler-32 trailer is an error, not a
        // short read.
        let mut inflater = Decompress::new(true);
        let mut output = Vec::with_capacity(data.len().saturating_mul(2).max(64));
        loop {
            let consumed = inflater.total_in() as usize;
            let status = inflater
                .decompress_vec(&data[consumed..], &mut output, FlushDecompress::Finish)
                .map_err(|e| CodecError::DecompressionFailure(format!("zlib: {e}")))?;
            match status {
                Status::StreamEnd if inflater.total_in() as usize == data.len() => {
                    return Ok(output);
                }
                Status::StreamEnd => {
                    return Err(CodecError::DecompressionFailure(format!(
                        "zlib: {} trailing bytes after stream end",
                        data.len() - inflater.total_in() as usize
                    )));
                }
                _ if output.len() == output.capacity() => output.reserve(output.len()),
                _ => {
                    return Err(CodecError::DecompressionFailure(
                        "zlib: stream ended before its trailer".into(),
                    ));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Deflate `data` with the default zlib backend.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    Ok(ZlibBackend::default().compress(data)?)
}

/// Inflate `data` with the default zlib backend.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    ZlibBackend::default().decompress(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_compress_decompress_roundtrip() {
        let backend = ZlibBackend::default();
        let data: Vec<u8> = b"Hello, world! This is test data. "
            .iter()
            .copied()
            .cycle()
            .take(1024)
            .collect();
        let compressed = backend.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let decompressed = backend.decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn empty_buffer_roundtrip() {
        let compressed = deflate(b"").unwrap();
        assert!(!compressed.is_empty());
        assert!(inflate(&compressed).unwrap().is_empty());
    }

    #[test]
    fn all_levels_roundtrip() {
        let data = vec![0x5Au8; 4096];
        for level in 0..=9 {
            let backend = ZlibBackend::new(level);
            assert_eq!(backend.level(), level);
            let compressed = backend.compress(&data).unwrap();
            assert_eq!(backend.decompress(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(ZlibBackend::new(42).level(), 9);
    }

    #[test]
    fn garbage_is_decompression_failure() {
        let result = inflate(b"definitely not zlib");
        assert!(matches!(result, Err(CodecError::DecompressionFailure(_))));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        let compressed = deflate(&data).unwrap();
        for cut in [0, 1, 2, compressed.len() / 2, compressed.len() - 1] {
            assert!(
                matches!(
                    inflate(&compressed[..cut]),
                    Err(CodecError::DecompressionFailure(_))
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut compressed = deflate(b"payload").unwrap();
        compressed.push(0);
        assert!(matches!(
            inflate(&compressed),
            Err(CodecError::DecompressionFailure(_))
        ));
    }

    #[test]
    fn large_output_grows_buffer() {
        let data = vec![0u8; 1 << 20];
        let compressed = deflate(&data).unwrap();
        assert!(compressed.len() < 4096);
        assert_eq!(inflate(&compressed).unwrap(), data);
    }

    #[test]
    fn custom_backend() {
        struct Reverse;
        impl DeflateBackend for Reverse {
            fn name(&self) -> &'static str {
                "reverse"
            }
            fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
                Ok(data.iter().rev().copied().collect())
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
                Ok(data.iter().rev().copied().collect())
            }
        }

        let backend = Reverse;
        let compressed = backend.compress(b"hello world").unwrap();
        assert_eq!(backend.decompress(&compressed).unwrap(), b"hello world");
        assert_eq!(backend.name(), "reverse");
    }
}
