// File-level helpers around the engine.
//
// `encode_file()` and `decode_file()` read the input (and the previous
// version, when given) fully into memory, run the engine and write the
// result through a `BufWriter`. With the `file-io` feature a SHA-256 of the
// uncompressed side is computed as the bytes pass through.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::detect::Format;
use crate::engine::Engine;
use crate::error::CodecError;
use crate::huffman::HuffmanTree;
use crate::policy::{Algorithm, ContentCategory};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `encode_file()`.
#[derive(Debug, Clone)]
pub struct EncodeStats {
    /// Input file size in bytes.
    pub input_size: u64,
    /// Encoded output size in bytes.
    pub output_size: u64,
    /// Size of the previous version, if one was supplied.
    pub previous_size: Option<u64>,
    pub category: ContentCategory,
    pub algorithm: Algorithm,
    pub rationale: String,
    /// Huffman tree, when Huffman coding was chosen.
    pub tree: Option<HuffmanTree>,
    /// SHA-256 of the input file (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decode_file()`.
#[derive(Debug, Clone)]
pub struct DecodeStats {
    /// Encoded input size in bytes.
    pub input_size: u64,
    /// Decoded output size in bytes.
    pub output_size: u64,
    pub format: Format,
    /// SHA-256 of the decoded output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// encode_file
// ---------------------------------------------------------------------------

/// Encode `input_path` into `output_path`.
///
/// The category is inferred from the input's extension unless given.
/// `previous_path` names the prior version for delta coding; the same file
/// must be supplied to `decode_file`.
pub fn encode_file(
    engine: &Engine,
    input_path: &Path,
    output_path: &Path,
    category: Option<ContentCategory>,
    previous_path: Option<&Path>,
) -> Result<EncodeStats, IoError> {
    let input = std::fs::read(input_path)?;
    let previous = previous_path.map(std::fs::read).transpose()?;
    let category = category.unwrap_or_else(|| ContentCategory::from_path(input_path));

    #[cfg(feature = "file-io")]
    let input_sha256 = Some(sha2::Sha256::digest(&input).into());
    #[cfg(not(feature = "file-io"))]
    let input_sha256: Option<[u8; 32]> = None;

    let encoded = engine.encode(&input, category, previous.as_deref())?;

    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    writer.write_all(&encoded.bytes)?;
    writer.flush()?;

    Ok(EncodeStats {
        input_size: input.len() as u64,
        output_size: encoded.bytes.len() as u64,
        previous_size: previous.as_ref().map(|p| p.len() as u64),
        category,
        algorithm: encoded.algorithm,
        rationale: encoded.rationale,
        tree: encoded.tree,
        input_sha256,
    })
}

// ---------------------------------------------------------------------------
// decode_file
// ---------------------------------------------------------------------------

/// Decode `input_path` into `output_path`, detecting the codec from the bytes.
pub fn decode_file(
    engine: &Engine,
    input_path: &Path,
    output_path: &Path,
    previous_path: Option<&Path>,
) -> Result<DecodeStats, IoError> {
    let input = std::fs::read(input_path)?;
    let previous = previous_path.map(std::fs::read).transpose()?;

    let decoded = engine.decode(&input, previous.as_deref())?;

    let mut output_writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);

    #[cfg(feature = "file-io")]
    let output_sha256 = {
        let mut output_hasher = sha2::Sha256::new();
        let mut hashing_writer = HashingWriter {
            inner: &mut output_writer,
            hasher: &mut output_hasher,
        };
        hashing_writer.write_all(&decoded.bytes)?;
        Some(output_hasher.finalize().into())
    };
    #[cfg(not(feature = "file-io"))]
    let output_sha256: Option<[u8; 32]> = {
        output_writer.write_all(&decoded.bytes)?;
        None
    };

    output_writer.flush()?;

    Ok(DecodeStats {
        input_size: input.len() as u64,
        output_size: decoded.bytes.len() as u64,
        format: decoded.format,
        output_sha256,
    })
}

/// Lowercase hex rendering of a digest.
pub fn hex(digest: &[u8]) -> String {
    use std::fmt::Write as _;
    digest.iter().fold(String::with_capacity(digest.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
