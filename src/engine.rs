// Codec engine: ties the selection policy and format detection to the codecs.
//
// Encoding asks `policy::select` for a codec and runs it; decoding hands the
// buffer to `detect`, which recovers the codec from the bytes alone. The
// previous version is borrowed per call and never stored, so one `Engine`
// can serve any number of threads.

use crate::chunked::{self, DEFAULT_CHUNK_SIZE};
use crate::deflate::{DEFAULT_LEVEL, DeflateBackend, ZlibBackend};
use crate::delta::{self, DEFAULT_MAX_CELLS};
use crate::detect::{self, DEFAULT_MAX_PROBE_CHUNKS, Format, Probe};
use crate::error::{CodecError, Result};
use crate::huffman::{self, HuffmanTree};
use crate::policy::{self, Algorithm, ContentCategory};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for encoding and decoding.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Uncompressed bytes per chunk of a chunked container.
    pub chunk_size: usize,
    /// zlib compression level (0-9).
    pub level: u32,
    /// Ceiling on LCS table cells; larger deltas are Huffman coded instead.
    pub max_delta_cells: usize,
    /// Chunk counts at or above this are not probed as containers. Encoding
    /// raises the chunk size as needed to stay below it.
    pub max_probe_chunks: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            level: DEFAULT_LEVEL,
            max_delta_cells: DEFAULT_MAX_CELLS,
            max_probe_chunks: DEFAULT_MAX_PROBE_CHUNKS,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Output of an encode call.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Codec that actually produced `bytes`.
    pub algorithm: Algorithm,
    pub rationale: String,
    /// Huffman tree, for callers that want to render it.
    pub tree: Option<HuffmanTree>,
}

impl Encoded {
    pub fn label(&self) -> &'static str {
        self.algorithm.label()
    }
}

/// Output of a decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub bytes: Vec<u8>,
    pub format: Format,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    options: EngineOptions,
    backend: Box<dyn DeflateBackend>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let backend = Box::new(ZlibBackend::new(options.level));
        Self { options, backend }
    }

    /// Use a different deflate primitive. Decoding must use the same one.
    pub fn with_backend(options: EngineOptions, backend: Box<dyn DeflateBackend>) -> Self {
        Self { options, backend }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn backend(&self) -> &dyn DeflateBackend {
        self.backend.as_ref()
    }

    /// Pick a codec for `input` and encode it.
    ///
    /// `previous` enables delta coding for mid-sized text; the same buffer
    /// must be passed to [`Engine::decode`] to rebuild the input.
    pub fn encode(
        &self,
        input: &[u8],
        category: ContentCategory,
        previous: Option<&[u8]>,
    ) -> Result<Encoded> {
        let decision = policy::select(category, input.len() as u64, previous.is_some());
        log::debug!("engine: {} ({})", decision.algorithm, decision.rationale);

        let mut rationale = decision.rationale;
        let mut tree = None;
        let delta_bytes = match (decision.algorithm, previous) {
            (Algorithm::Delta, Some(base)) => {
                match delta::encode(base, input, self.options.max_delta_cells, self.backend()) {
                    Ok(bytes) => Some(bytes),
                    Err(CodecError::InputTooLarge(reason)) => {
                        log::warn!("delta coding skipped: {reason}");
                        rationale.push_str("; Huffman coded (delta table over budget)");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            _ => None,
        };

        let (algorithm, bytes) = match (decision.algorithm, delta_bytes) {
            (Algorithm::Delta, Some(bytes)) => (Algorithm::Delta, bytes),
            (Algorithm::Huffman | Algorithm::Delta, _) => {
                let (payload, built) = huffman::encode_with_tree(input)?;
                tree = built;
                (Algorithm::Huffman, payload.to_bytes()?)
            }
            (Algorithm::LossyImage, _) => {
                log::warn!(
                    "lossy image recompression is not available; storing {} bytes chunked",
                    input.len()
                );
                rationale.push_str("; stored chunked (lossy recompression unavailable)");
                (Algorithm::Chunked, self.chunk(input)?)
            }
            (Algorithm::Chunked, _) => (Algorithm::Chunked, self.chunk(input)?),
        };

        log::info!(
            "encoded {} bytes -> {} bytes with {algorithm}",
            input.len(),
            bytes.len()
        );
        Ok(Encoded {
            bytes,
            algorithm,
            rationale,
            tree,
        })
    }

    /// Detect how `data` was encoded and decode it.
    pub fn decode(&self, data: &[u8], previous: Option<&[u8]>) -> Result<Decoded> {
        let found = detect::detect(&Probe {
            data,
            previous,
            max_chunks: self.options.max_probe_chunks,
            backend: self.backend(),
        })?;
        log::info!(
            "decoded {} bytes -> {} bytes as {}",
            data.len(),
            found.bytes.len(),
            found.format
        );
        Ok(Decoded {
            bytes: found.bytes,
            format: found.format,
        })
    }

    /// Chunk `input`, widening chunks so the count stays below the probe
    /// ceiling and the container is detectable again.
    fn chunk(&self, input: &[u8]) -> Result<Vec<u8>> {
        let chunk_size = self.effective_chunk_size(input.len())?;
        chunked::encode(input, chunk_size, self.backend())
    }

    fn effective_chunk_size(&self, len: usize) -> Result<usize> {
        let requested = self.options.chunk_size.max(1);
        if len == 0 {
            return Ok(requested);
        }
        let max_chunks = self.options.max_probe_chunks.saturating_sub(1) as usize;
        if max_chunks == 0 {
            return Err(CodecError::InputTooLarge(format!(
                "a probe ceiling of {} chunks leaves no room for a container",
                self.options.max_probe_chunks
            )));
        }
        let floor = len.div_ceil(max_chunks);
        if floor > requested {
            log::debug!(
                "chunk size raised from {requested} to {floor} to stay under {} chunks",
                self.options.max_probe_chunks
            );
            return Ok(floor);
        }
        Ok(requested)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Convenience
// ---------------------------------------------------------------------------

/// Encode with default options.
pub fn encode(input: &[u8], category: ContentCategory, previous: Option<&[u8]>) -> Result<Encoded> {
    Engine::default().encode(input, category, previous)
}

/// Decode with default options.
pub fn decode(data: &[u8], previous: Option<&[u8]>) -> Result<Decoded> {
    Engine::default().decode(data, previous)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
