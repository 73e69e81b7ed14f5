// Decode-time format detection.
//
// Nothing in the output names the codec that produced it, so decoding tries
// an ordered list of probes and keeps the first that succeeds:
//
//   1. chunked container: plausible little-endian chunk count, full decode
//   2. Huffman: JSON code table header terminated by `\n`
//   3. deflate: inflate; an edit script is applied to the
//      previous version when one is available
//
// A probe failure only means "not this format"; it is logged at debug level
// and the next probe runs. When all of them fail the buffer is rejected.
//
// The chunked probe runs first and needs nothing but four bytes of shape, so
// a small binary buffer whose leading u32 happens to be a plausible count is
// tried as a container before anything else. A full decode has to succeed
// for that to be accepted.

use std::fmt;

use crate::chunked;
use crate::deflate::DeflateBackend;
use crate::delta::{self, script};
use crate::error::{CodecError, Result};
use crate::huffman::{self, HuffmanPayload};

/// Probed chunk counts must be below this unless configured otherwise.
pub const DEFAULT_MAX_PROBE_CHUNKS: u32 = 10_000;

/// Format a buffer was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Chunked,
    Huffman,
    /// Deflated edit script applied to the previous version.
    Delta,
    /// Deflated bytes returned as-is.
    Deflate,
}

impl Format {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chunked => "chunked",
            Self::Huffman => "huffman",
            Self::Delta => "delta",
            Self::Deflate => "deflate",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A successfully decoded buffer and the format it was recognised as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub format: Format,
    pub bytes: Vec<u8>,
}

/// Inputs shared by every probe.
pub struct Probe<'a> {
    pub data: &'a [u8],
    pub previous: Option<&'a [u8]>,
    pub max_chunks: u32,
    pub backend: &'a dyn DeflateBackend,
}

type ProbeFn = fn(&Probe<'_>) -> Result<Detected>;

/// Probes in priority order.
const PROBES: [(&str, ProbeFn); 3] = [
    ("chunked", probe_chunked),
    ("huffman", probe_huffman),
    ("deflate", probe_deflate),
];

/// Detect the format of `data` and decode it.
pub fn detect(probe: &Probe<'_>) -> Result<Detected> {
    for (name, run) in PROBES {
        match run(probe) {
            Ok(found) => {
                log::debug!(
                    "detect: {name} probe accepted {} bytes -> {} bytes",
                    probe.data.len(),
                    found.bytes.len()
                );
                return Ok(found);
            }
            Err(e) => log::debug!("detect: {name} probe rejected input: {e}"),
        }
    }
    Err(CodecError::UnrecognizedFormat)
}

fn probe_chunked(probe: &Probe<'_>) -> Result<Detected> {
    let count = chunked::peek_chunk_count(probe.data).ok_or_else(|| {
        CodecError::CorruptContainer("shorter than a chunk count".into())
    })?;

    // Four zero bytes is the container for an empty input.
    if count == 0 && probe.data.len() == chunked::COUNT_LEN {
        return Ok(Detected {
            format: Format::Chunked,
            bytes: Vec::new(),
        });
    }
    if count == 0 || count >= probe.max_chunks {
        return Err(CodecError::CorruptContainer(format!(
            "chunk count {count} outside 1..{}",
            probe.max_chunks
        )));
    }

    Ok(Detected {
        format: Format::Chunked,
        bytes: chunked::decode(probe.data, probe.backend)?,
    })
}

fn probe_huffman(probe: &Probe<'_>) -> Result<Detected> {
    let payload = HuffmanPayload::from_bytes(probe.data)?;
    Ok(Detected {
        format: Format::Huffman,
        bytes: huffman::decode(&payload)?,
    })
}

fn probe_deflate(probe: &Probe<'_>) -> Result<Detected> {
    let inflated = probe.backend.decompress(probe.data)?;
    match (probe.previous, script::from_json(&inflated)) {
        (Some(previous), Ok(ops)) => Ok(Detected {
            format: Format::Delta,
            bytes: delta::apply_delta(previous, &ops),
        }),
        _ => Ok(Detected {
            format: Format::Deflate,
            bytes: inflated,
        }),
    }
}
