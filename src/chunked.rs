// Chunked framing: independently deflated, length-prefixed segments.
//
// Container layout (all integers little-endian):
//
//   u32 chunk_count
//   chunk_count x u32 compressed_len
//   concatenated compressed chunks
//
// There is no overall length field; the container ends where the last
// declared chunk ends, and any other length is rejected.
//
// Chunks are compressed and decompressed independently, so with the
// `parallel` feature both directions fan out across a rayon pool. Results
// are collected in declared order.

use crate::deflate::DeflateBackend;
use crate::error::{CodecError, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default chunk size (512 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Size of the chunk-count field.
pub const COUNT_LEN: usize = 4;

/// Size of one entry in the length table.
pub const LENGTH_ENTRY_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parsed container header: the per-chunk compressed lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub lengths: Vec<u32>,
}

impl ContainerHeader {
    pub fn chunk_count(&self) -> usize {
        self.lengths.len()
    }

    /// Bytes taken by the count field and the length table.
    pub fn header_len(&self) -> usize {
        COUNT_LEN + self.lengths.len() * LENGTH_ENTRY_LEN
    }

    /// Sum of all declared chunk lengths.
    pub fn payload_len(&self) -> u64 {
        self.lengths.iter().map(|&l| l as u64).sum()
    }
}

/// Read the declared chunk count without validating anything else.
pub fn peek_chunk_count(data: &[u8]) -> Option<u32> {
    let bytes: [u8; COUNT_LEN] = data.get(..COUNT_LEN)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Parse and validate the header of a container.
///
/// Fails with `CorruptContainer` if the buffer is shorter than the header,
/// or if the declared lengths do not exactly cover the rest of the buffer.
pub fn parse_header(data: &[u8]) -> Result<ContainerHeader> {
    let count = peek_chunk_count(data).ok_or_else(|| {
        CodecError::CorruptContainer(format!(
            "{} bytes is too short for a chunk count",
            data.len()
        ))
    })? as usize;

    let table_end = count
        .checked_mul(LENGTH_ENTRY_LEN)
        .and_then(|n| n.checked_add(COUNT_LEN))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            CodecError::CorruptContainer(format!(
                "length table for {count} chunks overruns {} byte buffer",
                data.len()
            ))
        })?;

    let lengths: Vec<u32> = data[COUNT_LEN..table_end]
        .chunks_exact(LENGTH_ENTRY_LEN)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let header = ContainerHeader { lengths };
    let remaining = (data.len() - table_end) as u64;
    if header.payload_len() != remaining {
        return Err(CodecError::CorruptContainer(format!(
            "declared chunk lengths sum to {} bytes but {remaining} bytes follow the header",
            header.payload_len()
        )));
    }
    Ok(header)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Split `data` into `chunk_size` pieces, deflate each, and frame them.
///
/// A `chunk_size` of zero is treated as one. Empty input yields a container
/// with zero chunks (a four-byte header).
pub fn encode(data: &[u8], chunk_size: usize, backend: &dyn DeflateBackend) -> Result<Vec<u8>> {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<&[u8]> = data.chunks(chunk_size).collect();
    let count = u32::try_from(chunks.len()).map_err(|_| {
        CodecError::InputTooLarge(format!(
            "{} chunks exceed the u32 chunk count",
            chunks.len()
        ))
    })?;

    #[cfg(feature = "parallel")]
    let compressed: std::io::Result<Vec<Vec<u8>>> =
        chunks.par_iter().map(|c| backend.compress(c)).collect();
    #[cfg(not(feature = "parallel"))]
    let compressed: std::io::Result<Vec<Vec<u8>>> =
        chunks.iter().map(|c| backend.compress(c)).collect();
    let compressed = compressed?;

    let payload_len: usize = compressed.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(COUNT_LEN + compressed.len() * LENGTH_ENTRY_LEN + payload_len);
    out.extend_from_slice(&count.to_le_bytes());
    for chunk in &compressed {
        let len = u32::try_from(chunk.len()).map_err(|_| {
            CodecError::InputTooLarge(format!(
                "compressed chunk of {} bytes exceeds the u32 length field",
                chunk.len()
            ))
        })?;
        out.extend_from_slice(&len.to_le_bytes());
    }
    for chunk in &compressed {
        out.extend_from_slice(chunk);
    }

    log::debug!(
        "chunked: {} bytes -> {} bytes in {count} chunks of <= {chunk_size} ({})",
        data.len(),
        out.len(),
        backend.name()
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Parse a container, inflate every chunk in order and concatenate them.
pub fn decode(data: &[u8], backend: &dyn DeflateBackend) -> Result<Vec<u8>> {
    let header = parse_header(data)?;

    let mut slices = Vec::with_capacity(header.chunk_count());
    let mut offset = header.header_len();
    for &len in &header.lengths {
        let end = offset + len as usize;
        slices.push(&data[offset..end]);
        offset = end;
    }

    #[cfg(feature = "parallel")]
    let inflated: Result<Vec<Vec<u8>>> = slices.par_iter().map(|s| backend.decompress(s)).collect();
    #[cfg(not(feature = "parallel"))]
    let inflated: Result<Vec<Vec<u8>>> = slices.iter().map(|s| backend.decompress(s)).collect();
    let inflated = inflated?;

    log::debug!(
        "chunked: inflated {} chunks ({} bytes)",
        inflated.len(),
        inflated.iter().map(Vec::len).sum::<usize>()
    );
    Ok(inflated.concat())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::ZlibBackend;

    fn zlib() -> ZlibBackend {
        ZlibBackend::default()
    }

    #[test]
    fn empty_input_is_count_only_header() {
        let container = encode(b"", 16, &zlib()).unwrap();
        assert_eq!(container, vec![0, 0, 0, 0]);
        assert!(decode(&container, &zlib()).unwrap().is_empty());
    }

    #[test]
    fn roundtrip_various_chunk_sizes() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 97) as u8).collect();
        for chunk_size in [1, 7, 64, 4096, 9_999, 10_000, 10_001, 1 << 20] {
            let container = encode(&data, chunk_size, &zlib()).unwrap();
            let header = parse_header(&container).unwrap();
            assert_eq!(header.chunk_count(), data.len().div_ceil(chunk_size));
            assert_eq!(decode(&container, &zlib()).unwrap(), data, "chunk_size={chunk_size}");
        }
    }

    #[test]
    fn zero_chunk_size_treated_as_one() {
        let container = encode(b"abc", 0, &zlib()).unwrap();
        assert_eq!(peek_chunk_count(&container), Some(3));
        assert_eq!(decode(&container, &zlib()).unwrap(), b"abc");
    }

    #[test]
    fn header_layout_is_little_endian() {
        let container = encode(&[1u8; 10], 4, &zlib()).unwrap();
        assert_eq!(&container[..4], &3u32.to_le_bytes());
        let header = parse_header(&container).unwrap();
        assert_eq!(header.header_len(), 16);
        assert_eq!(
            header.payload_len() as usize,
            container.len() - header.header_len()
        );
    }

    #[test]
    fn short_buffer_rejected() {
        assert!(matches!(
            decode(&[1, 0], &zlib()),
            Err(CodecError::CorruptContainer(_))
        ));
    }

    #[test]
    fn length_table_overrun_rejected() {
        // Claims 5 chunks but carries only one length entry.
        let data = [5, 0, 0, 0, 1, 0, 0, 0];
        assert!(matches!(
            decode(&data, &zlib()),
            Err(CodecError::CorruptContainer(_))
        ));
    }

    #[test]
    fn payload_overrun_rejected() {
        let mut container = encode(b"hello hello hello", 8, &zlib()).unwrap();
        container.truncate(container.len() - 1);
        assert!(matches!(
            decode(&container, &zlib()),
            Err(CodecError::CorruptContainer(_))
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut container = encode(b"hello", 8, &zlib()).unwrap();
        container.push(0);
        assert!(matches!(
            decode(&container, &zlib()),
            Err(CodecError::CorruptContainer(_))
        ));
    }

    #[test]
    fn corrupt_chunk_is_decompression_failure() {
        let mut container = encode(&[9u8; 100], 50, &zlib()).unwrap();
        let header_len = parse_header(&container).unwrap().header_len();
        container[header_len] ^= 0xFF;
        assert!(matches!(
            decode(&container, &zlib()),
            Err(CodecError::DecompressionFailure(_))
        ));
    }
}
