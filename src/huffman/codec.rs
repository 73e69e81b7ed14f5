// Huffman encode/decode and the payload wire format.
//
// Wire layout:
//
//   {"codes":{"97":"0","98":"10",...},"padding":3}\n<packed bits>
//
// The header is compact JSON (never contains a raw newline), keys are decimal
// byte values and codes are `0`/`1` text. A single `\n` separates it from the
// bit-packed body; the padding count lives in the header.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::{CodecError, Result};

use super::table::{Code, CodeTable};
use super::tree::{FrequencyTable, HuffmanTree};

/// Separator between the JSON header and the packed body.
pub const HEADER_SEPARATOR: u8 = b'\n';

/// Longest header the parser will scan for a separator.
///
/// A full 256-symbol table with 64-bit codes stays below 20 KiB.
pub const MAX_HEADER_LEN: usize = 32 * 1024;

/// A self-contained Huffman payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuffmanPayload {
    /// Bit-packed code stream.
    pub bytes: Vec<u8>,
    /// Code table used to produce `bytes`.
    pub table: CodeTable,
    /// Zero bits appended to the final byte (0-7).
    pub padding: u8,
}

#[derive(Serialize, Deserialize)]
struct WireHeader {
    codes: BTreeMap<u8, String>,
    padding: u8,
}

impl HuffmanPayload {
    /// Serialize to the wire layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = WireHeader {
            codes: self.table.iter().map(|(s, c)| (s, c.to_string())).collect(),
            padding: self.padding,
        };
        let mut out = serde_json::to_vec(&header)
            .map_err(|e| CodecError::MalformedTable(format!("header serialization: {e}")))?;
        out.reserve(1 + self.bytes.len());
        out.push(HEADER_SEPARATOR);
        out.extend_from_slice(&self.bytes);
        Ok(out)
    }

    /// Parse the wire layout. The table is validated but not inverted.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let scan = &data[..data.len().min(MAX_HEADER_LEN)];
        let split = scan
            .iter()
            .position(|&b| b == HEADER_SEPARATOR)
            .ok_or_else(|| {
                CodecError::MalformedTable(format!(
                    "no header separator in the first {} bytes",
                    scan.len()
                ))
            })?;

        let header: WireHeader = serde_json::from_slice(&data[..split])
            .map_err(|e| CodecError::MalformedTable(format!("header: {e}")))?;

        let table = header
            .codes
            .iter()
            .map(|(&symbol, text)| -> Result<(u8, Code)> { Ok((symbol, Code::parse(text)?)) })
            .collect::<Result<CodeTable>>()?;

        Ok(Self {
            bytes: data[split + 1..].to_vec(),
            table,
            padding: header.padding,
        })
    }
}

/// Huffman-encode `data`.
pub fn encode(data: &[u8]) -> Result<HuffmanPayload> {
    encode_with_tree(data).map(|(payload, _)| payload)
}

/// Huffman-encode `data`, also returning the tree for visualization.
///
/// Empty input produces an empty payload and no tree.
pub fn encode_with_tree(data: &[u8]) -> Result<(HuffmanPayload, Option<HuffmanTree>)> {
    let freqs = FrequencyTable::from_bytes(data);
    let Some(tree) = HuffmanTree::build(&freqs) else {
        return Ok((HuffmanPayload::default(), None));
    };
    let table = CodeTable::from_tree(&tree)?;

    let bit_len = table.encoded_bits(data).unwrap_or(0);
    let mut writer = BitWriter::with_capacity(bit_len);
    for &b in data {
        let code = table.get(b).ok_or_else(|| {
            CodecError::MalformedTable(format!("symbol {b} missing from its own table"))
        })?;
        writer.push_bits(code.bits(), code.len());
    }
    let (bytes, padding) = writer.finish();

    log::debug!(
        "huffman: {} bytes -> {} bytes ({} symbols, {} padding bits)",
        data.len(),
        bytes.len(),
        table.len(),
        padding
    );

    Ok((
        HuffmanPayload {
            bytes,
            table,
            padding,
        },
        Some(tree),
    ))
}

/// Decode a payload by greedy prefix matching against its table.
pub fn decode(payload: &HuffmanPayload) -> Result<Vec<u8>> {
    let lookup = payload.table.invert()?;
    let max_len = payload.table.max_len();
    let reader = BitReader::new(&payload.bytes, payload.padding)?;

    let mut out = Vec::with_capacity(reader.len() / max_len.max(1) as usize);
    let mut prefix = Code::EMPTY;
    for bit in reader {
        prefix = match prefix.push(bit) {
            Some(p) if p.len() <= max_len => p,
            _ => {
                return Err(CodecError::TruncatedStream(format!(
                    "{}-bit prefix matches no code (longest code is {max_len} bits)",
                    prefix.len() + 1
                )));
            }
        };
        if let Some(&symbol) = lookup.get(&prefix) {
            out.push(symbol);
            prefix = Code::EMPTY;
        }
    }

    if !prefix.is_empty() {
        return Err(CodecError::TruncatedStream(format!(
            "stream ends inside a code (dangling prefix {prefix})"
        )));
    }
    Ok(out)
}

/// Encode straight to the wire layout.
pub fn encode_to_bytes(data: &[u8]) -> Result<Vec<u8>> {
    encode(data)?.to_bytes()
}

/// Decode straight from the wire layout.
pub fn decode_from_bytes(data: &[u8]) -> Result<Vec<u8>> {
    decode(&HuffmanPayload::from_bytes(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_small_text() {
        let data = b"aaaabbbccd";
        let payload = encode(data).unwrap();
        assert_eq!(decode(&payload).unwrap(), data);
        // 19 bits of codes -> 3 bytes with 5 padding bits.
        assert_eq!(payload.bytes.len(), 3);
        assert_eq!(payload.padding, 5);
    }

    #[test]
    fn empty_input() {
        let (payload, tree) = encode_with_tree(b"").unwrap();
        assert!(tree.is_none());
        assert!(payload.bytes.is_empty());
        assert!(payload.table.is_empty());
        assert_eq!(payload.padding, 0);
        assert!(decode(&payload).unwrap().is_empty());
    }

    #[test]
    fn single_distinct_symbol() {
        let data = vec![b'x'; 13];
        let payload = encode(&data).unwrap();
        assert_eq!(payload.bytes, vec![0, 0]);
        assert_eq!(payload.padding, 3);
        assert_eq!(decode(&payload).unwrap(), data);
    }

    #[test]
    fn all_byte_values() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        let payload = encode(&data).unwrap();
        assert_eq!(payload.table.len(), 256);
        assert_eq!(decode(&payload).unwrap(), data);
    }

    #[test]
    fn wire_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog\n\n";
        let wire = encode_to_bytes(data).unwrap();
        assert_eq!(wire[0], b'{');
        assert_eq!(decode_from_bytes(&wire).unwrap(), data);
    }

    #[test]
    fn wire_header_layout() {
        let wire = encode_to_bytes(b"ab").unwrap();
        let split = wire.iter().position(|&b| b == b'\n').unwrap();
        let header = std::str::from_utf8(&wire[..split]).unwrap();
        assert_eq!(header, r#"{"codes":{"97":"0","98":"1"},"padding":6}"#);
        assert_eq!(&wire[split + 1..], &[0b0100_0000]);
    }

    #[test]
    fn full_table_header_fits_scan_window() {
        let data: Vec<u8> = (0..=255u8).collect();
        let wire = encode_to_bytes(&data).unwrap();
        let split = wire.iter().position(|&b| b == b'\n').unwrap();
        assert!(split < MAX_HEADER_LEN);
    }

    #[test]
    fn missing_separator_rejected() {
        assert!(matches!(
            decode_from_bytes(b"{\"codes\":{},\"padding\":0}"),
            Err(CodecError::MalformedTable(_))
        ));
    }

    #[test]
    fn non_json_header_rejected() {
        assert!(matches!(
            decode_from_bytes(b"hello\nworld"),
            Err(CodecError::MalformedTable(_))
        ));
    }

    #[test]
    fn non_injective_table_rejected() {
        let wire = br#"{"codes":{"97":"0","98":"0"},"padding":7}
"#;
        let mut data = wire.to_vec();
        data.push(0);
        assert!(matches!(
            decode_from_bytes(&data),
            Err(CodecError::MalformedTable(_))
        ));
    }

    #[test]
    fn dangling_prefix_is_truncated_stream() {
        let table: CodeTable = [
            (b'a', Code::parse("0").unwrap()),
            (b'b', Code::parse("10").unwrap()),
            (b'c', Code::parse("11").unwrap()),
        ]
        .into_iter()
        .collect();
        // Bits: 0 1 -> 'a' then a dangling "1".
        let payload = HuffmanPayload {
            bytes: vec![0b0100_0000],
            table,
            padding: 6,
        };
        assert!(matches!(
            decode(&payload),
            Err(CodecError::TruncatedStream(_))
        ));
    }

    #[test]
    fn bits_with_empty_table_are_truncated_stream() {
        let payload = HuffmanPayload {
            bytes: vec![0xFF],
            table: CodeTable::new(),
            padding: 0,
        };
        assert!(matches!(
            decode(&payload),
            Err(CodecError::TruncatedStream(_))
        ));
    }
}
