// Edit script type and its wire format.
//
// On the wire a script is a JSON array of externally tagged operations,
// `[{"m":104},{"d":101},{"i":97}]`, with symbols as byte values. The JSON is
// then passed through the deflate primitive.

use serde::{Deserialize, Serialize};

use crate::deflate::DeflateBackend;
use crate::error::{CodecError, Result};

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditOp {
    /// Symbol present in both base and target.
    #[serde(rename = "m")]
    Match(u8),
    /// Symbol present only in the target.
    #[serde(rename = "i")]
    Insert(u8),
    /// Symbol present only in the base.
    #[serde(rename = "d")]
    Delete(u8),
}

impl EditOp {
    pub fn symbol(&self) -> u8 {
        match *self {
            Self::Match(s) | Self::Insert(s) | Self::Delete(s) => s,
        }
    }
}

/// Operation counts of a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditStats {
    pub matches: usize,
    pub inserts: usize,
    pub deletes: usize,
}

impl EditStats {
    pub fn from_script(script: &[EditOp]) -> Self {
        let mut stats = Self::default();
        for op in script {
            match op {
                EditOp::Match(_) => stats.matches += 1,
                EditOp::Insert(_) => stats.inserts += 1,
                EditOp::Delete(_) => stats.deletes += 1,
            }
        }
        stats
    }

    /// Length of the base the script was computed against.
    pub fn base_len(&self) -> usize {
        self.matches + self.deletes
    }

    /// Length of the target the script rebuilds.
    pub fn target_len(&self) -> usize {
        self.matches + self.inserts
    }
}

/// Serialize a script to its (uncompressed) JSON form.
pub fn to_json(script: &[EditOp]) -> Result<Vec<u8>> {
    serde_json::to_vec(script)
        .map_err(|e| CodecError::CorruptContainer(format!("edit script serialization: {e}")))
}

/// Parse the JSON form of a script.
pub fn from_json(data: &[u8]) -> Result<Vec<EditOp>> {
    serde_json::from_slice(data)
        .map_err(|e| CodecError::CorruptContainer(format!("not an edit script: {e}")))
}

/// Serialize and deflate a script.
pub fn encode_script(script: &[EditOp], backend: &dyn DeflateBackend) -> Result<Vec<u8>> {
    let json = to_json(script)?;
    let out = backend.compress(&json)?;
    log::debug!(
        "delta: {} ops, {} JSON bytes -> {} bytes ({})",
        script.len(),
        json.len(),
        out.len(),
        backend.name()
    );
    Ok(out)
}

/// Inflate and parse a script.
pub fn decode_script(data: &[u8], backend: &dyn DeflateBackend) -> Result<Vec<EditOp>> {
    from_json(&backend.decompress(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::ZlibBackend;

    #[test]
    fn json_layout() {
        let script = vec![EditOp::Match(104), EditOp::Delete(101), EditOp::Insert(97)];
        let json = to_json(&script).unwrap();
        assert_eq!(json, br#"[{"m":104},{"d":101},{"i":97}]"#);
        assert_eq!(from_json(&json).unwrap(), script);
    }

    #[test]
    fn empty_script() {
        let json = to_json(&[]).unwrap();
        assert_eq!(json, b"[]");
        assert!(from_json(&json).unwrap().is_empty());
    }

    #[test]
    fn compressed_roundtrip() {
        let backend = ZlibBackend::default();
        let script: Vec<EditOp> = (0..500u32)
            .map(|i| match i % 3 {
                0 => EditOp::Match(b'a'),
                1 => EditOp::Insert(b'b'),
                _ => EditOp::Delete(b'c'),
            })
            .collect();
        let wire = encode_script(&script, &backend).unwrap();
        assert_eq!(decode_script(&wire, &backend).unwrap(), script);
    }

    #[test]
    fn non_script_json_rejected() {
        assert!(matches!(
            from_json(br#"{"m":1}"#),
            Err(CodecError::CorruptContainer(_))
        ));
        assert!(matches!(
            from_json(br#"[{"x":1}]"#),
            Err(CodecError::CorruptContainer(_))
        ));
        assert!(matches!(
            from_json(br#"[{"m":256}]"#),
            Err(CodecError::CorruptContainer(_))
        ));
        assert!(matches!(
            from_json(b"plain text"),
            Err(CodecError::CorruptContainer(_))
        ));
    }

    #[test]
    fn stats_lengths() {
        let stats = EditStats::from_script(&[
            EditOp::Match(1),
            EditOp::Match(2),
            EditOp::Insert(3),
            EditOp::Delete(4),
            EditOp::Delete(5),
        ]);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.deletes, 2);
        assert_eq!(stats.base_len(), 4);
        assert_eq!(stats.target_len(), 3);
    }

    #[test]
    fn symbol_accessor() {
        assert_eq!(EditOp::Insert(9).symbol(), 9);
        assert_eq!(EditOp::Delete(7).symbol(), 7);
    }
}
