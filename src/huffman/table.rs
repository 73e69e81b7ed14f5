// Code table: symbol -> variable-length bit run.
//
// Codes are kept as (bits, len) pairs rather than text; the textual "0101"
// form only exists on the wire (see `codec`).

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{CodecError, Result};

use super::tree::{HuffmanNode, HuffmanTree};

/// A prefix code of 1 to 64 bits, stored right-aligned in `bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    bits: u64,
    len: u8,
}

impl Code {
    /// Longest representable code.
    pub const MAX_LEN: u8 = 64;

    /// The zero-length prefix used while walking a tree or decoding.
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    /// Build a code from its low `len` bits. Returns `None` if `len > 64`.
    pub fn new(bits: u64, len: u8) -> Option<Self> {
        if len > Self::MAX_LEN {
            return None;
        }
        let bits = if len == 64 { bits } else { bits & ((1u64 << len) - 1) };
        Some(Self { bits, len })
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one bit. Returns `None` once the code would exceed 64 bits.
    #[inline]
    pub fn push(self, bit: bool) -> Option<Self> {
        if self.len == Self::MAX_LEN {
            return None;
        }
        Some(Self {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        })
    }

    /// Parse the textual `0`/`1` form.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(CodecError::MalformedTable("empty code".into()));
        }
        let mut code = Self::EMPTY;
        for c in text.chars() {
            let bit = match c {
                '0' => false,
                '1' => true,
                other => {
                    return Err(CodecError::MalformedTable(format!(
                        "invalid character {other:?} in code {text:?}"
                    )));
                }
            };
            code = code.push(bit).ok_or_else(|| {
                CodecError::MalformedTable(format!("code longer than {} bits", Self::MAX_LEN))
            })?;
        }
        Ok(code)
    }

    /// Whether `self` is a proper or equal prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (self.len == 0 || other.bits >> (other.len - self.len) == self.bits)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for shift in (0..self.len).rev() {
            f.write_str(if (self.bits >> shift) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Mapping from symbol to its code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, Code>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive codes from a tree: left edges are `0`, right edges `1`.
    ///
    /// A tree that is a single leaf yields the one-bit code `0`.
    pub fn from_tree(tree: &HuffmanTree) -> Result<Self> {
        let mut table = Self::new();
        match tree.root() {
            HuffmanNode::Leaf { symbol, .. } => {
                table.insert(*symbol, Code { bits: 0, len: 1 });
            }
            root => assign(root, Code::EMPTY, &mut table)?,
        }
        Ok(table)
    }

    pub fn insert(&mut self, symbol: u8, code: Code) -> Option<Code> {
        self.codes.insert(symbol, code)
    }

    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Entries ascending by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes.iter().map(|(&s, &c)| (s, c))
    }

    /// Length of the longest code (0 for an empty table).
    pub fn max_len(&self) -> u8 {
        self.codes.values().map(Code::len).max().unwrap_or(0)
    }

    /// Build the code -> symbol lookup used by the decoder.
    ///
    /// Fails if two symbols share a code.
    pub fn invert(&self) -> Result<HashMap<Code, u8>> {
        let mut lookup = HashMap::with_capacity(self.codes.len());
        for (&symbol, &code) in &self.codes {
            if let Some(prev) = lookup.insert(code, symbol) {
                return Err(CodecError::MalformedTable(format!(
                    "symbols {prev} and {symbol} share code {code}"
                )));
            }
        }
        Ok(lookup)
    }

    /// Whether no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let mut codes: Vec<Code> = self.codes.values().copied().collect();
        // Lexicographic bit order puts any prefix directly before a code it prefixes.
        codes.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        codes.windows(2).all(|w| !w[0].is_prefix_of(&w[1]))
    }

    /// Total encoded bit length of `data` under this table.
    pub fn encoded_bits(&self, data: &[u8]) -> Option<usize> {
        data.iter()
            .map(|&b| self.get(b).map(|c| c.len() as usize))
            .sum()
    }
}

impl FromIterator<(u8, Code)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (u8, Code)>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

fn assign(node: &HuffmanNode, prefix: Code, table: &mut CodeTable) -> Result<()> {
    match node {
        HuffmanNode::Leaf { symbol, .. } => {
            table.insert(*symbol, prefix);
            Ok(())
        }
        HuffmanNode::Internal { left, right, .. } => {
            let too_deep = || {
                CodecError::InputTooLarge(format!(
                    "huffman tree deeper than {} levels",
                    Code::MAX_LEN
                ))
            };
            assign(left, prefix.push(false).ok_or_else(too_deep)?, table)?;
            assign(right, prefix.push(true).ok_or_else(too_deep)?, table)
        }
    }
}
