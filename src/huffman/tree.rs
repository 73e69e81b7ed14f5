// Frequency analysis and Huffman tree construction.
//
// The tree is a tagged enum with boxed children. Construction pops the two
// lightest nodes from a min-heap keyed on (frequency, creation order), so the
// result is deterministic: leaves are created in ascending symbol order and
// every merged node gets the next sequence number.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;

/// Occurrence count of every byte value in one input.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    /// Count every byte of `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &b in data {
            counts[b as usize] += 1;
        }
        Self { counts }
    }

    /// Occurrences of `symbol`.
    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Number of distinct symbols present.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct() == 0
    }

    /// Present symbols with their counts, ascending by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A node of the Huffman tree.
///
/// Serializes as `{"kind":"leaf","symbol":97,"freq":4}` or
/// `{"kind":"internal","freq":10,"left":{..},"right":{..}}` for
/// visualization tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HuffmanNode {
    Leaf {
        symbol: u8,
        freq: u64,
    },
    Internal {
        freq: u64,
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    pub fn freq(&self) -> u64 {
        match self {
            Self::Leaf { freq, .. } | Self::Internal { freq, .. } => *freq,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// A complete Huffman tree. Never empty: empty input has no tree at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HuffmanTree {
    root: HuffmanNode,
}

impl HuffmanTree {
    /// Build a tree from symbol frequencies. Returns `None` for an empty table.
    pub fn build(freqs: &FrequencyTable) -> Option<Self> {
        let mut slots: Vec<Option<HuffmanNode>> = Vec::with_capacity(freqs.distinct() * 2);
        let mut heap = BinaryHeap::with_capacity(freqs.distinct());

        for (symbol, freq) in freqs.iter() {
            heap.push(Reverse((freq, slots.len())));
            slots.push(Some(HuffmanNode::Leaf { symbol, freq }));
        }

        while heap.len() > 1 {
            let Reverse((lf, li)) = heap.pop()?;
            let Reverse((rf, ri)) = heap.pop()?;
            let left = slots[li].take()?;
            let right = slots[ri].take()?;
            heap.push(Reverse((lf + rf, slots.len())));
            slots.push(Some(HuffmanNode::Internal {
                freq: lf + rf,
                left: Box::new(left),
                right: Box::new(right),
            }));
        }

        let Reverse((_, root)) = heap.pop()?;
        let root = slots[root].take()?;
        log::trace!(
            "huffman tree: {} leaves, depth {}",
            root.leaf_count(),
            root.depth()
        );
        Some(Self { root })
    }

    pub fn root(&self) -> &HuffmanNode {
        &self.root
    }

    /// Longest code length the tree implies (a lone leaf still gets one bit).
    pub fn depth(&self) -> usize {
        self.root.depth().max(1)
    }
}
