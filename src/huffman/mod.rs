// Huffman entropy coder.
//
// - `tree`: frequency analysis and tree construction
// - `table`: symbol -> bit-run code table
// - `codec`: encode/decode and the header + packed-body wire format

pub mod codec;
pub mod table;
pub mod tree;

pub use codec::{HuffmanPayload, decode, decode_from_bytes, encode, encode_to_bytes, encode_with_tree};
pub use table::{Code, CodeTable};
pub use tree::{FrequencyTable, HuffmanNode, HuffmanTree};
