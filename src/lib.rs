//! Polypack: content-aware compression with format auto-detection.
//!
//! The crate provides:
//! - Bit packing (`bits`) and a Huffman codec (`huffman`)
//! - An LCS delta codec against a previous version (`delta`)
//! - A chunked deflate container (`chunked`) over a pluggable zlib primitive (`deflate`)
//! - The codec selection policy (`policy`) and decode-time detection (`detect`)
//! - The encode/decode façade (`engine`) and file-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use polypack::engine;
//! use polypack::policy::ContentCategory;
//!
//! let previous = b"hello old world".repeat(1000);
//! let mut input = previous.clone();
//! input.extend_from_slice(b"and a new line");
//!
//! let encoded = engine::encode(&input, ContentCategory::Text, Some(&previous)).unwrap();
//! println!("{}: {}", encoded.algorithm, encoded.rationale);
//!
//! let decoded = engine::decode(&encoded.bytes, Some(&previous)).unwrap();
//! assert_eq!(decoded.bytes, input);
//! ```

pub mod bits;
pub mod chunked;
pub mod deflate;
pub mod delta;
pub mod detect;
pub mod engine;
pub mod error;
pub mod huffman;
pub mod io;
pub mod policy;

#[cfg(feature = "cli")]
pub mod cli;

pub use engine::{Decoded, Encoded, Engine, EngineOptions};
pub use error::{CodecError, Result};
