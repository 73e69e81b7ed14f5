// Codec error type shared by every encoder, decoder and the format detector.
//
// Every error is terminal for the call that produced it. Only the detector
// (`detect`) inspects failures, and only to move on to its next probe.

use thiserror::Error;

/// Errors produced by the codecs, the engine and the format detector.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A Huffman code table could not be parsed or is not injective.
    #[error("malformed code table: {0}")]
    MalformedTable(String),

    /// A bit stream ended in the middle of a code, or carried impossible padding.
    #[error("truncated stream: {0}")]
    TruncatedStream(String),

    /// A chunk container (or edit script container) is short or inconsistent.
    #[error("corrupt container: {0}")]
    CorruptContainer(String),

    /// The deflate primitive rejected its input.
    #[error("decompression failed: {0}")]
    DecompressionFailure(String),

    /// The input exceeds a resource bound of the selected codec.
    #[error("input too large: {0}")]
    InputTooLarge(String),

    /// No probe of the format detector accepted the buffer.
    #[error("unrecognized format: no decoder accepted the input")]
    UnrecognizedFormat,

    /// The underlying writer failed while compressing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;
