// Encode-time codec selection.
//
// A pure, total function of (content category, size, has-previous). Every
// threshold is inclusive on the side of the cheaper codec, so a text input of
// exactly 10 KiB still goes to Huffman and 10 KiB + 1 byte moves up a tier.

use std::fmt;
use std::path::Path;

/// Text inputs up to this size are always Huffman-coded.
pub const TEXT_HUFFMAN_MAX: u64 = 10 * 1024;

/// Text inputs up to this size may be delta-coded against a previous version.
pub const TEXT_DELTA_MAX: u64 = 1024 * 1024;

/// Images up to this size are candidates for lossy recompression.
pub const IMAGE_LOSSY_MAX: u64 = 200 * 1024;

/// Broad content classes the policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    Text,
    Image,
    /// Video and anything else.
    Other,
}

impl ContentCategory {
    /// Guess the category from a file extension. Unknown extensions are `Other`.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some(
                "txt" | "md" | "markdown" | "rst" | "csv" | "tsv" | "json" | "xml" | "html"
                | "htm" | "css" | "js" | "ts" | "rs" | "py" | "c" | "h" | "cpp" | "java" | "go"
                | "toml" | "yaml" | "yml" | "ini" | "log" | "svg" | "sh",
            ) => Self::Text,
            Some("png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tif" | "tiff" | "ico") => {
                Self::Image
            }
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codec chosen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Huffman,
    /// LCS delta against the previous version, deflated.
    Delta,
    Chunked,
    /// Lossy image recompression; executed as `Chunked` by the engine.
    LossyImage,
}

impl Algorithm {
    /// Label handed back to callers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Huffman => "huffman",
            Self::Delta => "delta",
            Self::Chunked => "chunked",
            Self::LossyImage => "lossy-image",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The policy's choice and why it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDecision {
    pub algorithm: Algorithm,
    pub rationale: String,
}

/// Pick a codec for an input of `size` bytes.
pub fn select(category: ContentCategory, size: u64, has_previous: bool) -> SelectionDecision {
    let (algorithm, rationale) = match category {
        ContentCategory::Text if size <= TEXT_HUFFMAN_MAX => (
            Algorithm::Huffman,
            format!("text of {size} bytes is within the {TEXT_HUFFMAN_MAX}-byte Huffman tier"),
        ),
        ContentCategory::Text if size <= TEXT_DELTA_MAX && has_previous => (
            Algorithm::Delta,
            format!("text of {size} bytes with a previous version: LCS delta"),
        ),
        ContentCategory::Text if size <= TEXT_DELTA_MAX => (
            Algorithm::Huffman,
            format!("text of {size} bytes without a previous version falls back to Huffman"),
        ),
        ContentCategory::Text => (
            Algorithm::Chunked,
            format!("text of {size} bytes exceeds the {TEXT_DELTA_MAX}-byte delta tier"),
        ),
        ContentCategory::Image if size <= IMAGE_LOSSY_MAX => (
            Algorithm::LossyImage,
            format!("image of {size} bytes is within the {IMAGE_LOSSY_MAX}-byte lossy tier"),
        ),
        ContentCategory::Image => (
            Algorithm::Chunked,
            format!("image of {size} bytes exceeds the {IMAGE_LOSSY_MAX}-byte lossy tier"),
        ),
        ContentCategory::Other => (
            Algorithm::Chunked,
            format!("{size} bytes of non-text, non-image content"),
        ),
    };
    SelectionDecision {
        algorithm,
        rationale,
    }
}
