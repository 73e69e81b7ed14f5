// LCS delta coder.
//
// - `lcs`: DP alignment, edit script extraction and application
// - `script`: EditOp and the deflated JSON wire format
//
// The base is never embedded in the output; callers must keep the previous
// version they encoded against and hand it back to `decode`.

pub mod lcs;
pub mod script;

pub use lcs::{DEFAULT_MAX_CELLS, apply_delta, extract_delta, extract_delta_bounded, lcs_length};
pub use script::{EditOp, EditStats, decode_script, encode_script};

use crate::deflate::DeflateBackend;
use crate::error::Result;

/// Compute the delta from `base` to `target` and produce its wire form.
pub fn encode(
    base: &[u8],
    target: &[u8],
    max_cells: usize,
    backend: &dyn DeflateBackend,
) -> Result<Vec<u8>> {
    let script = extract_delta_bounded(base, target, max_cells)?;
    encode_script(&script, backend)
}

/// Rebuild the target from a wire-form delta and the base it was made against.
pub fn decode(base: &[u8], delta: &[u8], backend: &dyn DeflateBackend) -> Result<Vec<u8>> {
    let script = decode_script(delta, backend)?;
    Ok(apply_delta(base, &script))
}
