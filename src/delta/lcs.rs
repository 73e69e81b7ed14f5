// LCS alignment between a base and a target sequence.
//
// `dp[i][j]` holds the LCS length of `base[i..]` and `target[j..]` and is
// filled bottom-up. The forward walk then emits Match on equal symbols,
// Delete when `dp[i+1][j] >= dp[i][j+1]`, and Insert otherwise; whatever is
// left on either side after one is exhausted is flushed as Delete (base)
// then Insert (target).
//
// The shared prefix and suffix are emitted as Matches around the table walk,
// so the quadratic table only covers the region that actually differs.

use crate::error::{CodecError, Result};

use super::script::EditOp;

/// Default ceiling on DP cells (2^26 cells of 4 bytes = 256 MiB).
pub const DEFAULT_MAX_CELLS: usize = 1 << 26;

/// Compute the edit script turning `base` into `target`.
pub fn extract_delta(base: &[u8], target: &[u8]) -> Result<Vec<EditOp>> {
    extract_delta_bounded(base, target, DEFAULT_MAX_CELLS)
}

/// Compute the edit script, refusing tables larger than `max_cells`.
pub fn extract_delta_bounded(base: &[u8], target: &[u8], max_cells: usize) -> Result<Vec<EditOp>> {
    let prefix = base
        .iter()
        .zip(target)
        .take_while(|(a, b)| a == b)
        .count();

    let suffix = base[prefix..]
        .iter()
        .rev()
        .zip(target[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut script = Vec::with_capacity(base.len().max(target.len()));
    script.extend(base[..prefix].iter().map(|&s| EditOp::Match(s)));

    let tail = &base[base.len() - suffix..];
    let base = &base[prefix..base.len() - suffix];
    let target = &target[prefix..target.len() - suffix];

    if base.is_empty() || target.is_empty() {
        flush(base, target, &mut script);
        script.extend(tail.iter().map(|&s| EditOp::Match(s)));
        return Ok(script);
    }

    let table = LcsTable::build(base, target, max_cells)?;
    let (mut i, mut j) = (0usize, 0usize);
    while i < base.len() && j < target.len() {
        if base[i] == target[j] {
            script.push(EditOp::Match(base[i]));
            i += 1;
            j += 1;
        } else if table.get(i + 1, j) >= table.get(i, j + 1) {
            script.push(EditOp::Delete(base[i]));
            i += 1;
        } else {
            script.push(EditOp::Insert(target[j]));
            j += 1;
        }
    }
    flush(&base[i..], &target[j..], &mut script);
    script.extend(tail.iter().map(|&s| EditOp::Match(s)));

    log::debug!(
        "delta: base {} / target {} bytes (shared prefix {prefix}, suffix {suffix}) -> {} ops",
        base.len() + prefix + suffix,
        target.len() + prefix + suffix,
        script.len()
    );
    Ok(script)
}

/// Rebuild the target from an edit script.
///
/// The base is not consulted: Match and Insert symbols are concatenated in
/// script order and Delete symbols are dropped. It is taken so callers pass
/// the same base they encoded against.
pub fn apply_delta(_base: &[u8], script: &[EditOp]) -> Vec<u8> {
    script
        .iter()
        .filter_map(|op| match *op {
            EditOp::Match(s) | EditOp::Insert(s) => Some(s),
            EditOp::Delete(_) => None,
        })
        .collect()
}

/// Length of the longest common subsequence of `a` and `b`.
pub fn lcs_length(a: &[u8], b: &[u8]) -> Result<usize> {
    lcs_length_bounded(a, b, DEFAULT_MAX_CELLS)
}

/// [`lcs_length`] with an explicit ceiling on DP cells.
pub fn lcs_length_bounded(a: &[u8], b: &[u8], max_cells: usize) -> Result<usize> {
    if a.is_empty() || b.is_empty() {
        return Ok(0);
    }
    Ok(LcsTable::build(a, b, max_cells)?.get(0, 0) as usize)
}

fn flush(base: &[u8], target: &[u8], script: &mut Vec<EditOp>) {
    script.extend(base.iter().map(|&s| EditOp::Delete(s)));
    script.extend(target.iter().map(|&s| EditOp::Insert(s)));
}

/// Flattened `(n+1) x (m+1)` suffix-LCS table.
struct LcsTable {
    cells: Vec<u32>,
    width: usize,
}

impl LcsTable {
    fn build(base: &[u8], target: &[u8], max_cells: usize) -> Result<Self> {
        let (n, m) = (base.len(), target.len());
        let width = m + 1;
        let total = (n + 1)
            .checked_mul(width)
            .filter(|&t| t <= max_cells)
            .ok_or_else(|| {
                CodecError::InputTooLarge(format!(
                    "LCS table of {} x {} exceeds {max_cells} cells",
                    n + 1,
                    width
                ))
            })?;
        if u32::try_from(n.min(m)).is_err() {
            return Err(CodecError::InputTooLarge(format!(
                "LCS length of up to {} does not fit a u32 cell",
                n.min(m)
            )));
        }

        let mut cells = vec![0u32; total];
        for i in (0..n).rev() {
            let row = i * width;
            let below = row + width;
            for j in (0..m).rev() {
                cells[row + j] = if base[i] == target[j] {
                    cells[below + j + 1] + 1
                } else {
                    cells[below + j].max(cells[row + j + 1])
                };
            }
        }
        Ok(Self { cells, width })
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }
}
