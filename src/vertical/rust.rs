use smallvec::SmallVec;

use crate::filter::{FilterTable, WEIGHT_BIAS, clamp_acc};
use crate::ring::RowRing;

/// Portable reference implementation, fixed channel count.
pub fn convolve_row<const CH: usize>(
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
) {
    let cols = dst.len() / CH;
    let entries = &table.entries[col_start..col_start + cols];

    for (i, entry) in entries.iter().enumerate() {
        debug_assert!(!entry.slow);
        let x = (col_start + i) * CH;
        let first = base_row + entry.start as i64;

        let mut acc = [WEIGHT_BIAS; CH];
        let weights = &table.weights[entry.offset as usize..][..entry.taps as usize];
        for (k, &w) in weights.iter().enumerate() {
            let s = &ring.row(first + k as i64)[x..x + CH];
            for c in 0..CH {
                acc[c] += w as i32 * s[c] as i32;
            }
        }

        let out = &mut dst[i * CH..(i + 1) * CH];
        for c in 0..CH {
            out[c] = clamp_acc(acc[c]);
        }
    }
}

/// Fallback for channel counts without a dedicated kernel.
pub fn convolve_row_any(
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
    channels: usize,
) {
    let cols = dst.len() / channels;
    let entries = &table.entries[col_start..col_start + cols];
    let mut acc: SmallVec<[i32; 8]> = SmallVec::from_elem(0, channels);

    for (i, entry) in entries.iter().enumerate() {
        debug_assert!(!entry.slow);
        let x = (col_start + i) * channels;
        let first = base_row + entry.start as i64;

        acc.fill(WEIGHT_BIAS);
        let weights = &table.weights[entry.offset as usize..][..entry.taps as usize];
        for (k, &w) in weights.iter().enumerate() {
            let s = &ring.row(first + k as i64)[x..x + channels];
            for c in 0..channels {
                acc[c] += w as i32 * s[c] as i32;
            }
        }

        let out = &mut dst[i * channels..(i + 1) * channels];
        for c in 0..channels {
            out[c] = clamp_acc(acc[c]);
        }
    }
}
