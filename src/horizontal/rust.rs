use smallvec::SmallVec;

use crate::filter::{FilterEntry, FilterTable, WEIGHT_BIAS, clamp_acc};

/// Portable reference implementation, fixed channel count.
pub fn convolve_row<const CH: usize>(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    for (px, entry) in out.chunks_exact_mut(CH).zip(&table.entries) {
        if entry.slow {
            slow_pixel(src, src_width, entry, table.weights_of(entry), background, CH, px);
            continue;
        }

        let base = entry.start as usize;
        let mut acc = [WEIGHT_BIAS; CH];
        let weights = &table.weights[entry.offset as usize..][..entry.taps as usize];
        for (k, &w) in weights.iter().enumerate() {
            let s = &src[(base + k) * CH..(base + k) * CH + CH];
            for c in 0..CH {
                acc[c] += w as i32 * s[c] as i32;
            }
        }
        for c in 0..CH {
            px[c] = clamp_acc(acc[c]);
        }
    }
}

/// Fallback for channel counts without a dedicated kernel.
pub fn convolve_row_any(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
    channels: usize,
) {
    let mut acc: SmallVec<[i32; 8]> = SmallVec::from_elem(0, channels);
    for (px, entry) in out.chunks_exact_mut(channels).zip(&table.entries) {
        if entry.slow {
            slow_pixel(
                src,
                src_width,
                entry,
                table.weights_of(entry),
                background,
                channels,
                px,
            );
            continue;
        }

        let base = entry.start as usize;
        acc.fill(WEIGHT_BIAS);
        let weights = &table.weights[entry.offset as usize..][..entry.taps as usize];
        for (k, &w) in weights.iter().enumerate() {
            let s = &src[(base + k) * channels..];
            for c in 0..channels {
                acc[c] += w as i32 * s[c] as i32;
            }
        }
        for c in 0..channels {
            px[c] = clamp_acc(acc[c]);
        }
    }
}

/// Boundary path shared by every backend.
///
/// Taps outside `[0, src_width)` contribute the background color, so the
/// leading and trailing overhangs of a window each fold the background in at
/// exactly the weight of their out-of-range taps. Deliberately unvectorized:
/// by construction only the first and last few entries of an axis land here.
pub(super) fn slow_pixel(
    src: &[u8],
    src_width: usize,
    entry: &FilterEntry,
    weights: &[i16],
    background: &[u8; 4],
    channels: usize,
    out: &mut [u8],
) {
    for c in 0..channels {
        let bg = background[c.min(3)] as i32;
        let mut acc = WEIGHT_BIAS;
        for (k, &w) in weights[..entry.taps as usize].iter().enumerate() {
            let idx = entry.start as i64 + k as i64;
            let s = if idx >= 0 && (idx as usize) < src_width {
                src[idx as usize * channels + c] as i32
            } else {
                bg
            };
            acc += w as i32 * s;
        }
        out[c] = clamp_acc(acc);
    }
}
