
cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod avx2;
        mod sse41;
    }
}
mod rust;

use crate::filter::FilterTable;
use crate::ring::RowRing;
use crate::util::Isa;

/// Resamples one destination row out of the circular intermediate buffer.
///
/// Column `x` of the output reads the tap window of `table.entries[x]`
/// relative to `base_row`; the entries encode the diagonal, so the window
/// wanders downward (or upward) across the row. Every referenced ring row
/// must already be materialized: the table builder never marks diagonal
/// entries slow, and the band driver upholds the materialization invariant.
///
/// `dst` receives `dst.len() / channels` pixels for columns starting at
/// `col_start`.
pub fn convolve_row(
    isa: Isa,
    channels: usize,
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
) {
    debug_assert!(dst.len() % channels == 0);
    debug_assert!(col_start + dst.len() / channels <= table.entries.len());

    if !matches!(channels, 1 | 3 | 4) {
        rust::convolve_row_any(ring, base_row, table, col_start, dst, channels);
        return;
    }

    match isa {
        Isa::Scalar => match channels {
            1 => rust::convolve_row::<1>(ring, base_row, table, col_start, dst),
            3 => rust::convolve_row::<3>(ring, base_row, table, col_start, dst),
            4 => rust::convolve_row::<4>(ring, base_row, table, col_start, dst),
            _ => unreachable!(),
        },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: Isa::detect only reports SSE4.1 when the CPU has it
        Isa::Sse41 => unsafe {
            match channels {
                1 => sse41::convolve_row_1(ring, base_row, table, col_start, dst),
                3 => sse41::convolve_row_3(ring, base_row, table, col_start, dst),
                4 => sse41::convolve_row_4(ring, base_row, table, col_start, dst),
                _ => unreachable!(),
            }
        },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: Isa::detect only reports AVX2 when the CPU has it
        Isa::Avx2 => unsafe {
            match channels {
                1 => avx2::convolve_row_1(ring, base_row, table, col_start, dst),
                3 => avx2::convolve_row_3(ring, base_row, table, col_start, dst),
                4 => avx2::convolve_row_4(ring, base_row, table, col_start, dst),
                _ => unreachable!(),
            }
        },
    }
}
