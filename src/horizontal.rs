
cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod avx2;
        mod sse41;
    }
}
mod rust;

use crate::filter::FilterTable;
use crate::util::{Isa, fill_solid};

/// Resamples one source row into one intermediate row.
///
/// The whole destination row is filled with the background color, then the
/// table's entries are evaluated into the `table.entries.len()` pixels
/// starting at column `dst_offset` (the row's quantized shear shift). The
/// destination row must be padded so vectored stores/loads past the last
/// column stay in bounds.
pub fn convolve_row(
    isa: Isa,
    channels: usize,
    src_row: &[u8],
    src_width: usize,
    dst_row: &mut [u8],
    table: &FilterTable,
    dst_offset: usize,
    background: &[u8; 4],
) {
    debug_assert!(src_row.len() >= src_width * channels);
    debug_assert!((dst_offset + table.entries.len()) * channels <= dst_row.len());

    fill_solid(dst_row, background, channels);
    let out = &mut dst_row[dst_offset * channels..][..table.entries.len() * channels];

    if !matches!(channels, 1 | 3 | 4) {
        rust::convolve_row_any(src_row, src_width, out, table, background, channels);
        return;
    }

    match isa {
        Isa::Scalar => match channels {
            1 => rust::convolve_row::<1>(src_row, src_width, out, table, background),
            3 => rust::convolve_row::<3>(src_row, src_width, out, table, background),
            4 => rust::convolve_row::<4>(src_row, src_width, out, table, background),
            _ => unreachable!(),
        },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: Isa::detect only reports SSE4.1 when the CPU has it
        Isa::Sse41 => unsafe {
            match channels {
                1 => sse41::convolve_row_1(src_row, src_width, out, table, background),
                3 => sse41::convolve_row_3(src_row, src_width, out, table, background),
                4 => sse41::convolve_row_4(src_row, src_width, out, table, background),
                _ => unreachable!(),
            }
        },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: Isa::detect only reports AVX2 when the CPU has it
        Isa::Avx2 => unsafe {
            match channels {
                1 => avx2::convolve_row_1(src_row, src_width, out, table, background),
                3 => avx2::convolve_row_3(src_row, src_width, out, table, background),
                4 => avx2::convolve_row_4(src_row, src_width, out, table, background),
                _ => unreachable!(),
            }
        },
    }
}
