#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use crate::filter::{FilterTable, WEIGHT_BIAS, clamp_acc};
use crate::ring::RowRing;
use crate::simd::{pack_store, sum_lanes, weight_pair};

#[target_feature(enable = "sse4.1")]
pub unsafe fn convolve_row_1(
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
) {
    let cols = dst.len();
    let wbase = table.weights.as_ptr();

    for (i, entry) in table.entries[col_start..col_start + cols].iter().enumerate() {
        debug_assert!(!entry.slow);
        let x = col_start + i;
        let first = base_row + entry.start as i64;
        let wp = wbase.add(entry.offset as usize);

        let mut acc = _mm_setzero_si128();
        let mut k = 0;
        while k < entry.padded_taps() {
            // Gather 4 taps from 4 consecutive ring rows.
            let quad = [
                ring.row(first + k as i64)[x],
                ring.row(first + k as i64 + 1)[x],
                ring.row(first + k as i64 + 2)[x],
                ring.row(first + k as i64 + 3)[x],
            ];
            let pix = _mm_cvtepu8_epi16(_mm_cvtsi32_si128(i32::from_le_bytes(quad)));
            let wts = _mm_loadl_epi64(wp.add(k) as *const __m128i);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, wts));
            k += 4;
        }
        dst[i] = clamp_acc(sum_lanes(acc) + WEIGHT_BIAS);
    }
}

#[target_feature(enable = "sse4.1")]
pub unsafe fn convolve_row_3(
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
) {
    let cols = dst.len() / 3;
    let wbase = table.weights.as_ptr();

    for (i, entry) in table.entries[col_start..col_start + cols].iter().enumerate() {
        debug_assert!(!entry.slow);
        let x = (col_start + i) * 3;
        let first = base_row + entry.start as i64;
        let wp = wbase.add(entry.offset as usize);

        let mut acc = _mm_set1_epi32(WEIGHT_BIAS);
        let mut k = 0;
        while k < entry.padded_taps() {
            // The 4th interleaved byte pair is junk; its lane is discarded.
            let a = _mm_cvtsi32_si128(
                (ring.row(first + k as i64).as_ptr().add(x) as *const i32).read_unaligned(),
            );
            let b = _mm_cvtsi32_si128(
                (ring.row(first + k as i64 + 1).as_ptr().add(x) as *const i32).read_unaligned(),
            );
            let pix = _mm_cvtepu8_epi16(_mm_unpacklo_epi8(a, b));
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, weight_pair(wp.add(k))));
            k += 2;
        }
        pack_store(acc, &mut dst[i * 3..], 3);
    }
}

#[target_feature(enable = "sse4.1")]
pub unsafe fn convolve_row_4(
    ring: &RowRing,
    base_row: i64,
    table: &FilterTable,
    col_start: usize,
    dst: &mut [u8],
) {
    let cols = dst.len() / 4;
    let wbase = table.weights.as_ptr();

    for (i, entry) in table.entries[col_start..col_start + cols].iter().enumerate() {
        debug_assert!(!entry.slow);
        let x = (col_start + i) * 4;
        let first = base_row + entry.start as i64;
        let wp = wbase.add(entry.offset as usize);

        let mut acc = _mm_set1_epi32(WEIGHT_BIAS);
        let mut k = 0;
        while k < entry.padded_taps() {
            let a = _mm_cvtsi32_si128(
                (ring.row(first + k as i64).as_ptr().add(x) as *const i32).read_unaligned(),
            );
            let b = _mm_cvtsi32_si128(
                (ring.row(first + k as i64 + 1).as_ptr().add(x) as *const i32).read_unaligned(),
            );
            let pix = _mm_cvtepu8_epi16(_mm_unpacklo_epi8(a, b));
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, weight_pair(wp.add(k))));
            k += 2;
        }
        pack_store(acc, &mut dst[i * 4..], 4);
    }
}
