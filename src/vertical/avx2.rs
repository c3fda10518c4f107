#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use crate::filter::{FilterTable, WEIGHT_BIAS, clamp_acc};
use crate::ring::RowRing;
use crate::simd::{fold_lanes, pack_store, sum_lanes, weight_quad};

#[target_feature(enable = "avx2")]
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
        let padded = entry.padded_taps();

        let mut acc = _mm_setzero_si128();
        let mut k = 0;
        // 8 taps per step while the weight group allows a full 128-bit load.
        while k + 8 <= padded {
            let mut octet = [0u8; 8];
            for (j, o) in octet.iter_mut().enumerate() {
                *o = ring.row(first + (k + j) as i64)[x];
            }
            let pix = _mm_cvtepu8_epi16(_mm_cvtsi64_si128(i64::from_le_bytes(octet)));
            let wts = _mm_loadu_si128(wp.add(k) as *const __m128i);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, wts));
            k += 8;
        }
        while k < padded {
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

#[target_feature(enable = "avx2")]
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

        let mut acc = _mm256_setzero_si256();
        let mut k = 0;
        while k < entry.padded_taps() {
            // Two interleaved row pairs, one per 128-bit lane; the 4th byte
            // pair of each lane is junk and its lane is discarded.
            let pair = |r: i64| unsafe {
                _mm_cvtsi32_si128((ring.row(r).as_ptr().add(x) as *const i32).read_unaligned())
            };
            let ab = _mm_unpacklo_epi8(pair(first + k as i64), pair(first + k as i64 + 1));
            let cd = _mm_unpacklo_epi8(pair(first + k as i64 + 2), pair(first + k as i64 + 3));
            let pix = _mm256_cvtepu8_epi16(_mm_unpacklo_epi64(ab, cd));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(pix, weight_quad(wp.add(k))));
            k += 4;
        }
        let biased = _mm_add_epi32(fold_lanes(acc), _mm_set1_epi32(WEIGHT_BIAS));
        pack_store(biased, &mut dst[i * 3..], 3);
    }
}

#[target_feature(enable = "avx2")]
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

        let mut acc = _mm256_setzero_si256();
        let mut k = 0;
        while k < entry.padded_taps() {
            let pair = |r: i64| unsafe {
                _mm_cvtsi32_si128((ring.row(r).as_ptr().add(x) as *const i32).read_unaligned())
            };
            let ab = _mm_unpacklo_epi8(pair(first + k as i64), pair(first + k as i64 + 1));
            let cd = _mm_unpacklo_epi8(pair(first + k as i64 + 2), pair(first + k as i64 + 3));
            let pix = _mm256_cvtepu8_epi16(_mm_unpacklo_epi64(ab, cd));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(pix, weight_quad(wp.add(k))));
            k += 4;
        }
        let biased = _mm_add_epi32(fold_lanes(acc), _mm_set1_epi32(WEIGHT_BIAS));
        pack_store(biased, &mut dst[i * 4..], 4);
    }
}
