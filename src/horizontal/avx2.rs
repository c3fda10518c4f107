#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use super::rust::slow_pixel;
use crate::filter::{FilterTable, WEIGHT_BIAS, clamp_acc};
use crate::simd::{fold_lanes, pack_store, sum_lanes, weight_quad};

#[target_feature(enable = "avx2")]
pub unsafe fn convolve_row_1(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    let sp = src.as_ptr();
    let wbase = table.weights.as_ptr();

    for (i, entry) in table.entries.iter().enumerate() {
        if entry.slow {
            slow_pixel(
                src,
                src_width,
                entry,
                table.weights_of(entry),
                background,
                1,
                &mut out[i..i + 1],
            );
            continue;
        }

        let tp = sp.add(entry.start as usize);
        let wp = wbase.add(entry.offset as usize);
        let padded = entry.padded_taps();
        let mut acc = _mm_setzero_si128();
        let mut k = 0;
        // 8 taps per step while the weight group allows a full 128-bit load.
        while k + 8 <= padded {
            let pix = _mm_cvtepu8_epi16(_mm_loadl_epi64(tp.add(k) as *const __m128i));
            let wts = _mm_loadu_si128(wp.add(k) as *const __m128i);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, wts));
            k += 8;
        }
        while k < padded {
            let pix = _mm_cvtepu8_epi16(_mm_cvtsi32_si128(
                (tp.add(k) as *const i32).read_unaligned(),
            ));
            let wts = _mm_loadl_epi64(wp.add(k) as *const __m128i);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, wts));
            k += 4;
        }
        out[i] = clamp_acc(sum_lanes(acc) + WEIGHT_BIAS);
    }
}

#[target_feature(enable = "avx2")]
pub unsafe fn convolve_row_3(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    let sp = src.as_ptr();
    let wbase = table.weights.as_ptr();
    // Byte layout per 16-byte load: taps k..k+4, 3 bytes each, interleaved
    // into madd pairs across the two lanes.
    let shuffle = _mm_set_epi8(-1, -1, 11, 8, 10, 7, 9, 6, -1, -1, 5, 2, 4, 1, 3, 0);

    for (i, entry) in table.entries.iter().enumerate() {
        if entry.slow {
            slow_pixel(
                src,
                src_width,
                entry,
                table.weights_of(entry),
                background,
                3,
                &mut out[i * 3..i * 3 + 3],
            );
            continue;
        }

        let wp = wbase.add(entry.offset as usize);
        let mut acc = _mm256_setzero_si256();
        let mut k = 0;
        while k < entry.padded_taps() {
            let raw = _mm_loadu_si128(sp.add((entry.start as usize + k) * 3) as *const __m128i);
            let pix = _mm256_cvtepu8_epi16(_mm_shuffle_epi8(raw, shuffle));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(pix, weight_quad(wp.add(k))));
            k += 4;
        }
        let biased = _mm_add_epi32(fold_lanes(acc), _mm_set1_epi32(WEIGHT_BIAS));
        pack_store(biased, &mut out[i * 3..], 3);
    }
}

#[target_feature(enable = "avx2")]
pub unsafe fn convolve_row_4(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    let sp = src.as_ptr();
    let wbase = table.weights.as_ptr();
    // Byte layout per 16-byte load: taps k..k+4, 4 bytes each.
    let shuffle = _mm_set_epi8(15, 11, 14, 10, 13, 9, 12, 8, 7, 3, 6, 2, 5, 1, 4, 0);

    for (i, entry) in table.entries.iter().enumerate() {
        if entry.slow {
            slow_pixel(
                src,
                src_width,
                entry,
                table.weights_of(entry),
                background,
                4,
                &mut out[i * 4..i * 4 + 4],
            );
            continue;
        }

        let wp = wbase.add(entry.offset as usize);
        let mut acc = _mm256_setzero_si256();
        let mut k = 0;
        while k < entry.padded_taps() {
            let raw = _mm_loadu_si128(sp.add((entry.start as usize + k) * 4) as *const __m128i);
            let pix = _mm256_cvtepu8_epi16(_mm_shuffle_epi8(raw, shuffle));
            acc = _mm256_add_epi32(acc, _mm256_madd_epi16(pix, weight_quad(wp.add(k))));
            k += 4;
        }
        let biased = _mm_add_epi32(fold_lanes(acc), _mm_set1_epi32(WEIGHT_BIAS));
        pack_store(biased, &mut out[i * 4..], 4);
    }
}
