#![allow(clippy::undocumented_unsafe_blocks)]

use std::arch::x86_64::*;

use super::rust::slow_pixel;
use crate::filter::{FilterTable, WEIGHT_BIAS, clamp_acc};
use crate::simd::{pack_store, sum_lanes, weight_pair};

#[target_feature(enable = "sse4.1")]
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
        let mut acc = _mm_setzero_si128();
        let mut k = 0;
        while k < entry.padded_taps() {
            // 4 taps per step; pad taps carry zero weights.
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

#[target_feature(enable = "sse4.1")]
pub unsafe fn convolve_row_3(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    let sp = src.as_ptr();
    let wbase = table.weights.as_ptr();
    // Interleaves two 3-byte pixels into one madd pair per channel.
    let pairs = _mm_set_epi8(-1, -1, -1, -1, -1, 5, -1, 2, -1, 4, -1, 1, -1, 3, -1, 0);

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
        let mut acc = _mm_set1_epi32(WEIGHT_BIAS);
        let mut k = 0;
        while k < entry.padded_taps() {
            let pix8 = _mm_loadl_epi64(sp.add((entry.start as usize + k) * 3) as *const __m128i);
            let pix = _mm_shuffle_epi8(pix8, pairs);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, weight_pair(wp.add(k))));
            k += 2;
        }
        pack_store(acc, &mut out[i * 3..], 3);
    }
}

#[target_feature(enable = "sse4.1")]
pub unsafe fn convolve_row_4(
    src: &[u8],
    src_width: usize,
    out: &mut [u8],
    table: &FilterTable,
    background: &[u8; 4],
) {
    let sp = src.as_ptr();
    let wbase = table.weights.as_ptr();
    // Interleaves two 4-byte pixels into one madd pair per channel.
    let pairs = _mm_set_epi8(-1, 7, -1, 3, -1, 6, -1, 2, -1, 5, -1, 1, -1, 4, -1, 0);

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
        let mut acc = _mm_set1_epi32(WEIGHT_BIAS);
        let mut k = 0;
        while k < entry.padded_taps() {
            let pix8 = _mm_loadl_epi64(sp.add((entry.start as usize + k) * 4) as *const __m128i);
            let pix = _mm_shuffle_epi8(pix8, pairs);
            acc = _mm_add_epi32(acc, _mm_madd_epi16(pix, weight_pair(wp.add(k))));
            k += 2;
        }
        pack_store(acc, &mut out[i * 4..], 4);
    }
}
