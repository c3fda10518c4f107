
use anyhow::{Result, ensure};
use smallvec::SmallVec;

/// Weights are fixed-point with this many fractional bits (Q12).
pub const WEIGHT_BITS: u32 = 12;
/// Unity gain: the quantized weights of every entry sum to exactly this.
pub const WEIGHT_ONE: i32 = 1 << WEIGHT_BITS;
/// Rounding bias added to every accumulator before the final shift.
pub const WEIGHT_BIAS: i32 = 1 << (WEIGHT_BITS - 1);
/// Pixels the vectored kernels may read past a tap window; windows that
/// close must take the slow path instead.
pub const OVERRUN_PIXELS: usize = 16;
/// Sub-pixel phases precomputed per axis.
pub const PHASE_COUNT: usize = 4;
/// Hard cap on taps per entry; bounds kernel size when downsampling.
pub const MAX_TAPS: usize = 10;
/// Tap groups are padded to this multiple so kernels can issue 4-wide loads.
pub const TAP_ALIGN: usize = 4;

/// Mitchell-Netravali cubic, B = C = 1/3, support radius 2.
const SUPPORT: f64 = 2.0;
const MITCHELL_B: f64 = 1.0 / 3.0;
const MITCHELL_C: f64 = 1.0 / 3.0;
/// Widest allowed squeeze; keeps `2 * SUPPORT * squeeze` within MAX_TAPS.
const MAX_SQUEEZE: f64 = (MAX_TAPS as f64 - 1.0) / (2.0 * SUPPORT);
/// Centers this close to a source sample collapse to a single-tap entry.
const ALIGN_EPS: f64 = 1e-3;
/// Zeroed taps appended after the final entry so wide weight loads of that
/// entry never run off the allocation.
const WEIGHT_TAIL: usize = 16;

/// Resampling window for one destination coordinate.
///
/// `start` is the first contributing source index and may be negative or
/// extend past the source extent for `slow` entries; the slow path feeds
/// those taps with the background color instead of reading memory.
#[derive(Debug, Clone, Copy)]
pub struct FilterEntry {
    pub offset: u32,
    pub taps: u16,
    pub slow: bool,
    pub start: i32,
}

impl FilterEntry {
    /// Tap count rounded up to the load alignment; the pad taps are zero.
    #[must_use]
    pub fn padded_taps(&self) -> usize {
        (self.taps as usize + TAP_ALIGN - 1) & !(TAP_ALIGN - 1)
    }
}

/// One axis/phase weight table: an index entry per destination coordinate
/// plus the shared flat Q12 weight array.
#[derive(Debug, Clone)]
pub struct FilterTable {
    pub entries: Vec<FilterEntry>,
    pub weights: Vec<i16>,
    /// Smallest `start` over all entries.
    pub min_start: i32,
    /// Largest `start + padded_taps` over all entries.
    pub max_end: i32,
}

impl FilterTable {
    /// Builds the table for a uniformly scaled axis (the horizontal pass).
    ///
    /// `step` is in source units per destination unit; the phase offsets the
    /// sampling grid by `phase / PHASE_COUNT` of a destination pixel. Entries
    /// whose padded window plus `guard` pixels would read outside
    /// `[0, src_len)` are marked slow so vectored loads (which may overrun
    /// the last used tap by up to 16 bytes) never touch invalid memory; a
    /// table that will drive those kernels must be built with
    /// `guard >= OVERRUN_PIXELS`.
    pub fn scaled(
        src_len: usize,
        count: usize,
        step: f64,
        phase: usize,
        guard: usize,
    ) -> Result<Self> {
        ensure!(step.is_finite() && step > 0.0, "invalid step {step}");
        ensure!(phase < PHASE_COUNT, "phase {phase} out of range");

        let mut builder = Builder::with_capacity(count)?;
        let offset = phase as f64 / PHASE_COUNT as f64;
        for i in 0..count {
            let center = (i as f64 + 0.5 - offset) * step - 0.5;
            builder.push(center, step, Some((src_len, guard)));
        }
        Ok(builder.finish())
    }

    /// Builds the table for the diagonal read of the vertical pass.
    ///
    /// `offsets[i]` is the extra source-row offset of destination column `i`
    /// (the shear drop); the phase offsets every center by a quarter row.
    /// Entries are never slow: the streaming driver materializes every row a
    /// window can reference, synthesizing background rows beyond the source.
    pub fn diagonal(step: f64, phase: usize, offsets: &[f64]) -> Result<Self> {
        ensure!(step.is_finite() && step > 0.0, "invalid step {step}");
        ensure!(phase < PHASE_COUNT, "phase {phase} out of range");

        let mut builder = Builder::with_capacity(offsets.len())?;
        let base = phase as f64 / PHASE_COUNT as f64;
        for &off in offsets {
            builder.push(base + off, step, None);
        }
        Ok(builder.finish())
    }

    /// The padded weight group of one entry.
    #[must_use]
    pub fn weights_of(&self, entry: &FilterEntry) -> &[i16] {
        &self.weights[entry.offset as usize..][..entry.padded_taps()]
    }
}

struct Builder {
    entries: Vec<FilterEntry>,
    weights: Vec<i16>,
    min_start: i32,
    max_end: i32,
}

impl Builder {
    fn with_capacity(count: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(count)?;
        let mut weights = Vec::new();
        weights.try_reserve_exact(count * (MAX_TAPS + TAP_ALIGN) + WEIGHT_TAIL)?;
        Ok(Self {
            entries,
            weights,
            min_start: i32::MAX,
            max_end: i32::MIN,
        })
    }

    /// Appends the entry for one destination coordinate.
    ///
    /// `bounds` carries `(src_len, guard)` for a bounded axis; `None` means
    /// every referenced index is materialized by the caller.
    fn push(&mut self, center: f64, step: f64, bounds: Option<(usize, usize)>) {
        let squeeze = step.max(1.0).min(MAX_SQUEEZE);

        let (first, quantized) = sample_window(center, squeeze);

        let offset = self.weights.len() as u32;
        let taps = quantized.len() as u16;
        self.weights.extend_from_slice(&quantized);
        // Zero-pad the group to the load alignment.
        let padded = (quantized.len() + TAP_ALIGN - 1) & !(TAP_ALIGN - 1);
        self.weights.resize(offset as usize + padded, 0);

        let slow = match bounds {
            Some((src_len, guard)) => {
                first < 0 || first + (padded + guard) as i64 > src_len as i64
            }
            None => false,
        };

        let entry = FilterEntry {
            offset,
            taps,
            slow,
            start: first as i32,
        };
        self.min_start = self.min_start.min(entry.start);
        self.max_end = self.max_end.max(entry.start + padded as i32);
        self.entries.push(entry);
    }

    fn finish(mut self) -> FilterTable {
        self.weights.resize(self.weights.len() + WEIGHT_TAIL, 0);
        FilterTable {
            entries: self.entries,
            weights: self.weights,
            min_start: self.min_start,
            max_end: self.max_end,
        }
    }
}

/// Samples the cubic at every integer offset within the support window and
/// quantizes to Q12 with exact unity gain.
fn sample_window(center: f64, squeeze: f64) -> (i64, SmallVec<[i16; MAX_TAPS + TAP_ALIGN]>) {
    let mut quantized = SmallVec::new();

    // A center landing on a source sample with no squeeze is an exact copy;
    // emitting the cubic there would blur content that is not being moved.
    if squeeze <= 1.0 + 1e-9 && (center - center.round()).abs() < ALIGN_EPS {
        quantized.push(WEIGHT_ONE as i16);
        return (center.round() as i64, quantized);
    }

    let radius = SUPPORT * squeeze;
    let first = (center - radius).ceil() as i64;
    let last = (center + radius).floor() as i64;
    debug_assert!(last - first + 1 <= MAX_TAPS as i64);

    let mut raw: SmallVec<[f64; MAX_TAPS + TAP_ALIGN]> = SmallVec::new();
    let mut sum = 0.0;
    for t in first..=last {
        let w = mitchell((t as f64 - center) / squeeze);
        raw.push(w);
        sum += w;
    }

    if sum <= f64::EPSILON {
        // Degenerate window; fall back to the nearest sample.
        quantized.push(WEIGHT_ONE as i16);
        return (center.round() as i64, quantized);
    }

    let mut total = 0i32;
    for &w in &raw {
        let q = (w / sum * WEIGHT_ONE as f64).round() as i32;
        total += q;
        quantized.push(q as i16);
    }

    // Fold the rounding residue into the heaviest tap so the sum is exact.
    let residue = WEIGHT_ONE - total;
    if residue != 0 {
        let (heaviest, _) = quantized
            .iter()
            .enumerate()
            .max_by_key(|&(_, &w)| (w as i32).abs())
            .unwrap_or((0, &0));
        quantized[heaviest] = (quantized[heaviest] as i32 + residue) as i16;
    }

    (first, quantized)
}

/// Final stage of every kernel: round, rescale and clamp one accumulator.
///
/// All backends must produce bit-identical output, so the SIMD saturating
/// packs and this scalar clamp are required to agree; accumulators stay well
/// inside the i16-after-shift range, where they do.
#[inline]
#[must_use]
pub fn clamp_acc(acc: i32) -> u8 {
    (acc >> WEIGHT_BITS).clamp(0, 255) as u8
}

/// Mitchell-Netravali cubic convolution kernel.
#[must_use]
pub fn mitchell(x: f64) -> f64 {
    let x = x.abs();
    let (b, c) = (MITCHELL_B, MITCHELL_C);
    if x < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * x.powi(3)
            + (-18.0 + 12.0 * b + 6.0 * c) * x.powi(2)
            + (6.0 - 2.0 * b))
            / 6.0
    } else if x < 2.0 {
        ((-b - 6.0 * c) * x.powi(3)
            + (6.0 * b + 30.0 * c) * x.powi(2)
            + (-12.0 * b - 48.0 * c) * x
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}
