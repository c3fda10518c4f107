#[cfg(test)]
mod tests;

use anyhow::{Result, ensure};

use crate::filter::{FilterTable, OVERRUN_PIXELS, PHASE_COUNT};
use crate::geometry::{DeskewOptions, Plan, quantize_phase};
use crate::raster::{Raster, RasterView};
use crate::ring::RowRing;
use crate::util::fill_solid;
use crate::{horizontal, vertical};

/// A fully derived deskew configuration: the geometry plan plus the per-axis,
/// per-phase weight tables and the ring sizing they imply.
///
/// Immutable once built; one configuration drives any number of `run`/`apply`
/// calls over same-sized sources, each with its own transient band state.
pub struct Deskew {
    plan: Plan,
    h_tables: [FilterTable; PHASE_COUNT],
    v_tables: [FilterTable; PHASE_COUNT],
    /// Lowest ring row any vertical window reads, relative to its base row.
    v_min_start: i32,
    /// One past the highest (padded) ring row any vertical window reads.
    v_max_end: i32,
    ring_rows: usize,
}

impl Deskew {
    pub fn new(
        src_width: usize,
        src_height: usize,
        channels: usize,
        opts: &DeskewOptions,
    ) -> Result<Self> {
        let plan = Plan::new(src_width, src_height, channels, opts)?;

        let h_tables = build_phases(|phase| {
            FilterTable::scaled(src_width, plan.span, plan.step_x, phase, OVERRUN_PIXELS)
        })?;
        let offsets = plan.column_offsets();
        let v_tables = build_phases(|phase| FilterTable::diagonal(plan.step_y, phase, &offsets))?;

        let v_min_start = v_tables.iter().map(|t| t.min_start).min().unwrap_or(0);
        let v_max_end = v_tables.iter().map(|t| t.max_end).max().unwrap_or(1);
        // Extent of the diagonal plus filter support; rows older than this
        // are dead by the time the write cursor laps them.
        let ring_rows = (v_max_end - v_min_start) as usize + 2;

        Ok(Self {
            plan,
            h_tables,
            v_tables,
            v_min_start,
            v_max_end,
            ring_rows,
        })
    }

    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    #[must_use]
    pub fn output_width(&self) -> usize {
        self.plan.dst_width
    }

    #[must_use]
    pub fn output_height(&self) -> usize {
        self.plan.dst_height
    }

    /// Rows of the circular intermediate buffer a `run` will allocate.
    #[must_use]
    pub fn ring_rows(&self) -> usize {
        self.ring_rows
    }

    /// Streams the deskewed image one destination row at a time.
    ///
    /// Alternates between ingesting source rows into the circular buffer
    /// (horizontal pass) and emitting destination rows out of it (vertical
    /// pass); memory use is proportional to the intermediate width times the
    /// ring height, never the image height. Rows arrive strictly top to
    /// bottom; the slice passed to `emit` is only valid during the call.
    pub fn run(&self, src: &RasterView, mut emit: impl FnMut(usize, &[u8])) -> Result<()> {
        let plan = &self.plan;
        ensure!(
            src.width() == plan.src_width
                && src.height() == plan.src_height
                && src.channels() == plan.channels,
            "source raster {}x{}x{} does not match the configured {}x{}x{}",
            src.width(),
            src.height(),
            src.channels(),
            plan.src_width,
            plan.src_height,
            plan.channels,
        );

        let ch = plan.channels;
        // Row padding tolerates wide vector loads past the last column.
        let mut ring = RowRing::new(self.ring_rows, (plan.inter_width + OVERRUN_PIXELS) * ch)?;
        let mut out_row = Vec::new();
        out_row.try_reserve_exact(plan.dst_width * ch)?;
        out_row.resize(plan.dst_width * ch, 0);

        // Pre-fill: the first destination rows read rows that precede the
        // source, so the cursor starts above row 0.
        let (first_base, _) = quantize_phase(plan.read_pos_at(plan.crop_y));
        let mut next_row = first_base + self.v_min_start as i64;

        for out_y in 0..plan.dst_height {
            let (base, phase) = quantize_phase(plan.read_pos_at(out_y + plan.crop_y));

            // Ingest until every row the padded window can touch is present.
            let needed = base + self.v_max_end as i64;
            while next_row < needed {
                self.ingest(src, &mut ring, next_row);
                next_row += 1;
            }

            vertical::convolve_row(
                plan.isa,
                ch,
                &ring,
                base,
                &self.v_tables[phase],
                plan.crop_x,
                &mut out_row,
            );
            emit(out_y, &out_row);
        }
        Ok(())
    }

    /// Whole-image form: allocates the destination raster and runs the
    /// banded pipeline into it. Either returns a fully valid image or an
    /// error; there is no partial output.
    pub fn apply(&self, src: &RasterView) -> Result<Raster> {
        let plan = &self.plan;
        let mut dest = Raster::filled(
            plan.dst_width,
            plan.dst_height,
            plan.channels,
            &plan.background,
        )?;
        self.run(src, |y, row| dest.row_mut(y).copy_from_slice(row))?;
        Ok(dest)
    }

    /// Writes one intermediate row: a horizontally sheared source row, or a
    /// synthesized background row above or below the source.
    fn ingest(&self, src: &RasterView, ring: &mut RowRing, row: i64) {
        let plan = &self.plan;
        let dst = ring.row_mut(row);

        if row < 0 || row >= plan.src_height as i64 {
            fill_solid(dst, &plan.background, plan.channels);
            return;
        }

        let y = row as usize;
        let (shift, phase) = quantize_phase(plan.shift_at(y));
        debug_assert!(shift >= 0);
        horizontal::convolve_row(
            plan.isa,
            plan.channels,
            src.row(y),
            src.width(),
            dst,
            &self.h_tables[phase],
            shift as usize,
            &plan.background,
        );
    }
}

/// One-shot convenience wrapper around [`Deskew`].
pub fn deskew(src: &RasterView, opts: &DeskewOptions) -> Result<Raster> {
    Deskew::new(src.width(), src.height(), src.channels(), opts)?.apply(src)
}

fn build_phases(mut build: impl FnMut(usize) -> Result<FilterTable>) -> Result<[FilterTable; PHASE_COUNT]> {
    Ok([build(0)?, build(1)?, build(2)?, build(3)?])
}
