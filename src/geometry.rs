#[cfg(test)]
mod tests;

use anyhow::{Result, bail, ensure};

use crate::filter::PHASE_COUNT;
use crate::util::Isa;

/// Deskew is only exact as a two-pass decomposition well away from 90
/// degrees; document skew is a few degrees at most.
const MAX_ANGLE_DEG: f64 = 45.0;

/// How the output canvas relates to the rotated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderMode {
    /// Full bounding box of the rotated content; nothing is lost, new border
    /// pixels take the background color.
    #[default]
    Grow = 0,
    /// Output matches the un-rotated content size, centered.
    Preserve = 1,
    /// Output is cropped to the guaranteed-valid interior, centered.
    Shrink = 2,
}

impl TryFrom<i64> for BorderMode {
    type Error = anyhow::Error;

    fn try_from(val: i64) -> Result<Self> {
        Ok(match val {
            0 => Self::Grow,
            1 => Self::Preserve,
            2 => Self::Shrink,
            _ => bail!("Invalid border mode, must be 0-2, got {val}."),
        })
    }
}

/// Caller-facing knobs for one deskew operation.
#[derive(Debug, Clone)]
pub struct DeskewOptions {
    /// Rotation to apply, in degrees. Positive rotates counter-clockwise.
    pub angle_deg: f64,
    /// (x, y) scale applied before the rotation.
    pub pre_scale: (f64, f64),
    /// (x, y) scale applied after the rotation.
    pub post_scale: (f64, f64),
    pub border: BorderMode,
    /// One byte per channel; unused trailing bytes are ignored.
    pub background: [u8; 4],
}

impl Default for DeskewOptions {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            pre_scale: (1.0, 1.0),
            post_scale: (1.0, 1.0),
            border: BorderMode::default(),
            background: [255; 4],
        }
    }
}

/// Derived geometry of one deskew operation.
///
/// The rotation plus pre/post scales factor into an X shear+scale pass
/// followed by a Y shear+scale pass:
///
/// ```text
/// x_inter = kx * x_src + shift_origin + row_shift * y_src
/// y_dst   = ky * (y_inter - read_origin + drop * x_inter)   (inverted below)
/// ```
///
/// so the first pass resamples each source row at a row-dependent offset and
/// the second pass pulls each destination row out of the intermediate image
/// along a diagonal of slope `drop`.
#[derive(Debug, Clone)]
pub struct Plan {
    pub src_width: usize,
    pub src_height: usize,
    pub channels: usize,

    /// Horizontal scale of pass 1 (`x_pre * x_post * cos θ`).
    pub kx: f64,
    /// Vertical scale of pass 2 (`y_pre * y_post / cos θ`).
    pub ky: f64,
    /// Horizontal shift added per source row (`-x_post * y_pre * sin θ`).
    pub row_shift: f64,
    /// Constant shift keeping every row offset non-negative.
    pub shift_origin: f64,
    /// Rows the diagonal read descends per intermediate column
    /// (`sin θ / (y_pre * x_post)`).
    pub drop: f64,
    /// Centering constant of the diagonal read (may be negative).
    pub read_origin: f64,
    /// Source units per destination unit for each pass.
    pub step_x: f64,
    pub step_y: f64,

    /// Columns one scaled source row occupies in the intermediate image.
    pub span: usize,
    /// Intermediate image width (shear drift included).
    pub inter_width: usize,
    /// Grow-mode canvas size.
    pub full_width: usize,
    pub full_height: usize,
    /// Reported output size under the chosen border mode.
    pub dst_width: usize,
    pub dst_height: usize,
    /// Symmetric crop applied by Preserve/Shrink.
    pub crop_x: usize,
    pub crop_y: usize,

    pub border: BorderMode,
    pub background: [u8; 4],
    pub isa: Isa,
}

impl Plan {
    pub fn new(
        src_width: usize,
        src_height: usize,
        channels: usize,
        opts: &DeskewOptions,
    ) -> Result<Self> {
        ensure!(src_width > 0 && src_height > 0, "empty source raster");
        ensure!(channels > 0, "source must have at least one channel");
        ensure!(
            opts.angle_deg.is_finite() && opts.angle_deg.abs() < MAX_ANGLE_DEG,
            "angle {} outside the supported range (-{MAX_ANGLE_DEG}, {MAX_ANGLE_DEG})",
            opts.angle_deg
        );
        for s in [
            opts.pre_scale.0,
            opts.pre_scale.1,
            opts.post_scale.0,
            opts.post_scale.1,
        ] {
            ensure!(s.is_finite() && s > 0.0, "scale factors must be positive, got {s}");
        }

        let theta = opts.angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let (x_pre, y_pre) = opts.pre_scale;
        let (x_post, y_post) = opts.post_scale;

        let kx = x_pre * x_post * cos;
        let ky = y_pre * y_post / cos;
        let row_shift = -x_post * y_pre * sin;
        let drop = sin / (y_pre * x_post);

        let w = src_width as f64;
        let h = src_height as f64;

        let shift_extent = row_shift.abs() * (h - 1.0);
        let shift_origin = (-row_shift * (h - 1.0)).max(0.0);
        let span = (kx * w).ceil() as usize + 1;
        let inter_width = shift_extent.ceil() as usize + span;

        // rel(x) = -drop * (x + 0.5); its minimum centers the diagonal read.
        let rel_first = -drop * 0.5;
        let rel_last = -drop * (inter_width as f64 - 0.5);
        let read_origin = rel_first.min(rel_last);
        let rel_extent = drop.abs() * (inter_width as f64 - 1.0);

        let full_width = inter_width;
        let full_height = (ky * (h + rel_extent)).ceil() as usize + 1;

        let (dst_width, dst_height) = match opts.border {
            BorderMode::Grow => (full_width, full_height),
            BorderMode::Preserve => {
                let pw = (w * x_pre * x_post).round().max(1.0) as usize;
                let ph = (h * y_pre * y_post).round().max(1.0) as usize;
                (pw.min(full_width), ph.min(full_height))
            }
            BorderMode::Shrink => {
                let sw = (kx * w - shift_extent + 1e-9).floor() as i64;
                let sh = (ky * h - ky * rel_extent + 1e-9).floor() as i64;
                ensure!(
                    sw >= 1 && sh >= 1,
                    "shrink border mode leaves no valid interior at {}°",
                    opts.angle_deg
                );
                (sw as usize, sh as usize)
            }
        };

        let crop_x = (full_width - dst_width) / 2;
        let crop_y = (full_height - dst_height) / 2;

        Ok(Self {
            src_width,
            src_height,
            channels,
            kx,
            ky,
            row_shift,
            shift_origin,
            drop,
            read_origin,
            step_x: 1.0 / kx,
            step_y: 1.0 / ky,
            span,
            inter_width,
            full_width,
            full_height,
            dst_width,
            dst_height,
            crop_x,
            crop_y,
            border: opts.border,
            background: opts.background,
            isa: Isa::detect(),
        })
    }

    /// Horizontal shift of one source row in intermediate columns.
    #[must_use]
    pub fn shift_at(&self, src_row: usize) -> f64 {
        self.shift_origin + self.row_shift * src_row as f64
    }

    /// Diagonal read position of one full-canvas destination row, in
    /// intermediate rows at the column where `rel` is smallest.
    #[must_use]
    pub fn read_pos_at(&self, dst_row: usize) -> f64 {
        (dst_row as f64 + 0.5) * self.step_y - 0.5 + self.read_origin
    }

    /// Extra source-row offset of each intermediate column relative to
    /// `read_pos_at` (the diagonal, shifted to be non-negative).
    #[must_use]
    pub fn column_offsets(&self) -> Vec<f64> {
        (0..self.inter_width)
            .map(|x| -self.drop * (x as f64 + 0.5) - self.read_origin)
            .collect()
    }
}

/// Splits a continuous position into a whole part and one of the
/// `PHASE_COUNT` quantized sub-pixel phases.
#[must_use]
pub fn quantize_phase(pos: f64) -> (i64, usize) {
    let q = (pos * PHASE_COUNT as f64).round() as i64;
    (
        q.div_euclid(PHASE_COUNT as i64),
        q.rem_euclid(PHASE_COUNT as i64) as usize,
    )
}
