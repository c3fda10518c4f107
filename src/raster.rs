#[cfg(test)]
mod tests;

use anyhow::{Result, bail};

use crate::util::fill_solid;

/// Borrowed view over an interleaved 8-bit raster.
///
/// The deskew engine never takes ownership of its input; callers keep using
/// whatever container produced the samples. `stride` is in bytes and may
/// exceed `width * channels` for padded rows.
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    samples: &'a [u8],
}

impl<'a> RasterView<'a> {
    pub fn new(
        samples: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("raster dimensions must be non-zero ({width}x{height})");
        }
        if channels == 0 {
            bail!("raster must have at least one channel");
        }
        if stride < width * channels {
            bail!("stride {stride} too small for {width} pixels of {channels} channels");
        }
        // The final row does not need trailing padding.
        let needed = stride * (height - 1) + width * channels;
        if samples.len() < needed {
            bail!("sample buffer holds {} bytes, need {needed}", samples.len());
        }

        Ok(Self {
            width,
            height,
            channels,
            stride,
            samples,
        })
    }

    /// View over a tightly packed buffer (`stride == width * channels`).
    pub fn packed(samples: &'a [u8], width: usize, height: usize, channels: usize) -> Result<Self> {
        Self::new(samples, width, height, channels, width * channels)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// One row of samples, without any trailing stride padding.
    #[must_use]
    pub fn row(&self, y: usize) -> &'a [u8] {
        debug_assert!(y < self.height);
        &self.samples[y * self.stride..][..self.width * self.channels]
    }
}

/// Owned destination raster produced by a deskew operation.
///
/// Rows are tightly packed. The buffer is fully initialized on creation, so
/// a returned image never exposes uninitialized pixels regardless of how
/// much of it the pipeline later overwrites.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Allocates a raster pre-filled with a solid color.
    pub fn filled(width: usize, height: usize, channels: usize, color: &[u8; 4]) -> Result<Self> {
        if width == 0 || height == 0 || channels == 0 {
            bail!("raster dimensions must be non-zero ({width}x{height}x{channels})");
        }
        let len = width * height * channels;
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);
        fill_solid(&mut data, color, channels);

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.width * self.channels
    }

    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        debug_assert!(y < self.height);
        &self.data[y * self.stride()..][..self.stride()]
    }

    #[must_use]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        debug_assert!(y < self.height);
        let stride = self.stride();
        &mut self.data[y * stride..][..stride]
    }

    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    /// Reborrows the raster as a source view, e.g. to chain operations.
    #[must_use]
    pub fn as_view(&self) -> RasterView<'_> {
        RasterView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.stride(),
            samples: &self.data,
        }
    }
}
