
#[cfg(target_arch = "x86_64")]
cpufeatures::new!(cpuid_avx2, "avx2");

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(cpuid_sse41, "sse4.1");

#[cfg(target_arch = "x86_64")]
pub use cpuid_avx2::get as has_avx2;

#[cfg(target_arch = "x86_64")]
pub use cpuid_sse41::get as has_sse41;

/// The inner-loop implementation used by both convolution passes.
///
/// Resolved once when a deskew configuration is built and held constant for
/// the lifetime of that configuration, so a single call never mixes backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isa {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Sse41,
    #[cfg(target_arch = "x86_64")]
    Avx2,
}

impl Isa {
    #[must_use]
    pub fn detect() -> Self {
        if cfg!(feature = "no_simd") {
            return Isa::Scalar;
        }

        cfg_if::cfg_if! {
            if #[cfg(target_arch = "x86_64")] {
                if has_avx2() {
                    Isa::Avx2
                } else if has_sse41() {
                    Isa::Sse41
                } else {
                    Isa::Scalar
                }
            } else {
                Isa::Scalar
            }
        }
    }
}

/// Fills an interleaved pixel buffer with a solid color.
///
/// `buf.len()` must be a multiple of `channels`. Single-channel and
/// uniform-color fills take the memset path.
pub fn fill_solid(buf: &mut [u8], color: &[u8; 4], channels: usize) {
    debug_assert!(buf.len() % channels == 0);

    if channels == 1 || color[..channels.min(4)].iter().all(|&c| c == color[0]) {
        buf.fill(color[0]);
        return;
    }

    for px in buf.chunks_exact_mut(channels) {
        for (c, v) in px.iter_mut().enumerate() {
            *v = color[c.min(3)];
        }
    }
}
