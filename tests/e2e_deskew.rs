#![allow(clippy::unwrap_used, reason = "allow in test files")]

use deskew::{BorderMode, Deskew, DeskewOptions, RasterView, deskew};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro128StarStar;

fn opts(angle: f64, border: BorderMode, background: [u8; 4]) -> DeskewOptions {
    DeskewOptions {
        angle_deg: angle,
        border,
        background,
        ..Default::default()
    }
}

#[test]
fn zero_angle_shrink_is_pixel_identical() {
    let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
    let samples: Vec<u8> = (0..37 * 23 * 3).map(|_| rng.random()).collect();
    let src = RasterView::packed(&samples, 37, 23, 3).unwrap();

    let out = deskew(&src, &opts(0.0, BorderMode::Shrink, [0; 4])).unwrap();

    assert_eq!((out.width(), out.height()), (37, 23));
    assert_eq!(out.samples(), &samples[..]);
}

#[test]
fn gray_page_five_degrees_grow() {
    // 100x100 uniform gray page, 5 degree skew, grow border: the canvas
    // must grow in both axes, new border pixels take the background, and
    // the interior stays at the page value.
    let samples = vec![128u8; 100 * 100];
    let src = RasterView::packed(&samples, 100, 100, 1).unwrap();

    let out = deskew(&src, &opts(5.0, BorderMode::Grow, [32; 4])).unwrap();

    assert!(out.width() > 100, "width {}", out.width());
    assert!(out.height() > 100, "height {}", out.height());

    // All four canvas corners are outside the rotated page.
    let (w, h) = (out.width(), out.height());
    for (x, y) in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
        assert_eq!(out.row(y)[x], 32, "corner ({x},{y})");
    }

    // Deep interior: unity-gain resampling of a flat field is exact.
    for y in h / 2 - 10..h / 2 + 10 {
        for x in w / 2 - 10..w / 2 + 10 {
            let v = out.row(y)[x] as i32;
            assert!((v - 128).abs() <= 1, "interior ({x},{y}) = {v}");
        }
    }
}

#[test]
fn vanishing_angle_is_numerically_stable() {
    // Four-channel 64x64 image at 0.0001 degrees: every quantized shift
    // collapses to zero, so the content region must match the input to
    // within one intensity unit.
    let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
    let samples: Vec<u8> = (0..64 * 64 * 4).map(|_| rng.random()).collect();
    let src = RasterView::packed(&samples, 64, 64, 4).unwrap();

    let out = deskew(&src, &opts(0.0001, BorderMode::Grow, [0; 4])).unwrap();

    assert!(out.width() >= 64 && out.height() >= 64);
    for y in 0..64 {
        let got = &out.row(y)[..64 * 4];
        let want = &samples[y * 64 * 4..][..64 * 4];
        for (x, (&g, &w)) in got.iter().zip(want).enumerate() {
            assert!(
                (g as i32 - w as i32).abs() <= 1,
                "row {y} byte {x}: {g} vs {w}"
            );
        }
    }
}

#[test]
fn deskew_then_reskew_roundtrips_the_interior() {
    // A smooth gradient page rotated +3 then -3 degrees reconstructs the
    // central region up to resampling loss.
    let n = 80usize;
    let samples: Vec<u8> = (0..n * n)
        .map(|i| {
            let (x, y) = (i % n, i / n);
            ((x + y) * 255 / (2 * n)) as u8
        })
        .collect();
    let src = RasterView::packed(&samples, n, n, 1).unwrap();

    let once = deskew(&src, &opts(3.0, BorderMode::Grow, [255; 4])).unwrap();
    let twice = deskew(&once.as_view(), &opts(-3.0, BorderMode::Grow, [255; 4])).unwrap();

    // Content stays centered in both grow canvases to within a couple of
    // pixels, so a generous interior margin absorbs the misregistration.
    let ox = (twice.width() - n) / 2;
    let oy = (twice.height() - n) / 2;
    let margin = 20usize;
    let mut worst = 0i32;
    let mut total = 0i64;
    let mut count = 0i64;
    for y in margin..n - margin {
        for x in margin..n - margin {
            let orig = samples[y * n + x] as i32;
            let back = twice.row(oy + y)[ox + x] as i32;
            let diff = (orig - back).abs();
            worst = worst.max(diff);
            total += diff as i64;
            count += 1;
        }
    }
    assert!(worst <= 16, "round-trip drifted by {worst} intensity units");
    assert!(total / count <= 6, "mean drift {}", total / count);
}

#[test]
fn preserve_keeps_the_footprint() {
    let samples = vec![200u8; 90 * 50];
    let src = RasterView::packed(&samples, 90, 50, 1).unwrap();
    let out = deskew(&src, &opts(2.0, BorderMode::Preserve, [0; 4])).unwrap();
    assert_eq!((out.width(), out.height()), (90, 50));
}

#[test]
fn rgb_and_rgba_channels_survive_independently() {
    // A solid color image must stay that color in the interior; channel
    // order must not be scrambled by the interleaved kernels.
    let color = [10u8, 120, 240, 77];
    for ch in [3usize, 4] {
        let mut samples = vec![0u8; 60 * 60 * ch];
        for px in samples.chunks_exact_mut(ch) {
            px.copy_from_slice(&color[..ch]);
        }
        let src = RasterView::packed(&samples, 60, 60, ch).unwrap();
        let out = deskew(&src, &opts(4.0, BorderMode::Shrink, color)).unwrap();

        for y in 0..out.height() {
            for px in out.row(y).chunks_exact(ch) {
                assert_eq!(px, &color[..ch], "channel scramble at row {y}");
            }
        }
    }
}

#[test]
fn uncommon_channel_counts_use_the_fallback() {
    let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
    let samples: Vec<u8> = (0..40 * 30 * 2).map(|_| rng.random()).collect();
    let src = RasterView::packed(&samples, 40, 30, 2).unwrap();
    let out = deskew(&src, &opts(2.0, BorderMode::Grow, [5; 4])).unwrap();
    assert_eq!(out.channels(), 2);
    assert!(out.width() > 40);
}

#[test]
fn strided_sources_are_read_correctly() {
    // Same image twice: once packed, once with 13 bytes of row padding.
    let w = 33usize;
    let h = 21usize;
    let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
    let packed: Vec<u8> = (0..w * h).map(|_| rng.random()).collect();
    let stride = w + 13;
    let mut padded = vec![0xAAu8; stride * (h - 1) + w];
    for y in 0..h {
        padded[y * stride..y * stride + w].copy_from_slice(&packed[y * w..(y + 1) * w]);
    }

    let o = opts(1.7, BorderMode::Grow, [0; 4]);
    let a = deskew(&RasterView::packed(&packed, w, h, 1).unwrap(), &o).unwrap();
    let b = deskew(&RasterView::new(&padded, w, h, 1, stride).unwrap(), &o).unwrap();
    assert_eq!(a.samples(), b.samples());
}

#[test]
fn out_of_contract_inputs_are_rejected() {
    let samples = vec![0u8; 16];
    let src = RasterView::packed(&samples, 4, 4, 1).unwrap();

    assert!(deskew(&src, &opts(60.0, BorderMode::Grow, [0; 4])).is_err());

    let mut bad_scale = opts(1.0, BorderMode::Grow, [0; 4]);
    bad_scale.post_scale = (1.0, 0.0);
    assert!(deskew(&src, &bad_scale).is_err());

    let mut nan = opts(1.0, BorderMode::Grow, [0; 4]);
    nan.angle_deg = f64::NAN;
    assert!(deskew(&src, &nan).is_err());
}

#[test]
fn opposite_angles_produce_mirrored_canvases() {
    let samples = vec![128u8; 70 * 35];
    let src = RasterView::packed(&samples, 70, 35, 1).unwrap();
    let pos = deskew(&src, &opts(6.0, BorderMode::Grow, [0; 4])).unwrap();
    let neg = deskew(&src, &opts(-6.0, BorderMode::Grow, [0; 4])).unwrap();
    assert_eq!(pos.width(), neg.width());
    assert_eq!(pos.height(), neg.height());
}

#[test]
fn configuration_reports_output_size_before_running() {
    let d = Deskew::new(100, 100, 1, &opts(5.0, BorderMode::Grow, [0; 4])).unwrap();
    let samples = vec![0u8; 100 * 100];
    let src = RasterView::packed(&samples, 100, 100, 1).unwrap();
    let out = d.apply(&src).unwrap();
    assert_eq!((out.width(), out.height()), (d.output_width(), d.output_height()));
}
