#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;
use crate::geometry::BorderMode;

fn gray_opts(angle: f64, border: BorderMode) -> DeskewOptions {
    DeskewOptions {
        angle_deg: angle,
        border,
        background: [0; 4],
        ..Default::default()
    }
}

#[test]
fn ring_covers_the_diagonal_extent() {
    for angle in [-10.0, -4.0, -0.5, 0.0, 0.5, 4.0, 10.0] {
        let d = Deskew::new(300, 200, 1, &gray_opts(angle, BorderMode::Grow)).unwrap();
        let diagonal = d.plan().drop.abs() * d.plan().inter_width as f64;
        assert!(
            d.ring_rows() as f64 >= diagonal,
            "angle {angle}: ring {} rows cannot hold a {diagonal:.1}-row diagonal",
            d.ring_rows()
        );
        // The ring must stay a band, not grow toward the image height.
        assert!(d.ring_rows() < diagonal as usize + 32);
    }
}

#[test]
fn zero_angle_needs_only_the_filter_support() {
    let d = Deskew::new(1000, 1000, 1, &gray_opts(0.0, BorderMode::Grow)).unwrap();
    assert!(d.ring_rows() <= 8, "got {} rows", d.ring_rows());
}

#[test]
fn run_emits_rows_in_order() {
    let samples = vec![100u8; 64 * 40 * 3];
    let src = RasterView::packed(&samples, 64, 40, 3).unwrap();
    let d = Deskew::new(64, 40, 3, &gray_opts(2.0, BorderMode::Grow)).unwrap();

    let mut rows = Vec::new();
    d.run(&src, |y, row| {
        assert_eq!(row.len(), d.output_width() * 3);
        rows.push(y);
    })
    .unwrap();

    assert_eq!(rows.len(), d.output_height());
    assert!(rows.windows(2).all(|p| p[1] == p[0] + 1));
}

#[test]
fn run_rejects_a_mismatched_source() {
    let samples = vec![0u8; 32 * 32];
    let src = RasterView::packed(&samples, 32, 32, 1).unwrap();
    let d = Deskew::new(64, 32, 1, &gray_opts(1.0, BorderMode::Grow)).unwrap();
    assert!(d.run(&src, |_, _| {}).is_err());
}

#[test]
fn apply_matches_streaming_run() {
    let mut samples = vec![0u8; 48 * 30];
    for (i, v) in samples.iter_mut().enumerate() {
        *v = (i * 7 % 251) as u8;
    }
    let src = RasterView::packed(&samples, 48, 30, 1).unwrap();
    let d = Deskew::new(48, 30, 1, &gray_opts(-3.0, BorderMode::Grow)).unwrap();

    let image = d.apply(&src).unwrap();
    let mut streamed = vec![0u8; d.output_width() * d.output_height()];
    d.run(&src, |y, row| {
        streamed[y * d.output_width()..][..row.len()].copy_from_slice(row);
    })
    .unwrap();

    assert_eq!(image.samples(), &streamed[..]);
}

#[test]
fn configurations_are_reusable() {
    let a = vec![10u8; 20 * 20];
    let b = vec![200u8; 20 * 20];
    let d = Deskew::new(20, 20, 1, &gray_opts(1.5, BorderMode::Grow)).unwrap();
    let out_a = d
        .apply(&RasterView::packed(&a, 20, 20, 1).unwrap())
        .unwrap();
    let out_b = d
        .apply(&RasterView::packed(&b, 20, 20, 1).unwrap())
        .unwrap();
    assert_eq!(out_a.width(), out_b.width());
    assert_ne!(out_a.samples(), out_b.samples());
}

#[test]
fn one_shot_wrapper_matches_the_configured_form() {
    let samples: Vec<u8> = (0..24 * 18).map(|i| (i % 255) as u8).collect();
    let src = RasterView::packed(&samples, 24, 18, 1).unwrap();
    let opts = gray_opts(2.5, BorderMode::Shrink);

    let via_wrapper = deskew(&src, &opts).unwrap();
    let via_config = Deskew::new(24, 18, 1, &opts).unwrap().apply(&src).unwrap();
    assert_eq!(via_wrapper.samples(), via_config.samples());
}
