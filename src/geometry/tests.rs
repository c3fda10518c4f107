#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;

fn opts(angle: f64, border: BorderMode) -> DeskewOptions {
    DeskewOptions {
        angle_deg: angle,
        border,
        ..Default::default()
    }
}

#[test]
fn border_mode_from_i64() {
    assert_eq!(BorderMode::try_from(0).unwrap(), BorderMode::Grow);
    assert_eq!(BorderMode::try_from(1).unwrap(), BorderMode::Preserve);
    assert_eq!(BorderMode::try_from(2).unwrap(), BorderMode::Shrink);
    assert!(BorderMode::try_from(3).is_err());
    assert!(BorderMode::try_from(-1).is_err());
}

#[test]
fn rejects_bad_inputs() {
    assert!(Plan::new(0, 10, 1, &opts(0.0, BorderMode::Grow)).is_err());
    assert!(Plan::new(10, 10, 0, &opts(0.0, BorderMode::Grow)).is_err());
    assert!(Plan::new(10, 10, 1, &opts(60.0, BorderMode::Grow)).is_err());
    assert!(Plan::new(10, 10, 1, &opts(f64::NAN, BorderMode::Grow)).is_err());

    let mut o = opts(1.0, BorderMode::Grow);
    o.pre_scale = (0.0, 1.0);
    assert!(Plan::new(10, 10, 1, &o).is_err());
    o.pre_scale = (1.0, -2.0);
    assert!(Plan::new(10, 10, 1, &o).is_err());
}

#[test]
fn unit_scale_coefficients_match_the_decomposition() {
    let plan = Plan::new(200, 100, 1, &opts(5.0, BorderMode::Grow)).unwrap();
    let theta = 5.0f64.to_radians();
    // b = sin θ, c = -tan θ; the per-row shift is kx * c = -sin θ.
    assert!((plan.drop - theta.sin()).abs() < 1e-12);
    assert!((plan.row_shift + theta.sin()).abs() < 1e-12);
    assert!((plan.kx - theta.cos()).abs() < 1e-12);
    assert!((plan.ky - 1.0 / theta.cos()).abs() < 1e-12);
}

#[test]
fn zero_angle_shrink_is_the_source_size() {
    let plan = Plan::new(100, 60, 3, &opts(0.0, BorderMode::Shrink)).unwrap();
    assert_eq!((plan.dst_width, plan.dst_height), (100, 60));
    assert_eq!((plan.crop_x, plan.crop_y), (0, 0));
    assert_eq!(plan.span, 101);
    assert!((plan.row_shift).abs() < 1e-12);
    assert!((plan.drop).abs() < 1e-12);
}

#[test]
fn grow_canvas_strictly_exceeds_a_skewed_source() {
    let plan = Plan::new(100, 100, 1, &opts(5.0, BorderMode::Grow)).unwrap();
    assert!(plan.dst_width > 100);
    assert!(plan.dst_height > 100);
    assert_eq!((plan.crop_x, plan.crop_y), (0, 0));
}

#[test]
fn negative_angle_mirrors_the_canvas_size() {
    let pos = Plan::new(120, 80, 1, &opts(4.0, BorderMode::Grow)).unwrap();
    let neg = Plan::new(120, 80, 1, &opts(-4.0, BorderMode::Grow)).unwrap();
    assert_eq!(pos.dst_width, neg.dst_width);
    assert_eq!(pos.dst_height, neg.dst_height);
}

#[test]
fn preserve_reports_the_unrotated_content_size() {
    let mut o = opts(3.0, BorderMode::Preserve);
    o.pre_scale = (2.0, 1.0);
    let plan = Plan::new(100, 100, 1, &o).unwrap();
    assert_eq!(plan.dst_width, 200);
    assert_eq!(plan.dst_height, 100);
    // Centered crop.
    assert!(plan.crop_x <= (plan.full_width - plan.dst_width));
    assert_eq!(plan.crop_x, (plan.full_width - plan.dst_width) / 2);
}

#[test]
fn shrink_discards_the_shear_margins() {
    let plan = Plan::new(100, 100, 1, &opts(5.0, BorderMode::Shrink)).unwrap();
    assert!(plan.dst_width < 100);
    assert!(plan.dst_height < 100);
    assert!(plan.crop_x > 0);
    assert!(plan.crop_y > 0);
}

#[test]
fn row_shifts_stay_non_negative() {
    for angle in [-8.0, -2.5, 0.0, 1.0, 7.5] {
        let plan = Plan::new(64, 48, 1, &opts(angle, BorderMode::Grow)).unwrap();
        for y in 0..48 {
            let s = plan.shift_at(y);
            assert!(s >= 0.0, "angle {angle} row {y}: shift {s}");
            assert!(s <= plan.row_shift.abs() * 47.0 + 1e-9);
        }
    }
}

#[test]
fn column_offsets_are_non_negative_and_span_the_diagonal() {
    for angle in [-6.0, 3.0] {
        let plan = Plan::new(64, 48, 1, &opts(angle, BorderMode::Grow)).unwrap();
        let offs = plan.column_offsets();
        assert_eq!(offs.len(), plan.inter_width);
        let extent = plan.drop.abs() * (plan.inter_width as f64 - 1.0);
        for &o in &offs {
            assert!(o >= -1e-9);
            assert!(o <= extent + 1e-9);
        }
        // One end of the diagonal sits at zero.
        let min = offs.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(min < 1e-9);
    }
}

#[test]
fn read_pos_advances_by_the_vertical_step() {
    let plan = Plan::new(64, 48, 1, &opts(2.0, BorderMode::Grow)).unwrap();
    let d = plan.read_pos_at(11) - plan.read_pos_at(10);
    assert!((d - plan.step_y).abs() < 1e-12);
}

#[test]
fn quantize_phase_splits_quarters() {
    assert_eq!(quantize_phase(0.0), (0, 0));
    assert_eq!(quantize_phase(0.26), (0, 1));
    assert_eq!(quantize_phase(0.5), (0, 2));
    assert_eq!(quantize_phase(1.0), (1, 0));
    assert_eq!(quantize_phase(2.74), (2, 3));
    // Negative positions round Euclidean so phases stay in 0..4.
    assert_eq!(quantize_phase(-0.25), (-1, 3));
    assert_eq!(quantize_phase(-1.0), (-1, 0));
}
