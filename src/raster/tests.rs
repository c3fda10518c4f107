#![allow(clippy::unwrap_used, reason = "allow in test files")]

use super::*;

#[test]
fn view_rejects_zero_dimensions() {
    let buf = [0u8; 16];
    assert!(RasterView::new(&buf, 0, 4, 1, 4).is_err());
    assert!(RasterView::new(&buf, 4, 0, 1, 4).is_err());
    assert!(RasterView::new(&buf, 4, 4, 0, 4).is_err());
}

#[test]
fn view_rejects_short_stride() {
    let buf = [0u8; 64];
    assert!(RasterView::new(&buf, 8, 2, 3, 16).is_err());
}

#[test]
fn view_rejects_short_buffer() {
    let buf = [0u8; 15];
    assert!(RasterView::new(&buf, 4, 4, 1, 4).is_err());
}

#[test]
fn view_accepts_unpadded_final_row() {
    // Strided buffers commonly omit padding after the last row.
    let buf = [0u8; 4 * 6 + 4];
    let view = RasterView::new(&buf, 4, 2, 2, 12).unwrap();
    assert_eq!(view.row(1).len(), 8);
}

#[test]
fn view_row_skips_stride_padding() {
    let buf: Vec<u8> = (0..24).collect();
    let view = RasterView::new(&buf, 3, 2, 1, 12).unwrap();
    assert_eq!(view.row(0), &[0, 1, 2]);
    assert_eq!(view.row(1), &[12, 13, 14]);
}

#[test]
fn filled_raster_is_fully_initialized() {
    let r = Raster::filled(5, 3, 3, &[9, 8, 7, 0]).unwrap();
    assert_eq!(r.row(2), &[9, 8, 7, 9, 8, 7, 9, 8, 7, 9, 8, 7, 9, 8, 7]);
}

#[test]
fn raster_roundtrips_through_view() {
    let mut r = Raster::filled(4, 2, 1, &[0; 4]).unwrap();
    r.row_mut(1).copy_from_slice(&[1, 2, 3, 4]);
    let v = r.as_view();
    assert_eq!(v.row(1), &[1, 2, 3, 4]);
    assert_eq!(v.stride(), 4);
}
