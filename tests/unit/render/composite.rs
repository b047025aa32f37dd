use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn transparent_overlay_leaves_primary_untouched() {
    let dst = [10, 20, 30, 255];
    let src = [0, 0, 0, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn opaque_label_pixel_replaces_primary() {
    let dst = [0, 0, 0, 255];
    let src = [255, 255, 255, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    assert!(over_in_place(&mut dst[..6], &[0u8; 6], 1.0).is_err());
}

#[test]
fn over_in_place_composites_every_pixel() {
    let mut dst = [0u8, 0, 255, 255].repeat(3);
    let mut src = vec![0u8; 12];
    src[4..8].copy_from_slice(&[255, 0, 0, 255]);
    over_in_place(&mut dst, &src, 1.0).unwrap();
    assert_eq!(&dst[0..4], &[0, 0, 255, 255]);
    assert_eq!(&dst[4..8], &[255, 0, 0, 255]);
    assert_eq!(&dst[8..12], &[0, 0, 255, 255]);
}
