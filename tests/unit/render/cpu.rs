use super::*;

fn pixel(pm: &vello_cpu::Pixmap, x: usize, y: usize) -> [u8; 4] {
    let w = pm.width() as usize;
    let i = (y * w + x) * 4;
    let d = pm.data_as_u8_slice();
    [d[i], d[i + 1], d[i + 2], d[i + 3]]
}

#[test]
fn image_is_stretched_over_dest() {
    let img = PreparedImage::solid(2, 2, [255, 0, 0, 255]).unwrap();
    let mut pm = new_pixmap(Canvas::new(8, 8).unwrap()).unwrap();
    let mut r = CpuRasterizer::new();
    r.draw_image(&mut pm, &img, Rect::new(0.0, 0.0, 8.0, 8.0))
        .unwrap();
    assert_eq!(pixel(&pm, 4, 4), [255, 0, 0, 255]);
    assert_eq!(pixel(&pm, 0, 7), [255, 0, 0, 255]);
}

#[test]
fn drawing_clears_previous_content() {
    let img = PreparedImage::solid(1, 1, [0, 0, 255, 255]).unwrap();
    let mut pm = new_pixmap(Canvas::new(8, 8).unwrap()).unwrap();
    let mut r = CpuRasterizer::new();
    r.draw_image(&mut pm, &img, Rect::new(0.0, 0.0, 8.0, 8.0))
        .unwrap();
    r.draw_image(&mut pm, &img, Rect::new(2.0, 2.0, 6.0, 6.0))
        .unwrap();
    assert_eq!(pixel(&pm, 0, 0), [0, 0, 0, 0]);
    assert_eq!(pixel(&pm, 1, 1), [0, 0, 0, 0]);
    assert_eq!(pixel(&pm, 4, 4), [0, 0, 255, 255]);
}

#[test]
fn empty_image_is_an_error() {
    let mut pm = new_pixmap(Canvas::new(4, 4).unwrap()).unwrap();
    let mut r = CpuRasterizer::new();
    assert!(
        r.draw_image(&mut pm, &PreparedImage::empty(), Rect::new(0.0, 0.0, 4.0, 4.0))
            .is_err()
    );
}

#[test]
fn premul_bytes_length_is_checked() {
    assert!(pixmap_from_premul_bytes(&[0u8; 12], 2, 2).is_err());
    assert!(pixmap_from_premul_bytes(&[0u8; 16], 2, 2).is_ok());
}

fn fixture_font() -> TextLayoutEngine {
    let bytes = std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/fonts/DejaVuSans.ttf"
    ))
    .unwrap();
    TextLayoutEngine::with_font(bytes).unwrap()
}

fn lit_in(pm: &vello_cpu::Pixmap, x0: usize, y0: usize, x1: usize, y1: usize) -> usize {
    let mut n = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            if pixel(pm, x, y)[3] > 0 {
                n += 1;
            }
        }
    }
    n
}

fn label(text: &str, x: f64, y: f64, font_size: f64) -> LabelOp {
    LabelOp {
        text: text.to_string(),
        x,
        y,
        font_size,
    }
}

#[test]
fn label_glyphs_sit_on_the_baseline_at_the_anchor() {
    let mut pm = new_pixmap(Canvas::new(200, 200).unwrap()).unwrap();
    let mut r = CpuRasterizer::new();
    let mut text = fixture_font();
    r.draw_labels(
        &mut pm,
        &[label("A", 80.0, 180.0, 10.0)],
        &mut text,
        TextBrushRgba8::default(),
    )
    .unwrap();

    // Glyph ink stays right of x=80 and above the y=180 baseline.
    assert!(lit_in(&pm, 80, 170, 92, 181) > 0);
    let total = lit_in(&pm, 0, 0, 200, 200);
    assert_eq!(lit_in(&pm, 78, 168, 94, 182), total);
    assert_eq!(pixel(&pm, 10, 10), [0, 0, 0, 0]);
}

#[test]
fn unshapeable_label_does_not_hide_the_others() {
    let mut pm = new_pixmap(Canvas::new(200, 200).unwrap()).unwrap();
    let mut r = CpuRasterizer::new();
    let mut text = fixture_font();
    r.draw_labels(
        &mut pm,
        &[
            label("FAR", 0.0, 0.0, 1e39),
            label("A", 80.0, 180.0, 10.0),
        ],
        &mut text,
        TextBrushRgba8::default(),
    )
    .unwrap();
    assert!(lit_in(&pm, 80, 170, 92, 181) > 0);
}
