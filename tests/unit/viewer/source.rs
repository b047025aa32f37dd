use super::*;

fn opts() -> ViewerOptions {
    ViewerOptions {
        width: 320,
        height: 240,
        host: "robot.local".to_string(),
        port: 8080,
        ..ViewerOptions::default()
    }
}

#[test]
fn uri_carries_size_and_topic() {
    let uri = StreamUri::new(&opts(), "/cam/image");
    assert_eq!(
        uri.to_string(),
        "http://robot.local:8080/stream?topic=/cam/image&width=320&height=240"
    );
}

#[test]
fn uri_adds_quality_invert_and_cache_buster_when_set() {
    let o = ViewerOptions {
        quality: 40,
        invert: true,
        ..opts()
    };
    let uri = StreamUri::new(&o, "/cam").with_cache_buster("00ff");
    assert_eq!(
        uri.to_string(),
        "http://robot.local:8080/stream?topic=/cam&width=320&height=240&quality=40&invert=true&cachebust=00ff"
    );
}

#[test]
fn static_factory_serves_known_ids_only() {
    let frame = PreparedImage::solid(2, 2, [1, 2, 3, 255]).unwrap();
    let mut f = StaticImageFactory::new().with_frame("/a", frame.clone());
    assert_eq!(f.open(&StreamUri::new(&opts(), "/a")).frame(), Some(frame));
    assert_eq!(f.open(&StreamUri::new(&opts(), "/b")).frame(), None);
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("unit-tmp")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn file_factory_decodes_sanitized_stream_path() {
    let dir = temp_dir("file_factory_decodes");
    image::save_buffer_with_format(
        dir.join("cam_image.png"),
        &[0, 0, 255, 255, 0, 0, 255, 255, 0, 0, 255, 255, 0, 0, 255, 255],
        2,
        2,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .unwrap();

    let mut f = FileImageFactory::new(&dir);
    assert_eq!(f.resolve("/cam/image"), Some(dir.join("cam_image.png")));
    let frame = f.open(&StreamUri::new(&opts(), "/cam/image")).frame().unwrap();
    assert_eq!((frame.width, frame.height), (2, 2));
    assert_eq!(&frame.rgba8_premul[0..4], &[0, 0, 255, 255]);
}

#[test]
fn file_factory_yields_empty_source_for_missing_or_bad_files() {
    let dir = temp_dir("file_factory_empty");
    std::fs::write(dir.join("broken.png"), b"not a png").unwrap();
    let mut f = FileImageFactory::new(&dir);
    assert!(f.open(&StreamUri::new(&opts(), "/missing")).frame().is_none());
    assert!(f.open(&StreamUri::new(&opts(), "/broken")).frame().is_none());
}

#[test]
fn empty_stream_id_maps_to_default_stem() {
    assert_eq!(FileImageFactory::file_stem("/"), "stream");
    assert_eq!(FileImageFactory::file_stem("a b/c"), "a_b_c");
}
