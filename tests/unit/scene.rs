use super::*;
use crate::viewer::stream_viewer::PrimaryContent;

const SCENE: &str = r#"{
  "viewer": {"width": 200, "height": 200, "stream_id": "/cam/front"},
  "poses": [{"frame": "base", "pose": {"rotation": {"x": 0, "y": 0, "z": 0}, "translation": {"x": 0, "y": 0, "z": 0}}}],
  "channels": [{
    "name": "/markers/update_full",
    "payloads": [{"groups": [{"name": "g", "frame_id": "base",
      "controls": [{"name": "c", "elements": [{"position": {"x": 0, "y": 0, "z": 0}, "label": "A"}]}]}]}]
  }],
  "ticks": 3,
  "switches": [{"at_tick": 2, "stream_id": "/cam/rear"}]
}"#;

fn assets_root() -> PathBuf {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("unit-tmp")
        .join("scene_empty_assets");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn scene_json_fills_defaults() {
    let scene = Scene::from_json_str(SCENE).unwrap();
    assert_eq!(scene.ticks, 3);
    assert_eq!(scene.channels[0].kind, MarkerKind::InteractiveMarkerInit);
    assert_eq!(
        scene.channels[0].spec.throttle_rate_ms,
        crate::markers::manager::DEFAULT_THROTTLE_RATE_MS
    );
    assert_eq!(Scene::from_json_str("{}").unwrap(), Scene::default());
}

#[test]
fn replayed_scene_plans_labels_and_switches_streams() {
    let scene = Scene::from_json_str(SCENE).unwrap();
    let mut viewer = scene.build_viewer(&assets_root()).unwrap();
    assert!(viewer.markers().is_subscribed("/markers/update_full"));

    let last = scene.run(&mut viewer, false).unwrap();
    assert_eq!(last.tick, 3);
    assert_eq!(last.primary, PrimaryContent::Placeholder);
    assert_eq!(viewer.current_stream(), Some("/cam/rear"));
    assert_eq!(viewer.tracker().lookup("base"), Pose::IDENTITY);

    let label = viewer.overlay_plan().label("A").unwrap();
    assert_eq!((label.x, label.y, label.font_size), (80.0, 180.0, 10.0));
}

#[test]
fn invalid_scenes_are_rejected() {
    let zero_ticks = Scene {
        ticks: 0,
        ..Scene::default()
    };
    assert!(matches!(zero_ticks.validate(), Err(OverlayError::Validation(_))));

    let bad_switch = Scene {
        switches: vec![SceneSwitch {
            at_tick: 0,
            stream_id: "/a".to_string(),
        }],
        ..Scene::default()
    };
    assert!(bad_switch.build_viewer(&assets_root()).is_err());
}

#[test]
fn missing_font_fails_viewer_build() {
    let scene = Scene {
        label_font: Some(PathBuf::from("no-such-font.ttf")),
        ..Scene::default()
    };
    assert!(scene.build_viewer(&assets_root()).is_err());
}
