//! Replayable viewer scene: options plus scripted poses, marker payloads and stream switches.
//!
//! Relative paths in a scene (`images_dir`, `label_font`) resolve against an assets root,
//! normally the directory holding the scene file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Pose;
use crate::foundation::error::{OverlayError, OverlayResult};
use crate::markers::manager::ChannelSpec;
use crate::markers::message::{MarkerKind, MarkerPayload};
use crate::replay::{ReplayMarkerProvider, ReplayTransformProvider};
use crate::viewer::options::ViewerOptions;
use crate::viewer::schedule::TickSchedule;
use crate::viewer::source::FileImageFactory;
use crate::viewer::stream_viewer::{StreamViewer, TickReport};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenePose {
    pub frame: String,
    pub pose: Pose,
}

fn interactive_marker_init() -> MarkerKind {
    MarkerKind::InteractiveMarkerInit
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneChannel {
    #[serde(flatten)]
    pub spec: ChannelSpec,
    #[serde(default = "interactive_marker_init")]
    pub kind: MarkerKind,
    /// Payloads replayed when the channel is subscribed.
    #[serde(default)]
    pub payloads: Vec<MarkerPayload>,
}

/// Switch to `stream_id` right before tick `at_tick` (1-based).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSwitch {
    pub at_tick: u64,
    pub stream_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub viewer: ViewerOptions,
    /// TTF/OTF file used for marker labels. Without it labels are planned but not drawn.
    pub label_font: Option<PathBuf>,
    /// Directory holding stream frames, see [`FileImageFactory`].
    pub images_dir: Option<PathBuf>,
    pub poses: Vec<ScenePose>,
    pub channels: Vec<SceneChannel>,
    pub ticks: u64,
    pub switches: Vec<SceneSwitch>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            viewer: ViewerOptions::default(),
            label_font: None,
            images_dir: None,
            poses: Vec::new(),
            channels: Vec::new(),
            ticks: 1,
            switches: Vec::new(),
        }
    }
}

impl Scene {
    pub fn from_json_str(s: &str) -> OverlayResult<Self> {
        serde_json::from_str(s).map_err(|e| OverlayError::serde(e.to_string()))
    }

    pub fn from_reader(r: impl Read) -> OverlayResult<Self> {
        serde_json::from_reader(r).map_err(|e| OverlayError::serde(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OverlayError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> OverlayResult<()> {
        self.viewer.validate()?;
        if self.ticks == 0 {
            return Err(OverlayError::validation("scene ticks must be > 0"));
        }
        if let Some(s) = self.switches.iter().find(|s| s.at_tick == 0) {
            return Err(OverlayError::validation(format!(
                "switch to '{}' has at_tick 0; ticks are 1-based",
                s.stream_id
            )));
        }
        for (i, c) in self.channels.iter().enumerate() {
            if c.spec.name.is_empty() {
                return Err(OverlayError::validation(format!(
                    "channels[{i}] has an empty name"
                )));
            }
        }
        Ok(())
    }

    /// Build a viewer wired to replay providers and a file-backed image factory, with every
    /// scene channel subscribed.
    pub fn build_viewer(&self, assets_root: &Path) -> OverlayResult<StreamViewer> {
        self.validate()?;

        let images_root = match &self.images_dir {
            Some(dir) => assets_root.join(dir),
            None => assets_root.to_path_buf(),
        };
        let transforms = self
            .poses
            .iter()
            .fold(ReplayTransformProvider::new(), |p, sp| {
                p.with_pose(sp.frame.as_str(), sp.pose)
            });
        let mut markers = ReplayMarkerProvider::new();
        for c in &self.channels {
            for payload in &c.payloads {
                markers.push(c.spec.name.as_str(), payload.clone());
            }
        }

        let mut viewer = StreamViewer::new(
            self.viewer.clone(),
            Box::new(FileImageFactory::new(images_root)),
            Box::new(transforms),
            Box::new(markers),
        )?;

        if let Some(font) = &self.label_font {
            let path = assets_root.join(font);
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read label font '{}'", path.display()))?;
            viewer.set_label_font(bytes)?;
        }

        for c in &self.channels {
            viewer.subscribe_markers(c.spec.clone(), c.kind.clone())?;
        }
        Ok(viewer)
    }

    /// Run the scripted ticks, applying switches before their tick. With `paced`, ticks follow
    /// the viewer's tick period; otherwise they run back to back.
    ///
    /// Returns the report of the last tick, or `None` if the viewer was already disposed.
    pub fn run(&self, viewer: &mut StreamViewer, paced: bool) -> Option<TickReport> {
        let mut schedule = TickSchedule::new(viewer.tick_period());
        let mut last = None;
        for tick in 1..=self.ticks {
            for s in self.switches.iter().filter(|s| s.at_tick == tick) {
                viewer.switch_stream(&s.stream_id);
            }
            last = Some(viewer.step()?);
            if paced && tick < self.ticks {
                schedule.wait();
            }
        }
        last
    }
}

#[cfg(test)]
#[path = "../tests/unit/scene.rs"]
mod tests;
