use std::collections::HashMap;

use crate::foundation::core::Pose;
use crate::foundation::error::OverlayResult;
use crate::updates::UpdateSink;

/// Source of frame poses (e.g. a transform-tree client).
///
/// After `subscribe(frame, sink)` the provider pushes an [`crate::Update::Transform`] into
/// `sink` every time it observes a new pose for `frame`. There is no ordering guarantee across
/// frames.
pub trait TransformProvider {
    fn subscribe(&mut self, frame: &str, sink: UpdateSink) -> OverlayResult<()>;
}

/// A provider that never delivers anything; every frame stays at the identity pose.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransformProvider;

impl TransformProvider for NullTransformProvider {
    fn subscribe(&mut self, _frame: &str, _sink: UpdateSink) -> OverlayResult<()> {
        Ok(())
    }
}

/// A registered frame and its latest pose, if one has arrived.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFrame {
    pub name: String,
    pub pose: Option<Pose>,
}

/// Tracks named frames and the latest pose of each relative to the base frame.
pub struct TransformFrameTracker {
    provider: Box<dyn TransformProvider>,
    sink: UpdateSink,
    frames: Vec<TrackedFrame>,
    frame_idx_by_name: HashMap<String, usize>,
}

impl TransformFrameTracker {
    pub(crate) fn new(provider: Box<dyn TransformProvider>, sink: UpdateSink) -> Self {
        Self {
            provider,
            sink,
            frames: Vec::new(),
            frame_idx_by_name: HashMap::new(),
        }
    }

    /// Start tracking `name`. Returns `false` if it was already tracked.
    ///
    /// A provider failure is logged; the frame stays registered and resolves to identity.
    pub fn register_frame(&mut self, name: &str) -> bool {
        if self.frame_idx_by_name.contains_key(name) {
            return false;
        }
        let i = self.frames.len();
        self.frames.push(TrackedFrame {
            name: name.to_string(),
            pose: None,
        });
        self.frame_idx_by_name.insert(name.to_string(), i);

        if let Err(e) = self.provider.subscribe(name, self.sink.clone()) {
            tracing::warn!(frame = name, error = %e, "transform subscription failed");
        } else {
            tracing::debug!(frame = name, "tracking frame");
        }
        true
    }

    /// Replace the pose of a registered frame. Unregistered frames are ignored (`false`).
    ///
    /// No numeric validation happens here: NaN components are stored as-is.
    pub fn update_pose(&mut self, name: &str, pose: Pose) -> bool {
        let Some(&i) = self.frame_idx_by_name.get(name) else {
            tracing::debug!(frame = name, "pose for unregistered frame ignored");
            return false;
        };
        self.frames[i].pose = Some(pose);
        true
    }

    /// Latest pose of `name`, or [`Pose::IDENTITY`] when none is known yet.
    pub fn lookup(&self, name: &str) -> Pose {
        self.frame_idx_by_name
            .get(name)
            .and_then(|&i| self.frames[i].pose)
            .unwrap_or(Pose::IDENTITY)
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.frame_idx_by_name.contains_key(name)
    }

    /// Tracked frames in registration order.
    pub fn frames(&self) -> &[TrackedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl std::fmt::Debug for TransformFrameTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformFrameTracker")
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tf/tracker.rs"]
mod tests;
