//! Providers that replay scripted updates, used by the CLI scene runner and tests.
//!
//! Each provider delivers everything scripted for a frame or channel the moment it is
//! subscribed, in script order. Throttling is not applied to replayed payloads.

use std::collections::{HashMap, HashSet};

use crate::foundation::core::Pose;
use crate::foundation::error::OverlayResult;
use crate::markers::manager::{ChannelSpec, MarkerChannelProvider};
use crate::markers::message::MarkerPayload;
use crate::tf::tracker::TransformProvider;
use crate::updates::UpdateSink;

#[derive(Clone, Debug, Default)]
pub struct ReplayTransformProvider {
    poses: HashMap<String, Vec<Pose>>,
    subscribed: Vec<String>,
}

impl ReplayTransformProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pose(mut self, frame: impl Into<String>, pose: Pose) -> Self {
        self.push(frame, pose);
        self
    }

    pub fn push(&mut self, frame: impl Into<String>, pose: Pose) {
        self.poses.entry(frame.into()).or_default().push(pose);
    }

    /// Frames subscribed so far, in subscription order.
    pub fn subscribed(&self) -> &[String] {
        &self.subscribed
    }
}

impl TransformProvider for ReplayTransformProvider {
    fn subscribe(&mut self, frame: &str, sink: UpdateSink) -> OverlayResult<()> {
        self.subscribed.push(frame.to_string());
        let poses = self.poses.get(frame).map(Vec::as_slice).unwrap_or_default();
        tracing::debug!(frame, poses = poses.len(), "replaying poses");
        for pose in poses {
            sink.send_transform(frame, *pose);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ReplayMarkerProvider {
    payloads: HashMap<String, Vec<MarkerPayload>>,
    active: HashSet<String>,
}

impl ReplayMarkerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, channel: impl Into<String>, payload: MarkerPayload) -> Self {
        self.push(channel, payload);
        self
    }

    pub fn push(&mut self, channel: impl Into<String>, payload: MarkerPayload) {
        self.payloads.entry(channel.into()).or_default().push(payload);
    }

    pub fn is_active(&self, channel: &str) -> bool {
        self.active.contains(channel)
    }
}

impl MarkerChannelProvider for ReplayMarkerProvider {
    fn subscribe(&mut self, spec: &ChannelSpec, sink: UpdateSink) -> OverlayResult<()> {
        self.active.insert(spec.name.clone());
        let payloads = self
            .payloads
            .get(&spec.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        tracing::debug!(channel = %spec.name, payloads = payloads.len(), "replaying markers");
        for payload in payloads {
            sink.send_markers(spec.name.as_str(), payload.clone());
        }
        Ok(())
    }

    fn unsubscribe(&mut self, channel: &str) {
        self.active.remove(channel);
    }
}
