//! Typed queue carrying asynchronous provider updates to the viewer.
//!
//! Providers hold an [`UpdateSink`] and push into it whenever they observe something new. The
//! viewer drains the queue between ticks, so each update is applied whole before the next tick
//! reads tracker or marker state.

use std::sync::mpsc;

use crate::foundation::core::Pose;
use crate::markers::message::MarkerPayload;

/// One asynchronous update delivered by a provider.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// A new pose for a tracked frame.
    Transform { frame: String, pose: Pose },
    /// A marker payload that arrived on a subscribed channel.
    Markers {
        channel: String,
        payload: MarkerPayload,
    },
}

/// Producer half handed to providers.
#[derive(Clone, Debug)]
pub struct UpdateSink {
    tx: mpsc::Sender<Update>,
}

impl UpdateSink {
    pub fn send(&self, update: Update) {
        // A closed queue means the viewer is gone; late deliveries are simply dropped.
        if self.tx.send(update).is_err() {
            tracing::debug!("update dropped: viewer queue closed");
        }
    }

    pub fn send_transform(&self, frame: impl Into<String>, pose: Pose) {
        self.send(Update::Transform {
            frame: frame.into(),
            pose,
        });
    }

    pub fn send_markers(&self, channel: impl Into<String>, payload: MarkerPayload) {
        self.send(Update::Markers {
            channel: channel.into(),
            payload,
        });
    }
}

/// Consumer half owned by the viewer.
#[derive(Debug)]
pub(crate) struct UpdateQueue {
    rx: mpsc::Receiver<Update>,
}

impl UpdateQueue {
    /// Everything queued right now, in arrival order, without blocking.
    pub(crate) fn drain(&self) -> Vec<Update> {
        self.rx.try_iter().collect()
    }
}

pub(crate) fn update_channel() -> (UpdateSink, UpdateQueue) {
    let (tx, rx) = mpsc::channel();
    (UpdateSink { tx }, UpdateQueue { rx })
}
