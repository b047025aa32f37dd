use serde::{Deserialize, Serialize};

use crate::foundation::error::OverlayResult;
use crate::markers::message::{ActiveMarkerSet, MarkerKind, MarkerMessage, MarkerPayload};
use crate::tf::tracker::TransformFrameTracker;
use crate::updates::UpdateSink;

/// Throttle requested from the channel provider unless the `ChannelSpec` sets one.
pub const DEFAULT_THROTTLE_RATE_MS: u32 = 3800;

fn default_throttle_rate_ms() -> u32 {
    DEFAULT_THROTTLE_RATE_MS
}

/// A marker channel to subscribe to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    /// Minimum spacing between deliveries, enforced by the provider.
    #[serde(default = "default_throttle_rate_ms")]
    pub throttle_rate_ms: u32,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            throttle_rate_ms: DEFAULT_THROTTLE_RATE_MS,
        }
    }
}

/// Source of marker payloads (e.g. a pub/sub bridge client).
///
/// After `subscribe`, the provider pushes [`crate::Update::Markers`] for `spec.name` into
/// `sink`, dropping or coalescing anything faster than `spec.throttle_rate_ms`.
pub trait MarkerChannelProvider {
    fn subscribe(&mut self, spec: &ChannelSpec, sink: UpdateSink) -> OverlayResult<()>;

    fn unsubscribe(&mut self, channel: &str);
}

/// A provider without any channels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMarkerProvider;

impl MarkerChannelProvider for NullMarkerProvider {
    fn subscribe(&mut self, _spec: &ChannelSpec, _sink: UpdateSink) -> OverlayResult<()> {
        Ok(())
    }

    fn unsubscribe(&mut self, _channel: &str) {}
}

/// Why an inbound payload was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The channel is not (or no longer) subscribed.
    UnknownChannel,
    /// The payload has no groups.
    Empty,
    /// The first group does not name a frame.
    MissingFrame,
}

/// Result of applying one inbound payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadOutcome {
    Inserted,
    /// An older message of the same kind was evicted.
    Replaced,
    Dropped(DropReason),
}

#[derive(Clone, Debug)]
struct Subscription {
    spec: ChannelSpec,
    kind: MarkerKind,
}

/// Channel subscriptions plus the active marker set they feed.
pub struct MarkerStreamManager {
    provider: Box<dyn MarkerChannelProvider>,
    sink: UpdateSink,
    subscriptions: Vec<Subscription>,
    active: ActiveMarkerSet,
}

impl MarkerStreamManager {
    pub(crate) fn new(provider: Box<dyn MarkerChannelProvider>, sink: UpdateSink) -> Self {
        Self {
            provider,
            sink,
            subscriptions: Vec::new(),
            active: ActiveMarkerSet::default(),
        }
    }

    /// Open a throttled subscription whose messages are treated as `kind`.
    ///
    /// Re-subscribing an existing channel name replaces the previous subscription.
    pub fn subscribe(&mut self, spec: ChannelSpec, kind: MarkerKind) -> OverlayResult<()> {
        if self.subscriptions.iter().any(|s| s.spec.name == spec.name) {
            self.unsubscribe(&spec.name);
        }
        self.provider.subscribe(&spec, self.sink.clone())?;
        tracing::debug!(
            channel = %spec.name,
            kind = %kind,
            throttle_rate_ms = spec.throttle_rate_ms,
            "marker channel subscribed"
        );
        self.subscriptions.push(Subscription { spec, kind });
        Ok(())
    }

    /// Stop a channel. Markers it already delivered stay active until replaced.
    pub fn unsubscribe(&mut self, channel: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.spec.name != channel);
        if self.subscriptions.len() == before {
            return false;
        }
        self.provider.unsubscribe(channel);
        tracing::debug!(channel, "marker channel unsubscribed");
        true
    }

    pub(crate) fn unsubscribe_all(&mut self) {
        for sub in std::mem::take(&mut self.subscriptions) {
            self.provider.unsubscribe(&sub.spec.name);
        }
    }

    /// Remove every active message that arrived on `channel`.
    pub fn purge_channel(&mut self, channel: &str) -> usize {
        self.active.remove_channel(channel)
    }

    /// Apply one payload delivered on `channel`.
    ///
    /// Registers the payload's frame with `tracker` when it is not tracked yet, then replaces
    /// the active message of the channel's kind.
    pub fn handle_payload(
        &mut self,
        channel: &str,
        payload: MarkerPayload,
        tracker: &mut TransformFrameTracker,
    ) -> PayloadOutcome {
        let Some(sub) = self.subscriptions.iter().find(|s| s.spec.name == channel) else {
            tracing::debug!(channel, "payload for unsubscribed channel dropped");
            return PayloadOutcome::Dropped(DropReason::UnknownChannel);
        };
        if payload.is_empty() {
            tracing::debug!(channel, "empty marker payload dropped");
            return PayloadOutcome::Dropped(DropReason::Empty);
        }
        let Some(frame) = payload.source_frame().map(str::to_string) else {
            tracing::debug!(channel, "marker payload without frame dropped");
            return PayloadOutcome::Dropped(DropReason::MissingFrame);
        };

        let kind = sub.kind.clone();
        tracker.register_frame(&frame);
        let evicted = self.active.insert(MarkerMessage {
            kind,
            source_frame: frame,
            channel: channel.to_string(),
            payload,
        });
        match evicted {
            Some(_) => PayloadOutcome::Replaced,
            None => PayloadOutcome::Inserted,
        }
    }

    pub fn active(&self) -> &ActiveMarkerSet {
        &self.active
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.subscriptions.iter().any(|s| s.spec.name == channel)
    }

    /// Current subscriptions with the kind each one feeds.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&ChannelSpec, &MarkerKind)> {
        self.subscriptions.iter().map(|s| (&s.spec, &s.kind))
    }
}

impl std::fmt::Debug for MarkerStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerStreamManager")
            .field("subscriptions", &self.subscriptions)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markers/manager.rs"]
mod tests;
