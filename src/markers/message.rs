use serde::{Deserialize, Serialize};

use crate::foundation::core::Vec3;

/// Discriminator of a marker message. At most one message per kind is active.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarkerKind {
    /// `visualization_msgs/InteractiveMarkerInit`: the only kind the overlay draws.
    InteractiveMarkerInit,
    /// Any other message type. Kept in the active set, never drawn.
    Other(String),
}

impl MarkerKind {
    pub const INTERACTIVE_MARKER_INIT: &'static str = "visualization_msgs/InteractiveMarkerInit";

    pub fn as_str(&self) -> &str {
        match self {
            Self::InteractiveMarkerInit => Self::INTERACTIVE_MARKER_INIT,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for MarkerKind {
    fn from(s: String) -> Self {
        if s == Self::INTERACTIVE_MARKER_INIT {
            Self::InteractiveMarkerInit
        } else {
            Self::Other(s)
        }
    }
}

impl From<&str> for MarkerKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<MarkerKind> for String {
    fn from(k: MarkerKind) -> Self {
        k.as_str().to_string()
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An annotated point; only labelled elements are drawn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerElement {
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MarkerElement {
    pub fn labelled(position: Vec3, label: impl Into<String>) -> Self {
        Self {
            position,
            label: Some(label.into()),
        }
    }

    /// The label, when present and non-empty.
    pub fn visible_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerControl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub elements: Vec<MarkerElement>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerGroup {
    #[serde(default)]
    pub name: String,
    /// Frame the group's element positions are expressed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default)]
    pub controls: Vec<MarkerControl>,
}

/// Wire payload delivered by a marker channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerPayload {
    #[serde(default)]
    pub groups: Vec<MarkerGroup>,
}

impl MarkerPayload {
    /// One group, one control, the given elements, all in `frame`.
    pub fn single(frame: impl Into<String>, elements: Vec<MarkerElement>) -> Self {
        Self {
            groups: vec![MarkerGroup {
                name: String::new(),
                frame_id: Some(frame.into()),
                controls: vec![MarkerControl {
                    name: String::new(),
                    elements,
                }],
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Frame of the first group, when it names one.
    pub fn source_frame(&self) -> Option<&str> {
        self.groups
            .first()
            .and_then(|g| g.frame_id.as_deref())
            .filter(|f| !f.is_empty())
    }

    /// Leaf elements in group -> control -> element order.
    pub fn elements(&self) -> impl Iterator<Item = &MarkerElement> {
        self.groups
            .iter()
            .flat_map(|g| g.controls.iter())
            .flat_map(|c| c.elements.iter())
    }
}

/// A payload accepted into the active set, stamped with its channel's kind and resolved frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerMessage {
    pub kind: MarkerKind,
    pub source_frame: String,
    pub channel: String,
    pub payload: MarkerPayload,
}

/// Kind-unique collection of active messages, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct ActiveMarkerSet {
    entries: Vec<MarkerMessage>,
}

impl ActiveMarkerSet {
    /// Insert `msg`, evicting any entry of the same kind first. Returns the evicted entry.
    pub fn insert(&mut self, msg: MarkerMessage) -> Option<MarkerMessage> {
        let evicted = self
            .entries
            .iter()
            .position(|m| m.kind == msg.kind)
            .map(|i| self.entries.remove(i));
        self.entries.push(msg);
        evicted
    }

    pub fn get(&self, kind: &MarkerKind) -> Option<&MarkerMessage> {
        self.entries.iter().find(|m| &m.kind == kind)
    }

    /// Drop every message that arrived on `channel`. Returns how many were removed.
    pub fn remove_channel(&mut self, channel: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|m| m.channel != channel);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerMessage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markers/message.rs"]
mod tests;
