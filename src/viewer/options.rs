use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{OverlayError, OverlayResult};
use crate::viewer::schedule::tick_period;

/// One selectable stream, as offered to an external stream selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Viewer configuration. Every field has a default, so a partial JSON object is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    pub width: u32,
    pub height: u32,
    /// Stream server host.
    pub host: String,
    pub port: u16,
    /// Requested JPEG quality, 1-100. `0` leaves it to the server.
    pub quality: u8,
    pub refresh_rate_hz: f64,
    /// Lower bound on the tick period, in milliseconds.
    pub interval_ms: u64,
    /// Ask the server for an inverted image.
    pub invert: bool,
    /// Frame every marker pose is expressed against; tracked from construction.
    pub base_frame: String,
    /// Initial stream. Falls back to `streams[default_stream]`.
    pub stream_id: Option<String>,
    pub streams: Vec<StreamEntry>,
    pub default_stream: usize,
    /// Re-issue the stream URI with a fresh cache-busting parameter after every tick.
    pub cache_bust: bool,
    /// Drop a channel's markers when it is unsubscribed instead of keeping the last ones.
    pub purge_on_unsubscribe: bool,
    pub overlay_opacity: f32,
    /// Straight RGBA8 label color.
    pub label_rgba: [u8; 4],
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            host: "localhost".to_string(),
            port: 8080,
            quality: 0,
            refresh_rate_hz: 10.0,
            interval_ms: 30,
            invert: false,
            base_frame: "arm_mount_plate_link".to_string(),
            stream_id: None,
            streams: Vec::new(),
            default_stream: 0,
            cache_bust: false,
            purge_on_unsubscribe: false,
            overlay_opacity: 1.0,
            label_rgba: [255, 255, 255, 255],
        }
    }
}

impl ViewerOptions {
    pub fn from_json_str(s: &str) -> OverlayResult<Self> {
        serde_json::from_str(s).map_err(|e| OverlayError::serde(e.to_string()))
    }

    pub fn from_reader(r: impl Read) -> OverlayResult<Self> {
        serde_json::from_reader(r).map_err(|e| OverlayError::serde(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OverlayError::validation(format!("open viewer options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the options and return the surface size.
    pub fn validate(&self) -> OverlayResult<Canvas> {
        let canvas = Canvas::new(self.width, self.height)?;
        if !self.refresh_rate_hz.is_finite() || self.refresh_rate_hz <= 0.0 {
            return Err(OverlayError::validation(
                "refresh_rate_hz must be finite and > 0",
            ));
        }
        if self.quality > 100 {
            return Err(OverlayError::validation("quality must be within 0..=100"));
        }
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(OverlayError::validation(
                "overlay_opacity must be within 0..=1",
            ));
        }
        if self.host.trim().is_empty() {
            return Err(OverlayError::validation("host must be non-empty"));
        }
        if self.base_frame.is_empty() {
            return Err(OverlayError::validation("base_frame must be non-empty"));
        }
        if !self.streams.is_empty() && self.default_stream >= self.streams.len() {
            return Err(OverlayError::validation(format!(
                "default_stream {} out of range for {} streams",
                self.default_stream,
                self.streams.len()
            )));
        }
        Ok(canvas)
    }

    /// Stream to start with, if any.
    pub fn initial_stream(&self) -> Option<&str> {
        self.stream_id
            .as_deref()
            .or_else(|| self.streams.get(self.default_stream).map(|s| s.id.as_str()))
    }

    pub fn tick_period(&self) -> Duration {
        tick_period(self.refresh_rate_hz, self.interval_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/options.rs"]
mod tests;
