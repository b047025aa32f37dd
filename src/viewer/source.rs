use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::OverlayResult;
use crate::viewer::options::ViewerOptions;

/// Address of one MJPEG stream on the stream server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamUri {
    pub host: String,
    pub port: u16,
    pub stream_id: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub invert: bool,
    pub cache_buster: Option<String>,
}

impl StreamUri {
    pub fn new(options: &ViewerOptions, stream_id: impl Into<String>) -> Self {
        Self {
            host: options.host.clone(),
            port: options.port,
            stream_id: stream_id.into(),
            width: options.width,
            height: options.height,
            quality: options.quality,
            invert: options.invert,
            cache_buster: None,
        }
    }

    pub fn with_cache_buster(mut self, token: impl Into<String>) -> Self {
        self.cache_buster = Some(token.into());
        self
    }
}

impl fmt::Display for StreamUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "http://{}:{}/stream?topic={}&width={}&height={}",
            self.host, self.port, self.stream_id, self.width, self.height
        )?;
        if self.quality > 0 {
            write!(f, "&quality={}", self.quality)?;
        }
        if self.invert {
            f.write_str("&invert=true")?;
        }
        if let Some(token) = &self.cache_buster {
            write!(f, "&cachebust={token}")?;
        }
        Ok(())
    }
}

/// Polled source of the latest decoded stream frame.
///
/// A source that never loads keeps returning `None` (or a zero-area frame).
pub trait ImageSource {
    fn frame(&self) -> Option<PreparedImage>;
}

pub trait ImageSourceFactory {
    fn open(&mut self, uri: &StreamUri) -> Box<dyn ImageSource>;
}

/// Source holding one fixed frame.
#[derive(Clone, Debug, Default)]
pub struct StaticImageSource {
    frame: Option<PreparedImage>,
}

impl StaticImageSource {
    pub fn new(frame: Option<PreparedImage>) -> Self {
        Self { frame }
    }
}

impl ImageSource for StaticImageSource {
    fn frame(&self) -> Option<PreparedImage> {
        self.frame.clone()
    }
}

/// Factory serving fixed frames keyed by stream id. Unknown ids open an empty source.
#[derive(Clone, Debug, Default)]
pub struct StaticImageFactory {
    frames: HashMap<String, PreparedImage>,
}

impl StaticImageFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, stream_id: impl Into<String>, frame: PreparedImage) -> Self {
        self.frames.insert(stream_id.into(), frame);
        self
    }
}

impl ImageSourceFactory for StaticImageFactory {
    fn open(&mut self, uri: &StreamUri) -> Box<dyn ImageSource> {
        Box::new(StaticImageSource::new(
            self.frames.get(&uri.stream_id).cloned(),
        ))
    }
}

const FILE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Factory that maps a stream id to an image file under `root`.
///
/// `/camera/image_raw` resolves to `camera_image_raw.{png,jpg,jpeg}`. Files are decoded once per
/// `open`; a missing or undecodable file yields a permanently empty source.
#[derive(Clone, Debug)]
pub struct FileImageFactory {
    root: PathBuf,
}

impl FileImageFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(stream_id: &str) -> String {
        let stem: String = stream_id
            .trim_matches('/')
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            "stream".to_string()
        } else {
            stem
        }
    }

    /// First existing candidate file for `stream_id`.
    pub fn resolve(&self, stream_id: &str) -> Option<PathBuf> {
        let stem = Self::file_stem(stream_id);
        FILE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
    }

    fn load(&self, stream_id: &str) -> OverlayResult<Option<PreparedImage>> {
        let Some(path) = self.resolve(stream_id) else {
            return Ok(None);
        };
        let bytes =
            std::fs::read(&path).with_context(|| format!("read frame '{}'", path.display()))?;
        decode_image(&bytes).map(Some)
    }
}

impl ImageSourceFactory for FileImageFactory {
    fn open(&mut self, uri: &StreamUri) -> Box<dyn ImageSource> {
        let frame = match self.load(&uri.stream_id) {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                tracing::warn!(stream = %uri.stream_id, root = %self.root.display(), "no frame file for stream");
                None
            }
            Err(e) => {
                tracing::warn!(stream = %uri.stream_id, error = %e, "failed to load frame file");
                None
            }
        };
        Box::new(StaticImageSource::new(frame))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/source.rs"]
mod tests;
