//! stream-overlay renders a live camera stream with projected 3D marker labels on top.
//!
//! A [`StreamViewer`] owns two CPU surfaces: the primary one shows the latest frame of the
//! selected stream (or a placeholder when the stream has nothing to show), the overlay one shows
//! the labels of the active interactive markers, projected through the poses of their frames.
//! Both are composited into a presented [`FrameRGBA`] on every tick.
//!
//! - Inject an [`ImageSourceFactory`], a [`TransformProvider`] and a [`MarkerChannelProvider`]
//! - Providers push [`Update`]s through an [`UpdateSink`]; the viewer applies them between ticks
//! - Drive it with [`StreamViewer::step`] / [`StreamViewer::run_until`], or replay a [`Scene`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod markers;
pub(crate) mod render;
pub mod replay;
pub mod scene;
pub(crate) mod tf;
pub mod updates;
pub(crate) mod viewer;

pub use crate::assets::decode::{PreparedImage, decode_image};
pub use crate::assets::text::TextBrushRgba8;
pub use crate::foundation::core::{Affine, Canvas, Point, Pose, Rect, Vec2, Vec3};
pub use crate::foundation::error::{OverlayError, OverlayResult};

pub use crate::markers::manager::{
    ChannelSpec, DEFAULT_THROTTLE_RATE_MS, DropReason, MarkerChannelProvider,
    MarkerStreamManager, NullMarkerProvider, PayloadOutcome,
};
pub use crate::markers::message::{
    ActiveMarkerSet, MarkerControl, MarkerElement, MarkerGroup, MarkerKind, MarkerMessage,
    MarkerPayload,
};
pub use crate::render::backend::FrameRGBA;
pub use crate::render::overlay::{LabelOp, OverlayPlan, compile_overlay, label_font_size};
pub use crate::render::projection::{Projected, project};
pub use crate::replay::{ReplayMarkerProvider, ReplayTransformProvider};
pub use crate::scene::{Scene, SceneChannel, ScenePose, SceneSwitch};
pub use crate::tf::tracker::{
    NullTransformProvider, TrackedFrame, TransformFrameTracker, TransformProvider,
};
pub use crate::updates::{Update, UpdateSink};
pub use crate::viewer::notify::{INVALID_STREAM, ViewerEvent};
pub use crate::viewer::options::{StreamEntry, ViewerOptions};
pub use crate::viewer::schedule::{MAX_TICK_PERIOD, TickSchedule, tick_period};
pub use crate::viewer::source::{
    FileImageFactory, ImageSource, ImageSourceFactory, StaticImageFactory, StaticImageSource,
    StreamUri,
};
pub use crate::viewer::stream_viewer::{PrimaryContent, StreamViewer, TickReport, ViewerState};
