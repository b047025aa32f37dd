use std::time::Duration;

use crate::assets::decode::PreparedImage;
use crate::assets::placeholder::placeholder_image;
use crate::assets::text::TextBrushRgba8;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::OverlayResult;
use crate::markers::manager::{ChannelSpec, MarkerChannelProvider, MarkerStreamManager};
use crate::markers::message::{ActiveMarkerSet, MarkerKind};
use crate::render::backend::FrameRGBA;
use crate::render::composite::over_in_place;
use crate::render::cpu::{CpuRasterizer, clear_pixmap_to_transparent, new_pixmap};
use crate::render::overlay::{OverlayPlan, OverlayRenderer};
use crate::tf::tracker::{TransformFrameTracker, TransformProvider};
use crate::updates::{Update, UpdateQueue, UpdateSink, update_channel};
use crate::viewer::notify::{INVALID_STREAM, Notifier, ViewerEvent};
use crate::viewer::options::{StreamEntry, ViewerOptions};
use crate::viewer::schedule::TickSchedule;
use crate::viewer::source::{ImageSource, ImageSourceFactory, StreamUri};

/// Providers may enqueue more updates while earlier ones are applied (a newly referenced frame
/// subscribes and replays its pose). Pumping stops after this many rounds.
const MAX_PUMP_ROUNDS: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Streaming { stream_id: String },
    Disposed,
}

/// What ended up on the primary surface during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryContent {
    Stream,
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based tick counter.
    pub tick: u64,
    pub primary: PrimaryContent,
    /// Labels planned on the overlay this tick.
    pub labels: usize,
}

/// Live camera viewer: one primary surface showing the stream (or a placeholder), one overlay
/// surface with projected marker labels, composited into a presented frame every tick.
pub struct StreamViewer {
    options: ViewerOptions,
    canvas: Canvas,
    state: ViewerState,
    uri: Option<StreamUri>,
    source: Option<Box<dyn ImageSource>>,
    factory: Box<dyn ImageSourceFactory>,
    tracker: TransformFrameTracker,
    markers: MarkerStreamManager,
    overlay: OverlayRenderer,
    rasterizer: CpuRasterizer,
    primary: vello_cpu::Pixmap,
    placeholder: PreparedImage,
    composited: FrameRGBA,
    sink: UpdateSink,
    queue: UpdateQueue,
    notifier: Notifier,
    ticks: u64,
}

impl StreamViewer {
    pub fn new(
        options: ViewerOptions,
        images: Box<dyn ImageSourceFactory>,
        transforms: Box<dyn TransformProvider>,
        markers: Box<dyn MarkerChannelProvider>,
    ) -> OverlayResult<Self> {
        let canvas = options.validate()?;
        let (sink, queue) = update_channel();

        let mut tracker = TransformFrameTracker::new(transforms, sink.clone());
        tracker.register_frame(&options.base_frame);
        let markers = MarkerStreamManager::new(markers, sink.clone());

        let overlay =
            OverlayRenderer::with_system_font(canvas, TextBrushRgba8::from(options.label_rgba))?;
        let placeholder = placeholder_image((canvas.width / 2).max(1), (canvas.height / 2).max(1))?;

        let mut viewer = Self {
            canvas,
            state: ViewerState::Idle,
            uri: None,
            source: None,
            factory: images,
            tracker,
            markers,
            overlay,
            rasterizer: CpuRasterizer::new(),
            primary: new_pixmap(canvas)?,
            placeholder,
            composited: FrameRGBA::transparent(canvas.width, canvas.height),
            sink,
            queue,
            notifier: Notifier::default(),
            ticks: 0,
            options,
        };
        if let Some(id) = viewer.options.initial_stream().map(str::to_owned) {
            viewer.switch_stream(&id);
        }
        Ok(viewer)
    }

    /// Load a font (TTF/OTF bytes) used to rasterize overlay labels, replacing the system font.
    pub fn set_label_font(&mut self, font_bytes: Vec<u8>) -> OverlayResult<()> {
        self.overlay = OverlayRenderer::new(
            self.canvas,
            Some(font_bytes),
            TextBrushRgba8::from(self.options.label_rgba),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn switch_stream(&mut self, stream_id: &str) {
        if self.state == ViewerState::Disposed {
            tracing::warn!("switch_stream ignored: viewer disposed");
            return;
        }
        let uri = StreamUri::new(&self.options, stream_id);
        tracing::debug!(uri = %uri, "opening stream");
        self.source = Some(self.factory.open(&uri));
        self.uri = Some(uri);
        self.state = ViewerState::Streaming {
            stream_id: stream_id.to_string(),
        };
        self.notifier.emit(&ViewerEvent::Changed {
            stream_id: stream_id.to_string(),
        });
    }

    /// Draw one frame. Failures never escape: they become a warning and a placeholder.
    ///
    /// Returns `None` once the viewer is disposed.
    #[tracing::instrument(level = "debug", skip(self), fields(tick = self.ticks + 1))]
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.state == ViewerState::Disposed {
            return None;
        }
        self.ticks += 1;

        clear_pixmap_to_transparent(&mut self.primary);
        let primary = match self.draw_primary() {
            Ok(PrimaryContent::Stream) => PrimaryContent::Stream,
            Ok(PrimaryContent::Placeholder) => {
                tracing::debug!("stream has no frame; drawing placeholder");
                self.warn(INVALID_STREAM.to_string());
                PrimaryContent::Placeholder
            }
            Err(e) => {
                tracing::warn!(error = %e, "primary draw failed");
                self.warn(e.to_string());
                self.draw_placeholder_or_clear();
                PrimaryContent::Placeholder
            }
        };

        let labels = match self.compose() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "overlay composite failed");
                self.warn(e.to_string());
                self.composited
                    .data
                    .copy_from_slice(self.primary.data_as_u8_slice());
                0
            }
        };

        if self.options.cache_bust {
            self.reopen_with_cache_buster();
        }

        Some(TickReport {
            tick: self.ticks,
            primary,
            labels,
        })
    }

    fn draw_primary(&mut self) -> OverlayResult<PrimaryContent> {
        let frame = self
            .source
            .as_ref()
            .and_then(|s| s.frame())
            .filter(|f| !f.is_empty());
        match frame {
            Some(frame) => {
                let dest = Rect::new(
                    0.0,
                    0.0,
                    f64::from(self.canvas.width),
                    f64::from(self.canvas.height),
                );
                self.rasterizer.draw_image(&mut self.primary, &frame, dest)?;
                Ok(PrimaryContent::Stream)
            }
            None => {
                self.draw_placeholder()?;
                Ok(PrimaryContent::Placeholder)
            }
        }
    }

    fn placeholder_rect(&self) -> Rect {
        let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        let (pw, ph) = (
            f64::from(self.placeholder.width),
            f64::from(self.placeholder.height),
        );
        let x0 = (w - pw) / 2.0;
        let y0 = (h - ph) / 2.0;
        Rect::new(x0, y0, x0 + pw, y0 + ph)
    }

    fn draw_placeholder(&mut self) -> OverlayResult<()> {
        let dest = self.placeholder_rect();
        self.rasterizer
            .draw_image(&mut self.primary, &self.placeholder, dest)
    }

    fn draw_placeholder_or_clear(&mut self) {
        if let Err(e) = self.draw_placeholder() {
            tracing::warn!(error = %e, "placeholder draw failed");
            clear_pixmap_to_transparent(&mut self.primary);
        }
    }

    fn compose(&mut self) -> OverlayResult<usize> {
        let labels = self
            .overlay
            .render(self.markers.active(), &self.tracker)?
            .labels
            .len();
        self.composited
            .data
            .copy_from_slice(self.primary.data_as_u8_slice());
        over_in_place(
            &mut self.composited.data,
            self.overlay.surface_bytes(),
            self.options.overlay_opacity,
        )?;
        Ok(labels)
    }

    fn reopen_with_cache_buster(&mut self) {
        let Some(uri) = self.uri.take() else {
            return;
        };
        let uri = uri.with_cache_buster(format!("{:016x}", rand::random::<u64>()));
        self.source = Some(self.factory.open(&uri));
        self.uri = Some(uri);
    }

    fn warn(&mut self, reason: String) {
        self.notifier.emit(&ViewerEvent::Warning { reason });
    }

    /// Apply every queued provider update in arrival order; returns how many were applied.
    pub fn pump_updates(&mut self) -> usize {
        let mut applied = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let batch = self.queue.drain();
            if batch.is_empty() {
                break;
            }
            if self.state == ViewerState::Disposed {
                tracing::debug!(discarded = batch.len(), "viewer disposed; dropping updates");
                return 0;
            }
            applied += batch.len();
            for update in batch {
                self.apply_update(update);
            }
        }
        applied
    }

    pub fn apply_update(&mut self, update: Update) {
        if self.state == ViewerState::Disposed {
            return;
        }
        match update {
            Update::Transform { frame, pose } => {
                self.tracker.update_pose(&frame, pose);
            }
            Update::Markers { channel, payload } => {
                let outcome = self
                    .markers
                    .handle_payload(&channel, payload, &mut self.tracker);
                tracing::debug!(channel = %channel, ?outcome, "marker payload handled");
            }
        }
    }

    /// One scheduler step: pump updates, then tick.
    pub fn step(&mut self) -> Option<TickReport> {
        self.pump_updates();
        self.tick()
    }

    /// Drive [`StreamViewer::step`] at the tick period until `keep_going` returns false or the
    /// viewer is disposed.
    pub fn run_until(&mut self, mut keep_going: impl FnMut(&TickReport) -> bool) {
        let mut schedule = TickSchedule::new(self.tick_period());
        while let Some(report) = self.step() {
            if !keep_going(&report) {
                break;
            }
            schedule.wait();
        }
    }

    pub fn on_event(&mut self, handler: impl FnMut(&ViewerEvent) + 'static) {
        self.notifier.subscribe(handler);
    }

    pub fn subscribe_markers(&mut self, spec: ChannelSpec, kind: MarkerKind) -> OverlayResult<()> {
        self.markers.subscribe(spec, kind)
    }

    pub fn unsubscribe_markers(&mut self, channel: &str) -> bool {
        let was_subscribed = self.markers.unsubscribe(channel);
        if was_subscribed && self.options.purge_on_unsubscribe {
            let purged = self.markers.purge_channel(channel);
            tracing::debug!(channel, purged, "purged markers of unsubscribed channel");
        }
        was_subscribed
    }

    /// Stop ticking, unsubscribe every channel and drop queued updates.
    pub fn dispose(&mut self) {
        if self.state == ViewerState::Disposed {
            return;
        }
        self.state = ViewerState::Disposed;
        self.markers.unsubscribe_all();
        self.source = None;
        self.notifier.clear();
        let discarded = self.queue.drain().len();
        tracing::debug!(discarded, "viewer disposed");
    }

    /// Sender for pushing updates from outside a provider.
    pub fn update_sink(&self) -> UpdateSink {
        self.sink.clone()
    }

    pub fn tracker(&self) -> &TransformFrameTracker {
        &self.tracker
    }

    pub fn markers(&self) -> &MarkerStreamManager {
        &self.markers
    }

    pub fn active_markers(&self) -> &ActiveMarkerSet {
        self.markers.active()
    }

    pub fn overlay_plan(&self) -> &OverlayPlan {
        self.overlay.plan()
    }

    /// Last presented frame, premultiplied RGBA8.
    pub fn composited(&self) -> &FrameRGBA {
        &self.composited
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn current_stream(&self) -> Option<&str> {
        match &self.state {
            ViewerState::Streaming { stream_id } => Some(stream_id),
            _ => None,
        }
    }

    pub fn stream_uri(&self) -> Option<&StreamUri> {
        self.uri.as_ref()
    }

    pub fn streams(&self) -> &[StreamEntry] {
        &self.options.streams
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn tick_period(&self) -> Duration {
        self.options.tick_period()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for StreamViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamViewer")
            .field("canvas", &self.canvas)
            .field("state", &self.state)
            .field("uri", &self.uri.as_ref().map(ToString::to_string))
            .field("tracker", &self.tracker)
            .field("markers", &self.markers)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/stream_viewer.rs"]
mod tests;
