/// Reason attached to the warning raised when a stream yields no frame.
pub const INVALID_STREAM: &str = "Invalid stream";

/// Notification delivered to observers registered with [`crate::StreamViewer::on_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The active stream changed.
    Changed { stream_id: String },
    /// Something went wrong during a tick; the viewer keeps running.
    Warning { reason: String },
}

type Handler = Box<dyn FnMut(&ViewerEvent)>;

#[derive(Default)]
pub(crate) struct Notifier {
    handlers: Vec<Handler>,
}

impl Notifier {
    pub(crate) fn subscribe(&mut self, handler: impl FnMut(&ViewerEvent) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub(crate) fn emit(&mut self, event: &ViewerEvent) {
        for h in &mut self.handlers {
            h(event);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
