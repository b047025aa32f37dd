pub(crate) mod notify;
pub(crate) mod options;
pub(crate) mod schedule;
pub(crate) mod source;
pub(crate) mod stream_viewer;
