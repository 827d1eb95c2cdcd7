//! Media backends.
//!
//! [`MediaBackend`](crate::MediaBackend) is the seam between the workbench and whatever performs
//! decoding, compositing and encoding. Two implementations ship with the crate:
//!
//! - [`FfmpegBackend`](crate::FfmpegBackend) keeps clips as filter-graph nodes and runs the
//!   system `ffmpeg` once per export.
//! - [`RecordingBackend`](crate::RecordingBackend) records calls and never touches media.

pub(crate) mod ffmpeg;
pub(crate) mod media;
pub(crate) mod recording;
