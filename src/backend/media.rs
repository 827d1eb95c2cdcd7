use std::fmt;
use std::path::PathBuf;

use crate::foundation::core::{Canvas, Timestamp};
use crate::foundation::error::VidmasterResult;
use crate::ops::model::{Effect, MediaKind};

/// Everything a backend needs to open a source clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipSource {
    /// Audio, image or video.
    pub kind: MediaKind,
    /// Resolved source path.
    pub path: PathBuf,
    /// Duration in seconds, already resolved from `duration`/`duration_from`.
    pub duration: Option<f64>,
    /// Keep the source's audio track (video only).
    pub has_audio: bool,
}

/// Encoder settings for one export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Resolved output path.
    pub destination: PathBuf,
    /// Output frame rate.
    pub fps: u32,
    /// Video codec name.
    pub codec: String,
    /// Encoder preset.
    pub preset: String,
    /// Encoder thread count.
    pub threads: Option<u32>,
    /// Extra encoder arguments, appended verbatim.
    pub extra_params: Vec<String>,
}

/// Media-processing backend driven by the workbench.
///
/// Handles are opaque to the workbench: it only stores them in the registry and hands them back.
/// Calls arrive strictly in script order and each one blocks until done.
pub trait MediaBackend {
    /// Opaque clip handle.
    type Clip: Clone + fmt::Debug;

    /// Open a source clip.
    fn construct(&mut self, source: &ClipSource) -> VidmasterResult<Self::Clip>;

    /// Duration of `clip` in seconds, when known.
    fn duration(&self, clip: &Self::Clip) -> VidmasterResult<Option<f64>>;

    /// Apply a single-clip effect.
    fn apply_effect(&mut self, clip: &Self::Clip, effect: &Effect) -> VidmasterResult<Self::Clip>;

    /// Play `clips` back to back, in slice order.
    fn concatenate(&mut self, clips: &[Self::Clip]) -> VidmasterResult<Self::Clip>;

    /// Layer `layers` on one canvas. Index 0 is painted first (bottom-most).
    fn composite(
        &mut self,
        layers: &[Self::Clip],
        size: Option<Canvas>,
    ) -> VidmasterResult<Self::Clip>;

    /// Replace the audio of `clip` with the audio of `audio`.
    fn attach_audio(&mut self, clip: &Self::Clip, audio: &Self::Clip)
    -> VidmasterResult<Self::Clip>;

    /// Cut `[start, end)` out of `clip`; `None` runs to its natural end.
    fn extract_range(
        &mut self,
        clip: &Self::Clip,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> VidmasterResult<Self::Clip>;

    /// Encode `clip` to `request.destination`.
    fn encode(&mut self, clip: &Self::Clip, request: &EncodeRequest) -> VidmasterResult<()>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for &mut B {
    type Clip = B::Clip;

    fn construct(&mut self, source: &ClipSource) -> VidmasterResult<Self::Clip> {
        (**self).construct(source)
    }

    fn duration(&self, clip: &Self::Clip) -> VidmasterResult<Option<f64>> {
        (**self).duration(clip)
    }

    fn apply_effect(&mut self, clip: &Self::Clip, effect: &Effect) -> VidmasterResult<Self::Clip> {
        (**self).apply_effect(clip, effect)
    }

    fn concatenate(&mut self, clips: &[Self::Clip]) -> VidmasterResult<Self::Clip> {
        (**self).concatenate(clips)
    }

    fn composite(
        &mut self,
        layers: &[Self::Clip],
        size: Option<Canvas>,
    ) -> VidmasterResult<Self::Clip> {
        (**self).composite(layers, size)
    }

    fn attach_audio(
        &mut self,
        clip: &Self::Clip,
        audio: &Self::Clip,
    ) -> VidmasterResult<Self::Clip> {
        (**self).attach_audio(clip, audio)
    }

    fn extract_range(
        &mut self,
        clip: &Self::Clip,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> VidmasterResult<Self::Clip> {
        (**self).extract_range(clip, start, end)
    }

    fn encode(&mut self, clip: &Self::Clip, request: &EncodeRequest) -> VidmasterResult<()> {
        (**self).encode(clip, request)
    }
}
