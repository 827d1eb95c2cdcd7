use std::path::{Path, PathBuf};

use crate::backend::media::{ClipSource, EncodeRequest, MediaBackend};
use crate::foundation::core::{Canvas, Timestamp};
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::ops::model::Effect;

/// Handle issued by [`RecordingBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedClip {
    /// Sequential id, starting at 0.
    pub id: usize,
    /// Tracked duration in seconds.
    pub duration: Option<f64>,
}

/// One call received by a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    /// `construct`
    Construct {
        /// Id of the new clip.
        id: usize,
        /// Source description.
        source: ClipSource,
    },
    /// `apply_effect`
    Effect {
        /// Id of the new clip.
        id: usize,
        /// Input clip id.
        input: usize,
        /// Effect applied.
        effect: Effect,
    },
    /// `concatenate`
    Concatenate {
        /// Id of the new clip.
        id: usize,
        /// Input clip ids in playback order.
        inputs: Vec<usize>,
    },
    /// `composite`
    Composite {
        /// Id of the new clip.
        id: usize,
        /// Layer clip ids in paint order.
        layers: Vec<usize>,
        /// Requested output size.
        size: Option<Canvas>,
    },
    /// `attach_audio`
    AttachAudio {
        /// Id of the new clip.
        id: usize,
        /// Picture clip id.
        clip: usize,
        /// Sound clip id.
        audio: usize,
    },
    /// `extract_range`
    ExtractRange {
        /// Id of the new clip.
        id: usize,
        /// Input clip id.
        input: usize,
        /// Range start.
        start: Timestamp,
        /// Range end.
        end: Option<Timestamp>,
    },
    /// `encode`
    Encode {
        /// Encoded clip id.
        clip: usize,
        /// Encoder settings.
        request: EncodeRequest,
    },
}

/// In-memory backend that records calls instead of processing media.
///
/// Used by `vidmaster check` to validate scripts without touching any file, and by tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_id: usize,
    fail_encode_to: Option<PathBuf>,
}

impl RecordingBackend {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `encode` fail for `destination`, as a disk or encoder failure would.
    pub fn fail_encode_to(mut self, destination: impl Into<PathBuf>) -> Self {
        self.fail_encode_to = Some(destination.into());
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Destinations of successful encodes, in order.
    pub fn encoded(&self) -> Vec<&Path> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Encode { request, .. } => Some(request.destination.as_path()),
                _ => None,
            })
            .collect()
    }

    fn issue(&mut self, duration: Option<f64>) -> RecordedClip {
        let clip = RecordedClip {
            id: self.next_id,
            duration,
        };
        self.next_id += 1;
        clip
    }
}

impl MediaBackend for RecordingBackend {
    type Clip = RecordedClip;

    fn construct(&mut self, source: &ClipSource) -> VidmasterResult<RecordedClip> {
        let clip = self.issue(source.duration);
        self.calls.push(BackendCall::Construct {
            id: clip.id,
            source: source.clone(),
        });
        Ok(clip)
    }

    fn duration(&self, clip: &RecordedClip) -> VidmasterResult<Option<f64>> {
        Ok(clip.duration)
    }

    fn apply_effect(
        &mut self,
        clip: &RecordedClip,
        effect: &Effect,
    ) -> VidmasterResult<RecordedClip> {
        let out = self.issue(clip.duration);
        self.calls.push(BackendCall::Effect {
            id: out.id,
            input: clip.id,
            effect: *effect,
        });
        Ok(out)
    }

    fn concatenate(&mut self, clips: &[RecordedClip]) -> VidmasterResult<RecordedClip> {
        let duration = clips.iter().map(|c| c.duration).sum::<Option<f64>>();
        let out = self.issue(duration);
        self.calls.push(BackendCall::Concatenate {
            id: out.id,
            inputs: clips.iter().map(|c| c.id).collect(),
        });
        Ok(out)
    }

    fn composite(
        &mut self,
        layers: &[RecordedClip],
        size: Option<Canvas>,
    ) -> VidmasterResult<RecordedClip> {
        let duration = layers
            .iter()
            .map(|c| c.duration)
            .collect::<Option<Vec<f64>>>()
            .and_then(|d| d.into_iter().reduce(f64::max));
        let out = self.issue(duration);
        self.calls.push(BackendCall::Composite {
            id: out.id,
            layers: layers.iter().map(|c| c.id).collect(),
            size,
        });
        Ok(out)
    }

    fn attach_audio(
        &mut self,
        clip: &RecordedClip,
        audio: &RecordedClip,
    ) -> VidmasterResult<RecordedClip> {
        let out = self.issue(clip.duration);
        self.calls.push(BackendCall::AttachAudio {
            id: out.id,
            clip: clip.id,
            audio: audio.id,
        });
        Ok(out)
    }

    fn extract_range(
        &mut self,
        clip: &RecordedClip,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> VidmasterResult<RecordedClip> {
        let start_secs = start.as_secs_f64();
        let duration = match end {
            Some(end) => Some((end.as_secs_f64() - start_secs).max(0.0)),
            None => clip.duration.map(|d| (d - start_secs).max(0.0)),
        };
        let out = self.issue(duration);
        self.calls.push(BackendCall::ExtractRange {
            id: out.id,
            input: clip.id,
            start,
            end,
        });
        Ok(out)
    }

    fn encode(&mut self, clip: &RecordedClip, request: &EncodeRequest) -> VidmasterResult<()> {
        if self.fail_encode_to.as_deref() == Some(request.destination.as_path()) {
            return Err(VidmasterError::backend(format!(
                "cannot write '{}'",
                request.destination.display()
            )));
        }
        self.calls.push(BackendCall::Encode {
            clip: clip.id,
            request: request.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/recording.rs"]
mod tests;
