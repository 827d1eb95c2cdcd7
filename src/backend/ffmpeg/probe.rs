use std::path::Path;

use crate::foundation::core::Canvas;
use crate::foundation::error::{VidmasterError, VidmasterResult};

/// Stream layout and duration of a media file, as reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds.
    pub duration: Option<f64>,
    /// Size of the first video stream.
    pub size: Option<Canvas>,
    /// At least one video stream is present.
    pub has_video: bool,
    /// At least one audio stream is present.
    pub has_audio: bool,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe `source_path` with the `ffprobe` program.
pub fn probe_media(ffprobe: &str, source_path: &Path) -> VidmasterResult<MediaProbe> {
    let out = std::process::Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| VidmasterError::backend(format!("failed to run {ffprobe}: {e}")))?;
    if !out.status.success() {
        return Err(VidmasterError::backend(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(bytes: &[u8]) -> VidmasterResult<MediaProbe> {
    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| VidmasterError::backend(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let size = video.and_then(|s| match (s.width, s.height) {
        (Some(width), Some(height)) => Some(Canvas { width, height }),
        _ => None,
    });
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(MediaProbe {
        duration,
        size,
        has_video: video.is_some(),
        has_audio,
    })
}

/// Read the pixel size of an image without decoding it fully.
pub fn probe_image(source_path: &Path) -> VidmasterResult<Canvas> {
    let (width, height) = image::image_dimensions(source_path).map_err(|e| {
        VidmasterError::backend(format!(
            "cannot read image '{}': {e}",
            source_path.display()
        ))
    })?;
    Ok(Canvas { width, height })
}

#[cfg(test)]
#[path = "../../../tests/unit/backend/probe.rs"]
mod tests;
