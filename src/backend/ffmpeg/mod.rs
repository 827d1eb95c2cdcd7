//! Backend that builds `ffmpeg` filter graphs and encodes with the system `ffmpeg` binary.

pub(crate) mod graph;
pub(crate) mod probe;

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::backend::ffmpeg::graph::{FfmpegClip, FilterGraph};
use crate::backend::ffmpeg::probe::{probe_image, probe_media};
use crate::backend::media::{ClipSource, EncodeRequest, MediaBackend};
use crate::foundation::core::{Canvas, Rgb8, Timestamp};
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::ops::model::{Effect, MediaKind};

/// Options for [`FfmpegBackend`].
#[derive(Clone, Debug)]
pub struct FfmpegBackendOpts {
    /// `ffmpeg` program name or path.
    pub ffmpeg: String,
    /// `ffprobe` program name or path.
    pub ffprobe: String,
    /// Overwrite output files that already exist.
    pub overwrite: bool,
    /// Build and record encode commands without running them.
    pub dry_run: bool,
}

impl Default for FfmpegBackendOpts {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_owned(),
            ffprobe: "ffprobe".to_owned(),
            overwrite: true,
            dry_run: false,
        }
    }
}

/// A fully built `ffmpeg` invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct FfmpegCommand {
    /// Program to run.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<OsString>,
}

impl FfmpegCommand {
    /// Shell-like rendering for logs and dry runs. Arguments with spaces are quoted.
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| {
                let a = a.to_string_lossy();
                if a.contains(char::is_whitespace) || a.contains(';') {
                    format!("'{a}'")
                } else {
                    a.into_owned()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the encode command for `clip`.
pub fn build_encode_command(
    opts: &FfmpegBackendOpts,
    clip: &FfmpegClip,
    request: &EncodeRequest,
) -> VidmasterResult<FfmpegCommand> {
    if !clip.has_video() {
        return Err(VidmasterError::backend(
            "export needs a clip with a picture, got an audio-only clip",
        ));
    }
    if request.fps == 0 {
        return Err(VidmasterError::backend("export fps must be non-zero"));
    }
    let graph = FilterGraph::lower(clip)?;

    let mut args: Vec<OsString> = Vec::new();
    let mut push = |s: &str| args.push(s.into());
    push("-hide_banner");
    push("-loglevel");
    push("error");
    push(if opts.overwrite { "-y" } else { "-n" });

    for input in &graph.inputs {
        args.extend(input.pre_args.iter().map(OsString::from));
        args.push("-i".into());
        args.push(input.path.clone().into_os_string());
    }

    args.push("-filter_complex".into());
    args.push(graph.filter_complex().into());
    for label in graph.video.iter().chain(graph.audio.iter()) {
        args.push("-map".into());
        args.push(format!("[{label}]").into());
    }
    if graph.audio.is_none() {
        args.push("-an".into());
    }

    args.extend(
        [
            "-r".to_owned(),
            request.fps.to_string(),
            "-c:v".to_owned(),
            request.codec.clone(),
            "-preset".to_owned(),
            request.preset.clone(),
        ]
        .map(OsString::from),
    );
    if let Some(threads) = request.threads {
        args.push("-threads".into());
        args.push(threads.to_string().into());
    }
    args.extend(request.extra_params.iter().map(OsString::from));
    args.push(request.destination.clone().into_os_string());

    Ok(FfmpegCommand {
        program: opts.ffmpeg.clone(),
        args,
    })
}

/// Backend that represents clips as filter-graph nodes and shells out to `ffmpeg` on export.
///
/// Sources are probed when defined (`ffprobe` for audio/video, the image header for images), so
/// missing or undecodable files fail at their `define` block rather than at export.
#[derive(Debug, Default)]
pub struct FfmpegBackend {
    opts: FfmpegBackendOpts,
    commands: Vec<FfmpegCommand>,
}

impl FfmpegBackend {
    /// Create a backend with `opts`.
    pub fn new(opts: FfmpegBackendOpts) -> Self {
        Self {
            opts,
            commands: Vec::new(),
        }
    }

    /// Every encode command built so far, in export order.
    pub fn commands(&self) -> &[FfmpegCommand] {
        &self.commands
    }

    fn run(&self, cmd: &FfmpegCommand, destination: &Path) -> VidmasterResult<()> {
        ensure_parent_dir(destination)?;
        if !self.opts.overwrite && destination.exists() {
            return Err(VidmasterError::backend(format!(
                "output file '{}' already exists",
                destination.display()
            )));
        }
        if !is_program_on_path(&self.opts.ffmpeg) {
            return Err(VidmasterError::backend(format!(
                "{} is required for export, but was not found on PATH",
                self.opts.ffmpeg
            )));
        }

        let out = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                VidmasterError::backend(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    cmd.program
                ))
            })?;
        if !out.status.success() {
            return Err(VidmasterError::backend(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl MediaBackend for FfmpegBackend {
    type Clip = FfmpegClip;

    fn construct(&mut self, source: &ClipSource) -> VidmasterResult<FfmpegClip> {
        let path = &source.path;
        if !path.is_file() {
            return Err(VidmasterError::backend(format!(
                "source file '{}' does not exist",
                path.display()
            )));
        }

        let clip = match source.kind {
            MediaKind::Image => {
                let size = probe_image(path)?;
                let duration = source.duration.ok_or_else(|| {
                    VidmasterError::backend(format!(
                        "image clip '{}' needs a duration or duration_from",
                        path.display()
                    ))
                })?;
                FfmpegClip::source(
                    MediaKind::Image,
                    path.clone(),
                    Some(duration),
                    Some(duration),
                    false,
                    Some(size),
                )
            }
            MediaKind::Video => {
                let probe = probe_media(&self.opts.ffprobe, path)?;
                if !probe.has_video {
                    return Err(VidmasterError::backend(format!(
                        "'{}' has no video stream",
                        path.display()
                    )));
                }
                if source.has_audio && !probe.has_audio {
                    tracing::warn!(path = %path.display(), "hasaudio is set but the source has no audio stream");
                }
                FfmpegClip::source(
                    MediaKind::Video,
                    path.clone(),
                    source.duration,
                    source.duration.or(probe.duration),
                    source.has_audio && probe.has_audio,
                    probe.size,
                )
            }
            MediaKind::Audio => {
                let probe = probe_media(&self.opts.ffprobe, path)?;
                if !probe.has_audio {
                    return Err(VidmasterError::backend(format!(
                        "'{}' has no audio stream",
                        path.display()
                    )));
                }
                FfmpegClip::source(
                    MediaKind::Audio,
                    path.clone(),
                    source.duration,
                    source.duration.or(probe.duration),
                    true,
                    None,
                )
            }
        };
        tracing::debug!(
            path = %path.display(),
            duration = ?clip.duration(),
            size = ?clip.size(),
            audio = clip.has_audio(),
            "opened source"
        );
        Ok(clip)
    }

    fn duration(&self, clip: &FfmpegClip) -> VidmasterResult<Option<f64>> {
        Ok(clip.duration())
    }

    fn apply_effect(&mut self, clip: &FfmpegClip, effect: &Effect) -> VidmasterResult<FfmpegClip> {
        match *effect {
            Effect::Resize { height, width } => clip.scale(width, height),
            Effect::Position { x, y } => clip.offset_by(x, y),
            Effect::Margin(m) => clip.pad(
                m.size.unwrap_or(0),
                Rgb8 {
                    r: m.red.unwrap_or(0),
                    g: m.green.unwrap_or(0),
                    b: m.blue.unwrap_or(0),
                },
                m.opacity.unwrap_or(1),
            ),
        }
    }

    fn concatenate(&mut self, clips: &[FfmpegClip]) -> VidmasterResult<FfmpegClip> {
        FfmpegClip::concat(clips)
    }

    fn composite(
        &mut self,
        layers: &[FfmpegClip],
        size: Option<Canvas>,
    ) -> VidmasterResult<FfmpegClip> {
        FfmpegClip::overlay(layers, size)
    }

    fn attach_audio(
        &mut self,
        clip: &FfmpegClip,
        audio: &FfmpegClip,
    ) -> VidmasterResult<FfmpegClip> {
        clip.with_audio(audio)
    }

    fn extract_range(
        &mut self,
        clip: &FfmpegClip,
        start: Timestamp,
        end: Option<Timestamp>,
    ) -> VidmasterResult<FfmpegClip> {
        clip.trim(start.as_secs_f64(), end.map(Timestamp::as_secs_f64))
    }

    fn encode(&mut self, clip: &FfmpegClip, request: &EncodeRequest) -> VidmasterResult<()> {
        let cmd = build_encode_command(&self.opts, clip, request)?;
        tracing::debug!(command = %cmd.display(), "encode command");
        if !self.opts.dry_run {
            self.run(&cmd, &request.destination)?;
        }
        self.commands.push(cmd);
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> VidmasterResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `program -version` can be invoked.
pub fn is_program_on_path(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when both `ffmpeg` and `ffprobe` from `opts` can be invoked.
pub fn tools_available(opts: &FfmpegBackendOpts) -> bool {
    is_program_on_path(&opts.ffmpeg) && is_program_on_path(&opts.ffprobe)
}

#[cfg(test)]
#[path = "../../../tests/unit/backend/ffmpeg.rs"]
mod tests;
