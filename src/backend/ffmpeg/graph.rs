//! Clip handles as immutable filter-graph nodes, and their lowering to `-filter_complex`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::ops::model::MediaKind;

/// Sample layout used for generated silence.
const SILENCE_SRC: &str = "anullsrc=channel_layout=stereo:sample_rate=44100";

#[derive(Debug)]
pub(crate) enum ClipNode {
    Source {
        kind: MediaKind,
        path: PathBuf,
        // Passed as `-t`; unset for sources that play to their natural end.
        limit: Option<f64>,
    },
    Scale {
        input: FfmpegClip,
        width: Option<u32>,
        height: Option<u32>,
    },
    Pad {
        input: FfmpegClip,
        size: u32,
        color: Rgb8,
        opacity: u32,
    },
    // Only changes where the clip lands in a composite.
    Offset {
        input: FfmpegClip,
    },
    Concat {
        inputs: Vec<FfmpegClip>,
    },
    Overlay {
        layers: Vec<FfmpegClip>,
        size: Canvas,
    },
    SetAudio {
        video: FfmpegClip,
        audio: FfmpegClip,
    },
    Trim {
        input: FfmpegClip,
        start: f64,
        end: Option<f64>,
    },
}

#[derive(Debug)]
struct ClipInfo {
    node: ClipNode,
    has_video: bool,
    has_audio: bool,
    duration: Option<f64>,
    size: Option<Canvas>,
    offset: (u32, u32),
}

/// Clip handle of the ffmpeg backend.
///
/// Cloning is cheap; a node is released once no registry entry or other node refers to it.
#[derive(Clone, Debug)]
pub struct FfmpegClip(Arc<ClipInfo>);

impl FfmpegClip {
    /// Clip exposes a picture.
    pub fn has_video(&self) -> bool {
        self.0.has_video
    }

    /// Clip exposes a sound track.
    pub fn has_audio(&self) -> bool {
        self.0.has_audio
    }

    /// Duration in seconds, when known.
    pub fn duration(&self) -> Option<f64> {
        self.0.duration
    }

    /// Picture size, when known.
    pub fn size(&self) -> Option<Canvas> {
        self.0.size
    }

    /// Top-left position used when this clip is a composite layer.
    pub fn offset(&self) -> (u32, u32) {
        self.0.offset
    }

    /// `limit` cuts the source at that many seconds; `duration` is what the clip then lasts.
    pub(crate) fn source(
        kind: MediaKind,
        path: PathBuf,
        limit: Option<f64>,
        duration: Option<f64>,
        has_audio: bool,
        size: Option<Canvas>,
    ) -> Self {
        Self(Arc::new(ClipInfo {
            has_video: kind != MediaKind::Audio,
            has_audio,
            duration,
            size,
            offset: (0, 0),
            node: ClipNode::Source { kind, path, limit },
        }))
    }

    pub(crate) fn scale(&self, width: Option<u32>, height: Option<u32>) -> VidmasterResult<Self> {
        self.require_video("resize")?;
        let size = match (width, height, self.size()) {
            (Some(width), Some(height), _) => Some(Canvas { width, height }),
            (Some(width), None, Some(cur)) if cur.width > 0 => Some(Canvas {
                width,
                height: scale_even(cur.height, width, cur.width),
            }),
            (None, Some(height), Some(cur)) if cur.height > 0 => Some(Canvas {
                width: scale_even(cur.width, height, cur.height),
                height,
            }),
            (None, None, cur) => cur,
            _ => None,
        };
        Ok(self.derive(
            ClipNode::Scale {
                input: self.clone(),
                width,
                height,
            },
            |info| info.size = size,
        ))
    }

    pub(crate) fn pad(&self, size: u32, color: Rgb8, opacity: u32) -> VidmasterResult<Self> {
        self.require_video("margin")?;
        let grown = self.size().map(|c| Canvas {
            width: c.width.saturating_add(size.saturating_mul(2)),
            height: c.height.saturating_add(size.saturating_mul(2)),
        });
        Ok(self.derive(
            ClipNode::Pad {
                input: self.clone(),
                size,
                color,
                opacity,
            },
            |info| info.size = grown,
        ))
    }

    pub(crate) fn offset_by(&self, x: Option<u32>, y: Option<u32>) -> VidmasterResult<Self> {
        self.require_video("position")?;
        let (cur_x, cur_y) = self.offset();
        let offset = (x.unwrap_or(cur_x), y.unwrap_or(cur_y));
        Ok(self.derive(
            ClipNode::Offset {
                input: self.clone(),
            },
            |info| info.offset = offset,
        ))
    }

    pub(crate) fn concat(inputs: &[FfmpegClip]) -> VidmasterResult<Self> {
        let first = inputs
            .first()
            .ok_or_else(|| VidmasterError::backend("concatenate needs at least one clip"))?;
        if inputs.iter().any(|c| c.has_video() != first.has_video()) {
            return Err(VidmasterError::backend(
                "concatenate cannot mix audio-only clips with picture clips",
            ));
        }
        let duration = inputs.iter().map(FfmpegClip::duration).sum::<Option<f64>>();
        Ok(Self(Arc::new(ClipInfo {
            has_video: first.has_video(),
            has_audio: inputs.iter().any(FfmpegClip::has_audio),
            duration,
            size: first.size(),
            offset: (0, 0),
            node: ClipNode::Concat {
                inputs: inputs.to_vec(),
            },
        })))
    }

    pub(crate) fn overlay(layers: &[FfmpegClip], size: Option<Canvas>) -> VidmasterResult<Self> {
        if layers.is_empty() {
            return Err(VidmasterError::backend(
                "composition needs at least one clip",
            ));
        }
        let size = size
            .or_else(|| layers.iter().find(|c| c.has_video()).and_then(|c| c.size()))
            .ok_or_else(|| {
                VidmasterError::backend(
                    "composition size is unknown; set height and width on the block",
                )
            })?;
        let duration = layers
            .iter()
            .map(FfmpegClip::duration)
            .collect::<Option<Vec<f64>>>()
            .and_then(|d| d.into_iter().reduce(f64::max));
        Ok(Self(Arc::new(ClipInfo {
            has_video: true,
            has_audio: layers.iter().any(FfmpegClip::has_audio),
            duration,
            size: Some(size),
            offset: (0, 0),
            node: ClipNode::Overlay {
                layers: layers.to_vec(),
                size,
            },
        })))
    }

    pub(crate) fn with_audio(&self, audio: &FfmpegClip) -> VidmasterResult<Self> {
        self.require_video("setaudio")?;
        if !audio.has_audio() {
            return Err(VidmasterError::backend(
                "setaudio source clip has no audio track",
            ));
        }
        Ok(self.derive(
            ClipNode::SetAudio {
                video: self.clone(),
                audio: audio.clone(),
            },
            |info| info.has_audio = true,
        ))
    }

    pub(crate) fn trim(&self, start: f64, end: Option<f64>) -> VidmasterResult<Self> {
        if let Some(end) = end
            && end <= start
        {
            return Err(VidmasterError::backend(format!(
                "subclip end ({end}s) must be after start ({start}s)"
            )));
        }
        if let Some(total) = self.duration()
            && start >= total
        {
            return Err(VidmasterError::backend(format!(
                "subclip start ({start}s) is past the end of the clip ({total}s)"
            )));
        }
        let duration = match (end, self.duration()) {
            (Some(end), Some(total)) => Some(end.min(total) - start),
            (Some(end), None) => Some(end - start),
            (None, total) => total.map(|t| t - start),
        };
        Ok(self.derive(
            ClipNode::Trim {
                input: self.clone(),
                start,
                end,
            },
            |info| info.duration = duration,
        ))
    }

    fn require_video(&self, what: &str) -> VidmasterResult<()> {
        if self.has_video() {
            Ok(())
        } else {
            Err(VidmasterError::backend(format!(
                "{what} needs a clip with a picture, got an audio-only clip"
            )))
        }
    }

    fn derive(&self, node: ClipNode, edit: impl FnOnce(&mut ClipInfo)) -> Self {
        let mut info = ClipInfo {
            node,
            has_video: self.has_video(),
            has_audio: self.has_audio(),
            duration: self.duration(),
            size: self.size(),
            offset: self.offset(),
        };
        edit(&mut info);
        Self(Arc::new(info))
    }

    fn node(&self) -> &ClipNode {
        &self.0.node
    }
}

// Keep even dimensions; yuv420p output rejects odd sizes.
fn scale_even(value: u32, num: u32, den: u32) -> u32 {
    let scaled = (u64::from(value) * u64::from(num) + u64::from(den) / 2) / u64::from(den);
    let scaled = u32::try_from(scaled).unwrap_or(u32::MAX);
    (scaled & !1).max(2)
}

/// One `-i` input of the generated command.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphInput {
    /// Options placed before `-i`.
    pub pre_args: Vec<String>,
    /// Input path.
    pub path: PathBuf,
}

/// A lowered clip: inputs, filter chains and the labels of its final streams.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterGraph {
    /// Inputs in `-i` order.
    pub inputs: Vec<GraphInput>,
    /// Filter chains, joined with `;` for `-filter_complex`.
    pub chains: Vec<String>,
    /// Final video label (without brackets).
    pub video: Option<String>,
    /// Final audio label (without brackets).
    pub audio: Option<String>,
}

impl FilterGraph {
    /// Lower `clip` into a graph whose outputs are labelled `vout` and `aout`.
    pub fn lower(clip: &FfmpegClip) -> VidmasterResult<Self> {
        let mut lowering = Lowering {
            graph: Self::default(),
            labels: 0,
        };
        let streams = lowering.lower(clip, clip.has_video(), clip.has_audio())?;
        let mut graph = lowering.graph;

        if let Some(v) = streams.video {
            graph.chains.push(format!("[{v}]null[vout]"));
            graph.video = Some("vout".to_owned());
        }
        if let Some(a) = streams.audio {
            graph.chains.push(format!("[{a}]anull[aout]"));
            graph.audio = Some("aout".to_owned());
        }
        Ok(graph)
    }

    /// The `-filter_complex` argument.
    pub fn filter_complex(&self) -> String {
        self.chains.join(";")
    }
}

#[derive(Default)]
struct Streams {
    video: Option<String>,
    audio: Option<String>,
}

struct Lowering {
    graph: FilterGraph,
    labels: usize,
}

impl Lowering {
    fn label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}{}", self.labels);
        self.labels += 1;
        label
    }

    fn chain(&mut self, input: &str, filter: &str, prefix: &str) -> String {
        let out = self.label(prefix);
        self.graph.chains.push(format!("[{input}]{filter}[{out}]"));
        out
    }

    // Each visit of a node emits fresh chains, so a clip used twice never shares a label.
    fn lower(&mut self, clip: &FfmpegClip, video: bool, audio: bool) -> VidmasterResult<Streams> {
        let video = video && clip.has_video();
        let audio = audio && clip.has_audio();
        let mut out = Streams::default();

        match clip.node() {
            ClipNode::Source { kind, path, limit } => {
                let idx = self.graph.inputs.len();
                let mut pre_args = Vec::new();
                if *kind == MediaKind::Image {
                    pre_args.extend(["-loop".to_owned(), "1".to_owned()]);
                }
                if let Some(d) = limit {
                    pre_args.extend(["-t".to_owned(), secs(*d)]);
                }
                self.graph.inputs.push(GraphInput {
                    pre_args,
                    path: path.clone(),
                });
                if video {
                    out.video = Some(format!("{idx}:v:0"));
                }
                if audio {
                    out.audio = Some(format!("{idx}:a:0"));
                }
            }
            ClipNode::Scale {
                input,
                width,
                height,
            } => {
                let inner = self.lower(input, video, audio)?;
                out.audio = inner.audio;
                if let Some(v) = inner.video {
                    let w = width.map_or("-2".to_owned(), |w| w.to_string());
                    let h = height.map_or("-2".to_owned(), |h| h.to_string());
                    out.video = Some(if width.is_none() && height.is_none() {
                        v
                    } else {
                        self.chain(&v, &format!("scale={w}:{h}"), "v")
                    });
                }
            }
            ClipNode::Pad {
                input,
                size,
                color,
                opacity,
            } => {
                let inner = self.lower(input, video, audio)?;
                out.audio = inner.audio;
                if let Some(v) = inner.video {
                    let filter = format!(
                        "pad=w=iw+{twice}:h=ih+{twice}:x={size}:y={size}:color={hex}@{alpha}",
                        twice = u64::from(*size) * 2,
                        hex = color.to_ffmpeg_hex(),
                        alpha = (*opacity).min(1),
                    );
                    out.video = Some(self.chain(&v, &filter, "v"));
                }
            }
            ClipNode::Offset { input } => {
                out = self.lower(input, video, audio)?;
            }
            ClipNode::Concat { inputs } => {
                let mut videos = Vec::with_capacity(inputs.len());
                let mut audios = Vec::with_capacity(inputs.len());
                for input in inputs {
                    let inner = self.lower(input, video, audio)?;
                    if let Some(v) = inner.video {
                        videos.push(v);
                    }
                    if audio {
                        let a = match inner.audio {
                            Some(a) => a,
                            None => self.silence(input)?,
                        };
                        audios.push(a);
                    }
                }
                if video {
                    out.video = Some(self.join(&videos, "v=1:a=0", "v"));
                }
                if audio {
                    out.audio = Some(self.join(&audios, "v=0:a=1", "a"));
                }
            }
            ClipNode::Overlay { layers, size } => {
                let mut base = None;
                if video {
                    let duration = clip.duration().ok_or_else(|| {
                        VidmasterError::backend(
                            "composition duration is unknown; give every layer a duration",
                        )
                    })?;
                    let label = self.label("v");
                    self.graph.chains.push(format!(
                        "color=c=black:s={}x{}:d={}[{label}]",
                        size.width,
                        size.height,
                        secs(duration)
                    ));
                    base = Some(label);
                }
                let mut audios = Vec::new();
                for layer in layers {
                    let inner = self.lower(layer, video, audio)?;
                    if let (Some(b), Some(v)) = (base.as_deref(), inner.video) {
                        let (x, y) = layer.offset();
                        let out_label = self.label("v");
                        self.graph.chains.push(format!(
                            "[{b}][{v}]overlay=x={x}:y={y}:eof_action=pass[{out_label}]"
                        ));
                        base = Some(out_label);
                    }
                    if let Some(a) = inner.audio {
                        audios.push(a);
                    }
                }
                out.video = base;
                if audio {
                    out.audio = Some(match audios.len() {
                        1 => audios.remove(0),
                        n => {
                            let ins: String = audios.iter().map(|a| format!("[{a}]")).collect();
                            let label = self.label("a");
                            self.graph.chains.push(format!(
                                "{ins}amix=inputs={n}:duration=longest[{label}]"
                            ));
                            label
                        }
                    });
                }
            }
            ClipNode::SetAudio {
                video: picture,
                audio: sound,
            } => {
                if video {
                    out.video = self.lower(picture, true, false)?.video;
                }
                if audio {
                    let a = self.lower(sound, false, true)?.audio;
                    // The result lasts as long as the picture.
                    out.audio = match (a, picture.duration()) {
                        (Some(a), Some(d)) => {
                            Some(self.chain(&a, &format!("atrim=end={}", secs(d)), "a"))
                        }
                        (a, _) => a,
                    };
                }
            }
            ClipNode::Trim { input, start, end } => {
                let inner = self.lower(input, video, audio)?;
                let range = match end {
                    Some(end) => format!("start={}:end={}", secs(*start), secs(*end)),
                    None => format!("start={}", secs(*start)),
                };
                if let Some(v) = inner.video {
                    out.video =
                        Some(self.chain(&v, &format!("trim={range},setpts=PTS-STARTPTS"), "v"));
                }
                if let Some(a) = inner.audio {
                    out.audio =
                        Some(self.chain(&a, &format!("atrim={range},asetpts=PTS-STARTPTS"), "a"));
                }
            }
        }
        Ok(out)
    }

    fn join(&mut self, labels: &[String], streams: &str, prefix: &str) -> String {
        let ins: String = labels.iter().map(|l| format!("[{l}]")).collect();
        let out = self.label(prefix);
        self.graph.chains.push(format!(
            "{ins}concat=n={}:{streams}[{out}]",
            labels.len()
        ));
        out
    }

    fn silence(&mut self, clip: &FfmpegClip) -> VidmasterResult<String> {
        let duration = clip.duration().ok_or_else(|| {
            VidmasterError::backend("cannot pad a silent clip of unknown duration with silence")
        })?;
        let out = self.label("a");
        self.graph
            .chains
            .push(format!("{SILENCE_SRC}:d={}[{out}]", secs(duration)));
        Ok(out)
    }
}

fn secs(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
#[path = "../../../tests/unit/backend/graph.rs"]
mod tests;
