use std::path::PathBuf;

use crate::foundation::core::{Canvas, Timestamp};
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::script::line::AttrMap;
use crate::script::reader::Block;

/// Default ffmpeg preset when an export block does not name one.
pub const DEFAULT_PRESET: &str = "medium";

/// Block kinds recognized after `#do`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `define`
    Define,
    /// `resize`
    Resize,
    /// `position`
    Position,
    /// `margin`
    Margin,
    /// `concatenate`
    Concatenate,
    /// `composition`
    Composition,
    /// `setaudio`
    SetAudio,
    /// `subclip`
    Subclip,
    /// `export`
    Export,
}

impl BlockKind {
    /// Every recognized kind, in documentation order.
    pub const ALL: [BlockKind; 9] = [
        Self::Define,
        Self::Resize,
        Self::Position,
        Self::Margin,
        Self::Concatenate,
        Self::Composition,
        Self::SetAudio,
        Self::Subclip,
        Self::Export,
    ];

    /// Parse a block kind token.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token() == token)
    }

    /// Token as written in scripts.
    pub fn token(self) -> &'static str {
        match self {
            Self::Define => "define",
            Self::Resize => "resize",
            Self::Position => "position",
            Self::Margin => "margin",
            Self::Concatenate => "concatenate",
            Self::Composition => "composition",
            Self::SetAudio => "setaudio",
            Self::Subclip => "subclip",
            Self::Export => "export",
        }
    }
}

/// Media type of a defined clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Audio-only source.
    Audio,
    /// Still image shown for a duration.
    Image,
    /// Video source, optionally with its audio track.
    Video,
}

impl MediaKind {
    /// Parse a `type = ...` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "audio" => Some(Self::Audio),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// `#do define`: bind a new clip built from a source file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Define {
    /// Registry name to bind.
    pub name: String,
    /// Audio, image or video.
    pub media_type: MediaKind,
    /// Source file.
    pub source_path: PathBuf,
    /// Keep the source's audio track (video only).
    pub has_audio: bool,
    /// Explicit duration in seconds. Wins over `duration_from`.
    pub duration: Option<u64>,
    /// Clip whose duration is inherited when `duration` is absent.
    pub duration_from: Option<String>,
}

/// Margin parameters. Unset fields use backend defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Margin {
    /// Margin width in pixels.
    pub size: Option<u32>,
    /// Margin opacity.
    pub opacity: Option<u32>,
    /// Red channel of the margin color.
    pub red: Option<u8>,
    /// Green channel of the margin color.
    pub green: Option<u8>,
    /// Blue channel of the margin color.
    pub blue: Option<u8>,
}

/// Effect sub-kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Surround the clip with a colored border.
    Margin(Margin),
    /// Place the clip at an offset when composited.
    Position {
        /// Horizontal offset in pixels.
        x: Option<u32>,
        /// Vertical offset in pixels.
        y: Option<u32>,
    },
    /// Scale the clip. A missing dimension keeps the aspect ratio.
    Resize {
        /// Target height in pixels.
        height: Option<u32>,
        /// Target width in pixels.
        width: Option<u32>,
    },
}

impl Effect {
    /// Block kind token of this effect.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Margin(_) => BlockKind::Margin.token(),
            Self::Position { .. } => BlockKind::Position.token(),
            Self::Resize { .. } => BlockKind::Resize.token(),
        }
    }
}

/// `#do resize|position|margin`: transform one clip into a new binding.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectOp {
    /// Clip the effect reads.
    pub input_clip: String,
    /// Registry name of the result.
    pub output_name: String,
    /// Effect and its parameters.
    pub effect: Effect,
}

/// Mix sub-kinds.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MixKind {
    /// Play clips one after another in list order.
    Concatenate {
        /// Clips in playback order.
        input_clips: Vec<String>,
    },
    /// Layer clips on one canvas; index 0 is the bottom layer.
    Composite {
        /// Clips in paint order.
        input_clips: Vec<String>,
        /// Output size; `width` and `height` are given together or not at all.
        size: Option<Canvas>,
    },
    /// Replace a clip's audio with another clip's audio.
    SetAudio {
        /// Clip providing the picture.
        input_clip: String,
        /// Clip providing the sound.
        audio_clip_name: String,
    },
}

/// `#do concatenate|composition|setaudio`: combine clips into a new binding.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mix {
    /// Registry name of the result.
    pub output_name: String,
    /// How the inputs are combined.
    pub kind: MixKind,
}

impl Mix {
    /// Block kind token of this mix.
    pub fn token(&self) -> &'static str {
        match self.kind {
            MixKind::Concatenate { .. } => BlockKind::Concatenate.token(),
            MixKind::Composite { .. } => BlockKind::Composition.token(),
            MixKind::SetAudio { .. } => BlockKind::SetAudio.token(),
        }
    }
}

/// `#do subclip`: extract `[start, end)` from a clip.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subclip {
    /// Clip to cut from.
    pub input_clip: String,
    /// Inclusive start.
    pub start: Timestamp,
    /// Exclusive end; `None` runs to the clip's natural end.
    pub end: Option<Timestamp>,
    /// Registry name of the result.
    pub output_name: String,
}

/// `#do export`: encode a clip to a file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Export {
    /// Clip to encode.
    pub input_clip: String,
    /// Output file.
    pub destination_path: PathBuf,
    /// Output frame rate.
    pub fps: u32,
    /// Video codec name.
    pub codec: String,
    /// Encoder preset.
    pub preset: String,
    /// Encoder thread count.
    pub threads: Option<u32>,
    /// Extra encoder arguments, passed through untouched.
    pub extra_params: Vec<String>,
}

/// One script operation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Clip definition.
    Define(Define),
    /// Single-clip effect.
    Effect(EffectOp),
    /// Multi-clip mix.
    Mix(Mix),
    /// Time range extraction.
    Subclip(Subclip),
    /// File export.
    Export(Export),
}

impl Operation {
    /// Build an operation from a block, validating kind and required fields.
    pub fn from_block(block: &Block) -> VidmasterResult<Self> {
        let kind = BlockKind::from_token(&block.kind)
            .ok_or_else(|| VidmasterError::unknown_kind(&block.kind, block.line))?;
        let mut attrs = AttrMap::from_block(block)?;
        let op = Self::from_attrs(kind, &mut attrs)?;
        attrs.finish();
        Ok(op)
    }

    fn from_attrs(kind: BlockKind, attrs: &mut AttrMap) -> VidmasterResult<Self> {
        let op = match kind {
            BlockKind::Define => {
                let name = attrs.require_text("name")?;
                let type_token = attrs.require_text("type")?;
                let media_type = MediaKind::from_token(&type_token)
                    .ok_or_else(|| VidmasterError::unknown_kind(&type_token, attrs.line()))?;
                Self::Define(Define {
                    name,
                    media_type,
                    source_path: PathBuf::from(attrs.require_text("source")?),
                    has_audio: attrs.bool("hasaudio")?.unwrap_or(false),
                    duration: attrs.u64("duration")?,
                    duration_from: attrs.text("duration_from")?,
                })
            }
            BlockKind::Resize | BlockKind::Position | BlockKind::Margin => {
                let input_clip = attrs.require_text("clip")?;
                let output_name = attrs.require_text("out")?;
                let effect = match kind {
                    BlockKind::Resize => Effect::Resize {
                        height: attrs.u32("height")?,
                        width: attrs.u32("width")?,
                    },
                    BlockKind::Position => Effect::Position {
                        x: attrs.u32("x")?,
                        y: attrs.u32("y")?,
                    },
                    _ => Effect::Margin(Margin {
                        size: attrs.u32("size")?,
                        opacity: attrs.u32("opacity")?,
                        red: attrs.u8("red")?,
                        green: attrs.u8("green")?,
                        blue: attrs.u8("blue")?,
                    }),
                };
                Self::Effect(EffectOp {
                    input_clip,
                    output_name,
                    effect,
                })
            }
            BlockKind::Concatenate => Self::Mix(Mix {
                output_name: attrs.require_text("out")?,
                kind: MixKind::Concatenate {
                    input_clips: attrs.require_list("clips")?,
                },
            }),
            BlockKind::Composition => {
                let output_name = attrs.require_text("out")?;
                let input_clips = attrs.require_list("clips")?;
                let size = match (attrs.u32("width")?, attrs.u32("height")?) {
                    (Some(width), Some(height)) => Some(Canvas { width, height }),
                    (None, None) => None,
                    (Some(_), None) => return Err(missing_half(kind, "height", attrs)),
                    (None, Some(_)) => return Err(missing_half(kind, "width", attrs)),
                };
                Self::Mix(Mix {
                    output_name,
                    kind: MixKind::Composite { input_clips, size },
                })
            }
            BlockKind::SetAudio => Self::Mix(Mix {
                output_name: attrs.require_text("out")?,
                kind: MixKind::SetAudio {
                    input_clip: attrs.require_text("clip")?,
                    audio_clip_name: attrs.require_text("audio")?,
                },
            }),
            BlockKind::Subclip => Self::Subclip(Subclip {
                input_clip: attrs.require_text("clip")?,
                start: attrs.require_timestamp("start")?,
                end: attrs.timestamp("end")?,
                output_name: attrs.require_text("out")?,
            }),
            BlockKind::Export => Self::Export(Export {
                input_clip: attrs.require_text("clip")?,
                destination_path: PathBuf::from(attrs.require_text("out")?),
                fps: attrs.require_u32("fps")?,
                codec: attrs.require_text("codec")?,
                preset: attrs
                    .text("preset")?
                    .unwrap_or_else(|| DEFAULT_PRESET.to_owned()),
                threads: attrs.u32("threads")?,
                extra_params: attrs.list("params")?.unwrap_or_default(),
            }),
        };
        Ok(op)
    }

    /// Block kind token that produced this operation.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Define(_) => BlockKind::Define.token(),
            Self::Effect(op) => op.effect.token(),
            Self::Mix(mix) => mix.token(),
            Self::Subclip(_) => BlockKind::Subclip.token(),
            Self::Export(_) => BlockKind::Export.token(),
        }
    }

    /// Clip names this operation reads from the registry, in resolution order.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            // An explicit duration wins, so `duration_from` is not read.
            Self::Define(def) => match def.duration {
                Some(_) => Vec::new(),
                None => def.duration_from.as_deref().into_iter().collect(),
            },
            Self::Effect(op) => vec![op.input_clip.as_str()],
            Self::Mix(mix) => match &mix.kind {
                MixKind::Concatenate { input_clips } | MixKind::Composite { input_clips, .. } => {
                    input_clips.iter().map(String::as_str).collect()
                }
                MixKind::SetAudio {
                    input_clip,
                    audio_clip_name,
                } => vec![input_clip.as_str(), audio_clip_name.as_str()],
            },
            Self::Subclip(sub) => vec![sub.input_clip.as_str()],
            Self::Export(export) => vec![export.input_clip.as_str()],
        }
    }

    /// Registry name this operation binds, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Define(def) => Some(&def.name),
            Self::Effect(op) => Some(&op.output_name),
            Self::Mix(mix) => Some(&mix.output_name),
            Self::Subclip(sub) => Some(&sub.output_name),
            Self::Export(_) => None,
        }
    }
}

fn missing_half(kind: BlockKind, field: &str, attrs: &AttrMap) -> VidmasterError {
    VidmasterError::missing_field(kind.token(), field, attrs.line())
}

/// An operation together with the script line of the block it came from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    /// 1-based line of the block's opening marker.
    pub line: usize,
    /// The operation.
    #[serde(flatten)]
    pub op: Operation,
}

#[cfg(test)]
#[path = "../../tests/unit/ops/model.rs"]
mod tests;
