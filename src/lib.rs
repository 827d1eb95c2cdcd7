//! vidmaster runs batch video-composition scripts.
//!
//! A script is plain text made of `#do <kind>` ... `#end` blocks holding `key = value` lines.
//! Each block describes one operation: define a clip from a file, resize/position/frame it,
//! concatenate or composite several clips, swap audio, cut a time range, or export to a file.
//! Blocks run once, top to bottom, and clips are referred to by name.
//!
//! - [`parse_script`] turns text into ordered [`Step`]s.
//! - [`Workbench`] executes steps against any [`MediaBackend`].
//! - [`FfmpegBackend`] renders through the system `ffmpeg`; [`RecordingBackend`] only records.
//!
//! ```
//! use vidmaster::{RecordingBackend, Workbench, parse_script};
//!
//! let steps = parse_script(
//!     "#do define\nname = title\ntype = image\nsource = title.png\nduration = 5\n#end\n\
//!      #do export\nclip = title\nout = title.mp4\nfps = 30\ncodec = libx264\n#end\n",
//! )?;
//! let report = Workbench::new(steps, RecordingBackend::new()).run()?;
//! assert_eq!(report.exports.len(), 1);
//! # Ok::<(), vidmaster::VidmasterError>(())
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod backend;
pub(crate) mod ops;
pub(crate) mod script;
pub(crate) mod workbench;

pub use crate::foundation::core::{Canvas, Rgb8, Timestamp};
pub use crate::foundation::error::{VidmasterError, VidmasterResult};

pub use crate::backend::ffmpeg::graph::{FfmpegClip, FilterGraph, GraphInput};
pub use crate::backend::ffmpeg::probe::{MediaProbe, parse_probe_json};
pub use crate::backend::ffmpeg::{
    FfmpegBackend, FfmpegBackendOpts, FfmpegCommand, build_encode_command, tools_available,
};
pub use crate::backend::media::{ClipSource, EncodeRequest, MediaBackend};
pub use crate::backend::recording::{BackendCall, RecordedClip, RecordingBackend};
pub use crate::ops::model::{
    BlockKind, DEFAULT_PRESET, Define, Effect, EffectOp, Export, Margin, MediaKind, Mix, MixKind,
    Operation, Step, Subclip,
};
pub use crate::script::reader::{Block, BlockLine, BlockReader};
pub use crate::script::{parse_block, parse_script, parse_script_file};
pub use crate::workbench::engine::{RunReport, Workbench};
pub use crate::workbench::registry::ClipRegistry;
