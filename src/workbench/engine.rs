use std::path::{Path, PathBuf};

use crate::backend::media::{ClipSource, EncodeRequest, MediaBackend};
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::ops::model::{Define, EffectOp, Export, Mix, MixKind, Operation, Step, Subclip};
use crate::workbench::registry::ClipRegistry;

/// Outcome of a finished [`Workbench::run`].
#[derive(Debug)]
pub struct RunReport<C> {
    /// Every binding left at the end of the script.
    pub registry: ClipRegistry<C>,
    /// Resolved destinations, in export order.
    pub exports: Vec<PathBuf>,
    /// Input clip name of the last export block.
    pub last_export: Option<String>,
    /// Number of steps executed.
    pub steps_run: usize,
}

/// Executes a parsed script against a [`MediaBackend`].
///
/// Steps run once, in script order. The first error stops the run; side effects of earlier steps
/// (files already encoded, for instance) are kept.
///
/// ```no_run
/// use vidmaster::{FfmpegBackend, Workbench};
///
/// let report = Workbench::from_script_path("intro.vms", FfmpegBackend::default())?.run()?;
/// for path in &report.exports {
///     println!("{}", path.display());
/// }
/// # Ok::<(), vidmaster::VidmasterError>(())
/// ```
#[derive(Debug)]
pub struct Workbench<B: MediaBackend> {
    steps: Vec<Step>,
    registry: ClipRegistry<B::Clip>,
    backend: B,
    base_dir: PathBuf,
    last_export: Option<String>,
}

impl<B: MediaBackend> Workbench<B> {
    /// Workbench over already parsed steps. Relative paths resolve against the current directory.
    pub fn new(steps: Vec<Step>, backend: B) -> Self {
        Self {
            steps,
            registry: ClipRegistry::new(),
            backend,
            base_dir: PathBuf::new(),
            last_export: None,
        }
    }

    /// Resolve relative `source` and export paths against `dir`.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Parse the script at `path`. Relative paths in it resolve against the script's directory.
    pub fn from_script_path(path: impl AsRef<Path>, backend: B) -> VidmasterResult<Self> {
        let path = path.as_ref();
        let steps = crate::script::parse_script_file(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(steps, backend).with_base_dir(base_dir))
    }

    /// Execute every step in order.
    #[tracing::instrument(skip(self), fields(steps = self.steps.len()))]
    pub fn run(mut self) -> VidmasterResult<RunReport<B::Clip>> {
        let steps = std::mem::take(&mut self.steps);
        let mut exports = Vec::new();

        for step in &steps {
            let (line, kind) = (step.line, step.op.token());
            tracing::debug!(line, kind, "step");

            // Every name the step reads must be bound before the backend sees it.
            for name in step.op.inputs() {
                self.registry.get(name, kind, line)?;
            }

            let clip = match &step.op {
                Operation::Define(def) => self.define(def, line)?,
                Operation::Effect(op) => self.effect(op, line)?,
                Operation::Mix(mix) => self.mix(mix, line)?,
                Operation::Subclip(sub) => self.subclip(sub, line)?,
                Operation::Export(export) => {
                    exports.push(self.export(export, line)?);
                    continue;
                }
            };
            if let Some(name) = step.op.output() {
                self.registry.bind(name, clip);
            }
        }

        Ok(RunReport {
            registry: self.registry,
            exports,
            last_export: self.last_export,
            steps_run: steps.len(),
        })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn define(&mut self, def: &Define, line: usize) -> VidmasterResult<B::Clip> {
        const KIND: &str = "define";
        let duration = match (def.duration, def.duration_from.as_deref()) {
            (Some(secs), _) => Some(secs as f64),
            (None, Some(from)) => {
                let clip = self.registry.get(from, KIND, line)?;
                self.backend
                    .duration(clip)
                    .map_err(|e| relabel(e, KIND, line))?
            }
            (None, None) => None,
        };
        let source = ClipSource {
            kind: def.media_type,
            path: self.resolve_path(&def.source_path),
            duration,
            has_audio: def.has_audio,
        };
        self.backend
            .construct(&source)
            .map_err(|e| relabel(e, KIND, line))
    }

    fn effect(&mut self, op: &EffectOp, line: usize) -> VidmasterResult<B::Clip> {
        let kind = op.effect.token();
        let input = self.registry.get(&op.input_clip, kind, line)?;
        self.backend
            .apply_effect(input, &op.effect)
            .map_err(|e| relabel(e, kind, line))
    }

    fn mix(&mut self, mix: &Mix, line: usize) -> VidmasterResult<B::Clip> {
        let kind = mix.token();
        match &mix.kind {
            MixKind::Concatenate { input_clips } => {
                let clips = self.resolve_all(input_clips, kind, line)?;
                self.backend.concatenate(&clips)
            }
            MixKind::Composite { input_clips, size } => {
                let layers = self.resolve_all(input_clips, kind, line)?;
                self.backend.composite(&layers, *size)
            }
            MixKind::SetAudio {
                input_clip,
                audio_clip_name,
            } => {
                let picture = self.registry.get(input_clip, kind, line)?;
                let sound = self.registry.get(audio_clip_name, kind, line)?;
                self.backend.attach_audio(picture, sound)
            }
        }
        .map_err(|e| relabel(e, kind, line))
    }

    fn subclip(&mut self, sub: &Subclip, line: usize) -> VidmasterResult<B::Clip> {
        const KIND: &str = "subclip";
        let input = self.registry.get(&sub.input_clip, KIND, line)?;
        self.backend
            .extract_range(input, sub.start, sub.end)
            .map_err(|e| relabel(e, KIND, line))
    }

    fn export(&mut self, export: &Export, line: usize) -> VidmasterResult<PathBuf> {
        const KIND: &str = "export";
        let clip = self.registry.get(&export.input_clip, KIND, line)?;
        let request = EncodeRequest {
            destination: self.resolve_path(&export.destination_path),
            fps: export.fps,
            codec: export.codec.clone(),
            preset: export.preset.clone(),
            threads: export.threads,
            extra_params: export.extra_params.clone(),
        };
        self.backend
            .encode(clip, &request)
            .map_err(|e| relabel(e, KIND, line))?;
        tracing::info!(
            clip = %export.input_clip,
            path = %request.destination.display(),
            "exported"
        );
        self.last_export = Some(export.input_clip.clone());
        Ok(request.destination)
    }

    fn resolve_all(
        &self,
        names: &[String],
        kind: &str,
        line: usize,
    ) -> VidmasterResult<Vec<B::Clip>> {
        names
            .iter()
            .map(|name| self.registry.get(name, kind, line).cloned())
            .collect()
    }
}

fn relabel(err: VidmasterError, kind: &str, line: usize) -> VidmasterError {
    match err {
        VidmasterError::Backend(msg) => {
            VidmasterError::Backend(format!("{kind} block at line {line}: {msg}"))
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workbench/engine.rs"]
mod tests;
