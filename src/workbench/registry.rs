use std::collections::HashMap;

use crate::foundation::error::{VidmasterError, VidmasterResult};

/// Named clip handles produced while a script runs.
///
/// Binding an existing name replaces the previous handle; later blocks see only the newest one.
#[derive(Clone, Debug)]
pub struct ClipRegistry<C> {
    clips: HashMap<String, C>,
}

impl<C> Default for ClipRegistry<C> {
    fn default() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }
}

impl<C> ClipRegistry<C> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `name` on behalf of the `kind` block at `line`.
    pub fn get(&self, name: &str, kind: &str, line: usize) -> VidmasterResult<&C> {
        self.clips
            .get(name)
            .ok_or_else(|| VidmasterError::undefined_reference(name, kind, line))
    }

    /// Look up `name` without reporting anything.
    pub fn lookup(&self, name: &str) -> Option<&C> {
        self.clips.get(name)
    }

    /// Bind `name` to `clip`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, clip: C) {
        let name = name.into();
        if self.contains(&name) {
            tracing::debug!(name = %name, "rebinding clip name");
        }
        self.clips.insert(name, clip);
    }

    /// `true` when `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// `true` when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "../../tests/unit/workbench/registry.rs"]
mod tests;
