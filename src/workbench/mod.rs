//! Script execution: the clip registry and the engine that walks the steps.

pub(crate) mod engine;
pub(crate) mod registry;
