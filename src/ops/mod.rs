//! Typed operation model.

pub(crate) mod model;
