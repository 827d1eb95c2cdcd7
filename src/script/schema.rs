/// Coercion rule applied to an attribute's raw text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrKind {
    /// `1` or `0`.
    Bool,
    /// Non-negative decimal integer.
    Int,
    /// `H:M:S` triple.
    Timestamp,
    /// Raw text, kept as written.
    Text,
}

/// Attributes with a typed coercion. Anything not listed is [`AttrKind::Text`].
const TYPED_ATTRS: &[(&str, AttrKind)] = &[
    ("hasaudio", AttrKind::Bool),
    ("duration", AttrKind::Int),
    ("height", AttrKind::Int),
    ("width", AttrKind::Int),
    ("x", AttrKind::Int),
    ("y", AttrKind::Int),
    ("size", AttrKind::Int),
    ("opacity", AttrKind::Int),
    ("red", AttrKind::Int),
    ("green", AttrKind::Int),
    ("blue", AttrKind::Int),
    ("fps", AttrKind::Int),
    ("threads", AttrKind::Int),
    ("start", AttrKind::Timestamp),
    ("end", AttrKind::Timestamp),
];

/// Look up the coercion rule for `key`.
pub fn attr_kind(key: &str) -> AttrKind {
    TYPED_ATTRS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
        .unwrap_or(AttrKind::Text)
}

#[cfg(test)]
#[path = "../../tests/unit/script/schema.rs"]
mod tests;
