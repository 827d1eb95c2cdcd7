use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::core::Timestamp;
use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::script::reader::{Block, BlockLine};
use crate::script::schema::{AttrKind, attr_kind};

// key = value, where value words are letters, digits, `_`, `/`, `.`, `:` separated by whitespace.
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s*=\s*([\w/.:]+(?:\s+[\w/.:]+)*)\s*$")
        .expect("line grammar regex is valid")
});

/// A coerced attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// Boolean attribute.
    Bool(bool),
    /// Integer attribute.
    Int(u64),
    /// Timestamp attribute.
    Timestamp(Timestamp),
    /// Raw text attribute.
    Text(String),
}

impl AttrValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "text",
        }
    }
}

/// Split one interior line into its key and coerced value.
pub fn parse_line(line: &BlockLine) -> VidmasterResult<(String, AttrValue)> {
    let caps = LINE_RE.captures(&line.text).ok_or_else(|| {
        VidmasterError::parse(
            line.number,
            format!("expected 'key = value', got '{}'", line.text.trim()),
        )
    })?;
    let key = &caps[1];
    let value = coerce(key, &caps[2]).map_err(|msg| VidmasterError::parse(line.number, msg))?;
    Ok((key.to_owned(), value))
}

/// Coerce `raw` according to the schema entry for `key`.
pub fn coerce(key: &str, raw: &str) -> Result<AttrValue, String> {
    match attr_kind(key) {
        AttrKind::Bool => match raw {
            "1" => Ok(AttrValue::Bool(true)),
            "0" => Ok(AttrValue::Bool(false)),
            _ => Err(format!(
                "invalid boolean '{raw}' for '{key}' (expected 0 or 1)"
            )),
        },
        AttrKind::Int => parse_uint(raw)
            .map(AttrValue::Int)
            .ok_or_else(|| format!("invalid integer '{raw}' for '{key}'")),
        AttrKind::Timestamp => parse_timestamp(raw)
            .map(AttrValue::Timestamp)
            .ok_or_else(|| format!("invalid timestamp '{raw}' for '{key}' (expected H:M:S)")),
        AttrKind::Text => Ok(AttrValue::Text(raw.to_owned())),
    }
}

fn parse_uint(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let mut parts = raw.split(':');
    let hours = parse_uint(parts.next()?)?;
    let minutes = parse_uint(parts.next()?)?;
    let seconds = parse_uint(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Timestamp::new(hours, minutes, seconds))
}

#[derive(Clone, Debug)]
struct Attr {
    value: AttrValue,
    line: usize,
}

/// Coerced attributes of one block.
///
/// Accessors remove what they read, so whatever is left after an operation is built was not used
/// by it (see [`AttrMap::finish`]).
#[derive(Clone, Debug)]
pub struct AttrMap {
    kind: String,
    line: usize,
    values: HashMap<String, Attr>,
}

impl AttrMap {
    /// Parse and coerce every interior line of `block`. Repeated keys: last one wins.
    pub fn from_block(block: &Block) -> VidmasterResult<Self> {
        let mut values = HashMap::with_capacity(block.lines.len());
        for line in &block.lines {
            let (key, value) = parse_line(line)?;
            values.insert(
                key,
                Attr {
                    value,
                    line: line.number,
                },
            );
        }
        Ok(Self {
            kind: block.kind.clone(),
            line: block.line,
            values,
        })
    }

    /// Line of the block's opening marker.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Return `true` when every attribute has been consumed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn take(&mut self, key: &str) -> Option<Attr> {
        self.values.remove(key)
    }

    fn missing(&self, key: &str) -> VidmasterError {
        VidmasterError::missing_field(&self.kind, key, self.line)
    }

    fn mismatch(&self, key: &str, attr: &Attr, expected: &str) -> VidmasterError {
        VidmasterError::parse(
            attr.line,
            format!(
                "'{key}' in '{}' block must be {expected}, got {}",
                self.kind,
                attr.value.type_name()
            ),
        )
    }

    /// Optional raw text attribute.
    pub fn text(&mut self, key: &str) -> VidmasterResult<Option<String>> {
        match self.take(key) {
            None => Ok(None),
            Some(Attr {
                value: AttrValue::Text(s),
                ..
            }) => Ok(Some(s)),
            Some(other) => Err(self.mismatch(key, &other, "text")),
        }
    }

    /// Required raw text attribute.
    pub fn require_text(&mut self, key: &str) -> VidmasterResult<String> {
        self.text(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional whitespace-separated list.
    pub fn list(&mut self, key: &str) -> VidmasterResult<Option<Vec<String>>> {
        Ok(self
            .text(key)?
            .map(|s| s.split_whitespace().map(str::to_owned).collect()))
    }

    /// Required whitespace-separated list.
    pub fn require_list(&mut self, key: &str) -> VidmasterResult<Vec<String>> {
        self.list(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional boolean attribute.
    pub fn bool(&mut self, key: &str) -> VidmasterResult<Option<bool>> {
        match self.take(key) {
            None => Ok(None),
            Some(Attr {
                value: AttrValue::Bool(b),
                ..
            }) => Ok(Some(b)),
            Some(other) => Err(self.mismatch(key, &other, "a boolean")),
        }
    }

    fn uint(&mut self, key: &str) -> VidmasterResult<Option<(u64, usize)>> {
        match self.take(key) {
            None => Ok(None),
            Some(Attr {
                value: AttrValue::Int(v),
                line,
            }) => Ok(Some((v, line))),
            Some(other) => Err(self.mismatch(key, &other, "an integer")),
        }
    }

    /// Optional integer attribute.
    pub fn u64(&mut self, key: &str) -> VidmasterResult<Option<u64>> {
        Ok(self.uint(key)?.map(|(v, _)| v))
    }

    /// Optional integer attribute narrowed to `u32`.
    pub fn u32(&mut self, key: &str) -> VidmasterResult<Option<u32>> {
        self.narrow(key)
    }

    /// Required integer attribute narrowed to `u32`.
    pub fn require_u32(&mut self, key: &str) -> VidmasterResult<u32> {
        self.u32(key)?.ok_or_else(|| self.missing(key))
    }

    /// Optional integer attribute narrowed to `u8`.
    pub fn u8(&mut self, key: &str) -> VidmasterResult<Option<u8>> {
        self.narrow(key)
    }

    fn narrow<T: TryFrom<u64>>(&mut self, key: &str) -> VidmasterResult<Option<T>> {
        let Some((v, line)) = self.uint(key)? else {
            return Ok(None);
        };
        T::try_from(v).map(Some).map_err(|_| {
            VidmasterError::parse(line, format!("value {v} for '{key}' is out of range"))
        })
    }

    /// Optional timestamp attribute.
    pub fn timestamp(&mut self, key: &str) -> VidmasterResult<Option<Timestamp>> {
        match self.take(key) {
            None => Ok(None),
            Some(Attr {
                value: AttrValue::Timestamp(t),
                ..
            }) => Ok(Some(t)),
            Some(other) => Err(self.mismatch(key, &other, "a timestamp")),
        }
    }

    /// Required timestamp attribute.
    pub fn require_timestamp(&mut self, key: &str) -> VidmasterResult<Timestamp> {
        self.timestamp(key)?.ok_or_else(|| self.missing(key))
    }

    /// Log attributes the operation did not use.
    pub fn finish(self) {
        if self.is_empty() {
            return;
        }
        let mut unused: Vec<&str> = self.values.keys().map(String::as_str).collect();
        unused.sort_unstable();
        tracing::debug!(
            kind = %self.kind,
            line = self.line,
            ?unused,
            "ignoring attributes not used by this block kind"
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/line.rs"]
mod tests;
