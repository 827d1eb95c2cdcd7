use std::iter::Enumerate;
use std::str::Lines;

/// Prefix of a line that opens a block.
pub const BLOCK_OPEN: &str = "#do";
/// Prefix of a line that closes a block.
pub const BLOCK_CLOSE: &str = "#end";
/// Prefix of a full-line comment.
pub const COMMENT: &str = "//";

/// One interior line of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLine {
    /// 1-based line number in the script.
    pub number: usize,
    /// Raw line text (markers and comments never appear here).
    pub text: String,
}

/// A delimited script fragment naming exactly one operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Kind token taken from the opening marker (`#do resize` -> `resize`).
    pub kind: String,
    /// 1-based line number of the opening marker.
    pub line: usize,
    /// Interior lines with blanks and comments removed.
    pub lines: Vec<BlockLine>,
    /// `false` when input ended before a closing marker.
    pub terminated: bool,
}

/// Lazily splits script text into [`Block`]s.
///
/// Text outside of blocks is free commentary and skipped.
pub struct BlockReader<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> BlockReader<'a> {
    /// Create a reader over the full script text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl Iterator for BlockReader<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let (open_idx, kind) = self.lines.by_ref().find_map(|(idx, line)| {
            line.strip_prefix(BLOCK_OPEN)
                .map(|rest| (idx, rest.trim().to_owned()))
        })?;

        let mut block = Block {
            kind,
            line: open_idx + 1,
            lines: Vec::new(),
            terminated: false,
        };

        for (idx, line) in self.lines.by_ref() {
            if line.starts_with(BLOCK_CLOSE) {
                block.terminated = true;
                break;
            }
            if is_skippable(line) {
                continue;
            }
            block.lines.push(BlockLine {
                number: idx + 1,
                text: line.to_owned(),
            });
        }

        if !block.terminated {
            tracing::warn!(
                line = block.line,
                kind = %block.kind,
                "block is not closed with '{BLOCK_CLOSE}' before end of script"
            );
        }
        Some(block)
    }
}

/// Blank lines and full-line comments carry no attributes.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with(COMMENT)
}

#[cfg(test)]
#[path = "../../tests/unit/script/reader.rs"]
mod tests;
