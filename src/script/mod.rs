//! Script text to operation list.

pub(crate) mod line;
pub(crate) mod reader;
pub(crate) mod schema;

use std::path::Path;

use crate::foundation::error::{VidmasterError, VidmasterResult};
use crate::ops::model::{Operation, Step};
use crate::script::reader::{Block, BlockReader};

/// Build one [`Step`] from a block.
pub fn parse_block(block: &Block) -> VidmasterResult<Step> {
    Ok(Step {
        line: block.line,
        op: Operation::from_block(block)?,
    })
}

/// Parse a whole script into its ordered steps. Stops at the first error.
#[tracing::instrument(skip(text), fields(bytes = text.len()))]
pub fn parse_script(text: &str) -> VidmasterResult<Vec<Step>> {
    let steps = BlockReader::new(text)
        .map(|block| parse_block(&block))
        .collect::<VidmasterResult<Vec<_>>>()?;
    tracing::debug!(steps = steps.len(), "parsed script");
    Ok(steps)
}

/// Read and parse a script file.
pub fn parse_script_file(path: impl AsRef<Path>) -> VidmasterResult<Vec<Step>> {
    use anyhow::Context as _;

    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read script '{}'", path.display()))
        .map_err(VidmasterError::Other)?;
    parse_script(&text)
}

#[cfg(test)]
#[path = "../../tests/unit/script/parse.rs"]
mod tests;
