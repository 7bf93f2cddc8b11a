//! Prompt assembly.
//!
//! The model sees the task instruction, the canonical schema, and the
//! serialized document so far, never the marker itself. Truncating the
//! serialized partial document at the marker is what turns "a tree with a
//! hole in it" into "the document up to the point being generated".

use crate::document::PartialDocument;
use crate::error::GenerateError;

/// Build the full prompt for the current generation step.
pub(crate) fn build(
    task: &str,
    schema_json: &str,
    document: &PartialDocument,
) -> Result<String, GenerateError> {
    let progress = document.progress()?;
    Ok(format!(
        "{task}\nOutput result in the following JSON schema format:\n{schema_json}\nResult: {progress}"
    ))
}
