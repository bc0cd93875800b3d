use serde::{Deserialize, Serialize};

/// Placeholder returned when nothing usable was extracted or the LLM call failed.
pub const NONE_FOUND: &str = "none found";

/// Name of the input column holding the prompt text.
pub const PROMPT_COLUMN: &str = "PROMPT";

/// Output table header, in column order.
pub const OUTPUT_HEADER: [&str; 2] = ["prompt", "output"];

/// One row of the input table. Columns other than `PROMPT` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "PROMPT")]
    pub prompt: String,
}

/// School name and location pulled out of a prompt. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPrompt {
    pub subject_name: String,
    pub location: String,
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub prompt: String,
    pub output: String,
}

/// A single fragment of a streamed completion. `delta` is `None` for
/// chunks that carry no text (role headers, finish markers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionChunk {
    pub delta: Option<String>,
}

impl CompletionChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            delta: Some(delta.into()),
        }
    }

    pub fn empty() -> Self {
        Self { delta: None }
    }
}
