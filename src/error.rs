//! Error taxonomy for the advisory engine.
//!
//! Corpus preparation (download, parse, index build) and the LLM transport
//! have typed errors so callers can tell "the statute index is unavailable"
//! apart from "the completion endpoint is down". Tool failures are resolved
//! inside the agent loop and never unwind past it; only total agent or
//! initialization failure reaches the caller as `anyhow::Error`.

use thiserror::Error;

/// Failures while preparing the retrieval corpus.
///
/// An index build failure is fatal to that build attempt but not to the
/// process: the engine records the index as absent and the statute tool
/// reports the resource as unavailable.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Download or cache write failed.
    #[error("failed to fetch source document: {0}")]
    Fetch(String),

    /// The source document could not be parsed into pages.
    #[error("failed to parse source document: {0}")]
    Parse(String),

    /// Embedding or storage failed during index construction.
    #[error("failed to build vector index: {0}")]
    IndexBuild(String),
}

/// Transport-level failure from the completion or embedding endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Required API key missing from the environment.
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    /// The endpoint rejected the request (non-retryable status).
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Network failure or retries exhausted.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Outcome of a tool dispatch inside the agent loop.
///
/// Both variants are recovered locally: the loop converts them to an
/// observation string and keeps going.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The agent asked for a tool name not in the catalog.
    #[error("unknown tool: {0}")]
    Unknown(String),

    /// The tool's underlying completion or service call failed.
    #[error("tool invocation failed: {0}")]
    Invocation(String),
}

impl From<LlmError> for ToolError {
    fn from(err: LlmError) -> Self {
        ToolError::Invocation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CorpusError::Fetch("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "failed to fetch source document: connection refused"
        );

        let err = ToolError::Unknown("翻訳ツール".to_string());
        assert_eq!(err.to_string(), "unknown tool: 翻訳ツール");
    }

    #[test]
    fn test_llm_error_converts_to_invocation() {
        let err: ToolError = LlmError::Transport("timeout".to_string()).into();
        assert!(matches!(err, ToolError::Invocation(_)));
    }
}
