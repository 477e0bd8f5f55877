use thiserror::Error;

use crate::rank_lookup::LookupStage;

/// Failure modes shared by every extractor.
///
/// A missing *optional* element never produces one of these; it resolves to an
/// empty or absent value instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required element or attribute was not where the extractor expected it.
    #[error("structure mismatch: `{0}` not found (page layout has likely changed)")]
    StructureMismatch(&'static str),

    /// A bounded browser wait expired.
    #[error("automation timed out while {0}")]
    AutomationTimeout(LookupStage),

    /// An element was found but its text is not the expected numeric shape.
    #[error("could not parse `{0}` as a number")]
    ValueParseError(&'static str),

    #[error("request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("browser session error: {0}")]
    Browser(String),

    #[error("invalid selector `{css}`: {reason}")]
    Selector { css: String, reason: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;
