use crate::error::AlignError;
use crate::types::VerdictEvent;

/// Splits raw text into alignment tokens.
///
/// The same tokenizer is applied to the reference script at build time and
/// to any hypothesis text fed through [`push_text`], so both sides agree on
/// token boundaries.
///
/// [`push_text`]: crate::pipeline::runtime::LiveSession::push_text
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Receives committed verdicts as they become final.
///
/// Publication must not block; a sink that cannot accept an event returns an
/// error and the session continues without it.
pub trait VerdictSink: Send + Sync {
    fn publish(&self, event: VerdictEvent) -> Result<(), AlignError>;
}
