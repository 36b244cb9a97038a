use crate::alignment::aligner::IncrementalAligner;
use crate::config::{CommitWindow, SessionConfig};
use crate::error::AlignError;
use crate::pipeline::defaults::{NullSink, WhitespaceTokenizer};
use crate::pipeline::runtime::{LiveSession, LiveSessionParts};
use crate::pipeline::traits::{Tokenizer, VerdictSink};

/// Builds a [`LiveSession`] from a reference script and optional seam
/// overrides. Unset seams fall back to the whitespace tokenizer and the
/// null sink.
pub struct SessionBuilder {
    reference_text: String,
    config: SessionConfig,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sink: Option<Box<dyn VerdictSink>>,
}

impl SessionBuilder {
    pub fn new(reference_text: impl Into<String>) -> Self {
        Self {
            reference_text: reference_text.into(),
            config: SessionConfig::default(),
            tokenizer: None,
            sink: None,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_commit_window(mut self, window: CommitWindow) -> Self {
        self.config.commit_window = window;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn VerdictSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<LiveSession, AlignError> {
        self.config.commit_window.validate()?;
        let tokenizer = self
            .tokenizer
            .unwrap_or_else(|| Box::new(WhitespaceTokenizer));
        let sink = self.sink.unwrap_or_else(|| Box::new(NullSink));

        let reference = tokenizer.tokenize(&self.reference_text);
        tracing::debug!(
            ref_tokens = reference.len(),
            window = ?self.config.commit_window,
            "building live session"
        );
        let aligner = IncrementalAligner::new(reference, self.config.commit_window)?;
        Ok(LiveSession::from_parts(LiveSessionParts {
            aligner,
            tokenizer,
            sink,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LowercaseTokenizer;

    impl Tokenizer for LowercaseTokenizer {
        fn tokenize(&self, text: &str) -> Vec<String> {
            text.split_whitespace()
                .map(|token| token.to_lowercase())
                .collect()
        }
    }

    #[test]
    fn default_seams_build_a_working_session() {
        let session = SessionBuilder::new("the cat sat")
            .build()
            .expect("build should succeed");
        assert_eq!(session.reference_len().expect("accessor works"), 3);

        let snapshot = session.push_token("the").expect("token aligns");
        assert_eq!(snapshot.total_cost, 2);
    }

    #[test]
    fn invalid_commit_window_fails_the_build() {
        let err = SessionBuilder::new("the cat")
            .with_commit_window(CommitWindow::Fixed(0))
            .build()
            .expect_err("window 0 must fail");
        assert!(matches!(err, AlignError::InvalidInput { .. }));
    }

    #[test]
    fn custom_tokenizer_applies_to_the_reference() {
        let session = SessionBuilder::new("The CAT")
            .with_tokenizer(Box::new(LowercaseTokenizer))
            .with_commit_window(CommitWindow::Fixed(1))
            .build()
            .expect("build should succeed");

        // Hypothesis text goes through the same tokenizer, so case folds on
        // both sides and the tokens match.
        let snapshot = session
            .push_text("THE cat")
            .expect("chunk aligns")
            .expect("chunk had tokens");
        assert_eq!(snapshot.total_cost, 0);
    }

    #[test]
    fn empty_reference_builds_an_insertion_only_session() {
        let session = SessionBuilder::new("   ")
            .build()
            .expect("build should succeed");
        assert_eq!(session.reference_len().expect("accessor works"), 0);
        let snapshot = session.push_token("hello").expect("token aligns");
        assert_eq!(snapshot.total_cost, 1);
    }

    #[test]
    fn config_file_values_flow_into_the_session() {
        let config = SessionConfig {
            commit_window: CommitWindow::CostAdaptive { floor: 2 },
        };
        let session = SessionBuilder::new("a b c")
            .with_config(config)
            .build()
            .expect("build should succeed");
        session.push_token("a").expect("token aligns");
        assert_eq!(session.frontier().expect("accessor works").ref_committed, 0);
    }
}
