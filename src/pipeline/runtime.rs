use std::sync::{Mutex, MutexGuard, TryLockError};

use crate::alignment::aligner::IncrementalAligner;
use crate::alignment::metrics::compute_metrics;
use crate::error::AlignError;
use crate::pipeline::traits::{Tokenizer, VerdictSink};
use crate::types::{
    AlignmentSnapshot, CommitFrontier, PartialMetrics, PathEdge, PositionKind, VerdictEvent,
};

pub(crate) struct LiveSessionParts {
    pub aligner: IncrementalAligner,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sink: Box<dyn VerdictSink>,
}

struct SessionState {
    aligner: IncrementalAligner,
    metrics: PartialMetrics,
    /// One entry per committed hypothesis position: how many further tokens
    /// had arrived by the time its verdict froze.
    commit_lags: Vec<f64>,
    completion_logged: bool,
}

/// A live comparison of one hypothesis stream against one reference script.
///
/// The session is single-writer: one producer feeds tokens, consumers read
/// committed verdicts from the sink. All methods are non-blocking; a call
/// that would have to wait for another one still inside the session fails
/// with [`AlignError::ReentrantAccess`] instead.
pub struct LiveSession {
    state: Mutex<SessionState>,
    tokenizer: Box<dyn Tokenizer>,
    sink: Box<dyn VerdictSink>,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession").finish_non_exhaustive()
    }
}

impl LiveSession {
    pub(crate) fn from_parts(parts: LiveSessionParts) -> Self {
        Self {
            state: Mutex::new(SessionState {
                aligner: parts.aligner,
                metrics: PartialMetrics::default(),
                commit_lags: Vec::new(),
                completion_logged: false,
            }),
            tokenizer: parts.tokenizer,
            sink: parts.sink,
        }
    }

    /// Feed the next hypothesis token.
    pub fn push_token(&self, token: &str) -> Result<AlignmentSnapshot, AlignError> {
        let mut state = self.lock("push_token")?;
        self.push_locked(&mut state, token)
    }

    /// Tokenize a text chunk with the session tokenizer and feed every token
    /// it contains. Returns the snapshot after the last one, or `None` when
    /// the chunk was pure whitespace.
    pub fn push_text(&self, text: &str) -> Result<Option<AlignmentSnapshot>, AlignError> {
        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return Ok(None);
        }
        let mut state = self.lock("push_text")?;
        let mut last = None;
        for token in &tokens {
            last = Some(self.push_locked(&mut state, token)?);
        }
        Ok(last)
    }

    /// Declare the stream finished and commit everything still provisional.
    pub fn finish(&self) -> Result<AlignmentSnapshot, AlignError> {
        let mut state = self.lock("finish")?;
        let outcome = state.aligner.on_end_of_stream()?;
        self.apply_committed(&mut state, &outcome.committed);
        state.metrics = compute_metrics(
            state.aligner.reference(),
            state.aligner.hypothesis(),
            &outcome.snapshot.path,
            true,
        );
        tracing::info!(
            total_cost = outcome.snapshot.total_cost,
            ref_tokens = state.aligner.reference().len(),
            hyp_tokens = state.aligner.hypothesis().len(),
            wer = state.metrics.wer,
            "hypothesis stream finished"
        );
        Ok(outcome.snapshot)
    }

    /// Error rates over the already-covered region, trailing deletions
    /// excluded while the stream is open.
    pub fn metrics(&self) -> Result<PartialMetrics, AlignError> {
        Ok(self.lock("metrics")?.metrics)
    }

    pub fn frontier(&self) -> Result<CommitFrontier, AlignError> {
        Ok(self.lock("frontier")?.aligner.frontier())
    }

    /// True once every reference token carries a committed verdict, whether
    /// because the reader got to the end of the script or because the stream
    /// was finished.
    pub fn is_complete(&self) -> Result<bool, AlignError> {
        let state = self.lock("is_complete")?;
        Ok(Self::complete(&state.aligner))
    }

    pub fn is_ended(&self) -> Result<bool, AlignError> {
        Ok(self.lock("is_ended")?.aligner.is_ended())
    }

    pub fn snapshot(&self) -> Result<AlignmentSnapshot, AlignError> {
        Ok(self.lock("snapshot")?.aligner.snapshot())
    }

    pub fn reference_len(&self) -> Result<usize, AlignError> {
        Ok(self.lock("reference_len")?.aligner.reference().len())
    }

    pub fn hypothesis_len(&self) -> Result<usize, AlignError> {
        Ok(self.lock("hypothesis_len")?.aligner.hypothesis().len())
    }

    /// Commit lags observed so far, one per committed hypothesis position.
    pub fn commit_lags(&self) -> Result<Vec<f64>, AlignError> {
        Ok(self.lock("commit_lags")?.commit_lags.clone())
    }

    fn push_locked(
        &self,
        state: &mut SessionState,
        token: &str,
    ) -> Result<AlignmentSnapshot, AlignError> {
        let outcome = state.aligner.on_token(token)?;
        self.apply_committed(state, &outcome.committed);
        state.metrics = compute_metrics(
            state.aligner.reference(),
            state.aligner.hypothesis(),
            &outcome.snapshot.path,
            false,
        );
        if !state.completion_logged && Self::complete(&state.aligner) {
            state.completion_logged = true;
            tracing::info!(
                ref_tokens = state.aligner.reference().len(),
                hyp_tokens = state.aligner.hypothesis().len(),
                "every reference token has a committed verdict"
            );
        }
        Ok(outcome.snapshot)
    }

    fn apply_committed(&self, state: &mut SessionState, committed: &[PathEdge]) {
        let hyp_len = state.aligner.hypothesis().len();
        for edge in committed {
            let verdict = edge.op.verdict();
            if let Some(index) = edge.ref_index {
                let token = state.aligner.reference()[index].clone();
                self.emit(VerdictEvent {
                    kind: PositionKind::Reference,
                    index,
                    verdict,
                    token,
                });
            }
            if let Some(index) = edge.hyp_index {
                let token = state.aligner.hypothesis()[index].clone();
                self.emit(VerdictEvent {
                    kind: PositionKind::Hypothesis,
                    index,
                    verdict,
                    token,
                });
                state.commit_lags.push((hyp_len - (index + 1)) as f64);
            }
        }
    }

    fn emit(&self, event: VerdictEvent) {
        if let Err(err) = self.sink.publish(event) {
            tracing::warn!(
                error = %err,
                "verdict sink rejected an event; alignment continues unpublished"
            );
        }
    }

    fn complete(aligner: &IncrementalAligner) -> bool {
        if aligner.is_ended() {
            return true;
        }
        let reference_len = aligner.reference().len();
        reference_len > 0 && aligner.frontier().ref_committed == reference_len
    }

    fn lock(&self, context: &'static str) -> Result<MutexGuard<'_, SessionState>, AlignError> {
        match self.state.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(AlignError::ReentrantAccess { context }),
            Err(TryLockError::Poisoned(_)) => Err(AlignError::runtime(
                context,
                "session state poisoned by an earlier panic",
            )),
        }
    }
}
