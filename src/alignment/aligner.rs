use crate::alignment::commit::CommitPolicy;
use crate::alignment::matrix::AlignmentMatrix;
use crate::config::CommitWindow;
use crate::error::AlignError;
use crate::types::{AlignmentSnapshot, CommitFrontier, PathEdge};

/// Result of feeding one token (or the end-of-stream marker) to the aligner.
#[derive(Debug, Clone)]
pub struct TokenOutcome {
    pub snapshot: AlignmentSnapshot,
    /// Edges whose verdicts became final through this call, in path order.
    pub committed: Vec<PathEdge>,
}

/// Streams hypothesis tokens into the alignment matrix and asks the commit
/// policy after every extension which path prefix can be frozen.
///
/// An empty reference is a degenerate but valid stream: the matrix is
/// skipped and every hypothesis token aligns as an insertion.
#[derive(Debug)]
pub struct IncrementalAligner {
    matrix: Option<AlignmentMatrix>,
    hypothesis: Vec<String>,
    policy: CommitPolicy,
    ended: bool,
}

impl IncrementalAligner {
    pub fn new(reference: Vec<String>, window: CommitWindow) -> Result<Self, AlignError> {
        window.validate()?;
        let matrix = if reference.is_empty() {
            None
        } else {
            Some(AlignmentMatrix::new(reference)?)
        };
        Ok(Self {
            matrix,
            hypothesis: Vec::new(),
            policy: CommitPolicy::new(window),
            ended: false,
        })
    }

    pub fn reference(&self) -> &[String] {
        self.matrix
            .as_ref()
            .map(|matrix| matrix.reference())
            .unwrap_or(&[])
    }

    pub fn hypothesis(&self) -> &[String] {
        &self.hypothesis
    }

    pub fn frontier(&self) -> CommitFrontier {
        self.policy.frontier()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Incorporate the next hypothesis token.
    pub fn on_token(&mut self, token: &str) -> Result<TokenOutcome, AlignError> {
        if self.ended {
            return Err(AlignError::out_of_order(
                "token received after end of stream",
            ));
        }
        let hyp_index = self.hypothesis.len();
        if let Some(matrix) = self.matrix.as_mut() {
            matrix.extend(hyp_index, token)?;
        }
        self.hypothesis.push(token.to_string());

        let live = self.live_path();
        let total_cost = self.current_cost();
        let committed = self.policy.observe(&live, total_cost);
        if let Some(matrix) = self.matrix.as_mut() {
            matrix.release_before(self.policy.frontier().hyp_committed);
        }
        Ok(TokenOutcome {
            snapshot: self.snapshot(),
            committed,
        })
    }

    /// Declare the hypothesis stream finished. Whatever is still provisional
    /// in the live path is committed as-is, which turns any unread tail of
    /// the reference into deletions.
    pub fn on_end_of_stream(&mut self) -> Result<TokenOutcome, AlignError> {
        if self.ended {
            return Err(AlignError::out_of_order("end of stream signaled twice"));
        }
        self.ended = true;
        let live = self.live_path();
        let committed = self.policy.force_commit(&live);
        if let Some(matrix) = self.matrix.as_mut() {
            matrix.release_before(self.policy.frontier().hyp_committed);
        }
        Ok(TokenOutcome {
            snapshot: self.snapshot(),
            committed,
        })
    }

    /// Current full-alignment view without feeding anything. After end of
    /// stream the live region is empty and the path is fully committed.
    pub fn snapshot(&self) -> AlignmentSnapshot {
        let mut path = self.policy.committed().to_vec();
        path.extend(self.live_path());
        AlignmentSnapshot {
            path,
            total_cost: self.current_cost(),
            frontier: self.policy.frontier(),
        }
    }

    fn live_path(&self) -> Vec<PathEdge> {
        let frontier = self.policy.frontier();
        match self.matrix.as_ref() {
            Some(matrix) => matrix.backtrace(frontier.ref_committed, frontier.hyp_committed),
            None => (frontier.hyp_committed..self.hypothesis.len())
                .map(PathEdge::inserted)
                .collect(),
        }
    }

    fn current_cost(&self) -> usize {
        match self.matrix.as_ref() {
            Some(matrix) => matrix.total_cost(),
            None => self.hypothesis.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EditOp, Verdict};

    fn words(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn feed(aligner: &mut IncrementalAligner, tokens: &[&str]) -> Vec<PathEdge> {
        let mut committed = Vec::new();
        for token in tokens {
            let outcome = aligner.on_token(token).expect("token should align");
            committed.extend(outcome.committed);
        }
        committed
    }

    #[test]
    fn worked_example_yields_sub_hit_hit_ins() {
        let mut aligner =
            IncrementalAligner::new(words(&["the", "cat", "sat"]), CommitWindow::Fixed(5))
                .expect("aligner builds");
        feed(&mut aligner, &["a", "cat", "sat", "down"]);
        let outcome = aligner.on_end_of_stream().expect("finish succeeds");

        let verdicts: Vec<Verdict> = outcome
            .snapshot
            .path
            .iter()
            .map(|edge| edge.op.verdict())
            .collect();
        assert_eq!(
            verdicts,
            vec![Verdict::Sub, Verdict::Hit, Verdict::Hit, Verdict::Ins]
        );
        assert_eq!(outcome.snapshot.total_cost, 2);
        assert_eq!(outcome.snapshot.frontier.ref_committed, 3);
        assert_eq!(outcome.snapshot.frontier.hyp_committed, 4);
    }

    #[test]
    fn empty_reference_marks_every_token_as_insertion() {
        let mut aligner =
            IncrementalAligner::new(Vec::new(), CommitWindow::Fixed(2)).expect("aligner builds");
        let committed = feed(&mut aligner, &["a", "b", "c"]);

        // With a window of 2 the first two insertions are already stable.
        assert_eq!(
            committed,
            vec![PathEdge::inserted(0), PathEdge::inserted(1)]
        );
        let outcome = aligner.on_end_of_stream().expect("finish succeeds");
        assert_eq!(outcome.committed, vec![PathEdge::inserted(2)]);
        assert_eq!(outcome.snapshot.total_cost, 3);
        assert!(outcome
            .snapshot
            .path
            .iter()
            .all(|edge| edge.op == EditOp::Insert));
    }

    #[test]
    fn silent_stream_ends_as_all_deletions() {
        let mut aligner =
            IncrementalAligner::new(words(&["a", "b", "c"]), CommitWindow::Fixed(5))
                .expect("aligner builds");
        let outcome = aligner.on_end_of_stream().expect("finish succeeds");
        assert_eq!(outcome.committed.len(), 3);
        assert!(outcome
            .snapshot
            .path
            .iter()
            .all(|edge| edge.op == EditOp::Delete));
        assert_eq!(outcome.snapshot.total_cost, 3);
    }

    #[test]
    fn tokens_after_end_of_stream_are_rejected() {
        let mut aligner =
            IncrementalAligner::new(words(&["a"]), CommitWindow::Fixed(5)).expect("aligner builds");
        aligner.on_end_of_stream().expect("finish succeeds");

        let err = aligner.on_token("a").expect_err("stream is closed");
        assert!(matches!(err, AlignError::OutOfOrderExtension { .. }));
        let err = aligner
            .on_end_of_stream()
            .expect_err("finishing twice is out of order");
        assert!(matches!(err, AlignError::OutOfOrderExtension { .. }));
    }

    #[test]
    fn zero_commit_window_is_rejected_at_construction() {
        let err = IncrementalAligner::new(words(&["a"]), CommitWindow::Fixed(0))
            .expect_err("window 0 must fail");
        assert!(matches!(err, AlignError::InvalidInput { .. }));
    }

    #[test]
    fn stable_prefix_commits_while_the_stream_is_open() {
        let mut aligner =
            IncrementalAligner::new(words(&["a", "b", "c", "d", "e"]), CommitWindow::Fixed(2))
                .expect("aligner builds");
        let committed = feed(&mut aligner, &["a", "b", "c"]);

        // Each matched edge needs one further extension to prove itself, so
        // "a" and "b" are committed while "c" still waits.
        assert_eq!(
            committed,
            vec![PathEdge::matched(0, 0), PathEdge::matched(1, 1)]
        );
        assert_eq!(aligner.frontier().ref_committed, 2);
        assert_eq!(aligner.frontier().hyp_committed, 2);
    }

    #[test]
    fn snapshot_covers_committed_and_live_regions() {
        let mut aligner =
            IncrementalAligner::new(words(&["a", "b", "c", "d"]), CommitWindow::Fixed(2))
                .expect("aligner builds");
        feed(&mut aligner, &["a", "b", "c"]);

        let snapshot = aligner.snapshot();
        // Full reference and full hypothesis appear exactly once each.
        let ref_seen: Vec<usize> = snapshot.path.iter().filter_map(|e| e.ref_index).collect();
        let hyp_seen: Vec<usize> = snapshot.path.iter().filter_map(|e| e.hyp_index).collect();
        assert_eq!(ref_seen, vec![0, 1, 2, 3]);
        assert_eq!(hyp_seen, vec![0, 1, 2]);
        assert_eq!(snapshot.total_cost, 1);
    }

    #[test]
    fn late_tokens_still_reach_exact_total_cost() {
        // The committed prefix pins early verdicts; the running cost stays
        // the exact edit distance regardless.
        let mut aligner =
            IncrementalAligner::new(words(&["x", "y", "z"]), CommitWindow::Fixed(1))
                .expect("aligner builds");
        feed(&mut aligner, &["x", "q", "z"]);
        assert_eq!(aligner.snapshot().total_cost, 1);
        assert_eq!(aligner.frontier().ref_committed, 3);
    }
}
