/// Terminal or provisional classification of one aligned position.
///
/// `Pending` only ever appears in provisional views (snapshots, partial
/// metrics). Committed events always carry a terminal verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pending,
    /// Reference and hypothesis token matched exactly.
    Hit,
    /// Reference token was replaced by a different hypothesis token.
    Sub,
    /// Reference token has no hypothesis counterpart.
    Del,
    /// Hypothesis token has no reference counterpart.
    Ins,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pending => "pending",
            Verdict::Hit => "hit",
            Verdict::Sub => "sub",
            Verdict::Del => "del",
            Verdict::Ins => "ins",
        }
    }

    /// True for every verdict except `Pending`.
    pub fn is_terminal(self) -> bool {
        self != Verdict::Pending
    }
}

/// Edit operation recorded as a cell predecessor in the alignment matrix,
/// listed in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    Match,
    Substitute,
    Delete,
    Insert,
}

impl EditOp {
    /// Cost contributed by one edge with this operation.
    pub fn cost(self) -> usize {
        match self {
            EditOp::Match => 0,
            EditOp::Substitute | EditOp::Delete | EditOp::Insert => 1,
        }
    }

    /// Verdict assigned to the positions this operation consumes.
    pub fn verdict(self) -> Verdict {
        match self {
            EditOp::Match => Verdict::Hit,
            EditOp::Substitute => Verdict::Sub,
            EditOp::Delete => Verdict::Del,
            EditOp::Insert => Verdict::Ins,
        }
    }
}

/// One edge of an alignment path.
///
/// A `Match` or `Substitute` edge consumes one token from each sequence,
/// `Delete` consumes only a reference token and `Insert` only a hypothesis
/// token. The unused side is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEdge {
    pub ref_index: Option<usize>,
    pub hyp_index: Option<usize>,
    pub op: EditOp,
}

impl PathEdge {
    pub fn matched(ref_index: usize, hyp_index: usize) -> Self {
        Self {
            ref_index: Some(ref_index),
            hyp_index: Some(hyp_index),
            op: EditOp::Match,
        }
    }

    pub fn substituted(ref_index: usize, hyp_index: usize) -> Self {
        Self {
            ref_index: Some(ref_index),
            hyp_index: Some(hyp_index),
            op: EditOp::Substitute,
        }
    }

    pub fn deleted(ref_index: usize) -> Self {
        Self {
            ref_index: Some(ref_index),
            hyp_index: None,
            op: EditOp::Delete,
        }
    }

    pub fn inserted(hyp_index: usize) -> Self {
        Self {
            ref_index: None,
            hyp_index: Some(hyp_index),
            op: EditOp::Insert,
        }
    }
}

/// Largest prefix of each sequence whose verdicts are final.
///
/// Both fields are prefix lengths, so `ref_committed = 3` means reference
/// indices 0, 1 and 2 carry committed verdicts. Frontiers only ever advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitFrontier {
    pub ref_committed: usize,
    pub hyp_committed: usize,
}

/// Which sequence a committed verdict refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKind {
    Reference,
    Hypothesis,
}

impl PositionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionKind::Reference => "ref",
            PositionKind::Hypothesis => "hyp",
        }
    }
}

/// Committed verdict for a single position.
///
/// Each `(kind, index)` pair receives at most one event per session, and the
/// verdict it carries is terminal and immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictEvent {
    pub kind: PositionKind,
    pub index: usize,
    pub verdict: Verdict,
    pub token: String,
}

/// Whole-alignment view after one extension.
///
/// `path` covers every hypothesis token seen so far and the full reference,
/// committed prefix first. `total_cost` is the exact edit distance between
/// the reference and the current hypothesis prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSnapshot {
    pub path: Vec<PathEdge>,
    pub total_cost: usize,
    pub frontier: CommitFrontier,
}

/// Error-rate counters over the region of the alignment that is already
/// meaningful mid-stream.
///
/// While the stream is open, a trailing run of deletions is treated as
/// not-yet-read material and excluded from every counter. `ref_processed`
/// is the number of reference tokens the counters cover.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialMetrics {
    pub wer: f64,
    pub cer: f64,
    pub hits: usize,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
    pub ref_processed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_strings_are_stable() {
        assert_eq!(Verdict::Pending.as_str(), "pending");
        assert_eq!(Verdict::Hit.as_str(), "hit");
        assert_eq!(Verdict::Sub.as_str(), "sub");
        assert_eq!(Verdict::Del.as_str(), "del");
        assert_eq!(Verdict::Ins.as_str(), "ins");
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!Verdict::Pending.is_terminal());
        for verdict in [Verdict::Hit, Verdict::Sub, Verdict::Del, Verdict::Ins] {
            assert!(verdict.is_terminal());
        }
    }

    #[test]
    fn edge_constructors_consume_the_expected_sides() {
        let hit = PathEdge::matched(2, 3);
        assert_eq!(hit.ref_index, Some(2));
        assert_eq!(hit.hyp_index, Some(3));
        assert_eq!(hit.op.verdict(), Verdict::Hit);

        let del = PathEdge::deleted(4);
        assert_eq!(del.ref_index, Some(4));
        assert_eq!(del.hyp_index, None);
        assert_eq!(del.op.cost(), 1);

        let ins = PathEdge::inserted(0);
        assert_eq!(ins.ref_index, None);
        assert_eq!(ins.hyp_index, Some(0));
        assert_eq!(ins.op.verdict(), Verdict::Ins);
    }

    #[test]
    fn match_is_the_only_free_operation() {
        assert_eq!(EditOp::Match.cost(), 0);
        assert_eq!(EditOp::Substitute.cost(), 1);
        assert_eq!(EditOp::Delete.cost(), 1);
        assert_eq!(EditOp::Insert.cost(), 1);
    }
}
