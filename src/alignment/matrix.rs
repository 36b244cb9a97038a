use std::collections::VecDeque;

use crate::error::AlignError;
use crate::types::{EditOp, PathEdge};

/// One column of the edit-distance matrix, covering every reference prefix
/// length for a single hypothesis prefix length.
#[derive(Debug, Clone)]
struct Column {
    /// `costs[i]` is the minimal edit cost aligning `reference[..i]` with the
    /// hypothesis prefix this column belongs to.
    costs: Vec<usize>,
    /// `ops[i]` is the predecessor operation that produced `costs[i]`.
    /// `ops[0]` is a filler; row 0 is only ever left via insertions.
    ops: Vec<EditOp>,
}

/// Column-incremental Levenshtein matrix over the reference token sequence.
///
/// Each hypothesis token appends exactly one column, computed from the
/// previous column alone, so costs are exact regardless of how many older
/// columns have been released. Released columns only bound how far back an
/// alignment path can be reconstructed.
#[derive(Debug)]
pub struct AlignmentMatrix {
    reference: Vec<String>,
    /// Retained columns, oldest first. `columns[0]` is column `base`.
    columns: VecDeque<Column>,
    /// Hypothesis prefix length of the oldest retained column.
    base: usize,
    /// Hypothesis prefix length of the newest column.
    hyp_len: usize,
}

impl AlignmentMatrix {
    pub fn new(reference: Vec<String>) -> Result<Self, AlignError> {
        if reference.is_empty() {
            return Err(AlignError::ReferenceEmpty);
        }
        let rows = reference.len() + 1;
        let mut costs = Vec::with_capacity(rows);
        let mut ops = Vec::with_capacity(rows);
        for i in 0..rows {
            costs.push(i);
            ops.push(if i == 0 { EditOp::Match } else { EditOp::Delete });
        }
        let mut columns = VecDeque::new();
        columns.push_back(Column { costs, ops });
        Ok(Self {
            reference,
            columns,
            base: 0,
            hyp_len: 0,
        })
    }

    pub fn reference(&self) -> &[String] {
        &self.reference
    }

    /// Number of hypothesis tokens incorporated so far.
    pub fn hyp_len(&self) -> usize {
        self.hyp_len
    }

    /// Exact edit distance between the full reference and the current
    /// hypothesis prefix.
    pub fn total_cost(&self) -> usize {
        match self.columns.back() {
            Some(column) => column.costs[self.reference.len()],
            None => 0,
        }
    }

    /// Columns currently held in memory.
    pub fn retained_columns(&self) -> usize {
        self.columns.len()
    }

    /// Append the column for hypothesis token `hyp_index`.
    ///
    /// Tokens must arrive in stream order: `hyp_index` has to equal the
    /// current frontier, otherwise the previous column for the recurrence
    /// does not exist.
    pub fn extend(&mut self, hyp_index: usize, token: &str) -> Result<(), AlignError> {
        if hyp_index != self.hyp_len {
            return Err(AlignError::out_of_order(format!(
                "extension for hypothesis index {hyp_index} but the matrix frontier is {}",
                self.hyp_len
            )));
        }
        let prev = match self.columns.back() {
            Some(column) => column,
            None => {
                return Err(AlignError::out_of_order(
                    "every matrix column has been released",
                ))
            }
        };

        let rows = self.reference.len() + 1;
        let mut costs = Vec::with_capacity(rows);
        let mut ops = Vec::with_capacity(rows);
        costs.push(hyp_index + 1);
        ops.push(EditOp::Insert);
        for i in 1..rows {
            let token_match = self.reference[i - 1] == token;
            let diag = prev.costs[i - 1] + usize::from(!token_match);
            let up = costs[i - 1] + 1;
            let left = prev.costs[i] + 1;
            let (best, op) = best_predecessor(diag, up, left, token_match);
            costs.push(best);
            ops.push(op);
        }

        self.columns.push_back(Column { costs, ops });
        self.hyp_len += 1;
        Ok(())
    }

    /// Reconstruct the best path from `(reference_len, hyp_len)` back to the
    /// anchor cell, which is the end of the committed prefix.
    ///
    /// The walk follows recorded predecessor operations while it stays
    /// strictly inside the live region. If it reaches the anchor column or
    /// the anchor row early it is clamped to the anchor with deletions or
    /// insertions; a clamp means the globally optimal path disagrees with an
    /// already committed prefix, which the commit window makes rare but
    /// cannot rule out.
    pub fn backtrace(&self, anchor_row: usize, anchor_col: usize) -> Vec<PathEdge> {
        debug_assert!(anchor_row <= self.reference.len());
        debug_assert!(anchor_col >= self.base && anchor_col <= self.hyp_len);

        let mut edges = Vec::new();
        let mut i = self.reference.len();
        let mut j = self.hyp_len;
        while !(i == anchor_row && j == anchor_col) {
            if j <= anchor_col {
                while i > anchor_row {
                    edges.push(PathEdge::deleted(i - 1));
                    i -= 1;
                }
                break;
            }
            if i <= anchor_row {
                if i < anchor_row {
                    tracing::debug!(
                        row = i,
                        anchor_row,
                        column = j,
                        "optimal path crossed above the committed prefix; clamping"
                    );
                }
                while j > anchor_col {
                    edges.push(PathEdge::inserted(j - 1));
                    j -= 1;
                }
                break;
            }
            match self.column(j).ops[i] {
                EditOp::Match => {
                    edges.push(PathEdge::matched(i - 1, j - 1));
                    i -= 1;
                    j -= 1;
                }
                EditOp::Substitute => {
                    edges.push(PathEdge::substituted(i - 1, j - 1));
                    i -= 1;
                    j -= 1;
                }
                EditOp::Delete => {
                    edges.push(PathEdge::deleted(i - 1));
                    i -= 1;
                }
                EditOp::Insert => {
                    edges.push(PathEdge::inserted(j - 1));
                    j -= 1;
                }
            }
        }
        edges.reverse();
        edges
    }

    /// Drop columns older than `col`. The newest column always survives so
    /// the recurrence can keep extending.
    pub fn release_before(&mut self, col: usize) {
        let keep_from = col.min(self.hyp_len);
        while self.base < keep_from {
            self.columns.pop_front();
            self.base += 1;
        }
    }

    fn column(&self, col: usize) -> &Column {
        debug_assert!(col >= self.base && col <= self.hyp_len);
        &self.columns[col - self.base]
    }
}

/// Pick the cheapest predecessor for one cell. Ties prefer the diagonal
/// (match before substitute by construction), then deletion, then insertion.
#[inline(always)]
fn best_predecessor(diag: usize, up: usize, left: usize, token_match: bool) -> (usize, EditOp) {
    if diag <= up && diag <= left {
        let op = if token_match {
            EditOp::Match
        } else {
            EditOp::Substitute
        };
        (diag, op)
    } else if up <= left {
        (up, EditOp::Delete)
    } else {
        (left, EditOp::Insert)
    }
}
