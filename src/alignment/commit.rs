use crate::config::CommitWindow;
use crate::types::{CommitFrontier, PathEdge};

/// Decides which prefix of the live alignment path is stable enough to
/// freeze.
///
/// After every extension the policy compares the fresh live path with the
/// one it saw previously. An edge's streak counts how many consecutive
/// extensions reproduced it identically; once every edge of a prefix has a
/// streak of at least the effective window, that prefix is committed and
/// leaves the live path for good. The frontier never moves backwards.
#[derive(Debug)]
pub struct CommitPolicy {
    window: CommitWindow,
    committed: Vec<PathEdge>,
    frontier: CommitFrontier,
    /// Live path remainder from the previous observation.
    live_tail: Vec<PathEdge>,
    /// `streaks[i]` counts consecutive observations of `live_tail[i]`.
    streaks: Vec<usize>,
}

impl CommitPolicy {
    pub fn new(window: CommitWindow) -> Self {
        Self {
            window,
            committed: Vec::new(),
            frontier: CommitFrontier::default(),
            live_tail: Vec::new(),
            streaks: Vec::new(),
        }
    }

    pub fn window(&self) -> CommitWindow {
        self.window
    }

    pub fn frontier(&self) -> CommitFrontier {
        self.frontier
    }

    /// Every edge committed so far, in path order.
    pub fn committed(&self) -> &[PathEdge] {
        &self.committed
    }

    /// Live path remainder as of the last observation.
    pub fn live_tail(&self) -> &[PathEdge] {
        &self.live_tail
    }

    /// Observe the live path produced by one extension and return the edges
    /// committed by it, in path order.
    ///
    /// `live` must start at the current frontier. `total_cost` feeds the
    /// cost-adaptive window variant.
    pub fn observe(&mut self, live: &[PathEdge], total_cost: usize) -> Vec<PathEdge> {
        let window = self.window.effective(total_cost).max(1);

        // A structural change at position k invalidates every streak from k
        // on; positions after the first difference are new observations even
        // when the edge values happen to coincide.
        let unchanged = self
            .live_tail
            .iter()
            .zip(live)
            .take_while(|(old, new)| old == new)
            .count();
        let mut streaks = Vec::with_capacity(live.len());
        for index in 0..live.len() {
            if index < unchanged {
                streaks.push(self.streaks[index] + 1);
            } else {
                streaks.push(1);
            }
        }

        let mut commit_len = 0;
        while commit_len < live.len() && streaks[commit_len] >= window {
            commit_len += 1;
        }

        let newly = live[..commit_len].to_vec();
        if !newly.is_empty() {
            self.apply(&newly);
            tracing::debug!(
                committed = newly.len(),
                ref_committed = self.frontier.ref_committed,
                hyp_committed = self.frontier.hyp_committed,
                window,
                "commit frontier advanced"
            );
        }
        self.live_tail = live[commit_len..].to_vec();
        self.streaks = streaks.split_off(commit_len);
        newly
    }

    /// Commit the whole remaining live path at end of stream, regardless of
    /// streaks.
    pub fn force_commit(&mut self, live: &[PathEdge]) -> Vec<PathEdge> {
        let newly = live.to_vec();
        if !newly.is_empty() {
            self.apply(&newly);
            tracing::debug!(
                committed = newly.len(),
                ref_committed = self.frontier.ref_committed,
                hyp_committed = self.frontier.hyp_committed,
                "end of stream committed the remaining path"
            );
        }
        self.live_tail.clear();
        self.streaks.clear();
        newly
    }

    fn apply(&mut self, edges: &[PathEdge]) {
        for edge in edges {
            if edge.ref_index.is_some() {
                self.frontier.ref_committed += 1;
            }
            if edge.hyp_index.is_some() {
                self.frontier.hyp_committed += 1;
            }
        }
        self.committed.extend_from_slice(edges);
    }
}
