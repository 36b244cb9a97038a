use crate::types::{EditOp, PartialMetrics, PathEdge};

/// Compute error rates over an alignment path.
///
/// While the stream is open (`stream_ended == false`) a trailing run of
/// deletions means the reader simply has not reached that part of the script
/// yet, so those edges are excluded from every counter. Once the stream has
/// ended the tail is real and counts as deletions.
///
/// WER is `(substitutions + deletions + insertions) / ref_processed`. CER is
/// the character-level edit distance between the covered reference and
/// hypothesis prefixes, rejoined with single spaces, divided by the covered
/// reference length in characters.
pub fn compute_metrics(
    reference: &[String],
    hypothesis: &[String],
    path: &[PathEdge],
    stream_ended: bool,
) -> PartialMetrics {
    let covered = if stream_ended {
        path.len()
    } else {
        match path.iter().rposition(|edge| edge.op != EditOp::Delete) {
            Some(last) => last + 1,
            None => 0,
        }
    };

    let mut metrics = PartialMetrics::default();
    let mut ref_cut = 0;
    let mut hyp_cut = 0;
    for edge in &path[..covered] {
        match edge.op {
            EditOp::Match => metrics.hits += 1,
            EditOp::Substitute => metrics.substitutions += 1,
            EditOp::Delete => metrics.deletions += 1,
            EditOp::Insert => metrics.insertions += 1,
        }
        if let Some(index) = edge.ref_index {
            ref_cut = ref_cut.max(index + 1);
        }
        if let Some(index) = edge.hyp_index {
            hyp_cut = hyp_cut.max(index + 1);
        }
    }

    metrics.ref_processed = metrics.hits + metrics.substitutions + metrics.deletions;
    if metrics.ref_processed > 0 {
        let errors = metrics.substitutions + metrics.deletions + metrics.insertions;
        metrics.wer = errors as f64 / metrics.ref_processed as f64;
    }

    let ref_text = reference[..ref_cut.min(reference.len())].join(" ");
    let hyp_text = hypothesis[..hyp_cut.min(hypothesis.len())].join(" ");
    let ref_chars: Vec<char> = ref_text.chars().collect();
    if !ref_chars.is_empty() {
        let hyp_chars: Vec<char> = hyp_text.chars().collect();
        metrics.cer = levenshtein(&ref_chars, &hyp_chars) as f64 / ref_chars.len() as f64;
    }

    metrics
}

/// Classic two-row Levenshtein distance with unit costs.
pub(crate) fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(item_a != item_b);
            let del = prev[j + 1] + 1;
            let ins = curr[j] + 1;
            curr[j + 1] = sub.min(del).min(ins);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn levenshtein_matches_known_distances() {
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars("abc"), &chars("abc")), 0);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("abc"), &chars("")), 3);
        assert_eq!(levenshtein(&chars("flaw"), &chars("lawn")), 2);
    }

    #[test]
    fn perfect_alignment_has_zero_error_rates() {
        let reference = words(&["the", "cat"]);
        let path = vec![PathEdge::matched(0, 0), PathEdge::matched(1, 1)];
        let metrics = compute_metrics(&reference, &reference, &path, false);
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.ref_processed, 2);
        assert_eq!(metrics.wer, 0.0);
        assert_eq!(metrics.cer, 0.0);
    }

    #[test]
    fn trailing_deletions_stay_out_of_open_stream_counters() {
        // Reader is two words into a four-word script.
        let reference = words(&["the", "cat", "sat", "down"]);
        let hypothesis = words(&["the", "cat"]);
        let path = vec![
            PathEdge::matched(0, 0),
            PathEdge::matched(1, 1),
            PathEdge::deleted(2),
            PathEdge::deleted(3),
        ];

        let open = compute_metrics(&reference, &hypothesis, &path, false);
        assert_eq!(open.hits, 2);
        assert_eq!(open.deletions, 0);
        assert_eq!(open.ref_processed, 2);
        assert_eq!(open.wer, 0.0);
        assert_eq!(open.cer, 0.0);

        let ended = compute_metrics(&reference, &hypothesis, &path, true);
        assert_eq!(ended.deletions, 2);
        assert_eq!(ended.ref_processed, 4);
        assert_eq!(ended.wer, 0.5);
    }

    #[test]
    fn interior_deletions_count_even_mid_stream() {
        let reference = words(&["a", "b", "c"]);
        let hypothesis = words(&["a", "c"]);
        let path = vec![
            PathEdge::matched(0, 0),
            PathEdge::deleted(1),
            PathEdge::matched(2, 1),
        ];
        let metrics = compute_metrics(&reference, &hypothesis, &path, false);
        assert_eq!(metrics.deletions, 1);
        assert_eq!(metrics.ref_processed, 3);
        assert!((metrics.wer - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn insertions_can_push_wer_above_one() {
        let reference = words(&["hi"]);
        let hypothesis = words(&["hi", "there", "again"]);
        let path = vec![
            PathEdge::matched(0, 0),
            PathEdge::inserted(1),
            PathEdge::inserted(2),
        ];
        let metrics = compute_metrics(&reference, &hypothesis, &path, false);
        assert_eq!(metrics.ref_processed, 1);
        assert_eq!(metrics.wer, 2.0);
    }

    #[test]
    fn cer_is_computed_over_the_covered_cut() {
        // "the cat" vs "the bat": one character differs out of seven.
        let reference = words(&["the", "cat", "sat"]);
        let hypothesis = words(&["the", "bat"]);
        let path = vec![
            PathEdge::matched(0, 0),
            PathEdge::substituted(1, 1),
            PathEdge::deleted(2),
        ];
        let metrics = compute_metrics(&reference, &hypothesis, &path, false);
        assert_eq!(metrics.ref_processed, 2);
        assert!((metrics.cer - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn empty_path_yields_default_metrics() {
        let metrics = compute_metrics(&[], &[], &[], false);
        assert_eq!(metrics, PartialMetrics::default());
    }

    #[test]
    fn all_pending_deletions_yield_zero_rates() {
        // Nothing spoken yet: the whole reference is a trailing deletion run.
        let reference = words(&["a", "b"]);
        let path = vec![PathEdge::deleted(0), PathEdge::deleted(1)];
        let metrics = compute_metrics(&reference, &[], &path, false);
        assert_eq!(metrics, PartialMetrics::default());
    }
}
