use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::AlignError;
use crate::types::PartialMetrics;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

const OUTLIER_TOP_N: usize = 20;
/// Sessions with a WER above this get a note so they stand out in the JSON.
const HIGH_WER_NOTE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub sessions: Vec<SessionReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub commit_window: String,
    pub session_count: usize,
}

/// Per-session summary of one replayed hypothesis stream.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub id: String,
    pub ref_tokens: u32,
    pub hyp_tokens: u32,
    pub total_cost: u32,
    pub wer: f32,
    pub cer: f32,
    pub hits: u32,
    pub substitutions: u32,
    pub deletions: u32,
    pub insertions: u32,
    /// True when the whole reference was committed before the stream closed.
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_lag: Option<CommitLagStats>,
    /// Attached only for outlier sessions; see [`attach_outlier_traces`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict_trace: Option<Vec<VerdictTraceEntry>>,
    pub notes: Vec<String>,
}

/// How many further tokens arrived before a hypothesis position's verdict
/// became final.
#[derive(Debug, Clone, Serialize)]
pub struct CommitLagStats {
    pub mean: f32,
    pub p90: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerdictTraceEntry {
    pub kind: &'static str,
    pub index: u32,
    pub token: String,
    pub verdict: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub session_count: usize,
    pub completed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wer: Option<MetricDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cer: Option<MetricDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_lag_mean: Option<MetricDistribution>,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub worst_wer: Vec<OutlierEntry>,
    pub worst_cer: Vec<OutlierEntry>,
    pub slowest_commit: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f32,
}

/// Summarize one finished session.
pub fn compute_session_report(
    id: &str,
    ref_tokens: usize,
    hyp_tokens: usize,
    total_cost: usize,
    metrics: &PartialMetrics,
    commit_lags: &[f64],
    completed: bool,
) -> Result<SessionReport, AlignError> {
    let mut notes = Vec::new();
    if ref_tokens == 0 {
        notes.push("empty_reference".to_string());
    }
    if hyp_tokens == 0 {
        notes.push("empty_hypothesis".to_string());
    }
    if metrics.wer > HIGH_WER_NOTE_THRESHOLD {
        notes.push(format!("high_wer:{:.2}", metrics.wer));
    }

    Ok(SessionReport {
        id: id.to_string(),
        ref_tokens: to_u32(ref_tokens),
        hyp_tokens: to_u32(hyp_tokens),
        total_cost: to_u32(total_cost),
        wer: checked_f32(metrics.wer, "session wer")?,
        cer: checked_f32(metrics.cer, "session cer")?,
        hits: to_u32(metrics.hits),
        substitutions: to_u32(metrics.substitutions),
        deletions: to_u32(metrics.deletions),
        insertions: to_u32(metrics.insertions),
        completed,
        commit_lag: commit_lag_stats(commit_lags)?,
        verdict_trace: None,
        notes,
    })
}

pub fn aggregate_reports(sessions: &[SessionReport]) -> Result<AggregateReport, AlignError> {
    let wers: Vec<f64> = sessions.iter().map(|s| f64::from(s.wer)).collect();
    let cers: Vec<f64> = sessions.iter().map(|s| f64::from(s.cer)).collect();
    let lag_means: Vec<f64> = sessions
        .iter()
        .filter_map(|s| s.commit_lag.as_ref().map(|lag| f64::from(lag.mean)))
        .collect();

    let worst_wer = ranked_outliers(
        sessions
            .iter()
            .map(|s| (s.id.clone(), f64::from(s.wer)))
            .collect(),
        OUTLIER_TOP_N,
    )?;
    let worst_cer = ranked_outliers(
        sessions
            .iter()
            .map(|s| (s.id.clone(), f64::from(s.cer)))
            .collect(),
        OUTLIER_TOP_N,
    )?;
    let slowest_commit = ranked_outliers(
        sessions
            .iter()
            .filter_map(|s| {
                s.commit_lag
                    .as_ref()
                    .map(|lag| (s.id.clone(), f64::from(lag.max)))
            })
            .collect(),
        OUTLIER_TOP_N,
    )?;

    Ok(AggregateReport {
        session_count: sessions.len(),
        completed_count: sessions.iter().filter(|s| s.completed).count(),
        wer: distribution_or_none(&wers, "aggregate wer")?,
        cer: distribution_or_none(&cers, "aggregate cer")?,
        commit_lag_mean: distribution_or_none(&lag_means, "aggregate commit lag")?,
        outliers: OutlierReport {
            worst_wer,
            worst_cer,
            slowest_commit,
        },
    })
}

/// Attach verdict traces to the `top_n` worst-WER sessions so the heaviest
/// failures can be inspected token by token without bloating every entry.
pub fn attach_outlier_traces(
    sessions: &mut [SessionReport],
    traces: &mut HashMap<String, Vec<VerdictTraceEntry>>,
    top_n: usize,
) {
    let mut ranked: Vec<(String, f32)> = sessions
        .iter()
        .map(|s| (s.id.clone(), s.wer))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(top_n);

    for session in sessions.iter_mut() {
        if ranked.iter().any(|(id, _)| id == &session.id) {
            session.verdict_trace = traces.remove(&session.id);
        }
    }
}

fn commit_lag_stats(lags: &[f64]) -> Result<Option<CommitLagStats>, AlignError> {
    if lags.is_empty() {
        return Ok(None);
    }
    let mut sorted = lags.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(Some(CommitLagStats {
        mean: checked_f32(mean(&sorted), "commit lag mean")?,
        p90: checked_f32(percentile_sorted(&sorted, 90.0), "commit lag p90")?,
        max: checked_f32(sorted[sorted.len() - 1], "commit lag max")?,
    }))
}

fn ranked_outliers(
    mut entries: Vec<(String, f64)>,
    top_n: usize,
) -> Result<Vec<OutlierEntry>, AlignError> {
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(top_n);
    entries
        .into_iter()
        .map(|(id, value)| {
            Ok(OutlierEntry {
                id,
                value: checked_f32(value, "outlier value")?,
            })
        })
        .collect()
}

fn distribution_or_none(
    values: &[f64],
    what: &'static str,
) -> Result<Option<MetricDistribution>, AlignError> {
    if values.is_empty() {
        return Ok(None);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), what)?,
        p50: checked_f32(median_sorted(&sorted), what)?,
        p90: checked_f32(percentile_sorted(&sorted, 90.0), what)?,
        p95: checked_f32(percentile_sorted(&sorted, 95.0), what)?,
        p99: checked_f32(percentile_sorted(&sorted, 99.0), what)?,
    }))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_sorted(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile with linear interpolation between adjacent ranks.
fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        return sorted[low];
    }
    let weight = rank - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
}

fn checked_f32(value: f64, what: &'static str) -> Result<f32, AlignError> {
    if !value.is_finite() {
        return Err(AlignError::invalid_input(format!(
            "{what} is not finite: {value}"
        )));
    }
    if value.abs() > f64::from(f32::MAX) {
        return Err(AlignError::invalid_input(format!(
            "{what} exceeds f32 range: {value}"
        )));
    }
    Ok(value as f32)
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
