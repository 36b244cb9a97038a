use std::fs;
use std::path::Path;

use scriptmatch::{MetricDistribution, OutlierEntry, Report};

pub fn write_report(path: &Path, report: &Report) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create report output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, render(report))
        .map_err(|err| format!("Failed to write report file '{}': {err}", path.display()))
}

fn render(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "session report (schema v{})\n",
        report.schema_version
    ));
    out.push_str(&format!("generated_at:  {}\n", report.meta.generated_at));
    out.push_str(&format!("commit_window: {}\n", report.meta.commit_window));
    out.push_str(&format!(
        "sessions:      {} ({} completed)\n\n",
        report.aggregates.session_count, report.aggregates.completed_count
    ));

    out.push_str(&format!(
        "{:<24} {:>6} {:>6} {:>6} {:>7} {:>7}  flags\n",
        "id", "ref", "hyp", "cost", "wer", "cer"
    ));
    for session in &report.sessions {
        let mut flags = Vec::new();
        if !session.completed {
            flags.push("incomplete".to_string());
        }
        flags.extend(session.notes.iter().cloned());
        out.push_str(&format!(
            "{:<24} {:>6} {:>6} {:>6} {:>7.3} {:>7.3}  {}\n",
            session.id,
            session.ref_tokens,
            session.hyp_tokens,
            session.total_cost,
            session.wer,
            session.cer,
            flags.join(",")
        ));
    }
    out.push('\n');

    push_distribution(&mut out, "wer", report.aggregates.wer.as_ref());
    push_distribution(&mut out, "cer", report.aggregates.cer.as_ref());
    push_distribution(
        &mut out,
        "commit_lag_mean",
        report.aggregates.commit_lag_mean.as_ref(),
    );

    push_outliers(&mut out, "worst wer", &report.aggregates.outliers.worst_wer);
    push_outliers(&mut out, "worst cer", &report.aggregates.outliers.worst_cer);
    push_outliers(
        &mut out,
        "slowest commit",
        &report.aggregates.outliers.slowest_commit,
    );
    out
}

fn push_distribution(out: &mut String, label: &str, distribution: Option<&MetricDistribution>) {
    match distribution {
        Some(d) => out.push_str(&format!(
            "{label:<16} mean {:.3}  p50 {:.3}  p90 {:.3}  p95 {:.3}  p99 {:.3}\n",
            d.mean, d.p50, d.p90, d.p95, d.p99
        )),
        None => out.push_str(&format!("{label:<16} (no data)\n")),
    }
}

fn push_outliers(out: &mut String, label: &str, entries: &[OutlierEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("\n{label}:\n"));
    for entry in entries {
        out.push_str(&format!("  {:<24} {:.3}\n", entry.id, entry.value));
    }
}
