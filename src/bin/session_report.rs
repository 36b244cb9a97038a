use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use scriptmatch::{
    aggregate_reports, attach_outlier_traces, compute_session_report, normalize_text, ChannelSink,
    CommitWindow, Meta, Report, SessionBuilder, SessionConfig, SessionReport, VerdictTraceEntry,
    REPORT_SCHEMA_VERSION,
};

#[path = "session_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "session_report/text_report_formatter.rs"]
mod text_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    #[value(name = "text")]
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "session_report")]
#[command(about = "Replay recorded hypothesis streams against a reference script and report error rates")]
struct Args {
    /// Reference script as plain text.
    #[arg(long, env = "SCRIPTMATCH_REPORT_REFERENCE")]
    reference: PathBuf,
    /// Recorded hypothesis stream files; each file becomes one session.
    #[arg(long, env = "SCRIPTMATCH_REPORT_HYPOTHESIS")]
    hypothesis: Vec<PathBuf>,
    /// Directory scanned for *.txt hypothesis streams, replayed in name order.
    #[arg(long, env = "SCRIPTMATCH_REPORT_HYPOTHESIS_DIR")]
    hypothesis_dir: Option<PathBuf>,
    /// Session config JSON; overrides the window flags below.
    #[arg(long, env = "SCRIPTMATCH_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SCRIPTMATCH_REPORT_COMMIT_WINDOW", default_value_t = 5)]
    commit_window: usize,
    /// Scale the window with the running edit cost instead of keeping it fixed.
    #[arg(long, env = "SCRIPTMATCH_REPORT_COST_ADAPTIVE", default_value_t = false)]
    cost_adaptive: bool,
    #[arg(long, env = "SCRIPTMATCH_REPORT_OUT")]
    out: Option<PathBuf>,
    #[arg(long, env = "SCRIPTMATCH_REPORT_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "SCRIPTMATCH_REPORT_OFFSET", default_value_t = 0)]
    offset: usize,
    #[arg(
        long,
        env = "SCRIPTMATCH_REPORT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
    /// Worst-WER sessions that get a full verdict trace attached.
    #[arg(long, env = "SCRIPTMATCH_REPORT_TRACE_TOP_N", default_value_t = 5)]
    trace_top_n: usize,
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let reference_path = resolve_path(&repo_root, &args.reference);
    require_path_exists(&reference_path, "Missing --reference script.")?;
    let reference_text = fs::read_to_string(&reference_path).map_err(|err| {
        format!(
            "Failed to read reference script '{}': {err}",
            reference_path.display()
        )
    })?;
    let reference_text = normalize_text(&reference_text);

    let streams = collect_streams(&repo_root, &args)?;
    if streams.is_empty() {
        return Err(
            "No hypothesis streams selected. Pass --hypothesis files or --hypothesis-dir."
                .to_string(),
        );
    }

    let window = commit_window(&repo_root, &args)?;
    let out_path = resolve_out_path(&repo_root, args.out.as_ref(), args.output_format);

    let progress = ProgressBar::new(streams.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let mut sessions: Vec<SessionReport> = Vec::new();
    let mut traces_by_id: HashMap<String, Vec<VerdictTraceEntry>> = HashMap::new();
    let mut replay_elapsed = Duration::ZERO;
    for stream in &streams {
        progress.set_message(stream.id.clone());
        let started = Instant::now();
        let (report, trace) = replay_stream(&reference_text, stream, window)?;
        replay_elapsed += started.elapsed();
        traces_by_id.insert(stream.id.clone(), trace);
        sessions.push(report);
        progress.inc(1);
    }
    progress.finish_with_message("replay complete");

    let replay_seconds = replay_elapsed.as_secs_f64();
    println!(
        "replay_elapsed: {:.2}s ({}) avg_per_session: {:.2}ms",
        replay_seconds,
        format_duration_hms(replay_elapsed),
        replay_seconds * 1000.0 / streams.len() as f64
    );

    let aggregates = aggregate_reports(&sessions)
        .map_err(|err| format!("Failed to aggregate session reports: {err}"))?;
    attach_outlier_traces(&mut sessions, &mut traces_by_id, args.trace_top_n);

    let report = Report {
        schema_version: REPORT_SCHEMA_VERSION,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            commit_window: describe_window(window),
            session_count: sessions.len(),
        },
        sessions,
        aggregates,
    };

    match args.output_format {
        OutputFormat::Json => json_report_formatter::write_report(&out_path, &report)?,
        OutputFormat::Text => text_report_formatter::write_report(&out_path, &report)?,
    }
    println!("Report written to {}", out_path.display());
    Ok(())
}

#[derive(Debug, Clone)]
struct StreamCase {
    id: String,
    path: PathBuf,
}

fn replay_stream(
    reference_text: &str,
    stream: &StreamCase,
    window: CommitWindow,
) -> Result<(SessionReport, Vec<VerdictTraceEntry>), String> {
    let content = fs::read_to_string(&stream.path).map_err(|err| {
        format!(
            "Failed to read hypothesis stream '{}': {err}",
            stream.path.display()
        )
    })?;

    let (sink, receiver) = ChannelSink::unbounded();
    let session = SessionBuilder::new(reference_text)
        .with_commit_window(window)
        .with_sink(Box::new(sink))
        .build()
        .map_err(|err| format!("Failed to build session '{}': {err}", stream.id))?;

    // Feed line by line so the replay sees the same chunk boundaries the
    // recorder wrote.
    for line in content.lines() {
        session
            .push_text(line)
            .map_err(|err| format!("Failed to align stream '{}': {err}", stream.id))?;
    }
    let completed_before_close = session
        .is_complete()
        .map_err(|err| format!("Failed to inspect session '{}': {err}", stream.id))?;
    let final_snapshot = session
        .finish()
        .map_err(|err| format!("Failed to finish stream '{}': {err}", stream.id))?;

    let metrics = session
        .metrics()
        .map_err(|err| format!("Failed to read metrics for '{}': {err}", stream.id))?;
    let commit_lags = session
        .commit_lags()
        .map_err(|err| format!("Failed to read commit lags for '{}': {err}", stream.id))?;
    let ref_tokens = session
        .reference_len()
        .map_err(|err| format!("Failed to read session '{}': {err}", stream.id))?;
    let hyp_tokens = session
        .hypothesis_len()
        .map_err(|err| format!("Failed to read session '{}': {err}", stream.id))?;

    let trace: Vec<VerdictTraceEntry> = receiver
        .try_iter()
        .map(|event| VerdictTraceEntry {
            kind: event.kind.as_str(),
            index: event.index as u32,
            token: event.token,
            verdict: event.verdict.as_str(),
        })
        .collect();

    let report = compute_session_report(
        &stream.id,
        ref_tokens,
        hyp_tokens,
        final_snapshot.total_cost,
        &metrics,
        &commit_lags,
        completed_before_close,
    )
    .map_err(|err| format!("Failed to summarize stream '{}': {err}", stream.id))?;
    Ok((report, trace))
}

fn collect_streams(repo_root: &Path, args: &Args) -> Result<Vec<StreamCase>, String> {
    let mut paths: Vec<PathBuf> = args
        .hypothesis
        .iter()
        .map(|path| resolve_path(repo_root, path))
        .collect();

    if let Some(dir) = &args.hypothesis_dir {
        let dir = resolve_path(repo_root, dir);
        require_path_exists(&dir, "Missing --hypothesis-dir directory.")?;
        let entries = fs::read_dir(&dir)
            .map_err(|err| format!("Failed to list '{}': {err}", dir.display()))?;
        let mut scanned = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| format!("Failed to list '{}': {err}", dir.display()))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("txt") {
                scanned.push(path);
            }
        }
        scanned.sort();
        paths.extend(scanned);
    }

    for path in &paths {
        require_path_exists(path, "Missing hypothesis stream file.")?;
    }

    let mut cases: Vec<StreamCase> = paths
        .into_iter()
        .map(|path| {
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            StreamCase { id, path }
        })
        .collect();

    if args.offset > 0 {
        cases = cases.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        cases.truncate(limit);
    }
    Ok(cases)
}

fn commit_window(repo_root: &Path, args: &Args) -> Result<CommitWindow, String> {
    if let Some(config_path) = &args.config {
        let config_path = resolve_path(repo_root, config_path);
        require_path_exists(&config_path, "Missing --config file.")?;
        let config = SessionConfig::load(&config_path).map_err(|err| {
            format!(
                "Failed to load session config '{}': {err}",
                config_path.display()
            )
        })?;
        return Ok(config.commit_window);
    }
    if args.cost_adaptive {
        Ok(CommitWindow::CostAdaptive {
            floor: args.commit_window,
        })
    } else {
        Ok(CommitWindow::Fixed(args.commit_window))
    }
}

fn describe_window(window: CommitWindow) -> String {
    match window {
        CommitWindow::Fixed(tokens) => format!("fixed({tokens})"),
        CommitWindow::CostAdaptive { floor } => format!("cost_adaptive(floor={floor})"),
    }
}

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .init();
    }
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>, format: OutputFormat) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
    };
    repo_root
        .join("target")
        .join("session_reports")
        .join(format!("session-report-{run_id}.{extension}"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn format_duration_hms(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let rem_after_hours = total_ms % 3_600_000;
    let minutes = rem_after_hours / 60_000;
    let rem_after_minutes = rem_after_hours % 60_000;
    let seconds = rem_after_minutes / 1_000;
    let millis = rem_after_minutes % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
