pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::aligner::{IncrementalAligner, TokenOutcome};
pub use alignment::commit::CommitPolicy;
pub use alignment::matrix::AlignmentMatrix;
pub use alignment::metrics::compute_metrics;
pub use alignment::report::{
    aggregate_reports, attach_outlier_traces, compute_session_report, AggregateReport,
    CommitLagStats, Meta, MetricDistribution, OutlierEntry, OutlierReport, Report, SessionReport,
    VerdictTraceEntry, REPORT_SCHEMA_VERSION,
};
pub use alignment::tokenization::{normalize_text, tokenize_words};
pub use config::{CommitWindow, SessionConfig};
pub use error::AlignError;
pub use pipeline::builder::SessionBuilder;
pub use pipeline::defaults::{ChannelSink, NullSink, WhitespaceTokenizer};
pub use pipeline::runtime::LiveSession;
pub use pipeline::traits::{Tokenizer, VerdictSink};
pub use types::{
    AlignmentSnapshot, CommitFrontier, EditOp, PartialMetrics, PathEdge, PositionKind, Verdict,
    VerdictEvent,
};
