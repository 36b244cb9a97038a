pub mod aligner;
pub mod commit;
pub mod matrix;
pub mod metrics;
pub mod report;
pub mod tokenization;
