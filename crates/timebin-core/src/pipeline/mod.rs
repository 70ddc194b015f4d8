pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_binning, run_binning_reported};
pub use types::{BinSummary, PipelineStage, ProgressReporter};
