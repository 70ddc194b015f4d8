use std::path::PathBuf;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Metadata,
    Binning,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Opening inputs"),
            Self::Metadata => write!(f, "Writing metadata"),
            Self::Binning => write!(f, "Binning frames"),
        }
    }
}

/// Outcome of a completed binning run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinSummary {
    pub input_frames: usize,
    pub window_size: usize,
    pub binned_frames: usize,
    /// Trailing frames that did not fill a whole window.
    pub dropped_frames: usize,
    pub output: PathBuf,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., window count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_binning` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
