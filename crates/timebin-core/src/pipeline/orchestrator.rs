use std::sync::Arc;

use tracing::{info, warn};

use crate::binning::{bin, projected_windows};
use crate::error::Result;
use crate::io::metadata::write_binning_metadata;
use crate::io::open_stacks;
use crate::io::tiff_writer::BinnedTiffWriter;
use crate::sink::write_binned;
use crate::source::FrameStream;

use super::config::BinConfig;
use super::types::{BinSummary, NoOpReporter, PipelineStage, ProgressReporter};

/// Run a binning job with a thread-safe progress reporter.
///
/// Opens every input, writes the metadata sidecar (if configured), then
/// streams the inputs through the binner into a BigTIFF at `config.output`.
pub fn run_binning_reported(
    config: &BinConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BinSummary> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Reading, Some(config.inputs.len()));
    let files = open_stacks(&config.inputs)?;
    let stream = FrameStream::new(files);
    reporter.finish_stage();

    let n = config.window_size;
    let input_frames = stream.remaining_frames();
    let (expected, remainder) = projected_windows(input_frames, n)?;
    info!(
        inputs = config.inputs.len(),
        total_frames = input_frames,
        window_size = n,
        windows = expected,
        "Reading image stacks"
    );
    if remainder > 0 {
        warn!(
            dropped = remainder,
            window_size = n,
            "Frame count is not a multiple of the window size; trailing frames will be dropped"
        );
    }

    if let Some(ref meta) = config.metadata {
        reporter.begin_stage(PipelineStage::Metadata, None);
        write_binning_metadata(&meta.input, &meta.output, n)?;
        reporter.finish_stage();
    }

    reporter.begin_stage(PipelineStage::Binning, Some(expected));
    let binned = bin(stream, n, config.parallelism)?;
    let sink = BinnedTiffWriter::create(&config.output)?;
    let written = write_binned(binned, sink, |done| reporter.advance(done))?;
    reporter.finish_stage();

    info!(
        binned_frames = written,
        output = %config.output.display(),
        "Binning complete"
    );

    Ok(BinSummary {
        input_frames,
        window_size: n,
        binned_frames: written,
        dropped_frames: input_frames.saturating_sub(written * n),
        output: config.output.clone(),
    })
}

/// Run a binning job without progress reporting.
pub fn run_binning(config: &BinConfig) -> Result<BinSummary> {
    run_binning_reported(config, Arc::new(NoOpReporter))
}
