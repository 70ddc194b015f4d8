use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use timebin_core::binning::Parallelism;
use timebin_core::pipeline::config::{BinConfig, MetadataConfig};
use timebin_core::pipeline::run_binning_reported;

use crate::progress::BarReporter;
use crate::summary::print_bin_summary;

#[derive(Args)]
pub struct BinArgs {
    /// Input SER or TIFF files, binned as one stream in the order given
    #[arg(required_unless_present = "config")]
    pub inputs: Vec<PathBuf>,

    /// Number of consecutive frames summed into each output frame
    #[arg(short = 'n', long, required_unless_present = "config")]
    pub window_size: Option<usize>,

    /// Output BigTIFF file
    #[arg(short, long, required_unless_present = "config")]
    pub output: Option<PathBuf>,

    /// Reduce windows on this many worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Input and output metadata (YAML) files; the output gets `binning: N`
    #[arg(long, num_args = 2, value_names = ["IN", "OUT"])]
    pub metadata: Option<Vec<PathBuf>>,

    /// Binning config file (TOML); replaces the options above
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &BinArgs) -> Result<()> {
    let config: BinConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid binning config")?
    } else {
        build_config_from_args(args)?
    };
    config.validate()?;

    print_bin_summary(&config);

    let reporter = Arc::new(BarReporter::new());
    let summary = run_binning_reported(&config, reporter.clone())
        .with_context(|| format!("Binning into {} failed", config.output.display()))?;
    reporter.finish();

    println!(
        "\nWrote {} binned frames ({} input frames, N = {}) to {}",
        summary.binned_frames,
        summary.input_frames,
        summary.window_size,
        summary.output.display()
    );
    if summary.dropped_frames > 0 {
        println!(
            "Dropped {} trailing frames that did not fill a window",
            summary.dropped_frames
        );
    }

    Ok(())
}

fn build_config_from_args(args: &BinArgs) -> Result<BinConfig> {
    let window_size = args.window_size.context("--window-size is required")?;
    let output = args.output.clone().context("--output is required")?;
    let parallelism = match args.workers {
        Some(n) => Parallelism::Workers(n),
        None => Parallelism::Sequential,
    };
    let metadata = match args.metadata.as_deref() {
        Some([input, output]) => Some(MetadataConfig {
            input: input.clone(),
            output: output.clone(),
        }),
        _ => None,
    };

    Ok(BinConfig {
        inputs: args.inputs.clone(),
        output,
        window_size,
        parallelism,
        metadata,
    })
}
