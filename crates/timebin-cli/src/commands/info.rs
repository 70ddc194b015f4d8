use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use timebin_core::binning::{projected_windows, validate_window_size};
use timebin_core::io::open_stack;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER or TIFF files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show how many binned frames this window size would produce
    #[arg(short = 'n', long)]
    pub window_size: Option<usize>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    if let Some(n) = args.window_size {
        validate_window_size(n)?;
    }
    let mut total_frames = 0;

    for path in &args.files {
        let stack =
            open_stack(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let info = stack.source_info();
        total_frames += info.total_frames;

        println!("File:        {}", info.filename.display());
        println!("Format:      {}", info.format);
        println!("Frames:      {}", info.total_frames);
        println!("Color mode:  {:?}", info.color_mode);

        for (i, series) in info.series.iter().enumerate() {
            println!(
                "Series {:<4} {}x{}, {}-bit, {} frames",
                i, series.width, series.height, series.bit_depth, series.frame_count
            );
        }

        let raw_bytes: usize = info
            .series
            .iter()
            .map(|s| {
                let bytes_per_sample = if s.bit_depth <= 8 { 1 } else { 2 };
                s.width as usize * s.height as usize * s.frame_count * bytes_per_sample
            })
            .sum();
        println!("Data size:   {:.1} MB", raw_bytes as f64 / (1024.0 * 1024.0));
        println!();
    }

    if args.files.len() > 1 {
        println!("Total:       {} frames in {} files", total_frames, args.files.len());
    }
    if let Some(n) = args.window_size {
        let (windows, dropped) = projected_windows(total_frames, n)?;
        println!(
            "Binning:     {} output frames with -n {} ({} trailing frames dropped)",
            windows, n, dropped
        );
    }

    Ok(())
}
