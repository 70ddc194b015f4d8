use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use timebin_core::pipeline::{PipelineStage, ProgressReporter};

/// Progress reporter that drives one indicatif bar per pipeline stage.
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    /// Finish whatever bar is still active.
    pub fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_with_message("Done");
            }
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let bar = match (stage, total_items) {
            (PipelineStage::Binning, Some(total)) => {
                let bar = ProgressBar::new(total as u64);
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{msg:16} [{bar:40}] {pos}/{len} ETA {eta}")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            _ => ProgressBar::new_spinner(),
        };
        bar.set_message(stage.to_string());
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(previous) = guard.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, items_done: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                bar.set_position(items_done as u64);
            }
        }
    }

    fn finish_stage(&self) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                bar.tick();
            }
        }
    }
}
