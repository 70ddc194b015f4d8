use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::binning::{validate_window_size, Parallelism};
use crate::error::{Result, TimebinError};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BinConfig {
    /// Input stacks, read in this order as one frame stream.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Frames summed into each output frame.
    pub window_size: usize,
    #[serde(default)]
    pub parallelism: Parallelism,
    /// Optional YAML sidecar to copy with the window size recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataConfig>,
}

impl BinConfig {
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(TimebinError::NoInputs);
        }
        validate_window_size(self.window_size)?;
        if self.parallelism == Parallelism::Workers(0) {
            return Err(TimebinError::InvalidWorkerCount);
        }
        if self.inputs.iter().any(|p| same_file(p, &self.output)) {
            return Err(TimebinError::Config(format!(
                "output {} is also an input",
                self.output.display()
            )));
        }
        Ok(())
    }
}

/// Paths name the same file: equal as written, or equal once both resolve.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("input.ser")],
            output: PathBuf::from("binned.tiff"),
            window_size: 10,
            parallelism: Parallelism::default(),
            metadata: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}
