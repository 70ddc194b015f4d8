use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::consts::METADATA_BINNING_KEY;
use crate::error::{Result, TimebinError};

/// Copy a YAML metadata sidecar from `input` to `output`, recording the window size.
///
/// The document must be a mapping. `binning` is set to `window_size`, replacing
/// any previous value; all other keys are kept.
pub fn write_binning_metadata(input: &Path, output: &Path, window_size: usize) -> Result<()> {
    let content = std::fs::read_to_string(input)?;
    let mut doc: Value = serde_yaml::from_str(&content).map_err(|e| TimebinError::Metadata {
        path: input.to_path_buf(),
        reason: e.to_string(),
    })?;

    if doc.is_null() {
        doc = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(mapping) = &mut doc else {
        return Err(TimebinError::Metadata {
            path: input.to_path_buf(),
            reason: "top-level document is not a mapping".into(),
        });
    };
    mapping.insert(
        Value::String(METADATA_BINNING_KEY.into()),
        Value::Number((window_size as u64).into()),
    );

    let rendered = serde_yaml::to_string(&doc).map_err(|e| TimebinError::Metadata {
        path: output.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(output, rendered)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        window_size,
        "Wrote metadata sidecar"
    );
    Ok(())
}
