pub mod metadata;
pub mod ser;
pub mod tiff_stack;
pub mod tiff_writer;

use std::path::Path;

use crate::consts::{SER_EXTENSIONS, TIFF_EXTENSIONS};
use crate::error::{Result, TimebinError};
use crate::frame::{Frame, SeriesInfo, SourceInfo};

/// An opened image-stack file: an ordered list of series, each an ordered list of frames.
pub trait StackFile {
    fn path(&self) -> &Path;

    fn series(&self) -> &[SeriesInfo];

    /// Decode frame `index` of series `series`.
    fn read_frame(&mut self, series: usize, index: usize) -> Result<Frame>;

    fn source_info(&self) -> SourceInfo;

    /// Total frames over all series.
    fn frame_count(&self) -> usize {
        self.series().iter().map(|s| s.frame_count).sum()
    }
}

/// Open a stack file, choosing the reader from the file extension.
pub fn open_stack(path: &Path) -> Result<Box<dyn StackFile>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some(e) if SER_EXTENSIONS.contains(&e) => Ok(Box::new(ser::SerReader::open(path)?)),
        Some(e) if TIFF_EXTENSIONS.contains(&e) => {
            Ok(Box::new(tiff_stack::TiffStackReader::open(path)?))
        }
        _ => Err(TimebinError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Open every path in order.
pub fn open_stacks(paths: &[impl AsRef<Path>]) -> Result<Vec<Box<dyn StackFile>>> {
    paths.iter().map(|p| open_stack(p.as_ref())).collect()
}
