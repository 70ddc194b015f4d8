use std::fs::File;
use std::path::{Path, PathBuf};

use tiff::encoder::{colortype, TiffEncoder, TiffKindBig};
use tiff::TiffError;
use tracing::debug;

use crate::error::{Result, TimebinError};
use crate::frame::BinnedFrame;
use crate::sink::FrameSink;

/// Appends binned frames to a BigTIFF as uncompressed 32-bit grayscale pages.
///
/// Each page is complete on disk once `append_frame` returns, so a run that
/// aborts leaves a readable file holding every frame written so far.
pub struct BinnedTiffWriter {
    path: PathBuf,
    encoder: TiffEncoder<File, TiffKindBig>,
    /// Second handle on the output, used to sync after the encoder is dropped.
    file: File,
    frames_written: usize,
}

impl BinnedTiffWriter {
    /// Create (or truncate) the output file and write the BigTIFF header.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| sink_error(path, TiffError::IoError(e)))?;
        let sync_handle = file
            .try_clone()
            .map_err(|e| sink_error(path, TiffError::IoError(e)))?;
        let encoder = TiffEncoder::new_big(file).map_err(|e| sink_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            encoder,
            file: sync_handle,
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl FrameSink for BinnedTiffWriter {
    fn append_frame(&mut self, frame: &BinnedFrame) -> Result<()> {
        let (w, h) = (frame.width() as u32, frame.height() as u32);
        let result = match frame.data.as_slice() {
            Some(pixels) => self.encoder.write_image::<colortype::Gray32>(w, h, pixels),
            None => {
                let pixels: Vec<u32> = frame.data.iter().copied().collect();
                self.encoder.write_image::<colortype::Gray32>(w, h, &pixels)
            }
        };
        result.map_err(|e| sink_error(&self.path, e))?;
        self.frames_written += 1;
        debug!(window = frame.window_index, "Wrote binned frame");
        Ok(())
    }

    fn finalize(self) -> Result<()> {
        let Self {
            path,
            encoder,
            file,
            frames_written,
        } = self;
        drop(encoder);
        file.sync_all()
            .map_err(|e| sink_error(&path, TiffError::IoError(e)))?;
        debug!(path = %path.display(), frames = frames_written, "Finalized output");
        Ok(())
    }
}

fn sink_error(path: &Path, source: TiffError) -> TimebinError {
    TimebinError::SinkWrite {
        path: path.to_path_buf(),
        source,
    }
}
