use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Result, TimebinError};
use crate::frame::Frame;
use crate::io::StackFile;

/// The frames of an ordered list of stack files, read as one forward-only stream.
///
/// Frames of file i precede those of file i+1; within a file, series order then
/// page order. Only the frame being decoded is held; a file is dropped as soon
/// as its last frame has been read. A decode failure is yielded once and ends
/// the stream.
pub struct FrameStream {
    files: VecDeque<Box<dyn StackFile>>,
    series: usize,
    index: usize,
    emitted: usize,
    failed: bool,
}

impl FrameStream {
    pub fn new(files: Vec<Box<dyn StackFile>>) -> Self {
        Self {
            files: files.into(),
            series: 0,
            index: 0,
            emitted: 0,
            failed: false,
        }
    }

    /// Frames still to come, from the file headers.
    pub fn remaining_frames(&self) -> usize {
        let total: usize = self.files.iter().map(|f| f.frame_count()).sum();
        let consumed_in_current: usize = self.files.front().map_or(0, |f| {
            f.series()[..self.series.min(f.series().len())]
                .iter()
                .map(|s| s.frame_count)
                .sum::<usize>()
                + self.index
        });
        total - consumed_in_current
    }

    /// Frames yielded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Advance the cursor past exhausted series and files.
    /// Returns false once every file is exhausted.
    fn settle(&mut self) -> bool {
        while let Some(file) = self.files.front() {
            match file.series().get(self.series) {
                Some(s) if self.index < s.frame_count => return true,
                Some(_) => {
                    self.series += 1;
                    self.index = 0;
                }
                None => {
                    debug!(path = %file.path().display(), "Input exhausted");
                    self.files.pop_front();
                    self.series = 0;
                    self.index = 0;
                }
            }
        }
        false
    }
}

impl Iterator for FrameStream {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Result<Frame>> {
        if self.failed || !self.settle() {
            return None;
        }
        let (series, index) = (self.series, self.index);
        let file = self.files.front_mut()?;
        match file.read_frame(series, index) {
            Ok(mut frame) => {
                frame.frame_index = self.emitted;
                self.index += 1;
                self.emitted += 1;
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(TimebinError::SourceDecode {
                    path: file.path().to_path_buf(),
                    series,
                    frame: index,
                    source: Box::new(e),
                }))
            }
        }
    }
}

impl std::iter::FusedIterator for FrameStream {}
