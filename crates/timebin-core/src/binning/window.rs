use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::Frame;

/// N consecutive frames of the stream: positions `[index * N, index * N + N)`.
#[derive(Debug)]
pub struct Window {
    pub index: usize,
    pub frames: Vec<Frame>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Stream position of the window's first frame.
    pub fn first_frame_index(&self) -> usize {
        self.index * self.frames.len()
    }
}

/// Splits a frame stream into consecutive, non-overlapping windows of `width` frames.
///
/// The stream is viewed as `width` striped cursors: lane `p % width` receives
/// stream position `p`, and a window is the set of lane values once every lane
/// is filled. Exactly `width` frames are pulled per window and nothing is read
/// ahead. A trailing partial window is discarded with a warning.
pub struct StripedWindows<I> {
    source: I,
    width: usize,
    lanes: Vec<Frame>,
    next_window: usize,
    consumed: usize,
    dropped: usize,
    done: bool,
}

impl<I> StripedWindows<I>
where
    I: Iterator<Item = Result<Frame>>,
{
    /// `width` must be at least 1; [`super::bin`] validates it.
    pub fn new(source: I, width: usize) -> Self {
        debug_assert!(width >= 1);
        Self {
            source,
            width,
            lanes: Vec::with_capacity(width),
            next_window: 0,
            consumed: 0,
            dropped: 0,
            done: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Frames pulled from the source so far.
    pub fn consumed_frames(&self) -> usize {
        self.consumed
    }

    /// Frames discarded as an incomplete trailing window.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }

    /// Frames currently held in the lanes.
    pub fn buffered_frames(&self) -> usize {
        self.lanes.len()
    }
}

impl<I> Iterator for StripedWindows<I>
where
    I: Iterator<Item = Result<Frame>>,
{
    type Item = Result<Window>;

    fn next(&mut self) -> Option<Result<Window>> {
        if self.done {
            return None;
        }
        while self.lanes.len() < self.width {
            match self.source.next() {
                Some(Ok(frame)) => {
                    debug_assert_eq!(self.consumed % self.width, self.lanes.len());
                    self.lanes.push(frame);
                    self.consumed += 1;
                }
                Some(Err(e)) => {
                    self.done = true;
                    self.lanes.clear();
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if !self.lanes.is_empty() {
                        self.dropped = self.lanes.len();
                        warn!(
                            dropped = self.dropped,
                            window_size = self.width,
                            "Dropping incomplete trailing window"
                        );
                        self.lanes.clear();
                    }
                    return None;
                }
            }
        }

        let frames = std::mem::replace(&mut self.lanes, Vec::with_capacity(self.width));
        let index = self.next_window;
        self.next_window += 1;
        debug!(window = index, "Window complete");
        Some(Ok(Window { index, frames }))
    }
}

impl<I> std::iter::FusedIterator for StripedWindows<I> where I: Iterator<Item = Result<Frame>> {}
