pub mod dispatch;
pub mod reduce;
pub mod window;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::MAX_WINDOW_SIZE;
use crate::error::{Result, TimebinError};
use crate::frame::{BinnedFrame, Frame};

use self::dispatch::OrderedDispatch;
use self::reduce::reduce_window;
use self::window::{StripedWindows, Window};

/// How window reductions are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parallelism {
    /// Reduce each window on the calling thread.
    #[default]
    Sequential,
    /// Reduce windows on a dedicated pool of this many worker threads.
    Workers(usize),
}

impl std::fmt::Display for Parallelism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "Sequential"),
            Self::Workers(1) => write!(f, "1 worker"),
            Self::Workers(n) => write!(f, "{n} workers"),
        }
    }
}

type Reducer = fn(Window) -> Result<BinnedFrame>;

enum Stage<I> {
    Sequential(StripedWindows<I>),
    Parallel(OrderedDispatch<StripedWindows<I>, Window, BinnedFrame, Reducer>),
}

/// Lazy sequence of binned frames, one per complete window, in window order.
///
/// Returned by [`bin`]. Ends after the first error.
pub struct BinnedFrames<I> {
    stage: Stage<I>,
    failed: bool,
}

impl<I> Iterator for BinnedFrames<I>
where
    I: Iterator<Item = Result<Frame>>,
{
    type Item = Result<BinnedFrame>;

    fn next(&mut self) -> Option<Result<BinnedFrame>> {
        if self.failed {
            return None;
        }
        let next = match &mut self.stage {
            Stage::Sequential(windows) => windows.next().map(|w| w.and_then(reduce_window)),
            Stage::Parallel(dispatch) => dispatch.next(),
        };
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}

impl<I> std::iter::FusedIterator for BinnedFrames<I> where I: Iterator<Item = Result<Frame>> {}

/// Bin `frames` into sums of `window_size` consecutive frames.
///
/// Output frame k is the pixelwise sum of input frames `k*N .. k*N+N`; a
/// trailing remainder shorter than `window_size` is dropped. Output order is
/// the same for every `parallelism`.
pub fn bin<I>(frames: I, window_size: usize, parallelism: Parallelism) -> Result<BinnedFrames<I>>
where
    I: Iterator<Item = Result<Frame>>,
{
    validate_window_size(window_size)?;
    let windows = StripedWindows::new(frames, window_size);
    let stage = match parallelism {
        Parallelism::Sequential => Stage::Sequential(windows),
        Parallelism::Workers(workers) => {
            let reducer: Reducer = reduce_window;
            Stage::Parallel(OrderedDispatch::new(windows, workers, reducer)?)
        }
    };
    info!(window_size, %parallelism, "Binning started");
    Ok(BinnedFrames {
        stage,
        failed: false,
    })
}

/// Output frames and dropped trailing frames for `total_frames` inputs.
pub fn projected_windows(total_frames: usize, window_size: usize) -> Result<(usize, usize)> {
    validate_window_size(window_size)?;
    Ok((total_frames / window_size, total_frames % window_size))
}

pub fn validate_window_size(window_size: usize) -> Result<()> {
    if window_size == 0 || window_size > MAX_WINDOW_SIZE {
        return Err(TimebinError::InvalidWindowSize {
            size: window_size,
            max: MAX_WINDOW_SIZE,
        });
    }
    Ok(())
}
