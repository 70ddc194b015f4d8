use ndarray::{Array2, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TimebinError};
use crate::frame::BinnedFrame;

use super::window::Window;

/// Sum a window of frames pixel by pixel into a u32 frame.
///
/// Every frame must have the shape of the first one.
pub fn reduce_window(window: Window) -> Result<BinnedFrame> {
    let first_frame_index = window.first_frame_index();
    let Window { index, frames } = window;
    let first = frames.first().ok_or(TimebinError::EmptySequence)?;
    let shape = first.data.dim();

    for (i, frame) in frames.iter().enumerate() {
        if frame.data.dim() != shape {
            return Err(TimebinError::ShapeMismatch {
                window: index,
                frame: i,
                expected: shape,
                found: frame.data.dim(),
            });
        }
    }

    let parallel = shape.0 * shape.1 >= PARALLEL_PIXEL_THRESHOLD;
    let mut sum = Array2::<u32>::zeros(shape);
    for frame in &frames {
        let zip = Zip::from(&mut sum).and(&frame.data);
        if parallel {
            zip.par_for_each(|acc, &px| *acc += px as u32);
        } else {
            zip.for_each(|acc, &px| *acc += px as u32);
        }
    }

    Ok(BinnedFrame {
        data: sum,
        window_index: index,
        frames_summed: frames.len(),
        first_frame_index,
    })
}
