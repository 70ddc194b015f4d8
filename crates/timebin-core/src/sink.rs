use crate::error::Result;
use crate::frame::BinnedFrame;

/// Destination for binned frames, written strictly in the order given.
pub trait FrameSink {
    fn append_frame(&mut self, frame: &BinnedFrame) -> Result<()>;

    /// Complete the output. Called exactly once, after the last frame.
    fn finalize(self) -> Result<()>
    where
        Self: Sized;
}

/// Drain `frames` into `sink` one frame at a time.
///
/// Each frame is released as soon as it has been written. The first error,
/// from upstream or from the sink, is returned immediately and the sink is
/// not finalized; frames already written stay in the output.
///
/// Calls `on_written(count)` after each frame and returns the frame count.
pub fn write_binned<I, S>(frames: I, mut sink: S, mut on_written: impl FnMut(usize)) -> Result<usize>
where
    I: IntoIterator<Item = Result<BinnedFrame>>,
    S: FrameSink,
{
    let mut written = 0;
    for frame in frames {
        let frame = frame?;
        sink.append_frame(&frame)?;
        drop(frame);
        written += 1;
        on_written(written);
    }
    sink.finalize()?;
    Ok(written)
}
