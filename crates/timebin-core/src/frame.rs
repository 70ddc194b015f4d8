use ndarray::Array2;
use std::path::PathBuf;

/// A single grayscale image frame as decoded from a stack file.
/// Pixel values are the raw sensor counts; 8-bit sources are widened to u16.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<u16>,
    /// Position in the logical frame stream (or within the file when read directly).
    pub frame_index: usize,
}

impl Frame {
    pub fn new(data: Array2<u16>) -> Self {
        Self {
            data,
            frame_index: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// The sum of one window of frames.
///
/// Each pixel holds the exact sum of the corresponding pixels of the window's
/// frames. `u32` holds `MAX_WINDOW_SIZE` saturated 16-bit samples.
#[derive(Clone, Debug)]
pub struct BinnedFrame {
    pub data: Array2<u32>,
    pub window_index: usize,
    pub frames_summed: usize,
    /// Stream index of the first frame in the window.
    pub first_frame_index: usize,
}

impl BinnedFrame {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// Sample layout of a single-plane source: mono or a raw Bayer mosaic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    BayerRGGB,
    BayerGRBG,
    BayerGBRG,
    BayerBGGR,
}

/// Shape and sample layout of one series within a stack file.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub frame_count: usize,
}

/// Metadata about one source file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub format: &'static str,
    pub total_frames: usize,
    pub series: Vec<SeriesInfo>,
    pub color_mode: ColorMode,
}
