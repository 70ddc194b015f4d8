#![allow(dead_code)]

use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndarray::Array2;
use tempfile::NamedTempFile;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};

use timebin_core::error::{Result, TimebinError};
use timebin_core::frame::{BinnedFrame, ColorMode, Frame, SeriesInfo, SourceInfo};
use timebin_core::io::ser::SER_HEADER_SIZE;
use timebin_core::io::StackFile;
use timebin_core::sink::FrameSink;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A frame with every pixel set to `value`.
pub fn flat_frame(value: u16, height: usize, width: usize) -> Frame {
    Frame::new(Array2::from_elem((height, width), value))
}

/// A 1x1 frame holding `value`.
pub fn pixel_frame(value: u16) -> Frame {
    flat_frame(value, 1, 1)
}

/// A frame whose pixel (r, c) is `seed + r * width + c`.
pub fn ramp_frame(seed: u16, height: usize, width: usize) -> Frame {
    let data = Array2::from_shape_fn((height, width), |(r, c)| seed + (r * width + c) as u16);
    Frame::new(data)
}

/// Turn a list of frames into a binner source.
pub fn ok_frames(frames: Vec<Frame>) -> impl Iterator<Item = Result<Frame>> {
    frames.into_iter().map(Ok)
}

/// Pixel (0, 0) of each binned frame.
pub fn first_pixels(frames: &[BinnedFrame]) -> Vec<u32> {
    frames.iter().map(|f| f.data[[0, 0]]).collect()
}

// ---------------------------------------------------------------------------
// Synthetic sources
// ---------------------------------------------------------------------------

/// An endless-or-bounded stream of 1x1 frames whose value is the stream index.
/// `pulled` counts how many frames have been handed out.
pub struct CountingSource {
    next: usize,
    limit: Option<usize>,
    pub pulled: Rc<Cell<usize>>,
}

impl CountingSource {
    pub fn new(limit: Option<usize>) -> (Self, Rc<Cell<usize>>) {
        let pulled = Rc::new(Cell::new(0));
        (
            Self {
                next: 0,
                limit,
                pulled: pulled.clone(),
            },
            pulled,
        )
    }
}

impl Iterator for CountingSource {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Result<Frame>> {
        if self.limit.is_some_and(|l| self.next >= l) {
            return None;
        }
        let frame = pixel_frame((self.next % 1000) as u16);
        self.next += 1;
        self.pulled.set(self.pulled.get() + 1);
        Some(Ok(frame))
    }
}

/// In-memory stack file. Each inner vec is one series.
pub struct MemoryStack {
    path: PathBuf,
    frames: Vec<Vec<Frame>>,
    info: Vec<SeriesInfo>,
    /// (series, index) whose decode fails.
    pub fail_at: Option<(usize, usize)>,
}

impl MemoryStack {
    pub fn new(name: &str, series: Vec<Vec<Frame>>) -> Self {
        let info = series
            .iter()
            .map(|frames| SeriesInfo {
                width: frames.first().map_or(0, |f| f.width() as u32),
                height: frames.first().map_or(0, |f| f.height() as u32),
                bit_depth: 16,
                frame_count: frames.len(),
            })
            .collect();
        Self {
            path: PathBuf::from(name),
            frames: series,
            info,
            fail_at: None,
        }
    }

    /// One series of 1x1 frames with the given values.
    pub fn pixels(name: &str, values: &[u16]) -> Self {
        Self::new(name, vec![values.iter().map(|&v| pixel_frame(v)).collect()])
    }

    pub fn boxed(self) -> Box<dyn StackFile> {
        Box::new(self)
    }
}

impl StackFile for MemoryStack {
    fn path(&self) -> &Path {
        &self.path
    }

    fn series(&self) -> &[SeriesInfo] {
        &self.info
    }

    fn read_frame(&mut self, series: usize, index: usize) -> Result<Frame> {
        if self.fail_at == Some((series, index)) {
            return Err(TimebinError::InvalidSer("corrupt frame".into()));
        }
        Ok(self.frames[series][index].clone())
    }

    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            filename: self.path.clone(),
            format: "memory",
            total_frames: self.frame_count(),
            series: self.info.clone(),
            color_mode: ColorMode::Mono,
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Records every appended frame and how often `finalize` ran.
#[derive(Default)]
pub struct RecordingSink {
    pub frames: Vec<BinnedFrame>,
    pub finalized: usize,
    /// Fail when asked to append the frame at this position.
    pub fail_on: Option<usize>,
}

impl FrameSink for &mut RecordingSink {
    fn append_frame(&mut self, frame: &BinnedFrame) -> Result<()> {
        if self.fail_on == Some(self.frames.len()) {
            return Err(TimebinError::SinkWrite {
                path: PathBuf::from("recording"),
                source: tiff::TiffError::IoError(std::io::Error::other("disk full")),
            });
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finalize(self) -> Result<()> {
        self.finalized += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SER files
// ---------------------------------------------------------------------------

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 9=BAYER_GRBG, 10=BAYER_GBRG, 11=BAYER_BGGR,
///             100=RGB, 101=BGR
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    // Height
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    // PixelDepth
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    // FrameCount
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&[0u8; 16]);

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete mono 8-bit SER file.
pub fn build_ser_8bit(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 8, frames.len(), 0);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Build a complete mono 16-bit little-endian SER file.
pub fn build_ser_16bit(width: u32, height: u32, frames: &[Vec<u16>]) -> Vec<u8> {
    let mut buf = build_ser_header_full(width, height, 16, frames.len(), 0);
    for frame in frames {
        for v in frame {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// Write bytes to a temporary file with the given suffix (e.g. ".ser").
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_temp(data: &[u8], suffix: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

pub fn write_test_ser(data: &[u8]) -> NamedTempFile {
    write_temp(data, ".ser")
}

// ---------------------------------------------------------------------------
// TIFF files
// ---------------------------------------------------------------------------

/// Write a multi-page 16-bit grayscale TIFF. Each page is `(width, height, pixels)`.
pub fn write_test_tiff(pages: &[(u32, u32, Vec<u16>)]) -> NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".tiff")
        .tempfile()
        .expect("create temp file");
    {
        let mut encoder = TiffEncoder::new(f.as_file_mut()).expect("tiff encoder");
        for (w, h, pixels) in pages {
            encoder
                .write_image::<colortype::Gray16>(*w, *h, pixels)
                .expect("write page");
        }
    }
    f.flush().expect("flush");
    f
}

/// Write a multi-page 8-bit grayscale TIFF.
pub fn write_test_tiff_8bit(pages: &[(u32, u32, Vec<u8>)]) -> NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".tif")
        .tempfile()
        .expect("create temp file");
    {
        let mut encoder = TiffEncoder::new(f.as_file_mut()).expect("tiff encoder");
        for (w, h, pixels) in pages {
            encoder
                .write_image::<colortype::Gray8>(*w, *h, pixels)
                .expect("write page");
        }
    }
    f.flush().expect("flush");
    f
}

/// Read every page of a 32-bit grayscale TIFF as (height, width) arrays.
pub fn read_u32_tiff(path: &Path) -> Vec<Array2<u32>> {
    let file = std::fs::File::open(path).expect("open output");
    let mut decoder = Decoder::new(std::io::BufReader::new(file)).expect("decoder");
    let mut pages = Vec::new();
    loop {
        let (w, h) = decoder.dimensions().expect("dimensions");
        let data = match decoder.read_image().expect("read page") {
            DecodingResult::U32(v) => v,
            other => panic!("expected u32 page, got {:?}", std::mem::discriminant(&other)),
        };
        pages.push(Array2::from_shape_vec((h as usize, w as usize), data).expect("shape"));
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().expect("next page");
    }
    pages
}
