use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;
use tracing::debug;

use crate::error::{Result, TimebinError};
use crate::frame::{ColorMode, Frame, SeriesInfo, SourceInfo};
use crate::io::StackFile;

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    /// Bytes per pixel plane (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel_plane(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            100 | 101 => 3,
            _ => 1,
        }
    }

    /// Total bytes per frame, or `None` if the dimensions overflow `usize`.
    pub fn frame_byte_size(&self) -> Option<usize> {
        let pixels = (self.width as usize).checked_mul(self.height as usize)?;
        pixels.checked_mul(self.bytes_per_pixel_plane() * self.planes_per_pixel())
    }

    /// Mosaic of a single-plane video. Unknown ids read as mono.
    pub fn color_mode(&self) -> ColorMode {
        match self.color_id {
            8 => ColorMode::BayerRGGB,
            9 => ColorMode::BayerGRBG,
            10 => ColorMode::BayerGBRG,
            11 => ColorMode::BayerBGGR,
            _ => ColorMode::Mono,
        }
    }
}

/// Memory-mapped SER file reader.
///
/// A SER video is a single series. Mono and raw Bayer data are read as one
/// plane; interleaved RGB/BGR videos are rejected at open.
pub struct SerReader {
    mmap: Mmap,
    path: PathBuf,
    frame_bytes: usize,
    series: [SeriesInfo; 1],
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(TimebinError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(TimebinError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        if header.planes_per_pixel() != 1 {
            return Err(TimebinError::UnsupportedPixelFormat(format!(
                "SER color id {} is interleaved RGB/BGR (only mono and raw Bayer can be binned)",
                header.color_id
            )));
        }
        if header.pixel_depth == 0 || header.pixel_depth > 16 {
            return Err(TimebinError::UnsupportedPixelFormat(format!(
                "{}-bit SER samples",
                header.pixel_depth
            )));
        }

        let frame_bytes = header.frame_byte_size().ok_or(TimebinError::InvalidDimensions {
            width: header.width,
            height: header.height,
        })?;
        let expected_data_size = frame_bytes
            .checked_mul(header.frame_count as usize)
            .and_then(|d| d.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| TimebinError::InvalidSer("Frame data size overflows".into()))?;
        if mmap.len() < expected_data_size {
            return Err(TimebinError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        debug!(
            path = %path.display(),
            frames = header.frame_count,
            width = header.width,
            height = header.height,
            depth = header.pixel_depth,
            "Opened SER file"
        );

        let series = [SeriesInfo {
            width: header.width,
            height: header.height,
            bit_depth: header.pixel_depth as u8,
            frame_count: header.frame_count as usize,
        }];

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            frame_bytes,
            series,
            header,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(TimebinError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_bytes;
        Ok(&self.mmap[offset..offset + self.frame_bytes])
    }

    /// Read a single frame with raw sample values.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let data = decode_mono_plane(
            raw,
            h,
            w,
            self.header.bytes_per_pixel_plane(),
            self.header.little_endian,
        );

        let mut frame = Frame::new(data);
        frame.frame_index = index;
        Ok(frame)
    }
}

impl StackFile for SerReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn series(&self) -> &[SeriesInfo] {
        &self.series
    }

    fn read_frame(&mut self, series: usize, index: usize) -> Result<Frame> {
        if series != 0 {
            return Err(TimebinError::FrameIndexOutOfRange { index: series, total: 1 });
        }
        SerReader::read_frame(self, index)
    }

    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            filename: self.path.clone(),
            format: "SER",
            total_frames: self.frame_count(),
            series: self.series.to_vec(),
            color_mode: self.header.color_mode(),
        }
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()? as u32;
    let height = cursor.read_i32::<LittleEndian>()? as u32;
    let pixel_depth = cursor.read_i32::<LittleEndian>()? as u32;
    let frame_count = cursor.read_i32::<LittleEndian>()? as u32;

    if width == 0 || height == 0 {
        return Err(TimebinError::InvalidDimensions { width, height });
    }

    // SER spec: LittleEndian field = 0 means big-endian pixel data,
    // but many writers (including FireCapture) use 0 for little-endian.
    // Follow Siril's convention: treat 0 as little-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
    })
}

fn decode_mono_plane(
    raw: &[u8],
    height: usize,
    width: usize,
    bytes_per_sample: usize,
    little_endian: bool,
) -> Array2<u16> {
    if bytes_per_sample == 1 {
        return Array2::from_shape_fn((height, width), |(row, col)| {
            raw[row * width + col] as u16
        });
    }
    Array2::from_shape_fn((height, width), |(row, col)| {
        let idx = (row * width + col) * 2;
        let pair = [raw[idx], raw[idx + 1]];
        if little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    })
}
