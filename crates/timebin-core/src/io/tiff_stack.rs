use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;
use tracing::debug;

use crate::error::{Result, TimebinError};
use crate::frame::{ColorMode, Frame, SeriesInfo, SourceInfo};
use crate::io::StackFile;

type TiffDecoder = Decoder<BufReader<File>>;

/// Multi-page TIFF / BigTIFF reader.
///
/// Pages are grouped into series: a series is a maximal run of consecutive
/// pages sharing width, height and bit depth. Only the page directory is
/// scanned at open; pixel data is decoded one page at a time.
pub struct TiffStackReader {
    path: PathBuf,
    decoder: TiffDecoder,
    /// Index of the page the decoder is currently positioned on.
    page: usize,
    series: Vec<SeriesInfo>,
}

impl TiffStackReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut decoder = open_decoder(path)?;
        let mut series: Vec<SeriesInfo> = Vec::new();

        loop {
            let (width, height) = decoder.dimensions()?;
            let bit_depth = gray_bit_depth(decoder.colortype()?)?;
            match series.last_mut() {
                Some(s) if s.width == width && s.height == height && s.bit_depth == bit_depth => {
                    s.frame_count += 1;
                }
                _ => series.push(SeriesInfo {
                    width,
                    height,
                    bit_depth,
                    frame_count: 1,
                }),
            }
            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }

        debug!(
            path = %path.display(),
            series = series.len(),
            pages = series.iter().map(|s| s.frame_count).sum::<usize>(),
            "Opened TIFF stack"
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder: open_decoder(path)?,
            page: 0,
            series,
        })
    }

    /// Global page index of frame `index` in series `series`.
    fn page_index(&self, series: usize, index: usize) -> Result<usize> {
        let info = self
            .series
            .get(series)
            .ok_or(TimebinError::FrameIndexOutOfRange {
                index: series,
                total: self.series.len(),
            })?;
        if index >= info.frame_count {
            return Err(TimebinError::FrameIndexOutOfRange {
                index,
                total: info.frame_count,
            });
        }
        let offset: usize = self.series[..series].iter().map(|s| s.frame_count).sum();
        Ok(offset + index)
    }

    /// Position the decoder on `page`, stepping forward through the IFD chain.
    fn seek_page(&mut self, page: usize) -> Result<()> {
        if page < self.page {
            self.decoder = open_decoder(&self.path)?;
            self.page = 0;
        }
        while self.page < page {
            self.decoder.next_image()?;
            self.page += 1;
        }
        Ok(())
    }
}

impl StackFile for TiffStackReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn series(&self) -> &[SeriesInfo] {
        &self.series
    }

    fn read_frame(&mut self, series: usize, index: usize) -> Result<Frame> {
        let page = self.page_index(series, index)?;
        self.seek_page(page)?;

        let info = &self.series[series];
        let (h, w) = (info.height as usize, info.width as usize);
        let pixels: Vec<u16> = match self.decoder.read_image()? {
            DecodingResult::U8(v) => v.into_iter().map(u16::from).collect(),
            DecodingResult::U16(v) => v,
            _ => {
                return Err(TimebinError::UnsupportedPixelFormat(format!(
                    "page {page} of {} is not 8/16-bit unsigned",
                    self.path.display()
                )))
            }
        };
        let data = Array2::from_shape_vec((h, w), pixels)
            .map_err(|e| TimebinError::InvalidTiff(format!("page {page}: {e}")))?;

        let mut frame = Frame::new(data);
        frame.frame_index = page;
        Ok(frame)
    }

    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            filename: self.path.clone(),
            format: "TIFF",
            total_frames: self.frame_count(),
            series: self.series.clone(),
            color_mode: ColorMode::Mono,
        }
    }
}

fn open_decoder(path: &Path) -> Result<TiffDecoder> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited()))
}

fn gray_bit_depth(color: ColorType) -> Result<u8> {
    match color {
        ColorType::Gray(bits @ (8 | 16)) => Ok(bits),
        other => Err(TimebinError::UnsupportedPixelFormat(format!(
            "TIFF color type {other:?} (only 8/16-bit grayscale can be binned)"
        ))),
    }
}
