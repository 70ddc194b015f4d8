mod common;

use ndarray::Array2;
use timebin_core::error::TimebinError;
use timebin_core::frame::BinnedFrame;
use timebin_core::io::tiff_stack::TiffStackReader;
use timebin_core::io::tiff_writer::BinnedTiffWriter;
use timebin_core::io::{open_stack, open_stacks, StackFile};
use timebin_core::sink::FrameSink;

use common::{read_u32_tiff, write_temp, write_test_tiff, write_test_tiff_8bit};

fn binned(window_index: usize, data: Array2<u32>) -> BinnedFrame {
    BinnedFrame {
        data,
        window_index,
        frames_summed: 2,
        first_frame_index: window_index * 2,
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

#[test]
fn test_multi_page_read() {
    let tiff = write_test_tiff(&[
        (3, 2, vec![1, 2, 3, 4, 5, 6]),
        (3, 2, vec![10, 20, 30, 40, 50, 60]),
        (3, 2, vec![100; 6]),
    ]);

    let mut reader = TiffStackReader::open(tiff.path()).unwrap();
    assert_eq!(reader.series().len(), 1);
    assert_eq!(reader.series()[0].frame_count, 3);
    assert_eq!(reader.series()[0].width, 3);
    assert_eq!(reader.series()[0].height, 2);
    assert_eq!(reader.series()[0].bit_depth, 16);

    let first = reader.read_frame(0, 0).unwrap();
    assert_eq!(first.height(), 2);
    assert_eq!(first.width(), 3);
    assert_eq!(first.data[[0, 2]], 3);
    assert_eq!(first.data[[1, 0]], 4);

    let second = reader.read_frame(0, 1).unwrap();
    assert_eq!(second.data[[1, 2]], 60);
    let third = reader.read_frame(0, 2).unwrap();
    assert_eq!(third.data[[0, 0]], 100);
}

#[test]
fn test_shape_change_starts_new_series() {
    let tiff = write_test_tiff(&[
        (2, 2, vec![1; 4]),
        (2, 2, vec![2; 4]),
        (4, 1, vec![3; 4]),
        (2, 2, vec![4; 4]),
    ]);

    let mut reader = TiffStackReader::open(tiff.path()).unwrap();
    let series = reader.series().to_vec();
    assert_eq!(series.len(), 3);
    assert_eq!(
        series.iter().map(|s| s.frame_count).collect::<Vec<_>>(),
        vec![2, 1, 1]
    );
    assert_eq!((series[1].width, series[1].height), (4, 1));
    assert_eq!(reader.frame_count(), 4);

    assert_eq!(reader.read_frame(1, 0).unwrap().data[[0, 3]], 3);
    assert_eq!(reader.read_frame(2, 0).unwrap().data[[1, 1]], 4);
}

#[test]
fn test_backward_seek_rereads_page() {
    let tiff = write_test_tiff(&[(1, 1, vec![7]), (1, 1, vec![8]), (1, 1, vec![9])]);
    let mut reader = TiffStackReader::open(tiff.path()).unwrap();

    assert_eq!(reader.read_frame(0, 2).unwrap().data[[0, 0]], 9);
    assert_eq!(reader.read_frame(0, 0).unwrap().data[[0, 0]], 7);
    assert_eq!(reader.read_frame(0, 1).unwrap().data[[0, 0]], 8);
}

#[test]
fn test_8bit_pages_are_widened() {
    let tiff = write_test_tiff_8bit(&[(2, 1, vec![0, 255])]);
    let mut reader = TiffStackReader::open(tiff.path()).unwrap();

    assert_eq!(reader.series()[0].bit_depth, 8);
    let frame = reader.read_frame(0, 0).unwrap();
    assert_eq!(frame.data[[0, 1]], 255);
}

#[test]
fn test_out_of_range_frame() {
    let tiff = write_test_tiff(&[(1, 1, vec![1])]);
    let mut reader = TiffStackReader::open(tiff.path()).unwrap();

    assert!(matches!(
        reader.read_frame(0, 1),
        Err(TimebinError::FrameIndexOutOfRange { index: 1, total: 1 })
    ));
    assert!(matches!(
        reader.read_frame(3, 0),
        Err(TimebinError::FrameIndexOutOfRange { .. })
    ));
}

#[test]
fn test_garbage_tiff_is_rejected() {
    let file = write_temp(b"definitely not a tiff", ".tif");
    assert!(TiffStackReader::open(file.path()).is_err());
}

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_open_stack_by_extension() {
    let tiff = write_test_tiff(&[(1, 1, vec![5])]);
    let stack = open_stack(tiff.path()).unwrap();
    assert_eq!(stack.source_info().format, "TIFF");
    assert_eq!(stack.source_info().total_frames, 1);

    let other = write_temp(b"", ".png");
    assert!(matches!(
        open_stack(other.path()),
        Err(TimebinError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_open_stacks_stops_at_first_failure() {
    let good = write_test_tiff(&[(1, 1, vec![5])]);
    let bad = write_temp(b"", ".avi");

    assert_eq!(open_stacks(&[good.path()]).unwrap().len(), 1);
    assert!(open_stacks(&[good.path(), bad.path()]).is_err());
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

#[test]
fn test_writer_output_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binned.tiff");

    let mut writer = BinnedTiffWriter::create(&path).unwrap();
    let a = Array2::from_shape_vec((2, 3), vec![0, 1, 2, 3, 4, 5]).unwrap();
    let b = Array2::from_elem((2, 3), u32::MAX);
    writer.append_frame(&binned(0, a.clone())).unwrap();
    writer.append_frame(&binned(1, b.clone())).unwrap();
    assert_eq!(writer.frames_written(), 2);
    writer.finalize().unwrap();

    let pages = read_u32_tiff(&path);
    assert_eq!(pages, vec![a, b]);
}

#[test]
fn test_writer_handles_non_contiguous_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transposed.tiff");

    let data = Array2::from_shape_vec((2, 3), vec![1u32, 2, 3, 4, 5, 6]).unwrap();
    let transposed = data.reversed_axes();
    assert!(transposed.as_slice().is_none());

    let mut writer = BinnedTiffWriter::create(&path).unwrap();
    writer.append_frame(&binned(0, transposed.clone())).unwrap();
    writer.finalize().unwrap();

    let pages = read_u32_tiff(&path);
    assert_eq!(pages[0].dim(), (3, 2));
    assert_eq!(pages[0], transposed);
    assert_eq!(pages[0][[2, 0]], 3);
}

#[test]
fn test_partial_output_survives_without_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.tiff");

    {
        let mut writer = BinnedTiffWriter::create(&path).unwrap();
        writer
            .append_frame(&binned(0, Array2::from_elem((1, 2), 9)))
            .unwrap();
        // dropped without finalize
    }

    let pages = read_u32_tiff(&path);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0][[0, 1]], 9);
}

#[test]
fn test_create_in_missing_directory_is_sink_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.tiff");
    assert!(matches!(
        BinnedTiffWriter::create(&path),
        Err(TimebinError::SinkWrite { .. })
    ));
}
