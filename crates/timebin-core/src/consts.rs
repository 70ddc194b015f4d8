/// Minimum pixel count (h*w) to use row-level Rayon parallelism when summing a window.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Largest window for which a u32 accumulator cannot overflow with 16-bit input:
/// `MAX_WINDOW_SIZE * u16::MAX <= u32::MAX`.
pub const MAX_WINDOW_SIZE: usize = (u32::MAX / u16::MAX as u32) as usize;

/// Windows allowed in flight (submitted but not yet delivered) per worker thread.
/// At 2048x2048 u16 with N = 100, one window is 800 MB; keep this small.
pub const INFLIGHT_WINDOWS_PER_WORKER: usize = 2;

/// File extensions recognised as SER videos.
pub const SER_EXTENSIONS: &[&str] = &["ser"];

/// File extensions recognised as TIFF stacks.
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Key written into the metadata sidecar with the window size.
pub const METADATA_BINNING_KEY: &str = "binning";
