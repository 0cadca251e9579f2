use std::path::{Path, PathBuf};

use glob::glob;
use indicatif::ProgressIterator;

use crate::error::IoError;
use crate::io::load_depth_png;
use crate::pipeline::{FrameOutcome, FrameStats, Pipeline, SkipReason};

/// Spacing of synthesized timestamps for files without one.
const DEFAULT_FRAME_INTERVAL_NS: i64 = 100_000_000;

/// Parses the timestamp from a file path.
///
/// The filename (without extension) is read as nanoseconds.
pub fn path_to_timestamp(path: &Path) -> Option<i64> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// Sorted PNG files directly under `root_folder`.
pub fn list_depth_frames(root_folder: impl AsRef<Path>) -> Result<Vec<PathBuf>, IoError> {
    let pattern = root_folder.as_ref().join("*.png");
    let mut paths: Vec<PathBuf> = glob(&pattern.to_string_lossy())?
        .filter_map(|p| p.ok())
        .collect();
    paths.sort();
    log::trace!("found {} depth frames under {:?}", paths.len(), root_folder.as_ref());
    Ok(paths)
}

/// Runs every frame under `root_folder` through `pipeline`, in order.
///
/// Frames are processed one at a time; `on_outcome` sees each outcome before
/// the next file is read. Unreadable files are counted as malformed.
pub fn process_directory<F>(
    pipeline: &Pipeline,
    root_folder: impl AsRef<Path>,
    mut on_outcome: F,
) -> Result<FrameStats, IoError>
where
    F: FnMut(&FrameOutcome) -> Result<(), IoError>,
{
    let paths = list_depth_frames(root_folder)?;
    let mut stats = FrameStats::default();
    for (idx, path) in paths.iter().enumerate().progress_count(paths.len() as u64) {
        let time_ns = path_to_timestamp(path).unwrap_or(idx as i64 * DEFAULT_FRAME_INTERVAL_NS);
        let outcome = match load_depth_png(path, time_ns) {
            Ok(frame) => pipeline.process(&frame),
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                FrameOutcome::Skipped(SkipReason::Malformed(e))
            }
        };
        stats.record(&outcome);
        on_outcome(&outcome)?;
    }
    log::info!(
        "{} frames: {} processed, {} malformed, {} empty",
        stats.total(),
        stats.processed,
        stats.skipped_malformed,
        stats.skipped_empty
    );
    Ok(stats)
}
