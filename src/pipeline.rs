//! Per-frame driver chaining the stages from depth image to range scan.
//!
//! A [`Pipeline`] holds only validated configuration. Every call to
//! [`Pipeline::process`] builds its own [`FrameContext`] and shares nothing
//! with other frames; the random source is re-seeded each time.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::deprojection::deproject;
use crate::error::{ConfigError, FrameError};
use crate::ground_height::ground_reference;
use crate::ground_plane::{GroundSegmentation, segment_ground};
use crate::obstacle_filter::filter_obstacles;
use crate::occupancy::{OccupancyGrid, occupancy_from_points};
use crate::scan::{RangeScan, synthesize_scan};
use crate::types::{DepthFrame, Point3, RawDepthImage};

/// Scan plus the metadata it is published with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub frame_id: String,
    /// Emission time, ns since the Unix epoch.
    pub stamp_ns: i128,
    /// Capture time of the source frame.
    pub source_time_ns: i64,
    pub scan: RangeScan,
}

/// Everything computed for one frame.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub source_time_ns: i64,
    pub cloud_size: usize,
    pub ground: GroundSegmentation,
    pub ground_height: f64,
    pub obstacles: Vec<Point3>,
    pub grid: OccupancyGrid,
    pub record: ScanRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Malformed(FrameError),
    /// No pixel produced a point.
    EmptyCloud,
}

#[derive(Debug, Clone)]
pub enum FrameOutcome {
    Processed(Box<FrameContext>),
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn record(&self) -> Option<&ScanRecord> {
        match self {
            FrameOutcome::Processed(ctx) => Some(&ctx.record),
            FrameOutcome::Skipped(_) => None,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, FrameOutcome::Processed(_))
    }
}

/// Running counts over a sequence of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub processed: usize,
    pub skipped_malformed: usize,
    pub skipped_empty: usize,
}

impl FrameStats {
    pub fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Processed(_) => self.processed += 1,
            FrameOutcome::Skipped(SkipReason::Malformed(_)) => self.skipped_malformed += 1,
            FrameOutcome::Skipped(SkipReason::EmptyCloud) => self.skipped_empty += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped_malformed + self.skipped_empty
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validates `config`; an invalid configuration never reaches a frame.
    pub fn new(config: PipelineConfig) -> Result<Pipeline, ConfigError> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process_raw(&self, raw: &RawDepthImage) -> FrameOutcome {
        match DepthFrame::from_raw(raw) {
            Ok(frame) => self.process(&frame),
            Err(e) => skip_malformed(e),
        }
    }

    pub fn process(&self, frame: &DepthFrame) -> FrameOutcome {
        let k = &self.config.intrinsics;
        if (frame.width, frame.height) != (k.width, k.height) {
            return skip_malformed(FrameError::DimensionMismatch {
                expected: (k.width, k.height),
                actual: (frame.width, frame.height),
            });
        }
        let expected = frame.width as usize * frame.height as usize;
        if frame.depths_mm.len() != expected {
            return skip_malformed(FrameError::buffer_mismatch(expected, frame.depths_mm.len()));
        }

        let cloud = deproject(frame, k, self.config.max_distance_mm);
        if cloud.is_empty() {
            log::debug!("frame {} has no valid depth, no scan", frame.time_ns);
            return FrameOutcome::Skipped(SkipReason::EmptyCloud);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.plane.seed);
        let ground = segment_ground(&cloud, &self.config.plane, &mut rng);
        let ground_height = ground_reference(&ground.inliers.points);
        let obstacles = filter_obstacles(
            &ground.outliers.points,
            ground_height,
            &self.config.obstacles,
        );
        let grid = occupancy_from_points(&obstacles, &self.config.grid);
        let scan = synthesize_scan(&grid, &self.config.scan);
        log::debug!(
            "frame {}: {} points, {} inliers, ground {:.3} m, {} obstacle points, {} bins hit",
            frame.time_ns,
            cloud.len(),
            ground.inliers.len(),
            ground_height,
            obstacles.len(),
            scan.hits().count()
        );

        let record = ScanRecord {
            frame_id: self.config.scan.frame_id.clone(),
            stamp_ns: time::OffsetDateTime::now_utc().unix_timestamp_nanos(),
            source_time_ns: frame.time_ns,
            scan,
        };
        FrameOutcome::Processed(Box::new(FrameContext {
            source_time_ns: frame.time_ns,
            cloud_size: cloud.len(),
            ground,
            ground_height,
            obstacles,
            grid,
            record,
        }))
    }
}

fn skip_malformed(err: FrameError) -> FrameOutcome {
    log::warn!("skipping malformed frame: {err}");
    FrameOutcome::Skipped(SkipReason::Malformed(err))
}
