pub mod config;
pub mod data_loader;
pub mod deprojection;
pub mod error;
pub mod ground_height;
pub mod ground_plane;
pub mod io;
pub mod obstacle_filter;
pub mod occupancy;
pub mod pipeline;
pub mod scan;
pub mod synthetic;
pub mod types;
pub mod visualization;

pub use config::PipelineConfig;
pub use pipeline::{FrameOutcome, FrameStats, Pipeline, ScanRecord, SkipReason};
pub use scan::RangeScan;
pub use types::{CameraIntrinsics, DepthFrame};
