use std::io::Write;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma};
use serde::{Serialize, de::DeserializeOwned};

use crate::config::PipelineConfig;
use crate::error::{FrameError, IoError};
use crate::pipeline::{FrameStats, ScanRecord};
use crate::types::DepthFrame;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: impl AsRef<Path>, object: &T) -> Result<(), IoError> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path, j)?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T, IoError> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Loads and validates a pipeline configuration.
pub fn load_config(file_path: impl AsRef<Path>) -> Result<PipelineConfig, IoError> {
    let config: PipelineConfig = object_from_json(file_path)?;
    config.validate()?;
    Ok(config)
}

/// Reads a single-channel 16-bit image as millimeter depth.
pub fn load_depth_png(path: impl AsRef<Path>, time_ns: i64) -> Result<DepthFrame, FrameError> {
    let img = image::open(path.as_ref()).map_err(|e| FrameError::Decode(e.to_string()))?;
    match img {
        DynamicImage::ImageLuma16(buf) => {
            let (width, height) = buf.dimensions();
            DepthFrame::new(width, height, buf.into_raw(), time_ns)
        }
        other => Err(FrameError::UnsupportedEncoding(format!("{:?}", other.color()))),
    }
}

pub fn save_depth_png(frame: &DepthFrame, path: impl AsRef<Path>) -> Result<(), IoError> {
    let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.depths_mm.clone()).ok_or_else(
            || {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "depth buffer does not match frame size",
                )
            },
        )?;
    buf.save(path)?;
    Ok(())
}

/// Appends one JSON line per published scan.
pub struct ScanWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> ScanWriter<W> {
    pub fn new(writer: W) -> ScanWriter<W> {
        ScanWriter { writer, written: 0 }
    }

    pub fn publish(&mut self, record: &ScanRecord) -> Result<(), IoError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(mut self) -> Result<W, IoError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Run summary written next to the scan output.
#[derive(serde::Serialize)]
struct RunReport<'a> {
    timestamp: String,
    config: &'a PipelineConfig,
    stats: FrameStats,
}

pub fn write_report(
    output_path: impl AsRef<Path>,
    config: &PipelineConfig,
    stats: &FrameStats,
) -> Result<(), IoError> {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let report = RunReport {
        timestamp: now.to_string(),
        config,
        stats: *stats,
    };
    object_to_json(output_path, &report)
}
