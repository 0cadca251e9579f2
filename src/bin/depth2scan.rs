use clap::Parser;
use depth_to_laserscan::data_loader::process_directory;
use depth_to_laserscan::io::{ScanWriter, load_config, write_report};
use depth_to_laserscan::visualization::log_frame;
use depth_to_laserscan::{FrameOutcome, Pipeline, PipelineConfig};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct Depth2ScanCli {
    /// folder of 16-bit PNG depth frames, named by timestamp in ns
    path: String,

    /// pipeline config json, defaults are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// output file, one scan per line
    #[arg(short, long, default_value = "scans.jsonl")]
    output: String,

    /// run summary json
    #[arg(long)]
    report: Option<String>,

    /// save a rerun recording of every processed frame
    #[arg(long)]
    rerun_output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Depth2ScanCli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let pipeline = Pipeline::new(config)?;

    let recording = match &cli.rerun_output {
        Some(path) => match rerun::RecordingStreamBuilder::new("depth2scan").save(path) {
            Ok(r) => Some(r),
            Err(e) => {
                log::warn!("rerun recording disabled: {e}");
                None
            }
        },
        None => None,
    };

    let mut writer = ScanWriter::new(BufWriter::new(File::create(&cli.output)?));
    let now = Instant::now();
    let stats = process_directory(&pipeline, &cli.path, |outcome| {
        if let FrameOutcome::Processed(ctx) = outcome {
            writer.publish(&ctx.record)?;
            if let Some(recording) = &recording {
                log_frame(recording, "/depth", ctx);
            }
        }
        Ok(())
    })?;
    let duration_sec = now.elapsed().as_secs_f64();
    writer.into_inner()?;

    log::info!("processing took {:.6} sec", duration_sec);
    if stats.total() > 0 {
        log::info!("avg: {:.6} sec", duration_sec / stats.total() as f64);
    }
    if let Some(report) = &cli.report {
        write_report(report, pipeline.config(), &stats)?;
    }
    Ok(())
}
