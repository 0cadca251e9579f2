use clap::{Parser, Subcommand};
use depth_to_laserscan::CameraIntrinsics;
use depth_to_laserscan::io::{object_from_json, object_to_json, save_depth_png};
use depth_to_laserscan::synthetic::{Scene, SceneBox};
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic depth frames of a floor with one box
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Camera intrinsics JSON, reference intrinsics when omitted
        #[arg(long)]
        intrinsics: Option<String>,

        /// Number of frames to generate
        #[arg(short, long, default_value = "20")]
        num_frames: usize,

        /// Camera height above the floor in meters
        #[arg(long, default_value = "0.6")]
        camera_height: f64,

        /// Lateral offset of the box center in meters, positive to the right
        #[arg(long, default_value = "0.4", allow_hyphen_values = true)]
        lateral: f64,

        /// Distance to the box front face in the first frame
        #[arg(long, default_value = "1.8")]
        start_distance: f64,

        /// Distance the box moves towards the camera per frame
        #[arg(long, default_value = "0.05")]
        step: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            intrinsics,
            num_frames,
            camera_height,
            lateral,
            start_distance,
            step,
        } => {
            let intrinsics: CameraIntrinsics = match intrinsics {
                Some(path) => object_from_json(path)?,
                None => CameraIntrinsics::default(),
            };
            intrinsics.validate()?;
            std::fs::create_dir_all(&output)?;

            for frame_idx in 0..num_frames {
                let near = start_distance - frame_idx as f64 * step;
                let scene = Scene {
                    camera_height: Some(camera_height),
                    ..Default::default()
                }
                .with_box(SceneBox::on_floor(camera_height, lateral, near, 0.3, 0.4, 0.4));
                let time_ns = frame_idx as i64 * 100_000_000;
                let frame = scene.render(&intrinsics, time_ns);
                save_depth_png(&frame, Path::new(&output).join(format!("{:019}.png", time_ns)))?;
            }

            object_to_json(Path::new(&output).join("intrinsics.json"), &intrinsics)?;
            log::info!("Generated {} frames in {}", num_frames, output);
        }
    }

    Ok(())
}
