use depth_to_laserscan::data_loader::{list_depth_frames, process_directory};
use depth_to_laserscan::io::{ScanWriter, load_config, load_depth_png, object_to_json, save_depth_png};
use depth_to_laserscan::synthetic::{Scene, SceneBox};
use depth_to_laserscan::{CameraIntrinsics, DepthFrame, FrameOutcome, Pipeline, PipelineConfig, ScanRecord};
use tempfile::TempDir;

#[test]
fn test_depth_png_roundtrip_keeps_millimeters() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("100.png");
    let frame = DepthFrame::new(3, 2, vec![0, 1, 1000, 4999, 5000, 65535], 100).unwrap();
    save_depth_png(&frame, &path).unwrap();
    let back = load_depth_png(&path, 100).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn test_8bit_image_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("gray8.png");
    image::GrayImage::new(4, 4).save(&path).unwrap();
    assert!(load_depth_png(&path, 0).is_err());
}

#[test]
fn test_process_directory_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let k = CameraIntrinsics::default();
    let scene = Scene::default().with_box(SceneBox::on_floor(0.6, 0.0, 1.2, 0.3, 0.3, 0.4));
    for time_ns in [300i64, 100, 200] {
        let frame = scene.render(&k, time_ns);
        save_depth_png(&frame, temp_dir.path().join(format!("{time_ns:04}.png"))).unwrap();
    }
    // all-zero frame and an undecodable file
    save_depth_png(&DepthFrame::filled(640, 480, 0, 0), temp_dir.path().join("0400.png")).unwrap();
    std::fs::write(temp_dir.path().join("0500.png"), b"not a png").unwrap();

    assert_eq!(list_depth_frames(temp_dir.path()).unwrap().len(), 5);

    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let mut writer = ScanWriter::new(Vec::new());
    let mut seen = Vec::new();
    let stats = process_directory(&pipeline, temp_dir.path(), |outcome| {
        if let FrameOutcome::Processed(ctx) = outcome {
            seen.push(ctx.source_time_ns);
            writer.publish(&ctx.record)?;
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(seen, vec![100, 200, 300]);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.skipped_empty, 1);
    assert_eq!(stats.skipped_malformed, 1);
    assert_eq!(writer.written(), 3);

    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let first: ScanRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert_eq!(first.scan.ranges.len(), 400);
    assert!(first.scan.hits().count() > 0);
}

#[test]
fn test_load_config_validates() {
    let temp_dir = TempDir::new().unwrap();
    let good = temp_dir.path().join("good.json");
    object_to_json(&good, &PipelineConfig::default()).unwrap();
    assert_eq!(load_config(&good).unwrap(), PipelineConfig::default());

    let bad = temp_dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"grid": {"cell_size": -0.01}}"#).unwrap();
    assert!(load_config(&bad).is_err());

    assert!(load_config(temp_dir.path().join("missing.json")).is_err());
}
