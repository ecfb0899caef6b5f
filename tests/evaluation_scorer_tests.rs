use tilesim::approach::OnDemand;
use tilesim::config::SimConfig;
use tilesim::core::{ArrivalRecord, Location, MotionSample, TileArrival, TileId};
use tilesim::evaluation::Evaluator;
use tilesim::frames::{MemoryFrameSink, SyntheticFrameSource};
use tilesim::trace::SizeTable;

fn small_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.video.video_duration = 3.0;
    config.video.video_fps = 10;
    config.video.origin.width = 128;
    config.video.origin.height = 64;
    config.video.converted.width = 128;
    config.video.converted.height = 64;
    config.video.converted.quality_list = vec![16];
    config.method.tile_width_num = 4;
    config.method.tile_height_num = 2;
    config.metric.range_fov = [90.0, 90.0];
    config.metric.fov_resolution = [16, 16];
    config.metric.sampling_size = [10, 10];
    config.metric.inter_mode = "nearest".to_string();
    config.metric.ssim_flag = true;
    config
}

fn front_tiles(chunk_idx: u32, playable_ts: f64) -> ArrivalRecord {
    ArrivalRecord {
        chunk_idx,
        chunk_size: 40_000,
        tiles: [1, 2, 5, 6]
            .into_iter()
            .map(|t| TileArrival {
                tile_idx: TileId::Tile(t),
                playable_ts,
                bitrate: 16,
            })
            .collect(),
    }
}

fn motion(yaw: f64) -> Vec<MotionSample> {
    (0..3000).step_by(50).map(|ts| MotionSample::new(ts, yaw, 0.0)).collect()
}

#[tokio::test]
async fn test_no_content_never_fails() {
    let config = small_config();
    let frames = SyntheticFrameSource::from_config(&config);
    let mut evaluator = Evaluator::from_config(&config, Box::new(OnDemand::default()), Vec::new()).unwrap();

    let ticks = evaluator.run(&motion(0.0), &frames, None).await.unwrap();
    assert_eq!(ticks.len(), 30);
    for tick in &ticks {
        assert_eq!(tick.location, Location::NoContent);
        assert_eq!(tick.out_area_percent, 1.0);
        assert_eq!(tick.psnr, 0.0);
    }

    let summary = evaluator.finish(&SizeTable::new());
    assert_eq!(summary.avg_psnr, 0.0);
    assert_eq!(summary.avg_out_area_percent, 1.0);
    assert_eq!(summary.total_transfer_mb, 0.0);
    assert_eq!(summary.gc_score, 0.0);
}

#[tokio::test]
async fn test_looking_at_delivered_tiles() {
    let config = small_config();
    let frames = SyntheticFrameSource::from_config(&config).with_drift(0.0);
    let arrivals = (0..3).map(|c| front_tiles(c, c as f64 * 1000.0 + 120.0)).collect();
    let mut evaluator = Evaluator::from_config(&config, Box::new(OnDemand::default()), arrivals).unwrap();

    let ticks = evaluator.run(&motion(0.0), &frames, None).await.unwrap();

    // each chunk is dark until its tiles land 120 ms in
    assert_eq!(ticks[0].location, Location::NoContent);
    assert_eq!(ticks[1].location, Location::NoContent);
    assert_eq!(ticks[2].location, Location::In);
    let in_view: Vec<_> = ticks.iter().filter(|t| t.location == Location::In).collect();
    assert!(!in_view.is_empty());
    for tick in in_view {
        assert_eq!(tick.out_area_percent, 0.0);
        assert!(tick.psnr > 30.0, "psnr {} at {}", tick.psnr, tick.motion_ts);
        assert!(tick.ssim > 0.8, "ssim {} at {}", tick.ssim, tick.motion_ts);
    }
}

#[tokio::test]
async fn test_looking_away_from_delivered_tiles() {
    let config = small_config();
    let frames = SyntheticFrameSource::from_config(&config);
    let arrivals = (0..3).map(|c| front_tiles(c, 0.0)).collect();
    let mut evaluator = Evaluator::from_config(&config, Box::new(OnDemand::default()), arrivals).unwrap();

    let ticks = evaluator.run(&motion(std::f64::consts::PI), &frames, None).await.unwrap();
    assert!(ticks.iter().all(|t| t.location == Location::Out));
    assert!(ticks.iter().all(|t| t.out_area_percent == 1.0));

    let summary = evaluator.finish(&SizeTable::new());
    assert_eq!(summary.avg_out_area_percent, 1.0);
}

#[tokio::test]
async fn test_saved_frames_cover_every_frame() {
    let mut config = small_config();
    config.method.pre_download_duration = 1.0;
    config.metric.save_result_img = true;
    config.metric.psnr_ssim_frequency = 5;
    let frames = SyntheticFrameSource::from_config(&config);
    let arrivals = (1..3).map(|c| front_tiles(c, 0.0)).collect();
    let mut evaluator = Evaluator::from_config(&config, Box::new(OnDemand::default()), arrivals).unwrap();
    let mut sink = MemoryFrameSink::new();

    let ticks = evaluator.run(&motion(0.0), &frames, Some(&mut sink)).await.unwrap();

    // frames 0..=10 get ground truth during pre-download; scoring starts at frame 10
    assert_eq!(ticks.first().unwrap().frame_idx, 10);
    assert_eq!(ticks.len(), 20);
    // only every fifth frame past the base is rendered
    assert_eq!(sink.indices().collect::<Vec<_>>(), (0..=10).chain([15, 20, 25]).collect::<Vec<u64>>());
    let scored: Vec<u64> = ticks.iter().filter(|t| t.psnr > 0.0).map(|t| t.frame_idx).collect();
    assert_eq!(scored, vec![10, 15, 20, 25]);
}
