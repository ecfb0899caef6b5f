use std::collections::BTreeSet;
use std::f64::consts::PI;

use tilesim::approach::{FullFrame, OnDemand};
use tilesim::config::SimConfig;
use tilesim::core::{DecisionRecord, MotionSample, TileId};
use tilesim::decision::DecisionEngine;
use tilesim::registry::ApproachRegistry;
use tilesim::SimError;

fn small_config(duration_s: f64) -> SimConfig {
    let mut config = SimConfig::default();
    config.video.video_duration = duration_s;
    config.video.video_fps = 10;
    config.video.converted.width = 128;
    config.video.converted.height = 64;
    config.video.converted.quality_list = vec![22, 35];
    config.method.tile_width_num = 4;
    config.method.tile_height_num = 2;
    config.method.decision_delay = 300;
    config.metric.range_fov = [90.0, 90.0];
    config.metric.sampling_size = [12, 12];
    config
}

fn engine(config: &SimConfig, approach: &str) -> DecisionEngine {
    // keep the built-in approaches linked
    let _ = (OnDemand::default(), FullFrame);
    let approach = ApproachRegistry::discover()
        .create(approach, &config.method.approach_config)
        .unwrap();
    DecisionEngine::from_config(config, approach).unwrap()
}

fn motion(until_ms: u64, yaw: impl Fn(u64) -> f64) -> Vec<MotionSample> {
    (0..until_ms)
        .step_by(50)
        .map(|ts| MotionSample::new(ts, yaw(ts), 0.0))
        .collect()
}

fn tile_set(record: &DecisionRecord) -> BTreeSet<u32> {
    record
        .tiles
        .iter()
        .filter_map(|t| match t.tile_idx {
            TileId::Tile(i) => Some(i),
            TileId::Background => None,
        })
        .collect()
}

#[test]
fn test_log_covers_every_chunk_in_order() {
    let config = small_config(5.0);
    let mut engine = engine(&config, "ondemand");
    let log = engine.run(&motion(5000, |_| 0.0)).unwrap();

    assert_eq!(log.iter().map(|r| r.chunk_idx).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    assert!(log.windows(2).all(|w| w[0].system_ts <= w[1].system_ts));
    // chunk k is decided decision_delay before its start
    for record in &log[1..] {
        assert_eq!(record.system_ts, record.chunk_idx as f64 * 1000.0 - 300.0);
    }
    assert!(engine.is_done());
}

#[test]
fn test_turning_around_moves_the_tile_set() {
    let config = small_config(5.0);
    let mut engine = engine(&config, "ondemand");
    let log = engine.run(&motion(5000, |ts| if ts < 1000 { 0.0 } else { PI })).unwrap();

    assert_eq!(tile_set(&log[0]), BTreeSet::from([1, 2, 5, 6]));
    // by chunk 4 the whole window looks backwards
    assert_eq!(tile_set(&log[4]), BTreeSet::from([0, 3, 4, 7]));
    assert!(log.iter().all(|r| r.tiles.iter().all(|t| t.bitrate == 22)));
}

#[test]
fn test_full_frame_requests_every_tile() {
    let mut config = small_config(3.0);
    config.method.background.enabled = true;
    let mut engine = engine(&config, "fullframe");
    let log = engine.run(&motion(3000, |ts| ts as f64 / 1000.0)).unwrap();

    assert_eq!(log.len(), 3);
    for record in &log {
        assert_eq!(tile_set(record), (0..8).collect::<BTreeSet<u32>>());
        assert_eq!(record.tiles.last().unwrap().tile_idx, TileId::Background);
    }
}

#[test]
fn test_server_decisions_see_delayed_motion() {
    let mut config = small_config(3.0);
    config.method.decision_location = "server".to_string();
    config.network.rtt = 40.0;
    let mut engine = engine(&config, "ondemand");
    let log = engine.run(&motion(3000, |_| 0.0)).unwrap();

    assert_eq!(log[0].system_ts, 20.0);
    // samples arrive on a 50 ms grid shifted by 20
    assert_eq!(log[1].system_ts, 720.0);
}

#[test]
fn test_pre_download_starts_later() {
    let mut config = small_config(4.0);
    config.method.pre_download_duration = 2.0;
    let mut engine = engine(&config, "ondemand");
    assert_eq!(engine.next_chunk(), 2);

    let log = engine.run(&motion(4000, |_| 0.0)).unwrap();
    assert_eq!(log.iter().map(|r| r.chunk_idx).collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn test_misaligned_pre_download_is_rejected() {
    let mut config = small_config(4.0);
    config.method.pre_download_duration = 1.5;
    assert!(matches!(config.validate(), Err(SimError::Config(_))));
}
