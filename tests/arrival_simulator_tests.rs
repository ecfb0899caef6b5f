use tilesim::arrival::{ArrivalSimulator, ArrivalTiming};
use tilesim::config::{DecisionLocation, SimConfig};
use tilesim::core::{DecisionRecord, TileChoice, TileId};
use tilesim::trace::{NetworkTrace, SizeTable};

const TWO_SEGMENTS: &str = r#"[
    {"throughput_MBps": 0.1, "duration_ms": 1000},
    {"throughput_MBps": 0.05, "duration_ms": 1000}
]"#;

fn decision(chunk_idx: u32, system_ts: f64, tiles: &[i64]) -> DecisionRecord {
    DecisionRecord {
        chunk_idx,
        system_ts,
        tiles: tiles
            .iter()
            .map(|&t| TileChoice {
                tile_idx: TileId::try_from(t).unwrap(),
                bitrate: 29,
            })
            .collect(),
    }
}

fn timing(rtt: f64, rendering: f64) -> ArrivalTiming {
    ArrivalTiming {
        default_rtt_ms: rtt,
        rendering_delay_ms: rendering,
        location: DecisionLocation::Client,
    }
}

#[test]
fn test_chunk_spanning_a_bandwidth_drop() {
    let network = NetworkTrace::from_json_str(TWO_SEGMENTS, 1.0).unwrap();
    let mut sizes = SizeTable::new();
    sizes.insert(0, TileId::Tile(0), 29, 150_000);

    let arrivals = ArrivalSimulator::new(&sizes, &network, timing(0.0, 0.0))
        .simulate(&[decision(0, 0.0, &[0])])
        .unwrap();
    // 100 KB in the first second, the remaining 50 KB at 50 KB/s
    assert!((arrivals[0].tiles[0].playable_ts - 2000.0).abs() < 1e-6);

    let arrivals = ArrivalSimulator::new(&sizes, &network, timing(30.0, 10.0))
        .simulate(&[decision(0, 0.0, &[0])])
        .unwrap();
    assert!((arrivals[0].tiles[0].playable_ts - 2040.0).abs() < 1e-6);
    assert_eq!(arrivals[0].chunk_size, 150_000);
}

#[test]
fn test_scale_ratio_speeds_up_the_link() {
    let network = NetworkTrace::from_json_str(TWO_SEGMENTS, 2.0).unwrap();
    let mut sizes = SizeTable::new();
    sizes.insert(0, TileId::Tile(0), 29, 150_000);

    let arrivals = ArrivalSimulator::new(&sizes, &network, timing(0.0, 0.0))
        .simulate(&[decision(0, 0.0, &[0])])
        .unwrap();
    assert!((arrivals[0].tiles[0].playable_ts - 750.0).abs() < 1e-6);
}

#[test]
fn test_chunk_bytes_include_background() {
    let network = NetworkTrace::from_json_str(TWO_SEGMENTS, 1.0).unwrap();
    let mut sizes = SizeTable::new();
    sizes.insert(0, TileId::Tile(2), 29, 20_000);
    sizes.insert(0, TileId::Background, 0, 30_000);

    let arrivals = ArrivalSimulator::new(&sizes, &network, timing(0.0, 0.0))
        .simulate(&[decision(0, 0.0, &[2, -1])])
        .unwrap();
    let record = &arrivals[0];
    assert_eq!(record.chunk_size, 50_000);
    assert_eq!(record.tiles.len(), 2);
    assert!(record.tiles.iter().all(|t| (t.playable_ts - 500.0).abs() < 1e-6));
    assert_eq!(record.tiles[1].tile_idx, TileId::Background);
}

#[test]
fn test_idle_link_starts_at_decision_time() {
    let network = NetworkTrace::from_json_str(TWO_SEGMENTS, 1.0).unwrap();
    let mut sizes = SizeTable::new();
    sizes.insert(0, TileId::Tile(0), 29, 10_000);
    sizes.insert(1, TileId::Tile(0), 29, 10_000);

    let arrivals = ArrivalSimulator::new(&sizes, &network, timing(0.0, 0.0))
        .simulate(&[decision(0, 0.0, &[0]), decision(1, 1500.0, &[0])])
        .unwrap();
    assert!((arrivals[0].tiles[0].playable_ts - 100.0).abs() < 1e-6);
    // second segment: 10 KB at 50 KB/s
    assert!((arrivals[1].tiles[0].playable_ts - 1700.0).abs() < 1e-6);
}

#[test]
fn test_timing_from_config() {
    let mut config = SimConfig::default();
    config.method.decision_location = "server".to_string();
    config.network.rtt = 50.0;
    config.video.rendering_delay = 5.0;

    let timing = ArrivalTiming::from_config(&config).unwrap();
    assert_eq!(timing.location, DecisionLocation::Server);
    assert_eq!(timing.location.download_rtt(timing.default_rtt_ms), 25.0);
    assert_eq!(timing.rendering_delay_ms, 5.0);
}
