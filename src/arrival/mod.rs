//! Serialized download simulation.
//!
//! Chunks download one after another over a piecewise-constant link. A
//! download starts when its decision is taken or when the link frees up,
//! whichever is later.

use std::collections::BTreeMap;

use crate::config::{DecisionLocation, SimConfig};
use crate::core::{ArrivalRecord, DecisionRecord, TileArrival};
use crate::trace::{NetworkTrace, SizeTable};
use crate::{Result, SimError};

/// Delays added on top of the transfer time, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalTiming {
    /// Round trip used when a segment carries none
    pub default_rtt_ms: f64,
    pub rendering_delay_ms: f64,
    pub location: DecisionLocation,
}

impl ArrivalTiming {
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        Ok(Self {
            default_rtt_ms: config.network.rtt,
            rendering_delay_ms: config.video.rendering_delay,
            location: config.method.location()?,
        })
    }
}

pub struct ArrivalSimulator<'a> {
    sizes: &'a SizeTable,
    network: &'a NetworkTrace,
    timing: ArrivalTiming,
}

impl<'a> ArrivalSimulator<'a> {
    pub fn new(sizes: &'a SizeTable, network: &'a NetworkTrace, timing: ArrivalTiming) -> Self {
        Self { sizes, network, timing }
    }

    /// Replay the decision log, in order, into per-chunk arrival records
    pub fn simulate(&self, decisions: &[DecisionRecord]) -> Result<Vec<ArrivalRecord>> {
        let mut cursor = self.network.cursor();
        let mut link_free_at = 0.0_f64;
        let mut last_ts = f64::NEG_INFINITY;
        let mut ledger: BTreeMap<u32, ArrivalRecord> = BTreeMap::new();

        for decision in decisions {
            if decision.system_ts < last_ts {
                return Err(SimError::malformed(
                    "decision log",
                    format!(
                        "chunk {} decided at {} after a decision at {}",
                        decision.chunk_idx, decision.system_ts, last_ts
                    ),
                ));
            }
            last_ts = decision.system_ts;

            let mut bytes = 0u64;
            for tile in &decision.tiles {
                bytes += self.sizes.size_of(decision.chunk_idx, tile.tile_idx, tile.bitrate)?;
            }

            let start = decision.system_ts.max(link_free_at);
            let transfer = cursor.transfer(start, bytes);
            link_free_at = transfer.end_ms;

            let rtt = transfer.segment.rtt.unwrap_or(self.timing.default_rtt_ms);
            let playable_ts =
                transfer.end_ms + self.timing.location.download_rtt(rtt) + self.timing.rendering_delay_ms;
            tracing::debug!(
                chunk = decision.chunk_idx,
                bytes,
                start,
                playable_ts,
                "chunk downloaded"
            );

            let record = ledger.entry(decision.chunk_idx).or_insert_with(|| ArrivalRecord {
                chunk_idx: decision.chunk_idx,
                chunk_size: 0,
                tiles: Vec::new(),
            });
            record.chunk_size += bytes;
            record.tiles.extend(decision.tiles.iter().map(|t| TileArrival {
                tile_idx: t.tile_idx,
                playable_ts,
                bitrate: t.bitrate,
            }));
        }

        tracing::info!(chunks = ledger.len(), link_free_at, "arrival stage finished");
        Ok(ledger.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TileChoice, TileId};

    fn network() -> NetworkTrace {
        NetworkTrace::from_segments([(100_000.0, 1000.0, None), (50_000.0, 1000.0, None)]).unwrap()
    }

    fn timing() -> ArrivalTiming {
        ArrivalTiming {
            default_rtt_ms: 30.0,
            rendering_delay_ms: 10.0,
            location: DecisionLocation::Client,
        }
    }

    fn decision(chunk_idx: u32, system_ts: f64, tiles: &[u32]) -> DecisionRecord {
        DecisionRecord {
            chunk_idx,
            system_ts,
            tiles: tiles
                .iter()
                .map(|&t| TileChoice {
                    tile_idx: TileId::Tile(t),
                    bitrate: 29,
                })
                .collect(),
        }
    }

    #[test]
    fn test_downloads_are_serialized() {
        let mut sizes = SizeTable::new();
        sizes.insert(0, TileId::Tile(0), 29, 50_000);
        sizes.insert(1, TileId::Tile(0), 29, 50_000);
        let net = network();
        let sim = ArrivalSimulator::new(&sizes, &net, timing());

        // both decided at 0; the second waits for the first
        let arrivals = sim
            .simulate(&[decision(0, 0.0, &[0]), decision(1, 0.0, &[0])])
            .unwrap();
        assert!((arrivals[0].tiles[0].playable_ts - 540.0).abs() < 1e-9);
        assert!((arrivals[1].tiles[0].playable_ts - 1040.0).abs() < 1e-9);
    }

    #[test]
    fn test_redecision_appends() {
        let mut sizes = SizeTable::new();
        sizes.insert(0, TileId::Tile(0), 29, 10_000);
        sizes.insert(0, TileId::Tile(1), 29, 20_000);
        let net = network();
        let sim = ArrivalSimulator::new(&sizes, &net, timing());

        let arrivals = sim
            .simulate(&[decision(0, 0.0, &[0]), decision(0, 500.0, &[1])])
            .unwrap();
        assert_eq!(arrivals.len(), 1);
        let record = &arrivals[0];
        assert_eq!(record.chunk_size, 30_000);
        assert_eq!(record.tiles.len(), 2);
        // first tile keeps its original time
        assert!((record.tiles[0].playable_ts - 140.0).abs() < 1e-9);
        assert!((record.tiles[1].playable_ts - 740.0).abs() < 1e-9);
        assert_eq!(record.first_playable_ts(), Some(record.tiles[0].playable_ts));
    }

    #[test]
    fn test_missing_size_is_fatal() {
        let sizes = SizeTable::new();
        let net = network();
        let sim = ArrivalSimulator::new(&sizes, &net, timing());
        let err = sim.simulate(&[decision(3, 0.0, &[7])]).unwrap_err();
        assert!(matches!(err, SimError::MissingSize { chunk_idx: 3, tile: 7, quality: 29 }));
    }

    #[test]
    fn test_out_of_order_log_rejected() {
        let mut sizes = SizeTable::new();
        sizes.insert(0, TileId::Tile(0), 29, 1);
        sizes.insert(1, TileId::Tile(0), 29, 1);
        let net = network();
        let sim = ArrivalSimulator::new(&sizes, &net, timing());
        let err = sim
            .simulate(&[decision(0, 500.0, &[0]), decision(1, 100.0, &[0])])
            .unwrap_err();
        assert!(matches!(err, SimError::Malformed { .. }));
    }

    #[test]
    fn test_segment_rtt_and_server_location() {
        let mut sizes = SizeTable::new();
        sizes.insert(0, TileId::Tile(0), 29, 1_000);
        let net = NetworkTrace::from_segments([(1_000_000.0, 1000.0, Some(80.0))]).unwrap();
        let mut t = timing();
        t.location = DecisionLocation::Server;
        let sim = ArrivalSimulator::new(&sizes, &net, t);
        let arrivals = sim.simulate(&[decision(0, 0.0, &[0])]).unwrap();
        // 1 ms transfer + 80/2 rtt + 10 rendering
        assert!((arrivals[0].tiles[0].playable_ts - 51.0).abs() < 1e-9);
    }
}
