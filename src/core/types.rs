use serde::{Deserialize, Serialize};
use std::fmt;

/// Viewing direction in radians.
///
/// Yaw is the azimuth and grows with the ERP column, positive pitch looks
/// up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub yaw: f64,
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
}

impl Direction {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// One head-motion sample at a fixed motion frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Milliseconds since the start of the trace
    pub timestamp: u64,
    pub yaw: f64,
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl MotionSample {
    pub fn new(timestamp: u64, yaw: f64, pitch: f64) -> Self {
        Self {
            timestamp,
            yaw,
            pitch,
            roll: 0.0,
            scale: 1.0,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::new(self.yaw, self.pitch, self.roll)
    }
}

/// Identifies a fetchable unit of one chunk: a grid tile or the
/// low-resolution background stream.
///
/// Serialized as an integer, `-1` being the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TileId {
    Background,
    Tile(u32),
}

impl TileId {
    pub const BACKGROUND_INDEX: i64 = -1;

    pub fn is_background(&self) -> bool {
        matches!(self, TileId::Background)
    }

    pub fn index(&self) -> i64 {
        i64::from(*self)
    }
}

impl From<TileId> for i64 {
    fn from(tile: TileId) -> i64 {
        match tile {
            TileId::Background => TileId::BACKGROUND_INDEX,
            TileId::Tile(idx) => idx as i64,
        }
    }
}

impl TryFrom<i64> for TileId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            TileId::BACKGROUND_INDEX => Ok(TileId::Background),
            v if v >= 0 && v <= u32::MAX as i64 => Ok(TileId::Tile(v as u32)),
            v => Err(format!("invalid tile index {}", v)),
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileId::Background => write!(f, "background"),
            TileId::Tile(idx) => write!(f, "tile_{:03}", idx),
        }
    }
}

/// A tile selected for download and the quality (QP) it is fetched at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileChoice {
    pub tile_idx: TileId,
    pub bitrate: u32,
}

/// One decision-log entry: the tiles to fetch for one chunk.
///
/// On disk the record is nested as
/// `{chunk_idx, decision_data: {system_ts, tile_info: [...]}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DecisionWire", try_from = "DecisionWire")]
pub struct DecisionRecord {
    pub chunk_idx: u32,
    /// Simulated time (ms) at which the decision was taken
    pub system_ts: f64,
    pub tiles: Vec<TileChoice>,
}

#[derive(Serialize, Deserialize)]
struct DecisionWire {
    chunk_idx: u32,
    decision_data: DecisionData,
}

#[derive(Serialize, Deserialize)]
struct DecisionData {
    system_ts: f64,
    tile_info: Vec<TileChoice>,
}

impl From<DecisionRecord> for DecisionWire {
    fn from(record: DecisionRecord) -> Self {
        Self {
            chunk_idx: record.chunk_idx,
            decision_data: DecisionData {
                system_ts: record.system_ts,
                tile_info: record.tiles,
            },
        }
    }
}

impl TryFrom<DecisionWire> for DecisionRecord {
    type Error = String;

    fn try_from(wire: DecisionWire) -> Result<Self, Self::Error> {
        let system_ts = wire.decision_data.system_ts;
        if !system_ts.is_finite() || system_ts < 0.0 {
            return Err(format!(
                "chunk {} has invalid system_ts {}",
                wire.chunk_idx, system_ts
            ));
        }
        Ok(Self {
            chunk_idx: wire.chunk_idx,
            system_ts,
            tiles: wire.decision_data.tile_info,
        })
    }
}

/// A tile's simulated arrival
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileArrival {
    pub tile_idx: TileId,
    /// Earliest simulated time (ms) at which the tile can be displayed
    pub playable_ts: f64,
    pub bitrate: u32,
}

/// Arrival ledger entry for one chunk.
///
/// Re-decided tiles are appended; `chunk_size` accumulates every download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub chunk_idx: u32,
    pub chunk_size: u64,
    pub tiles: Vec<TileArrival>,
}

impl ArrivalRecord {
    /// Playable time of the first tile set; the chunk shows nothing before it.
    pub fn first_playable_ts(&self) -> Option<f64> {
        self.tiles.first().map(|t| t.playable_ts)
    }

    /// Tiles playable at `ts`, in ledger order
    pub fn playable_at(&self, ts: f64) -> impl Iterator<Item = &TileArrival> {
        self.tiles.iter().filter(move |t| t.playable_ts <= ts)
    }
}

/// Where the viewport fell relative to the delivered tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    In,
    Out,
    NoContent,
}

/// Per-tick evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub motion_ts: u64,
    pub frame_idx: u64,
    pub yaw: f64,
    pub pitch: f64,
    pub location: Location,
    pub out_area_percent: f64,
    pub psnr: f64,
    pub ssim: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mse: Option<f64>,
}

/// Final aggregate record of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub avg_psnr: f64,
    pub avg_ssim: f64,
    pub avg_mse: f64,
    pub avg_out_area_percent: f64,
    pub max_bandwidth_mbps: f64,
    pub avg_bandwidth_mbps: f64,
    pub total_transfer_mb: f64,
    pub total_storage_gb: f64,
    /// Weighted bandwidth, storage and computation cost terms
    pub cost: [f64; 3],
    pub gc_score: f64,
}

/// One entry of the evaluation artifact: ticks followed by one summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationEntry {
    Tick(TickResult),
    Summary(RunSummary),
}
