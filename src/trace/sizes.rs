//! Encoded size of every tile variant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::TileId;
use crate::{Result, SimError};

/// `chunk -> tile -> quality -> bytes`; tile `-1` is the background stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeTable {
    chunks: BTreeMap<u32, BTreeMap<i64, BTreeMap<u32, u64>>>,
}

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, chunk_idx: u32, tile: TileId, quality: u32, bytes: u64) {
        self.chunks
            .entry(chunk_idx)
            .or_default()
            .entry(tile.index())
            .or_default()
            .insert(quality, bytes);
    }

    /// Size of one variant. The background has a single encoding, so its
    /// quality key is not consulted.
    pub fn size_of(&self, chunk_idx: u32, tile: TileId, quality: u32) -> Result<u64> {
        if tile.is_background() {
            return self.background_size(chunk_idx);
        }
        self.chunks
            .get(&chunk_idx)
            .and_then(|tiles| tiles.get(&tile.index()))
            .and_then(|q| q.get(&quality))
            .copied()
            .ok_or(SimError::MissingSize {
                chunk_idx,
                tile: tile.index(),
                quality,
            })
    }

    pub fn background_size(&self, chunk_idx: u32) -> Result<u64> {
        self.chunks
            .get(&chunk_idx)
            .and_then(|tiles| tiles.get(&TileId::BACKGROUND_INDEX))
            .and_then(|q| q.values().next())
            .copied()
            .ok_or(SimError::MissingSize {
                chunk_idx,
                tile: TileId::BACKGROUND_INDEX,
                quality: 0,
            })
    }

    /// Bytes stored across every encoded variant, used or not
    pub fn total_storage(&self) -> u64 {
        self.chunks
            .values()
            .flat_map(|tiles| tiles.values())
            .flat_map(|q| q.values())
            .sum()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "0": {"0": {"22": 1000, "29": 400}, "1": {"29": 300}, "-1": {"0": 250}},
        "1": {"0": {"29": 500}}
    }"#;

    #[test]
    fn test_lookup() {
        let table = SizeTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.size_of(0, TileId::Tile(0), 22).unwrap(), 1000);
        assert_eq!(table.size_of(1, TileId::Tile(0), 29).unwrap(), 500);
        assert_eq!(table.chunk_count(), 2);
    }

    #[test]
    fn test_background_ignores_quality() {
        let table = SizeTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.size_of(0, TileId::Background, 29).unwrap(), 250);
        assert!(table.background_size(1).is_err());
    }

    #[test]
    fn test_missing_entry() {
        let table = SizeTable::from_json_str(TABLE).unwrap();
        let err = table.size_of(0, TileId::Tile(1), 22).unwrap_err();
        assert!(matches!(
            err,
            SimError::MissingSize {
                chunk_idx: 0,
                tile: 1,
                quality: 22
            }
        ));
    }

    #[test]
    fn test_total_storage_counts_every_variant() {
        let table = SizeTable::from_json_str(TABLE).unwrap();
        assert_eq!(table.total_storage(), 1000 + 400 + 300 + 250 + 500);
    }

    #[test]
    fn test_insert() {
        let mut table = SizeTable::new();
        table.insert(2, TileId::Tile(5), 29, 77);
        assert_eq!(table.size_of(2, TileId::Tile(5), 29).unwrap(), 77);
    }
}
