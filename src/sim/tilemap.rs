//! Tile grid and solidity lookup
//!
//! Tiles are stored row-major; cell `(x, y)` covers
//! `[x * tile_size, (x + 1) * tile_size) x [y * tile_size, (y + 1) * tile_size)`.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::TILE_SIZE;

/// Tile index painted for open ground
pub const GROUND_TILE: i32 = 0;
/// Tile index painted for water/walls
pub const WATER_TILE: i32 = 8;
/// Number of tile kinds in the tileset
pub const TILE_KINDS: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    #[error("tile data has {actual} entries, expected {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },
    #[error("level has no tiles")]
    Empty,
    #[error("unknown map glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph { glyph: char, row: usize, column: usize },
    #[error("row {row} has {len} tiles, expected {width}")]
    RaggedRow { row: usize, len: usize, width: usize },
    #[error("tile size {0} must be positive")]
    BadTileSize(f32),
    #[error("level has no player spawn")]
    MissingPlayer,
}

/// A rectangular layer of tile indices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTileLayer")]
pub struct TileLayer {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    tiles: Vec<i32>,
}

impl TileLayer {
    pub fn new(width: usize, height: usize, tiles: Vec<i32>) -> Result<Self, LevelError> {
        if width == 0 || height == 0 {
            return Err(LevelError::Empty);
        }
        if tiles.len() != width * height {
            return Err(LevelError::SizeMismatch {
                width,
                height,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tile_size: TILE_SIZE,
            tiles,
        })
    }

    /// Build a layer from ASCII rows: `#` is water, `.` is ground
    pub fn from_ascii(rows: &[&str]) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut tiles = Vec::with_capacity(width * height);

        for (row, line) in rows.iter().enumerate() {
            let len = line.chars().count();
            if len != width {
                return Err(LevelError::RaggedRow { row, len, width });
            }
            for (column, glyph) in line.chars().enumerate() {
                let tile = match glyph {
                    '#' => WATER_TILE,
                    '.' => GROUND_TILE,
                    _ => return Err(LevelError::UnknownGlyph { glyph, row, column }),
                };
                tiles.push(tile);
            }
        }

        Self::new(width, height, tiles)
    }

    pub fn with_tile_size(mut self, tile_size: f32) -> Result<Self, LevelError> {
        if !(tile_size > 0.0 && tile_size.is_finite()) {
            return Err(LevelError::BadTileSize(tile_size));
        }
        self.tile_size = tile_size;
        Ok(self)
    }

    /// Tile index at a cell, `None` outside the grid
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.tiles[y as usize * self.width + x as usize])
    }

    /// Cell containing a world position (may be outside the grid)
    #[inline]
    pub fn cell_at(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    /// World-space bounds of a cell as (min, max)
    #[inline]
    pub fn cell_bounds(&self, x: i32, y: i32) -> (Vec2, Vec2) {
        let min = Vec2::new(x as f32, y as f32) * self.tile_size;
        (min, min + Vec2::splat(self.tile_size))
    }

    /// World-space center of a cell
    #[inline]
    pub fn cell_center(&self, x: i32, y: i32) -> Vec2 {
        (Vec2::new(x as f32, y as f32) + 0.5) * self.tile_size
    }
}

/// Unchecked layer as it appears in save data
#[derive(Deserialize)]
struct RawTileLayer {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<i32>,
}

impl TryFrom<RawTileLayer> for TileLayer {
    type Error = LevelError;

    fn try_from(raw: RawTileLayer) -> Result<Self, Self::Error> {
        TileLayer::new(raw.width, raw.height, raw.tiles)?.with_tile_size(raw.tile_size)
    }
}

/// Per-tile-kind solidity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidTable {
    solid: Vec<bool>,
}

impl Default for SolidTable {
    /// Kinds 8..=15 of the tileset are water; everything else is walkable
    fn default() -> Self {
        let solid = (0..TILE_KINDS).map(|i| (8..=15).contains(&i)).collect();
        Self { solid }
    }
}

impl SolidTable {
    pub fn new(solid: Vec<bool>) -> Self {
        Self { solid }
    }

    /// Negative and unknown tile indices are never solid
    #[inline]
    pub fn is_solid(&self, tile: i32) -> bool {
        usize::try_from(tile)
            .ok()
            .and_then(|i| self.solid.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Solidity of a cell, `false` outside the grid
    #[inline]
    pub fn is_solid_cell(&self, layer: &TileLayer, x: i32, y: i32) -> bool {
        layer.get(x, y).is_some_and(|t| self.is_solid(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ascii() {
        let layer = TileLayer::from_ascii(&["#..", "..#"]).unwrap();
        assert_eq!(layer.width, 3);
        assert_eq!(layer.height, 2);
        assert_eq!(layer.get(0, 0), Some(WATER_TILE));
        assert_eq!(layer.get(2, 1), Some(WATER_TILE));
        assert_eq!(layer.get(1, 1), Some(GROUND_TILE));
        assert_eq!(layer.get(3, 0), None);
        assert_eq!(layer.get(-1, 0), None);
    }

    #[test]
    fn test_bad_level_data() {
        assert_eq!(
            TileLayer::new(2, 2, vec![0; 3]).unwrap_err(),
            LevelError::SizeMismatch {
                width: 2,
                height: 2,
                actual: 3
            }
        );
        assert_eq!(TileLayer::from_ascii(&[]).unwrap_err(), LevelError::Empty);
        assert!(matches!(
            TileLayer::from_ascii(&["#x"]),
            Err(LevelError::UnknownGlyph { glyph: 'x', row: 0, column: 1 })
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert_eq!(
            TileLayer::from_ascii(&["###", "#", "#####"]).unwrap_err(),
            LevelError::RaggedRow {
                row: 1,
                len: 1,
                width: 3
            }
        );
    }

    #[test]
    fn test_tile_size() {
        let layer = TileLayer::from_ascii(&["..", ".."])
            .unwrap()
            .with_tile_size(8.0)
            .unwrap();
        assert_eq!(layer.cell_center(1, 1), Vec2::new(12.0, 12.0));
        assert_eq!(layer.cell_at(Vec2::new(9.0, 1.0)), (1, 0));

        for bad in [0.0, -16.0, f32::INFINITY] {
            assert!(matches!(
                TileLayer::from_ascii(&["."]).unwrap().with_tile_size(bad),
                Err(LevelError::BadTileSize(_))
            ));
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let layer: TileLayer =
            serde_json::from_str(r#"{"width":2,"height":1,"tile_size":16.0,"tiles":[0,8]}"#)
                .unwrap();
        assert_eq!(layer.get(1, 0), Some(WATER_TILE));

        let short = r#"{"width":5,"height":3,"tile_size":16.0,"tiles":[8,8]}"#;
        assert!(serde_json::from_str::<TileLayer>(short).is_err());
        let flat = r#"{"width":1,"height":1,"tile_size":0.0,"tiles":[8]}"#;
        assert!(serde_json::from_str::<TileLayer>(flat).is_err());
    }

    #[test]
    fn test_solid_table_out_of_range() {
        let table = SolidTable::default();
        assert!(table.is_solid(WATER_TILE));
        assert!(!table.is_solid(GROUND_TILE));
        assert!(!table.is_solid(-1));
        assert!(!table.is_solid(999));
    }

    #[test]
    fn test_cell_geometry() {
        let layer = TileLayer::from_ascii(&["...", "..."]).unwrap();
        assert_eq!(layer.cell_at(Vec2::new(17.0, 3.0)), (1, 0));
        assert_eq!(layer.cell_at(Vec2::new(-1.0, 3.0)), (-1, 0));
        let (min, max) = layer.cell_bounds(1, 1);
        assert_eq!(min, Vec2::new(16.0, 16.0));
        assert_eq!(max, Vec2::new(32.0, 32.0));
        assert_eq!(layer.cell_center(0, 0), Vec2::new(8.0, 8.0));
    }
}
