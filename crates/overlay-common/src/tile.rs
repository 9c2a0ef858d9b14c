//! Slippy-map tile coordinates.

use serde::{Deserialize, Serialize};

/// Deepest zoom level accepted for tile requests.
pub const MAX_ZOOM: u32 = 22;

/// A tile coordinate (z/x/y) in XYZ (slippy map) row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y), counted from the top
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether z is within range and x/y fit the zoom's grid.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Row in TMS order (counted from the bottom), as MBTiles stores it.
    pub fn tms_y(&self) -> u32 {
        ((1u64 << self.z) - 1 - self.y as u64) as u32
    }

    /// "z/x/y" path fragment.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tms_flip() {
        assert_eq!(TileCoord::new(0, 0, 0).tms_y(), 0);
        assert_eq!(TileCoord::new(1, 0, 0).tms_y(), 1);
        assert_eq!(TileCoord::new(14, 15152, 9520).tms_y(), (1 << 14) - 1 - 9520);
    }

    #[test]
    fn test_validity() {
        assert!(TileCoord::new(2, 3, 3).is_valid());
        assert!(!TileCoord::new(2, 4, 0).is_valid());
        assert!(!TileCoord::new(23, 0, 0).is_valid());
    }
}
