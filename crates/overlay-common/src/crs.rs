//! Coordinate Reference System codes understood by the overlay adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes used by overlay services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS string as written in service configs.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:3857"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "EPSG:900913" (legacy alias of Web Mercator)
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" | "EPSG:102100" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Numeric EPSG code, as ArcGIS `*SR` parameters expect.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_wms_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("epsg:3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_wms_string("EPSG:900913").unwrap(),
            CrsCode::Epsg3857
        );
        assert_eq!(
            CrsCode::from_wms_string("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert!(CrsCode::from_wms_string("EPSG:28356").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CrsCode::Epsg3857.to_string(), "EPSG:3857");
    }
}
