//! Read-only MBTiles access.
//!
//! MBTiles stores rows in TMS order (origin bottom-left), so lookups use
//! [`TileCoord::tms_y`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use overlay_common::tile::{TileCoord, MAX_ZOOM};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TilesetConfig;

#[derive(Debug, Error)]
pub enum MbtilesError {
    #[error("unknown tileset: {0}")]
    UnknownTileset(String),

    #[error("tileset file not available: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Whether tile data is already gzip-compressed.
pub fn is_gzipped(data: &[u8]) -> bool {
    data.starts_with(&[0x1f, 0x8b])
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TilesetMetadata {
    pub tileset: String,
    pub name: String,
    pub description: String,
    pub format: String,
    pub minzoom: u32,
    pub maxzoom: u32,
    pub bounds: String,
    pub center: String,
    pub attribution: String,
}

impl TilesetMetadata {
    fn from_rows(tileset: &str, rows: HashMap<String, String>) -> Self {
        let text = |key: &str, default: &str| {
            rows.get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        let zoom = |key: &str, default: u32| {
            rows.get(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        Self {
            tileset: tileset.to_string(),
            name: text("name", tileset),
            description: text("description", ""),
            format: text("format", "pbf"),
            minzoom: zoom("minzoom", 0),
            maxzoom: zoom("maxzoom", MAX_ZOOM),
            bounds: text("bounds", ""),
            center: text("center", ""),
            attribution: text("attribution", ""),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TilesetSummary {
    pub name: String,
    pub path: String,
    pub available: bool,
}

struct Tileset {
    path: PathBuf,
    pool: Option<SqlitePool>,
}

/// Configured tilesets and their connection pools.
pub struct TileStore {
    tilesets: BTreeMap<String, Tileset>,
}

impl TileStore {
    /// Open every configured tileset. Missing or unreadable files are kept in
    /// the listing as unavailable.
    pub async fn open(configs: &[TilesetConfig]) -> Self {
        let mut tilesets = BTreeMap::new();
        for config in configs {
            let pool = if config.path.exists() {
                let options = SqliteConnectOptions::new()
                    .filename(&config.path)
                    .read_only(true);
                match SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options)
                    .await
                {
                    Ok(pool) => {
                        info!(tileset = %config.name, path = %config.path.display(), "Opened tileset");
                        Some(pool)
                    }
                    Err(e) => {
                        warn!(tileset = %config.name, error = %e, "Failed to open tileset");
                        None
                    }
                }
            } else {
                warn!(tileset = %config.name, path = %config.path.display(), "Tileset file missing");
                None
            };
            tilesets.insert(
                config.name.clone(),
                Tileset {
                    path: config.path.clone(),
                    pool,
                },
            );
        }
        Self { tilesets }
    }

    fn pool(&self, tileset: &str) -> Result<&SqlitePool, MbtilesError> {
        let entry = self
            .tilesets
            .get(tileset)
            .ok_or_else(|| MbtilesError::UnknownTileset(tileset.to_string()))?;
        entry
            .pool
            .as_ref()
            .ok_or_else(|| MbtilesError::Unavailable(tileset.to_string()))
    }

    /// Tile bytes for a valid XYZ coordinate, `None` when no row exists.
    pub async fn tile(
        &self,
        tileset: &str,
        coord: TileCoord,
    ) -> Result<Option<Vec<u8>>, MbtilesError> {
        let pool = self.pool(tileset)?;
        let data = sqlx::query_scalar::<_, Option<Vec<u8>>>(
            "SELECT tile_data FROM tiles WHERE zoom_level = ? AND tile_column = ? AND tile_row = ?",
        )
        .bind(i64::from(coord.z))
        .bind(i64::from(coord.x))
        .bind(i64::from(coord.tms_y()))
        .fetch_optional(pool)
        .await?;
        Ok(data.flatten())
    }

    pub async fn metadata(&self, tileset: &str) -> Result<TilesetMetadata, MbtilesError> {
        let pool = self.pool(tileset)?;
        let rows = sqlx::query_as::<_, (String, String)>("SELECT name, value FROM metadata")
            .fetch_all(pool)
            .await?;
        Ok(TilesetMetadata::from_rows(tileset, rows.into_iter().collect()))
    }

    pub fn list(&self) -> Vec<TilesetSummary> {
        self.tilesets
            .iter()
            .map(|(name, t)| TilesetSummary {
                name: name.clone(),
                path: t.path.display().to_string(),
                available: t.pool.is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_detection() {
        assert!(is_gzipped(&[0x1f, 0x8b, 0x08, 0x00]));
        assert!(!is_gzipped(&[0x1a, 0x02]));
        assert!(!is_gzipped(&[]));
    }

    #[test]
    fn test_metadata_defaults() {
        let mut rows = HashMap::new();
        rows.insert("minzoom".to_string(), "10".to_string());
        rows.insert("maxzoom".to_string(), "not a number".to_string());

        let meta = TilesetMetadata::from_rows("flood", rows);
        assert_eq!(meta.name, "flood");
        assert_eq!(meta.format, "pbf");
        assert_eq!(meta.minzoom, 10);
        assert_eq!(meta.maxzoom, 22);
    }
}
