//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// A named MBTiles file, given as `name=path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetConfig {
    pub name: String,
    pub path: PathBuf,
}

fn parse_tileset(s: &str) -> Result<TilesetConfig, String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=path, got '{s}'"))?;
    let name = name.trim();
    let path = path.trim();
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected name=path, got '{s}'"));
    }
    Ok(TilesetConfig {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tile-proxy")]
#[command(about = "Same-origin tile proxy and MBTiles vector tile server")]
pub struct Args {
    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8090")]
    pub listen: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Vector tilesets as name=path, comma separated
    #[arg(
        long = "tileset",
        env = "TILESETS",
        value_delimiter = ',',
        value_parser = parse_tileset,
        default_value = "flood=data/tiles/brisbane-flood.mbtiles"
    )]
    pub tilesets: Vec<TilesetConfig>,

    /// Upstream hosts the proxy may contact. Empty allows any public host.
    #[arg(long, env = "PROXY_ALLOWED_HOSTS", value_delimiter = ',')]
    pub allowed_hosts: Vec<String>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "PROXY_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,
}

impl Args {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["tile-proxy"]);
        assert_eq!(args.listen, "0.0.0.0:8090");
        assert_eq!(
            args.tilesets,
            vec![TilesetConfig {
                name: "flood".to_string(),
                path: PathBuf::from("data/tiles/brisbane-flood.mbtiles"),
            }]
        );
        assert!(args.allowed_hosts.is_empty());
        assert_eq!(args.upstream_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_tileset_list() {
        let args = Args::parse_from([
            "tile-proxy",
            "--tileset",
            "flood=/srv/flood.mbtiles,heritage=/srv/heritage.mbtiles",
            "--allowed-hosts",
            "spatial-gis.information.qld.gov.au,maps.six.nsw.gov.au",
        ]);
        assert_eq!(args.tilesets.len(), 2);
        assert_eq!(args.tilesets[1].name, "heritage");
        assert_eq!(args.allowed_hosts.len(), 2);
    }

    #[test]
    fn test_bad_tileset_rejected() {
        assert!(parse_tileset("flood").is_err());
        assert!(parse_tileset("=x.mbtiles").is_err());
    }
}
