//! Application state and shared resources.

use std::net::IpAddr;

use anyhow::{Context, Result};

use crate::config::Args;
use crate::mbtiles::TileStore;

/// Shared application state.
pub struct AppState {
    pub http: reqwest::Client,
    pub tiles: TileStore,
    /// Hosts the proxy may contact; empty allows any public host
    pub allowed_hosts: Vec<String>,
}

impl AppState {
    pub async fn new(args: &Args) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(args.upstream_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let tiles = TileStore::open(&args.tilesets).await;
        let allowed_hosts = args
            .allowed_hosts
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Ok(Self {
            http,
            tiles,
            allowed_hosts,
        })
    }

    /// Whether `host` is allowed, matching listed hosts and their subdomains.
    /// Without a list, loopback and private addresses are refused.
    pub fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return !is_internal_host(host);
        }
        let host = host.to_ascii_lowercase();
        self.allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }
}

/// Loopback, private, link-local or unspecified address literals, and
/// `localhost`. Names that resolve to such addresses are not detected.
pub fn is_internal_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
        }
        Ok(IpAddr::V6(ip)) => {
            let first = ip.segments()[0];
            ip.is_loopback()
                || ip.is_unspecified()
                // unique local fc00::/7 and link-local fe80::/10
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || ip.to_ipv4_mapped().is_some_and(|v4| is_internal_host(&v4.to_string()))
        }
        Err(_) => false,
    }
}
