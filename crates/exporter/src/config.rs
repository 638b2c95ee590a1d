use std::time::Duration;

use url::Url;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL for {field}: {value} ({reason})")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("refresh interval must be at least one second")]
    ZeroInterval,
}

/// Resolved exporter settings. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub node_rpc_url: String,
    pub admin_api_url: String,
    pub network_api_url: String,
    pub external_nodes: Vec<String>,
    pub network_metrics: bool,
    pub node_fetch: bool,
    pub participant_address: Option<String>,
    pub port: u16,
    pub refresh_interval: Duration,
    pub sample_seed: Option<u64>,
}

impl Config {
    /// Short summary of the enabled metric groups, for the startup log line.
    pub fn feature_summary(&self) -> String {
        let mut groups = vec!["chain"];
        if self.network_metrics {
            groups.push("network");
        }
        if self.participant_address.is_some() {
            groups.push("participant");
        }
        if self.node_fetch {
            groups.push("nodes");
        }
        groups.join(",")
    }
}

/// Validates an http(s) base URL and strips trailing slashes so paths can be appended.
pub fn normalize_url(field: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Comma-separated endpoint list. Blank entries are dropped, duplicates keep their first position.
pub fn parse_node_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut nodes: Vec<String> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let url = normalize_url("external-nodes", entry)?;
        if !nodes.contains(&url) {
            nodes.push(url);
        }
    }
    Ok(nodes)
}

pub fn refresh_interval(seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(Duration::from_secs(seconds))
}
