use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use super::coerce::{lenient_default, lenient_f64, lenient_i64, lenient_seq, lenient_string};

/// Hardware status reported by the admin API. The discriminant is the exported gauge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HardwareStatus {
    #[default]
    Unknown = 0,
    Inference = 1,
    Poc = 2,
    Training = 3,
    Stopped = 4,
    Failed = 5,
}

impl HardwareStatus {
    /// Case-insensitive; anything unrecognized is `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INFERENCE" => HardwareStatus::Inference,
            "POC" => HardwareStatus::Poc,
            "TRAINING" => HardwareStatus::Training,
            "STOPPED" => HardwareStatus::Stopped,
            "FAILED" => HardwareStatus::Failed,
            _ => HardwareStatus::Unknown,
        }
    }

    pub fn metric_value(self) -> f64 {
        self as u8 as f64
    }
}

impl fmt::Display for HardwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareStatus::Unknown => "UNKNOWN",
            HardwareStatus::Inference => "INFERENCE",
            HardwareStatus::Poc => "POC",
            HardwareStatus::Training => "TRAINING",
            HardwareStatus::Stopped => "STOPPED",
            HardwareStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Proof-of-compute phase of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PocStatus {
    #[default]
    Idle = 0,
    Generating = 1,
    Validating = 2,
}

impl PocStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GENERATING" => PocStatus::Generating,
            "VALIDATING" => PocStatus::Validating,
            _ => PocStatus::Idle,
        }
    }

    pub fn metric_value(self) -> f64 {
        self as u8 as f64
    }
}

impl fmt::Display for PocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PocStatus::Idle => "IDLE",
            PocStatus::Generating => "GENERATING",
            PocStatus::Validating => "VALIDATING",
        };
        f.write_str(name)
    }
}

/// Body of `/admin/v1/nodes`. A malformed element is dropped without affecting its siblings.
#[derive(Debug, Default, Deserialize)]
pub struct NodeList(#[serde(deserialize_with = "lenient_seq")] pub Vec<NodeEntry>);

/// One element of the `/admin/v1/nodes` array.
#[derive(Debug, Default, Deserialize)]
pub struct NodeEntry {
    #[serde(default, deserialize_with = "lenient_default")]
    pub node: NodeInfo,
    #[serde(default, deserialize_with = "lenient_default")]
    pub state: NodeState,
}

#[derive(Debug, Default, Deserialize)]
pub struct NodeInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub poc_port: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NodeState {
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub intended_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub poc_current_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub poc_intended_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub epoch_ml_nodes: BTreeMap<String, EpochModelWeight>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EpochModelWeight {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub poc_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub host: String,
    pub port: Option<u16>,
    pub current_status: HardwareStatus,
    pub intended_status: HardwareStatus,
    pub poc_current_status: PocStatus,
    pub poc_intended_status: PocStatus,
    /// Model id to PoC weight. `None` marks a weight that failed to parse.
    pub poc_weights: BTreeMap<String, Option<f64>>,
}

impl From<NodeEntry> for NodeRecord {
    fn from(entry: NodeEntry) -> Self {
        let NodeEntry { node, state } = entry;
        let status = |raw: &Option<String>| HardwareStatus::from_wire(raw.as_deref().unwrap_or(""));
        let poc_status = |raw: &Option<String>| PocStatus::from_wire(raw.as_deref().unwrap_or(""));

        Self {
            id: node.id.unwrap_or_else(|| "unknown".to_string()),
            host: node.host.unwrap_or_else(|| "unknown".to_string()),
            port: node.poc_port.and_then(|p| u16::try_from(p).ok()),
            current_status: status(&state.current_status),
            intended_status: status(&state.intended_status),
            poc_current_status: poc_status(&state.poc_current_status),
            poc_intended_status: poc_status(&state.poc_intended_status),
            poc_weights: state
                .epoch_ml_nodes
                .into_iter()
                .map(|(model, weight)| (model, weight.poc_weight))
                .collect(),
        }
    }
}

/// Response of a node's `/api/v1/gpu/devices` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct GpuDevicesResponse {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub devices: Vec<GpuDevice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GpuDevice {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub utilization_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpuSummary {
    pub device_count: usize,
    pub avg_utilization: f64,
}

impl From<GpuDevicesResponse> for GpuSummary {
    fn from(response: GpuDevicesResponse) -> Self {
        let readings: Vec<f64> = response
            .devices
            .iter()
            .filter_map(|d| d.utilization_percent)
            .collect();
        let avg_utilization = if readings.is_empty() {
            0.0
        } else {
            readings.iter().sum::<f64>() / readings.len() as f64
        };
        Self {
            device_count: response.devices.len(),
            avg_utilization,
        }
    }
}
