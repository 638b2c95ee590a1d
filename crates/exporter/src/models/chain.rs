use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::coerce::{lenient_bool, lenient_i64, lenient_time};

/// `sync_info` block of a CometBFT `/status` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChainStatus {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub latest_block_height: Option<i64>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub latest_block_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub earliest_block_height: Option<i64>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub earliest_block_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub catching_up: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub result: StatusResult,
}

#[derive(Debug, Deserialize)]
pub struct StatusResult {
    #[serde(default)]
    pub sync_info: ChainStatus,
}

impl From<StatusResponse> for ChainStatus {
    fn from(response: StatusResponse) -> Self {
        response.result.sync_info
    }
}

/// Unix seconds with sub-second precision, as exported in `*_time_seconds` gauges.
pub fn unix_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}
