use std::time::Duration;

use log::warn;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::models::chain::{ChainStatus, StatusResponse};
use crate::models::network::{
    ModelInfo, ModelsResponse, ParticipantRecord, ParticipantStats, ParticipantStatsResponse,
    ParticipantsResponse, PricingInfo,
};
use crate::models::node::{GpuDevicesResponse, GpuSummary, NodeList, NodeRecord};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const EXTERNAL_NODE_TIMEOUT: Duration = Duration::from_secs(3);
pub const GPU_TIMEOUT: Duration = Duration::from_secs(2);
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned error status: {0}")]
    Status(StatusCode),
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP/JSON access to every upstream the exporter polls.
///
/// Each call is a single GET bounded by its own timeout. Failures of any kind are
/// logged here with the URL and returned as [`SourceError`]; callers only decide
/// what a missing payload means for their metrics.
#[derive(Clone, Debug)]
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("gonka-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T, SourceError> {
        let result = self.get_json(url, timeout).await;
        if let Err(e) = &result {
            warn!("Error fetching {url}: {e}");
        }
        result
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<T, SourceError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `base_url` is a CometBFT RPC root, local or external.
    pub async fn chain_status(
        &self,
        base_url: &str,
        timeout: Duration,
    ) -> Result<ChainStatus, SourceError> {
        let url = format!("{base_url}/status");
        self.fetch_json::<StatusResponse>(&url, timeout)
            .await
            .map(ChainStatus::from)
    }

    pub async fn nodes(&self, admin_url: &str) -> Result<Vec<NodeRecord>, SourceError> {
        let url = format!("{admin_url}/admin/v1/nodes");
        let NodeList(entries) = self.fetch_json(&url, DEFAULT_TIMEOUT).await?;
        Ok(entries.into_iter().map(NodeRecord::from).collect())
    }

    pub async fn gpu_stats(&self, host: &str, port: u16) -> Result<GpuSummary, SourceError> {
        let url = format!("http://{host}:{port}/api/v1/gpu/devices");
        self.fetch_json::<GpuDevicesResponse>(&url, GPU_TIMEOUT)
            .await
            .map(GpuSummary::from)
    }

    pub async fn participants(
        &self,
        network_url: &str,
    ) -> Result<Vec<ParticipantRecord>, SourceError> {
        let url = format!("{network_url}/v1/epochs/current/participants");
        self.fetch_json::<ParticipantsResponse>(&url, NETWORK_TIMEOUT)
            .await
            .map(ParticipantsResponse::into_records)
    }

    pub async fn pricing(&self, network_url: &str) -> Result<PricingInfo, SourceError> {
        let url = format!("{network_url}/v1/pricing");
        self.fetch_json(&url, NETWORK_TIMEOUT).await
    }

    pub async fn models(&self, network_url: &str) -> Result<Vec<ModelInfo>, SourceError> {
        let url = format!("{network_url}/v1/models");
        self.fetch_json::<ModelsResponse>(&url, NETWORK_TIMEOUT)
            .await
            .map(|response| response.models)
    }

    pub async fn participant_stats(
        &self,
        network_url: &str,
        address: &str,
    ) -> Result<ParticipantStats, SourceError> {
        let url = format!("{network_url}/v1/participants/{address}");
        self.fetch_json::<ParticipantStatsResponse>(&url, NETWORK_TIMEOUT)
            .await
            .map(|response| response.participant)
    }
}
