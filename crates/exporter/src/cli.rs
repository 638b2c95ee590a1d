use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::api::server::start_server;
use crate::collector::Collector;
use crate::config::{self, Config, ConfigError};
use crate::metrics::MetricStore;
use crate::sampler::{NodeSelector, RandomSelector, SeededSelector};
use crate::sources::SourceClient;

#[derive(Parser, Debug)]
#[command(name = "gonka-exporter", version, about = "Prometheus exporter for Gonka chain and ML nodes")]
pub struct Cli {
    /// Local CometBFT RPC URL
    #[arg(long, env = "NODE_RPC_URL", default_value = "http://localhost:26657")]
    pub node_rpc_url: String,

    /// Admin API URL of the network node (ML node inventory)
    #[arg(long, env = "ADMIN_API_URL", default_value = "http://localhost:9200")]
    pub admin_api_url: String,

    /// Network API URL (participants, pricing, models, participant stats)
    #[arg(long, env = "NETWORK_API_URL", default_value = "http://localhost:8000")]
    pub network_api_url: String,

    /// Comma-separated CometBFT RPC URLs sampled for the network max block height
    /// Example: `http://node1.gonka.ai:26657,http://node2.gonka.ai:26657`
    #[arg(long, env = "EXTERNAL_NODES", default_value = "")]
    pub external_nodes: String,

    /// Export network-wide metrics (max height sampling, participants, pricing, models)
    #[arg(long, env = "ENABLE_NETWORK_METRICS", default_value = "false")]
    pub enable_network_metrics: bool,

    /// Skip polling the admin API for ML nodes
    #[arg(long, env = "DISABLE_NODE_FETCH", default_value = "false")]
    pub disable_node_fetch: bool,

    /// Optional: participant address to export own epoch stats for
    #[arg(long, env = "PARTICIPANT_ADDRESS", default_value = None)]
    pub participant_address: Option<String>,

    /// Port of the metrics endpoint
    #[arg(short = 'p', long, env = "EXPORTER_PORT", default_value = "9401")]
    pub port: u16,

    /// Seconds between refresh cycles
    #[arg(short = 'i', long, env = "REFRESH_INTERVAL", default_value = "30")]
    pub refresh_interval: u64,

    /// Optional: seed for external node sampling, for reproducible runs
    #[arg(long, env = "SAMPLE_SEED", default_value = None)]
    pub seed: Option<u64>,

    /// Log level
    #[arg(short = 'l', long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let participant_address = self
            .participant_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map(str::to_string);

        Ok(Config {
            node_rpc_url: config::normalize_url("node-rpc-url", &self.node_rpc_url)?,
            admin_api_url: config::normalize_url("admin-api-url", &self.admin_api_url)?,
            network_api_url: config::normalize_url("network-api-url", &self.network_api_url)?,
            external_nodes: config::parse_node_list(&self.external_nodes)?,
            network_metrics: self.enable_network_metrics,
            node_fetch: !self.disable_node_fetch,
            participant_address,
            port: self.port,
            refresh_interval: config::refresh_interval(self.refresh_interval)?,
            sample_seed: self.seed,
        })
    }

    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        let config = Arc::new(self.resolve()?);
        let store = Arc::new(MetricStore::new()?);
        let client = SourceClient::new()?;
        let selector: Arc<dyn NodeSelector> = match config.sample_seed {
            Some(seed) => Arc::new(SeededSelector::new(seed)),
            None => Arc::new(RandomSelector),
        };

        info!(
            "Gonka exporter running on port {} (groups: {}, refresh every {}s, {} external nodes)",
            config.port,
            config.feature_summary(),
            config.refresh_interval.as_secs(),
            config.external_nodes.len()
        );

        let server = start_server("0.0.0.0", config.port, store.clone(), cancellation_token.clone())?;

        let collector = Collector::new(config, client, selector, store);
        let collector_handle = tokio::spawn(collector.run(cancellation_token.clone()));

        if let Err(e) = server.await {
            error!("Metrics server error: {e:?}");
        }
        cancellation_token.cancel();
        if let Err(e) = collector_handle.await {
            error!("Collector task failed: {e}");
        }
        Ok(())
    }
}
