use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::metrics::catalog::*;
use crate::metrics::{MetricStore, MetricsError};
use crate::models::chain::{unix_seconds, ChainStatus};
use crate::sampler::{NodeSampler, NodeSelector};
use crate::sources::{SourceClient, SourceError, DEFAULT_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Runs refresh cycles against every enabled source and writes the results to the store.
pub struct Collector {
    config: Arc<Config>,
    client: SourceClient,
    sampler: NodeSampler,
    store: Arc<MetricStore>,
}

impl Collector {
    pub fn new(
        config: Arc<Config>,
        client: SourceClient,
        selector: Arc<dyn NodeSelector>,
        store: Arc<MetricStore>,
    ) -> Self {
        let sampler = NodeSampler::new(
            client.clone(),
            config.node_rpc_url.clone(),
            config.external_nodes.clone(),
            selector,
        );
        Self {
            config,
            client,
            sampler,
            store,
        }
    }

    pub async fn run(self, cancellation_token: CancellationToken) {
        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Collector is stopping due to cancellation signal");
                    break;
                }
                _ = tokio::time::sleep(self.config.refresh_interval) => {}
            }
        }
    }

    /// One full refresh. Steps run in a fixed order and a failing step never stops the next one.
    pub async fn run_cycle(&self) {
        let cycle_start = Instant::now();
        debug!("Starting refresh cycle");

        isolate("chain status", self.update_chain_status()).await;

        if self.config.network_metrics {
            isolate("network participants", self.update_participants()).await;
            isolate("pricing", self.update_pricing()).await;
            isolate("model catalog", self.update_models()).await;
        }

        if let Some(address) = &self.config.participant_address {
            isolate("participant stats", self.update_participant_stats(address)).await;
        }

        if self.config.node_fetch {
            isolate("ml nodes", self.update_nodes()).await;
        }

        debug!(
            "Refresh cycle completed in {}ms",
            cycle_start.elapsed().as_millis()
        );
    }

    fn set(&self, name: &str, labels: &[&str], value: Option<f64>) -> Result<(), MetricsError> {
        match value {
            Some(value) => self.store.set(name, labels, value),
            None => {
                debug!("Skipping {name}{labels:?}: no usable value");
                Ok(())
            }
        }
    }

    async fn update_chain_status(&self) -> Result<(), UpdateError> {
        if !self.config.network_metrics {
            let status = self
                .client
                .chain_status(&self.config.node_rpc_url, DEFAULT_TIMEOUT)
                .await?;
            self.write_local_status(&status)?;
            self.write_earliest(&status)?;
            return Ok(());
        }

        let outcome = self.sampler.sample().await;
        match outcome.max_height() {
            Some(best) => {
                debug!("Max block height {} reported by {}", best.height, best.endpoint);
                self.store.set(MAX_BLOCK_HEIGHT, &[], best.height as f64)?;
                self.set(MAX_BLOCK_TIME, &[], best.time.as_ref().map(unix_seconds))?;
            }
            None => warn!("No chain node reported a block height, keeping previous max height"),
        }

        // The sampler queried the local node first; its answer is this cycle's local status.
        if let Some(local) = outcome.local() {
            self.set(BLOCK_HEIGHT, &[], local.latest_block_height.map(|h| h as f64))?;
            self.set(CATCHING_UP, &[], local.catching_up.map(bool_value))?;
        }
        if let Some(external) = outcome.first_reachable_external() {
            self.write_earliest(external)?;
        }
        Ok(())
    }

    fn write_local_status(&self, status: &ChainStatus) -> Result<(), MetricsError> {
        self.set(BLOCK_HEIGHT, &[], status.latest_block_height.map(|h| h as f64))?;
        self.set(
            BLOCK_TIME,
            &[],
            status.latest_block_time.as_ref().map(unix_seconds),
        )?;
        self.set(CATCHING_UP, &[], status.catching_up.map(bool_value))
    }

    fn write_earliest(&self, status: &ChainStatus) -> Result<(), MetricsError> {
        self.set(
            EARLIEST_BLOCK_HEIGHT,
            &[],
            status.earliest_block_height.map(|h| h as f64),
        )?;
        self.set(
            EARLIEST_BLOCK_TIME,
            &[],
            status.earliest_block_time.as_ref().map(unix_seconds),
        )
    }

    async fn update_participants(&self) -> Result<(), UpdateError> {
        let participants = self
            .client
            .participants(&self.config.network_api_url)
            .await?;
        for participant in &participants {
            let address = participant.address.as_str();
            self.set(PARTICIPANT_WEIGHT, &[address], participant.weight)?;
            for (node_id, weight) in &participant.nodes {
                self.set(PARTICIPANT_NODE_WEIGHT, &[address, node_id.as_str()], *weight)?;
            }
        }
        debug!("Updated {} network participants", participants.len());
        Ok(())
    }

    async fn update_pricing(&self) -> Result<(), UpdateError> {
        let pricing = self.client.pricing(&self.config.network_api_url).await?;
        self.set(UNIT_OF_COMPUTE_PRICE, &[], pricing.unit_of_compute_price)?;
        self.set(
            DYNAMIC_PRICING_ENABLED,
            &[],
            pricing.dynamic_pricing_enabled.map(bool_value),
        )?;
        for model in &pricing.models {
            let Some(model_id) = model.model_id.as_deref() else {
                warn!("Skipping model price without model_id");
                continue;
            };
            self.set(MODEL_PRICE_PER_TOKEN, &[model_id], model.price_per_token)?;
            self.set(
                MODEL_UNITS_PER_TOKEN,
                &[model_id],
                model.units_of_compute_per_token,
            )?;
        }
        Ok(())
    }

    async fn update_models(&self) -> Result<(), UpdateError> {
        let models = self.client.models(&self.config.network_api_url).await?;
        for model in &models {
            let Some(model_id) = model.id.as_deref() else {
                warn!("Skipping model without id");
                continue;
            };
            self.set(MODEL_VRAM, &[model_id], model.v_ram)?;
            self.set(
                MODEL_THROUGHPUT_PER_NONCE,
                &[model_id],
                model.throughput_per_nonce,
            )?;
            self.set(
                MODEL_VALIDATION_THRESHOLD,
                &[model_id],
                model.validation_threshold(),
            )?;
        }
        Ok(())
    }

    async fn update_participant_stats(&self, address: &str) -> Result<(), UpdateError> {
        let stats = self
            .client
            .participant_stats(&self.config.network_api_url, address)
            .await?;
        let epoch = &stats.current_epoch_stats;
        let labels = [address];
        self.set(EPOCHS_COMPLETED, &labels, stats.epochs_completed)?;
        self.set(COIN_BALANCE, &labels, stats.coin_balance)?;
        self.set(EPOCH_INFERENCE_COUNT, &labels, epoch.inference_count)?;
        self.set(EPOCH_MISSED_REQUESTS, &labels, epoch.missed_requests)?;
        self.set(EPOCH_EARNED_COINS, &labels, epoch.earned_coins)?;
        self.set(EPOCH_VALIDATED_INFERENCES, &labels, epoch.validated_inferences)?;
        self.set(
            EPOCH_INVALIDATED_INFERENCES,
            &labels,
            epoch.invalidated_inferences,
        )?;
        Ok(())
    }

    async fn update_nodes(&self) -> Result<(), UpdateError> {
        let nodes = self.client.nodes(&self.config.admin_api_url).await?;
        for node in &nodes {
            let labels = [node.id.as_str(), node.host.as_str()];
            debug!(
                "Node {} on {} is {} (intended {}), PoC {} (intended {})",
                node.id,
                node.host,
                node.current_status,
                node.intended_status,
                node.poc_current_status,
                node.poc_intended_status
            );
            self.store
                .set(NODE_STATUS, &labels, node.current_status.metric_value())?;
            self.store.set(
                NODE_INTENDED_STATUS,
                &labels,
                node.intended_status.metric_value(),
            )?;
            self.store.set(
                NODE_POC_STATUS,
                &labels,
                node.poc_current_status.metric_value(),
            )?;
            self.store.set(
                NODE_POC_INTENDED_STATUS,
                &labels,
                node.poc_intended_status.metric_value(),
            )?;
            for (model, weight) in &node.poc_weights {
                self.set(
                    NODE_POC_WEIGHT,
                    &[node.id.as_str(), node.host.as_str(), model.as_str()],
                    *weight,
                )?;
            }

            if let Some(port) = node.port {
                // Unreachable GPU endpoints still publish zeros for the node.
                let gpu = self
                    .client
                    .gpu_stats(&node.host, port)
                    .await
                    .unwrap_or_default();
                self.store
                    .set(NODE_GPU_COUNT, &labels, gpu.device_count as f64)?;
                self.store
                    .set(NODE_GPU_UTILIZATION, &labels, gpu.avg_utilization)?;
            }
        }
        debug!("Updated {} ml nodes", nodes.len());
        Ok(())
    }
}

async fn isolate(step: &str, update: impl Future<Output = Result<(), UpdateError>>) {
    if let Err(e) = update.await {
        error!("Failed to update {step}: {e}");
    }
}

fn bool_value(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use std::time::Duration;

    struct PoolOrder;

    impl NodeSelector for PoolOrder {
        fn select(&self, pool: &[String], count: usize) -> Vec<String> {
            pool.iter().take(count).cloned().collect()
        }
    }

    const LOCAL_STATUS: &str = r#"{"result": {"sync_info": {
        "latest_block_height": "1000",
        "latest_block_time": "2024-05-01T12:00:00Z",
        "earliest_block_height": "1",
        "earliest_block_time": "2024-01-01T00:00:00Z",
        "catching_up": false}}}"#;

    fn nodes_body(port: Option<u16>) -> String {
        let port = port.map_or("null".to_string(), |p| p.to_string());
        format!(
            r#"[{{
                "node": {{"id": "n1", "host": "127.0.0.1", "poc_port": {port}, "models": {{"m1": {{}}}}}},
                "state": {{"current_status": "INFERENCE", "intended_status": "INFERENCE",
                           "poc_current_status": "IDLE", "poc_intended_status": "GENERATING",
                           "epoch_ml_nodes": {{"m1": {{"poc_weight": 5}}}}}}
            }}]"#
        )
    }

    fn config(server: &ServerGuard) -> Config {
        Config {
            node_rpc_url: format!("{}/local", server.url()),
            admin_api_url: server.url(),
            network_api_url: server.url(),
            external_nodes: Vec::new(),
            network_metrics: false,
            node_fetch: true,
            participant_address: None,
            port: 9401,
            refresh_interval: Duration::from_secs(30),
            sample_seed: None,
        }
    }

    fn collector(config: Config) -> (Collector, Arc<MetricStore>) {
        let store = Arc::new(MetricStore::new().unwrap());
        let collector = Collector::new(
            Arc::new(config),
            SourceClient::new().unwrap(),
            Arc::new(PoolOrder),
            store.clone(),
        );
        (collector, store)
    }

    async fn json_mock(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn network_mocks(server: &mut ServerGuard) -> Vec<Mock> {
        vec![
            json_mock(
                server,
                "/v1/epochs/current/participants",
                r#"{"active_participants": {"participants": [
                    {"index": "gonka1abc", "weight": 120,
                     "ml_nodes": [{"ml_nodes": [{"node_id": "n1", "poc_weight": 70}]}]}]}}"#,
            )
            .await,
            json_mock(
                server,
                "/v1/pricing",
                r#"{"unit_of_compute_price": "100", "dynamic_pricing_enabled": true,
                    "models": [{"model_id": "m1", "price_per_token": 2500, "units_of_compute_per_token": 25}]}"#,
            )
            .await,
            json_mock(
                server,
                "/v1/models",
                r#"{"models": [{"id": "m1", "v_ram": 24, "throughput_per_nonce": 1000,
                    "validation_threshold": {"value": 3, "exponent": 2}}]}"#,
            )
            .await,
        ]
    }

    #[tokio::test]
    async fn local_mode_end_to_end() {
        let mut server = Server::new_async().await;
        let _status = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes_body(None)).await;

        let (collector, store) = collector(config(&server));
        collector.run_cycle().await;

        assert_eq!(store.value(BLOCK_HEIGHT, &[]), Some(1000.0));
        assert_eq!(store.value(BLOCK_TIME, &[]), Some(1_714_564_800.0));
        assert_eq!(store.value(EARLIEST_BLOCK_HEIGHT, &[]), Some(1.0));
        assert_eq!(store.value(CATCHING_UP, &[]), Some(0.0));
        assert_eq!(store.value(NODE_STATUS, &["n1", "127.0.0.1"]), Some(1.0));
        assert_eq!(
            store.value(NODE_POC_INTENDED_STATUS, &["n1", "127.0.0.1"]),
            Some(1.0)
        );
        assert_eq!(
            store.value(NODE_POC_WEIGHT, &["n1", "127.0.0.1", "m1"]),
            Some(5.0)
        );
        assert_eq!(store.value(MAX_BLOCK_HEIGHT, &[]), None);
        // no port, no GPU samples
        assert_eq!(store.value(NODE_GPU_COUNT, &["n1", "127.0.0.1"]), None);

        let text = store.export_metrics().unwrap();
        let status_line = text
            .lines()
            .find(|line| line.starts_with("gonka_node_status{"))
            .unwrap();
        assert!(status_line.contains(r#"node_id="n1""#));
        assert!(status_line.ends_with(" 1"));
        let weight_line = text
            .lines()
            .find(|line| line.starts_with("gonka_node_poc_weight{"))
            .unwrap();
        assert!(weight_line.contains(r#"model="m1""#));
        assert!(weight_line.ends_with(" 5"));
    }

    #[tokio::test]
    async fn network_groups_stay_absent_when_disabled() {
        let mut server = Server::new_async().await;
        let _status = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes_body(None)).await;
        let network = network_mocks(&mut server).await;

        let (collector, store) = collector(config(&server));
        collector.run_cycle().await;

        for mock in &network {
            assert!(!mock.matched_async().await);
        }
        let text = store.export_metrics().unwrap();
        for name in [
            PARTICIPANT_WEIGHT,
            PARTICIPANT_NODE_WEIGHT,
            UNIT_OF_COMPUTE_PRICE,
            DYNAMIC_PRICING_ENABLED,
            MODEL_PRICE_PER_TOKEN,
            MODEL_VRAM,
            MODEL_VALIDATION_THRESHOLD,
            MAX_BLOCK_HEIGHT,
        ] {
            assert!(!text.contains(name), "{name} should not be exported");
        }
    }

    #[tokio::test]
    async fn network_mode_writes_network_groups() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _local = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let _peer = json_mock(
            &mut server,
            "/peer/status",
            r#"{"result": {"sync_info": {"latest_block_height": "1010",
                "latest_block_time": "2024-05-01T12:01:00Z",
                "earliest_block_height": "500", "earliest_block_time": "2024-03-01T00:00:00Z",
                "catching_up": false}}}"#,
        )
        .await;
        let _network = network_mocks(&mut server).await;

        let mut config = config(&server);
        config.network_metrics = true;
        config.node_fetch = false;
        config.external_nodes = vec![format!("{base}/peer")];
        let (collector, store) = collector(config);
        collector.run_cycle().await;

        assert_eq!(store.value(MAX_BLOCK_HEIGHT, &[]), Some(1010.0));
        assert_eq!(store.value(MAX_BLOCK_TIME, &[]), Some(1_714_564_860.0));
        assert_eq!(store.value(BLOCK_HEIGHT, &[]), Some(1000.0));
        assert_eq!(store.value(CATCHING_UP, &[]), Some(0.0));
        assert_eq!(store.value(EARLIEST_BLOCK_HEIGHT, &[]), Some(500.0));
        assert_eq!(store.value(PARTICIPANT_WEIGHT, &["gonka1abc"]), Some(120.0));
        assert_eq!(
            store.value(PARTICIPANT_NODE_WEIGHT, &["gonka1abc", "n1"]),
            Some(70.0)
        );
        assert_eq!(store.value(UNIT_OF_COMPUTE_PRICE, &[]), Some(100.0));
        assert_eq!(store.value(DYNAMIC_PRICING_ENABLED, &[]), Some(1.0));
        assert_eq!(store.value(MODEL_PRICE_PER_TOKEN, &["m1"]), Some(2500.0));
        assert_eq!(store.value(MODEL_UNITS_PER_TOKEN, &["m1"]), Some(25.0));
        assert_eq!(store.value(MODEL_VRAM, &["m1"]), Some(24.0));
        assert_eq!(store.value(MODEL_VALIDATION_THRESHOLD, &["m1"]), Some(300.0));
        assert_eq!(store.value(NODE_STATUS, &["n1", "127.0.0.1"]), None);
    }

    #[tokio::test]
    async fn failed_sampling_keeps_previous_max_height() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let local = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;

        let mut config = config(&server);
        config.network_metrics = true;
        config.node_fetch = false;
        config.external_nodes = vec![format!("{base}/peer")];
        let (collector, store) = collector(config);
        collector.run_cycle().await;
        assert_eq!(store.value(MAX_BLOCK_HEIGHT, &[]), Some(1000.0));

        local.remove_async().await;
        let _down = server
            .mock("GET", Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        collector.run_cycle().await;
        assert_eq!(store.value(MAX_BLOCK_HEIGHT, &[]), Some(1000.0));
        assert_eq!(store.value(BLOCK_HEIGHT, &[]), Some(1000.0));
    }

    #[tokio::test]
    async fn one_failing_step_does_not_block_the_rest() {
        let mut server = Server::new_async().await;
        let _status = server
            .mock("GET", "/local/status")
            .with_status(503)
            .create_async()
            .await;
        let _pricing = server
            .mock("GET", "/v1/pricing")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;
        let _models = json_mock(
            &mut server,
            "/v1/models",
            r#"{"models": [{"id": "m1", "v_ram": "lots", "throughput_per_nonce": 1000}]}"#,
        )
        .await;
        let _stats = json_mock(
            &mut server,
            "/v1/participants/gonka1self",
            r#"{"participant": {"epochs_completed": 3, "coin_balance": "12.5",
                "current_epoch_stats": {"inference_count": 40, "missed_requests": "x",
                "earned_coins": 900, "validated_inferences": 38, "invalidated_inferences": 0}}}"#,
        )
        .await;
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes_body(None)).await;

        let mut config = config(&server);
        config.network_metrics = true;
        config.participant_address = Some("gonka1self".to_string());
        let (collector, store) = collector(config);
        collector.run_cycle().await;

        assert_eq!(store.value(MAX_BLOCK_HEIGHT, &[]), None);
        assert_eq!(store.value(UNIT_OF_COMPUTE_PRICE, &[]), None);
        // bad field skipped, siblings kept
        assert_eq!(store.value(MODEL_VRAM, &["m1"]), None);
        assert_eq!(store.value(MODEL_THROUGHPUT_PER_NONCE, &["m1"]), Some(1000.0));
        assert_eq!(store.value(EPOCHS_COMPLETED, &["gonka1self"]), Some(3.0));
        assert_eq!(store.value(COIN_BALANCE, &["gonka1self"]), Some(12.5));
        assert_eq!(store.value(EPOCH_MISSED_REQUESTS, &["gonka1self"]), None);
        assert_eq!(store.value(EPOCH_EARNED_COINS, &["gonka1self"]), Some(900.0));
        assert_eq!(
            store.value(EPOCH_INVALIDATED_INFERENCES, &["gonka1self"]),
            Some(0.0)
        );
        assert_eq!(store.value(NODE_STATUS, &["n1", "127.0.0.1"]), Some(1.0));
    }

    #[tokio::test]
    async fn null_collections_and_extreme_exponents_keep_every_group() {
        let mut server = Server::new_async().await;
        let _status = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let _participants = json_mock(
            &mut server,
            "/v1/epochs/current/participants",
            r#"{"active_participants": {"participants": [
                {"index": "gonka1a", "weight": 10, "ml_nodes": null},
                {"index": "gonka1b", "weight": 20, "ml_nodes": [{"ml_nodes": [{"node_id": "n9", "poc_weight": 4}]}]}]}}"#,
        )
        .await;
        let _pricing = json_mock(
            &mut server,
            "/v1/pricing",
            r#"{"unit_of_compute_price": 100, "dynamic_pricing_enabled": false, "models": null}"#,
        )
        .await;
        let _models = json_mock(
            &mut server,
            "/v1/models",
            r#"{"models": [
                {"id": "m1", "v_ram": 24, "validation_threshold": {"value": 3, "exponent": -2147483648}},
                {"id": "m2", "v_ram": 48, "validation_threshold": {"value": 3, "exponent": 9223372036854775807}}]}"#,
        )
        .await;
        let _nodes = json_mock(
            &mut server,
            "/admin/v1/nodes",
            r#"[
                {"node": {"id": "n1", "host": "h1"}, "state": {"current_status": "POC", "epoch_ml_nodes": {"m1": {"poc_weight": 5}}}},
                {"node": {"id": "n2", "host": "h2"}, "state": {"current_status": "INFERENCE", "epoch_ml_nodes": null}}
            ]"#,
        )
        .await;

        let mut config = config(&server);
        config.network_metrics = true;
        let (collector, store) = collector(config);
        collector.run_cycle().await;

        assert_eq!(store.value(PARTICIPANT_WEIGHT, &["gonka1a"]), Some(10.0));
        assert_eq!(store.value(PARTICIPANT_WEIGHT, &["gonka1b"]), Some(20.0));
        assert_eq!(
            store.value(PARTICIPANT_NODE_WEIGHT, &["gonka1b", "n9"]),
            Some(4.0)
        );
        assert_eq!(store.value(UNIT_OF_COMPUTE_PRICE, &[]), Some(100.0));
        assert_eq!(store.value(MODEL_VRAM, &["m1"]), Some(24.0));
        assert_eq!(store.value(MODEL_VALIDATION_THRESHOLD, &["m1"]), Some(0.0));
        assert_eq!(store.value(MODEL_VRAM, &["m2"]), Some(48.0));
        assert_eq!(store.value(MODEL_VALIDATION_THRESHOLD, &["m2"]), None);
        assert_eq!(store.value(NODE_STATUS, &["n1", "h1"]), Some(2.0));
        assert_eq!(store.value(NODE_POC_WEIGHT, &["n1", "h1", "m1"]), Some(5.0));
        assert_eq!(store.value(NODE_STATUS, &["n2", "h2"]), Some(1.0));
    }

    #[tokio::test]
    async fn gpu_failure_publishes_zeros() {
        let mut server = Server::new_async().await;
        let _status = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let nodes = nodes_body(Some(server.socket_address().port()));
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes).await;
        let _gpu = server
            .mock("GET", "/api/v1/gpu/devices")
            .with_status(500)
            .create_async()
            .await;

        let (collector, store) = collector(config(&server));
        collector.run_cycle().await;

        assert_eq!(store.value(NODE_GPU_COUNT, &["n1", "127.0.0.1"]), Some(0.0));
        assert_eq!(
            store.value(NODE_GPU_UTILIZATION, &["n1", "127.0.0.1"]),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn gpu_stats_are_published_for_nodes_with_a_port() {
        let mut server = Server::new_async().await;
        let _status = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let nodes = nodes_body(Some(server.socket_address().port()));
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes).await;
        let _gpu = json_mock(
            &mut server,
            "/api/v1/gpu/devices",
            r#"{"devices": [{"utilization_percent": 30}, {"utilization_percent": 50}]}"#,
        )
        .await;

        let (collector, store) = collector(config(&server));
        collector.run_cycle().await;

        assert_eq!(store.value(NODE_GPU_COUNT, &["n1", "127.0.0.1"]), Some(2.0));
        assert_eq!(
            store.value(NODE_GPU_UTILIZATION, &["n1", "127.0.0.1"]),
            Some(40.0)
        );
    }

    #[tokio::test]
    async fn identical_upstreams_give_identical_exposition() {
        let mut server = Server::new_async().await;
        let base = server.url();
        let _local = json_mock(&mut server, "/local/status", LOCAL_STATUS).await;
        let _peer = json_mock(&mut server, "/peer/status", LOCAL_STATUS).await;
        let _nodes = json_mock(&mut server, "/admin/v1/nodes", &nodes_body(None)).await;
        let _network = network_mocks(&mut server).await;

        let mut config = config(&server);
        config.network_metrics = true;
        config.external_nodes = vec![format!("{base}/peer")];
        let (collector, store) = collector(config);

        collector.run_cycle().await;
        let first = store.export_metrics().unwrap();
        collector.run_cycle().await;
        let second = store.export_metrics().unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let mut server = Server::new_async().await;
        let status = server
            .mock("GET", "/local/status")
            .with_status(200)
            .with_body(LOCAL_STATUS)
            .expect(1)
            .create_async()
            .await;

        let mut config = config(&server);
        config.node_fetch = false;
        let (collector, store) = collector(config);
        let token = CancellationToken::new();
        token.cancel();
        collector.run(token).await;

        status.assert_async().await;
        assert_eq!(store.value(BLOCK_HEIGHT, &[]), Some(1000.0));
    }
}
