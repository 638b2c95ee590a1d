use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::models::chain::ChainStatus;
use crate::sources::{SourceClient, DEFAULT_TIMEOUT, EXTERNAL_NODE_TIMEOUT};

/// Upper bound on external chain nodes queried per cycle.
pub const MAX_SAMPLED_NODES: usize = 5;

/// Chooses which external endpoints are queried in a cycle.
pub trait NodeSelector: Send + Sync {
    /// Up to `count` distinct entries of `pool`, in query order.
    fn select(&self, pool: &[String], count: usize) -> Vec<String>;
}

pub struct RandomSelector;

impl NodeSelector for RandomSelector {
    fn select(&self, pool: &[String], count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        pool.choose_multiple(&mut rng, count).cloned().collect()
    }
}

/// Reproducible selection for a given seed.
pub struct SeededSelector {
    rng: Mutex<StdRng>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NodeSelector for SeededSelector {
    fn select(&self, pool: &[String], count: usize) -> Vec<String> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.choose_multiple(&mut *rng, count).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub endpoint: String,
    pub status: Option<ChainStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeightSample {
    pub endpoint: String,
    pub height: i64,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// Local node first, then sampled external nodes, in query order.
    pub observations: Vec<Observation>,
}

impl SampleOutcome {
    /// `None` when no queried node reported a usable height.
    pub fn max_height(&self) -> Option<HeightSample> {
        max_height(&self.observations)
    }

    pub fn local(&self) -> Option<&ChainStatus> {
        self.observations.first()?.status.as_ref()
    }

    /// First external node that answered, in query order.
    pub fn first_reachable_external(&self) -> Option<&ChainStatus> {
        self.observations
            .iter()
            .skip(1)
            .find_map(|observation| observation.status.as_ref())
    }
}

/// Highest reported height with the block time that came with it. Ties keep the earlier observation.
pub fn max_height(observations: &[Observation]) -> Option<HeightSample> {
    let mut best: Option<HeightSample> = None;
    for observation in observations {
        let Some(status) = &observation.status else {
            continue;
        };
        let Some(height) = status.latest_block_height else {
            debug!("{} reported no usable block height", observation.endpoint);
            continue;
        };
        match &best {
            Some(current) if height <= current.height => {}
            _ => {
                best = Some(HeightSample {
                    endpoint: observation.endpoint.clone(),
                    height,
                    time: status.latest_block_time,
                })
            }
        }
    }
    best
}

/// Estimates the network head by polling the local node plus a random slice of known peers.
pub struct NodeSampler {
    client: SourceClient,
    local_url: String,
    pool: Vec<String>,
    selector: Arc<dyn NodeSelector>,
}

impl NodeSampler {
    pub fn new(
        client: SourceClient,
        local_url: String,
        pool: Vec<String>,
        selector: Arc<dyn NodeSelector>,
    ) -> Self {
        Self {
            client,
            local_url,
            pool,
            selector,
        }
    }

    /// Local endpoint followed by at most `min(MAX_SAMPLED_NODES, pool size)` distinct pool members.
    ///
    /// Whatever the selector returns is filtered against the pool, so a misbehaving
    /// selector cannot widen or duplicate the query set.
    pub fn targets(&self) -> Vec<String> {
        let count = MAX_SAMPLED_NODES.min(self.pool.len());
        let mut targets = Vec::with_capacity(count + 1);
        targets.push(self.local_url.clone());
        for endpoint in self.selector.select(&self.pool, count) {
            if targets.len() > count {
                break;
            }
            if self.pool.contains(&endpoint) && !targets.contains(&endpoint) {
                targets.push(endpoint);
            }
        }
        targets
    }

    pub async fn sample(&self) -> SampleOutcome {
        let targets = self.targets();
        let mut observations = Vec::with_capacity(targets.len());
        for (i, endpoint) in targets.into_iter().enumerate() {
            let timeout = if i == 0 {
                DEFAULT_TIMEOUT
            } else {
                EXTERNAL_NODE_TIMEOUT
            };
            let status = self.client.chain_status(&endpoint, timeout).await.ok();
            observations.push(Observation { endpoint, status });
        }
        SampleOutcome { observations }
    }
}
