pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod metrics;
pub mod models;
pub mod sampler;
pub mod sources;
pub mod utils;

pub use cli::Cli;
pub use collector::Collector;
pub use config::Config;
pub use metrics::{MetricSample, MetricStore};
pub use sampler::{NodeSampler, NodeSelector, RandomSelector, SeededSelector};
pub use sources::{SourceClient, SourceError};
