pub mod chain;
pub mod coerce;
pub mod network;
pub mod node;
