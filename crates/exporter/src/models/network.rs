use serde::Deserialize;

use super::coerce::{
    lenient_bool, lenient_default, lenient_f64, lenient_i64, lenient_seq, lenient_string,
};

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantsResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    pub active_participants: ActiveParticipants,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActiveParticipants {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub participants: Vec<ParticipantEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub index: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub ml_nodes: Vec<MlNodeGroup>,
}

/// The network API nests node weights one level deep, grouped per model slot.
#[derive(Debug, Default, Deserialize)]
pub struct MlNodeGroup {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub ml_nodes: Vec<MlNodeWeight>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MlNodeWeight {
    #[serde(default, deserialize_with = "lenient_string")]
    pub node_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub poc_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub address: String,
    pub weight: Option<f64>,
    pub nodes: Vec<(String, Option<f64>)>,
}

impl ParticipantsResponse {
    /// Flattens the response; participants without an address cannot be labeled and are dropped.
    pub fn into_records(self) -> Vec<ParticipantRecord> {
        self.active_participants
            .participants
            .into_iter()
            .filter_map(|entry| {
                let address = entry.index?;
                let nodes = entry
                    .ml_nodes
                    .into_iter()
                    .flat_map(|group| group.ml_nodes)
                    .filter_map(|node| Some((node.node_id?, node.poc_weight)))
                    .collect();
                Some(ParticipantRecord {
                    address,
                    weight: entry.weight,
                    nodes,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PricingInfo {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_of_compute_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub dynamic_pricing_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub models: Vec<ModelPrice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelPrice {
    #[serde(default, deserialize_with = "lenient_string")]
    pub model_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_per_token: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub units_of_compute_per_token: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelsResponse {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub v_ram: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub throughput_per_nonce: Option<f64>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub validation_threshold: Option<Decimal>,
}

impl ModelInfo {
    pub fn validation_threshold(&self) -> Option<f64> {
        self.validation_threshold.as_ref().and_then(Decimal::to_f64)
    }
}

/// A `value × 10^exponent` pair as the chain encodes fixed-point parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Decimal {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub exponent: Option<i64>,
}

impl Decimal {
    pub fn to_f64(&self) -> Option<f64> {
        let value = self.value?;
        // Beyond ±400 the power of ten is already 0 or inf in f64, so clamping keeps the result.
        let exponent = i32::try_from(self.exponent.unwrap_or(0).clamp(-400, 400)).ok()?;
        // Dividing by an exact power of ten keeps e.g. 85e-2 at 0.85 instead of 0.8500000000000001.
        let scaled = if exponent >= 0 {
            value * 10f64.powi(exponent)
        } else {
            value / 10f64.powi(-exponent)
        };
        scaled.is_finite().then_some(scaled)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantStatsResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    pub participant: ParticipantStats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParticipantStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub epochs_completed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub coin_balance: Option<f64>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub current_epoch_stats: EpochStats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EpochStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub inference_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub missed_requests: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub earned_coins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub validated_inferences: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub invalidated_inferences: Option<f64>,
}
