//! Every gauge the exporter can publish, with its fixed label schema.

pub struct MetricDef {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

const NODE_LABELS: &[&str] = &["node_id", "host"];
const MODEL_LABELS: &[&str] = &["model"];
const PARTICIPANT_LABELS: &[&str] = &["participant"];

// === CHAIN ===
pub const BLOCK_HEIGHT: &str = "gonka_block_height";
pub const BLOCK_TIME: &str = "gonka_block_time_seconds";
pub const EARLIEST_BLOCK_HEIGHT: &str = "gonka_earliest_block_height";
pub const EARLIEST_BLOCK_TIME: &str = "gonka_earliest_block_time_seconds";
pub const CATCHING_UP: &str = "gonka_catching_up";
pub const MAX_BLOCK_HEIGHT: &str = "gonka_max_block_height";
pub const MAX_BLOCK_TIME: &str = "gonka_max_block_time_seconds";

// === NETWORK ===
pub const PARTICIPANT_WEIGHT: &str = "gonka_participant_weight";
pub const PARTICIPANT_NODE_WEIGHT: &str = "gonka_participant_node_weight";
pub const UNIT_OF_COMPUTE_PRICE: &str = "gonka_unit_of_compute_price";
pub const DYNAMIC_PRICING_ENABLED: &str = "gonka_dynamic_pricing_enabled";
pub const MODEL_PRICE_PER_TOKEN: &str = "gonka_model_price_per_token";
pub const MODEL_UNITS_PER_TOKEN: &str = "gonka_model_units_of_compute_per_token";
pub const MODEL_VRAM: &str = "gonka_model_vram";
pub const MODEL_THROUGHPUT_PER_NONCE: &str = "gonka_model_throughput_per_nonce";
pub const MODEL_VALIDATION_THRESHOLD: &str = "gonka_model_validation_threshold";

// === SELF PARTICIPANT ===
pub const EPOCHS_COMPLETED: &str = "gonka_participant_epochs_completed";
pub const COIN_BALANCE: &str = "gonka_participant_coin_balance";
pub const EPOCH_INFERENCE_COUNT: &str = "gonka_epoch_inference_count";
pub const EPOCH_MISSED_REQUESTS: &str = "gonka_epoch_missed_requests";
pub const EPOCH_EARNED_COINS: &str = "gonka_epoch_earned_coins";
pub const EPOCH_VALIDATED_INFERENCES: &str = "gonka_epoch_validated_inferences";
pub const EPOCH_INVALIDATED_INFERENCES: &str = "gonka_epoch_invalidated_inferences";

// === ML NODES ===
pub const NODE_STATUS: &str = "gonka_node_status";
pub const NODE_INTENDED_STATUS: &str = "gonka_node_intended_status";
pub const NODE_POC_STATUS: &str = "gonka_node_poc_status";
pub const NODE_POC_INTENDED_STATUS: &str = "gonka_node_poc_intended_status";
pub const NODE_POC_WEIGHT: &str = "gonka_node_poc_weight";
pub const NODE_GPU_COUNT: &str = "gonka_node_gpu_count";
pub const NODE_GPU_UTILIZATION: &str = "gonka_node_gpu_utilization";

pub const CATALOG: &[MetricDef] = &[
    MetricDef {
        name: BLOCK_HEIGHT,
        help: "Latest block height of the local node",
        labels: &[],
    },
    MetricDef {
        name: BLOCK_TIME,
        help: "Timestamp of the latest block of the local node",
        labels: &[],
    },
    MetricDef {
        name: EARLIEST_BLOCK_HEIGHT,
        help: "Earliest block height still available",
        labels: &[],
    },
    MetricDef {
        name: EARLIEST_BLOCK_TIME,
        help: "Timestamp of the earliest block still available",
        labels: &[],
    },
    MetricDef {
        name: CATCHING_UP,
        help: "Whether the local node is catching up (1) or in sync (0)",
        labels: &[],
    },
    MetricDef {
        name: MAX_BLOCK_HEIGHT,
        help: "Highest block height observed across sampled chain nodes",
        labels: &[],
    },
    MetricDef {
        name: MAX_BLOCK_TIME,
        help: "Timestamp reported together with the highest observed block",
        labels: &[],
    },
    MetricDef {
        name: PARTICIPANT_WEIGHT,
        help: "Weight of a participant in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: PARTICIPANT_NODE_WEIGHT,
        help: "PoC weight of a participant's ML node in the current epoch",
        labels: &["participant", "node_id"],
    },
    MetricDef {
        name: UNIT_OF_COMPUTE_PRICE,
        help: "Current price of one unit of compute",
        labels: &[],
    },
    MetricDef {
        name: DYNAMIC_PRICING_ENABLED,
        help: "Whether dynamic pricing is enabled (1) or not (0)",
        labels: &[],
    },
    MetricDef {
        name: MODEL_PRICE_PER_TOKEN,
        help: "Price per token of a model",
        labels: MODEL_LABELS,
    },
    MetricDef {
        name: MODEL_UNITS_PER_TOKEN,
        help: "Units of compute charged per token of a model",
        labels: MODEL_LABELS,
    },
    MetricDef {
        name: MODEL_VRAM,
        help: "VRAM required by a model",
        labels: MODEL_LABELS,
    },
    MetricDef {
        name: MODEL_THROUGHPUT_PER_NONCE,
        help: "Throughput per nonce of a model",
        labels: MODEL_LABELS,
    },
    MetricDef {
        name: MODEL_VALIDATION_THRESHOLD,
        help: "Validation threshold of a model",
        labels: MODEL_LABELS,
    },
    MetricDef {
        name: EPOCHS_COMPLETED,
        help: "Epochs completed by the participant",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: COIN_BALANCE,
        help: "Coin balance of the participant",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: EPOCH_INFERENCE_COUNT,
        help: "Inferences served by the participant in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: EPOCH_MISSED_REQUESTS,
        help: "Requests missed by the participant in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: EPOCH_EARNED_COINS,
        help: "Coins earned by the participant in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: EPOCH_VALIDATED_INFERENCES,
        help: "Inferences of the participant validated in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: EPOCH_INVALIDATED_INFERENCES,
        help: "Inferences of the participant invalidated in the current epoch",
        labels: PARTICIPANT_LABELS,
    },
    MetricDef {
        name: NODE_STATUS,
        help: "Current node status (0=UNKNOWN, 1=INFERENCE, 2=POC, 3=TRAINING, 4=STOPPED, 5=FAILED)",
        labels: NODE_LABELS,
    },
    MetricDef {
        name: NODE_INTENDED_STATUS,
        help: "Intended node status (0=UNKNOWN, 1=INFERENCE, 2=POC, 3=TRAINING, 4=STOPPED, 5=FAILED)",
        labels: NODE_LABELS,
    },
    MetricDef {
        name: NODE_POC_STATUS,
        help: "Current PoC status (0=IDLE, 1=GENERATING, 2=VALIDATING)",
        labels: NODE_LABELS,
    },
    MetricDef {
        name: NODE_POC_INTENDED_STATUS,
        help: "Intended PoC status (0=IDLE, 1=GENERATING, 2=VALIDATING)",
        labels: NODE_LABELS,
    },
    MetricDef {
        name: NODE_POC_WEIGHT,
        help: "Node PoC weight per model",
        labels: &["node_id", "host", "model"],
    },
    MetricDef {
        name: NODE_GPU_COUNT,
        help: "Number of GPU devices reported by the node",
        labels: NODE_LABELS,
    },
    MetricDef {
        name: NODE_GPU_UTILIZATION,
        help: "Average GPU utilization of the node in percent",
        labels: NODE_LABELS,
    },
];
