//! Knobs of the external node that the verification scenario depends on.
//!
//! They are owned by whoever launches the external node; the verifier only reads them.

use std::time::Duration;

use serde::Deserialize;

use crate::envy_try_load;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExternalNodeRecoveryConfig {
    #[serde(default)]
    pub snapshots_recovery_enabled: bool,
    /// Number of tree chunks persisted in parallel during recovery.
    pub experimental_snapshots_recovery_tree_parallel_persistence_buffer: Option<usize>,
}

impl ExternalNodeRecoveryConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy_try_load("EN_")
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExternalNodePruningConfig {
    #[serde(default)]
    pub pruning_enabled: bool,
    /// Number of L1 batches pruned in a single iteration.
    pub pruning_chunk_size: Option<u32>,
    pub pruning_data_retention_sec: Option<u64>,
    pub pruning_removal_delay_sec: Option<u64>,
}

impl ExternalNodePruningConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy_try_load("EN_")
    }

    /// Settings that make the node prune every executed batch almost immediately.
    pub fn aggressive() -> Self {
        Self {
            pruning_enabled: true,
            pruning_chunk_size: Some(1),
            pruning_data_retention_sec: Some(0),
            pruning_removal_delay_sec: Some(1),
        }
    }

    pub fn data_retention(&self) -> Option<Duration> {
        self.pruning_data_retention_sec.map(Duration::from_secs)
    }

    pub fn removal_delay(&self) -> Option<Duration> {
        self.pruning_removal_delay_sec.map(Duration::from_secs)
    }
}
