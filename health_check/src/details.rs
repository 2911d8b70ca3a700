//! Details reported by individual components.
//!
//! Every field is optional: components fill in details gradually as they progress.

use ola_basic_types::{L1BatchNumber, MiniblockNumber};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotRecoveryDetails {
    pub snapshot_l1_batch: Option<L1BatchNumber>,
    pub snapshot_l2_block: Option<MiniblockNumber>,
    pub factory_deps_recovered: bool,
    pub tokens_recovered: bool,
    pub storage_logs_chunks_left_to_process: Option<u64>,
}

impl SnapshotRecoveryDetails {
    pub fn is_finished(&self) -> bool {
        self.factory_deps_recovered
            && self.tokens_recovered
            && self.storage_logs_chunks_left_to_process == Some(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyCheckerDetails {
    pub first_checked_batch: Option<L1BatchNumber>,
    pub last_checked_batch: Option<L1BatchNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorgDetectorDetails {
    pub last_correct_l1_batch: Option<L1BatchNumber>,
    pub last_correct_l2_block: Option<MiniblockNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbPrunerDetails {
    pub last_soft_pruned_l1_batch: Option<L1BatchNumber>,
    pub last_hard_pruned_l1_batch: Option<L1BatchNumber>,
}

/// Details of the Merkle tree component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeDetails {
    /// Earliest L1 batch still present in the tree; everything before it is pruned.
    pub min_l1_batch_number: Option<L1BatchNumber>,
    pub next_l1_batch_number: Option<L1BatchNumber>,
}

impl TreeDetails {
    /// Last L1 batch pruned from the tree.
    pub fn last_pruned_l1_batch(&self) -> Option<L1BatchNumber> {
        let min_l1_batch_number = self.min_l1_batch_number?;
        min_l1_batch_number.0.checked_sub(1).map(L1BatchNumber)
    }
}
