//! Abstractions over the nodes taking part in verification.

use std::{fmt, path::PathBuf};

use async_trait::async_trait;
use ola_config::external_node::ExternalNodePruningConfig;
use ola_types::{
    snapshots::{AllSnapshots, SnapshotHeader},
    tokens::TokenInfo,
    Address, L1BatchNumber, MiniblockNumber, H256,
};

/// Read-only view of a node's JSON-RPC API used by the verifier.
#[async_trait]
pub trait NodeApi: fmt::Debug + Send + Sync {
    async fn all_snapshots(&self) -> anyhow::Result<AllSnapshots>;

    async fn snapshot(&self, l1_batch_number: L1BatchNumber)
        -> anyhow::Result<Option<SnapshotHeader>>;

    /// Value of the storage slot as of the end of the given miniblock.
    async fn storage_value(
        &self,
        address: Address,
        key: H256,
        miniblock_number: MiniblockNumber,
    ) -> anyhow::Result<H256>;

    /// Tokens known to the node. `None` means the latest miniblock.
    async fn sync_tokens(
        &self,
        miniblock_number: Option<MiniblockNumber>,
    ) -> anyhow::Result<Vec<TokenInfo>>;

    async fn block_number(&self) -> anyhow::Result<MiniblockNumber>;

    async fn l1_batch_number(&self) -> anyhow::Result<L1BatchNumber>;
}

/// How the observed node process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub pid: Option<u32>,
    pub code: Option<i32>,
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.pid, self.code) {
            (Some(pid), Some(code)) => write!(f, "pid {pid}, exit code {code}"),
            (Some(pid), None) => write!(f, "pid {pid}"),
            (None, Some(code)) => write!(f, "exit code {code}"),
            (None, None) => f.write_str("no exit status"),
        }
    }
}

/// Allows monitors to fail fast if the node under test dies while being observed.
pub trait ProcessLiveness: fmt::Debug + Send + Sync {
    /// Returns `Some(_)` once the process has exited.
    fn exit_status(&self) -> Option<ProcessExit>;
}

/// Used when the node process is not managed by the verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnobservedProcess;

impl ProcessLiveness for UnobservedProcess {
    fn exit_status(&self) -> Option<ProcessExit> {
        None
    }
}

/// Checks a process by its PID using procfs.
#[derive(Debug, Clone)]
pub struct PidLiveness {
    pid: u32,
    proc_root: PathBuf,
}

impl PidLiveness {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            proc_root: PathBuf::from("/proc"),
        }
    }
}

impl ProcessLiveness for PidLiveness {
    fn exit_status(&self) -> Option<ProcessExit> {
        if self.proc_root.join(self.pid.to_string()).exists() {
            None
        } else {
            Some(ProcessExit {
                pid: Some(self.pid),
                code: None,
            })
        }
    }
}

/// Node management actions the verification scenario relies on.
#[async_trait]
pub trait NodeLifecycle: fmt::Debug + Send + Sync {
    /// Restarts the external node with pruning enabled.
    async fn restart_with_pruning(
        &self,
        pruning: &ExternalNodePruningConfig,
        tree_enabled: bool,
    ) -> anyhow::Result<()>;

    /// Makes the main node seal at least `count` more L1 batches.
    async fn generate_l1_batches(&self, count: u32) -> anyhow::Result<()>;
}

/// Lifecycle for nodes managed by the environment running the verifier; actions are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternallyManagedNode;

#[async_trait]
impl NodeLifecycle for ExternallyManagedNode {
    async fn restart_with_pruning(
        &self,
        pruning: &ExternalNodePruningConfig,
        tree_enabled: bool,
    ) -> anyhow::Result<()> {
        olaos_logs::info!(
            "External node is expected to restart with {} (tree enabled: {tree_enabled})",
            pruning_summary(pruning)
        );
        Ok(())
    }

    async fn generate_l1_batches(&self, count: u32) -> anyhow::Result<()> {
        olaos_logs::info!("Main node is expected to seal at least {count} more L1 batches");
        Ok(())
    }
}

fn pruning_summary(pruning: &ExternalNodePruningConfig) -> String {
    if !pruning.pruning_enabled {
        return "pruning disabled".to_owned();
    }
    format!(
        "pruning chunk size {:?}, data retention {:?}, removal delay {:?}",
        pruning.pruning_chunk_size,
        pruning.data_retention(),
        pruning.removal_delay()
    )
}
