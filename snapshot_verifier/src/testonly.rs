//! Test doubles shared by unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use ola_config::external_node::ExternalNodePruningConfig;
use ola_types::{
    snapshots::{
        AllSnapshots, SnapshotFactoryDependencies, SnapshotFactoryDependency, SnapshotHeader,
        SnapshotStorageKey, SnapshotStorageLog, SnapshotStorageLogsChunk,
        SnapshotStorageLogsChunkMetadata,
    },
    tokens::TokenInfo,
    Address, L1BatchNumber, MiniblockNumber, H256,
};
use olaos_health_check::AppHealthReport;
use olaos_object_store::ObjectStore;

use crate::{
    health::HealthSource,
    node::{NodeApi, NodeLifecycle, ProcessExit, ProcessLiveness},
    validator::EVM_BYTECODE_PREFIX,
};

pub(crate) const SNAPSHOT_L1_BATCH: L1BatchNumber = L1BatchNumber(10);
pub(crate) const SNAPSHOT_MINIBLOCK: MiniblockNumber = MiniblockNumber(50);

pub(crate) fn health_report(value: serde_json::Value) -> AppHealthReport {
    serde_json::from_value(value).expect("invalid health report")
}

/// Health source replaying a fixed script; once the script is exhausted,
/// either repeats the last entry or reports an unreachable node.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHealthSource {
    script: Mutex<VecDeque<Option<AppHealthReport>>>,
    repeat_last: bool,
    pub fetches: AtomicUsize,
}

impl ScriptedHealthSource {
    pub fn new(script: impl IntoIterator<Item = Option<AppHealthReport>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            repeat_last: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn reports(reports: impl IntoIterator<Item = serde_json::Value>) -> Self {
        Self::new(reports.into_iter().map(|report| Some(health_report(report))))
    }

    pub fn repeating(report: AppHealthReport) -> Self {
        Self {
            repeat_last: true,
            ..Self::new([Some(report)])
        }
    }
}

#[async_trait]
impl HealthSource for ScriptedHealthSource {
    async fn fetch_health(&self) -> anyhow::Result<Option<AppHealthReport>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if self.repeat_last && script.len() == 1 {
            return Ok(script.front().cloned().flatten());
        }
        Ok(script.pop_front().flatten())
    }
}

/// Process that exits after being checked the specified number of times.
#[derive(Debug, Default)]
pub(crate) struct MockProcess {
    exits_after_checks: Option<usize>,
    checks: AtomicUsize,
}

impl MockProcess {
    pub fn exiting_after(checks: usize) -> Self {
        Self {
            exits_after_checks: Some(checks),
            checks: AtomicUsize::new(0),
        }
    }
}

impl ProcessLiveness for MockProcess {
    fn exit_status(&self) -> Option<ProcessExit> {
        let checks = self.checks.fetch_add(1, Ordering::SeqCst);
        let limit = self.exits_after_checks?;
        (checks >= limit).then_some(ProcessExit {
            pid: Some(1),
            code: Some(1),
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockNode {
    pub snapshots: Vec<SnapshotHeader>,
    pub storage: HashMap<(Address, H256), H256>,
    pub tokens: Vec<TokenInfo>,
    pub block_number: MiniblockNumber,
    pub l1_batch_number: L1BatchNumber,
    pub storage_requests: AtomicUsize,
    pub token_requests: Mutex<Vec<Option<MiniblockNumber>>>,
}

#[async_trait]
impl NodeApi for MockNode {
    async fn all_snapshots(&self) -> anyhow::Result<AllSnapshots> {
        Ok(AllSnapshots {
            snapshots_l1_batch_numbers: self
                .snapshots
                .iter()
                .map(|header| header.l1_batch_number)
                .collect(),
        })
    }

    async fn snapshot(
        &self,
        l1_batch_number: L1BatchNumber,
    ) -> anyhow::Result<Option<SnapshotHeader>> {
        Ok(self
            .snapshots
            .iter()
            .find(|header| header.l1_batch_number == l1_batch_number)
            .cloned())
    }

    async fn storage_value(
        &self,
        address: Address,
        key: H256,
        _miniblock_number: MiniblockNumber,
    ) -> anyhow::Result<H256> {
        self.storage_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default())
    }

    async fn sync_tokens(
        &self,
        miniblock_number: Option<MiniblockNumber>,
    ) -> anyhow::Result<Vec<TokenInfo>> {
        self.token_requests.lock().unwrap().push(miniblock_number);
        Ok(self.tokens.clone())
    }

    async fn block_number(&self) -> anyhow::Result<MiniblockNumber> {
        Ok(self.block_number)
    }

    async fn l1_batch_number(&self) -> anyhow::Result<L1BatchNumber> {
        Ok(self.l1_batch_number)
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingLifecycle {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl NodeLifecycle for RecordingLifecycle {
    async fn restart_with_pruning(
        &self,
        pruning: &ExternalNodePruningConfig,
        tree_enabled: bool,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!(
            "restart(pruning={}, tree={tree_enabled})",
            pruning.pruning_enabled
        ));
        Ok(())
    }

    async fn generate_l1_batches(&self, count: u32) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("generate_l1_batches({count})"));
        Ok(())
    }
}

/// Bytecode starting with the EVM constructor prologue.
pub(crate) fn evm_bytecode() -> Vec<u8> {
    let mut bytecode = EVM_BYTECODE_PREFIX.to_vec();
    bytecode.extend_from_slice(&[0x60, 0x40, 0x52]);
    bytecode
}

pub(crate) fn factory_deps(hash_len: usize) -> SnapshotFactoryDependencies {
    SnapshotFactoryDependencies {
        factory_deps: vec![
            SnapshotFactoryDependency {
                bytecode: vec![0; 64],
                hash: Some(vec![1; hash_len]),
            },
            SnapshotFactoryDependency {
                bytecode: evm_bytecode(),
                hash: Some(vec![2; 32]),
            },
        ],
    }
}

pub(crate) fn storage_log(index: u8, initial_write: L1BatchNumber) -> SnapshotStorageLog {
    SnapshotStorageLog {
        key: SnapshotStorageKey::Plain {
            address: Address::repeat_byte(index),
            key: H256::repeat_byte(index),
        },
        value: H256::from_low_u64_be(u64::from(index) * 1_000),
        l1_batch_number_of_initial_write: initial_write,
        enumeration_index: u64::from(index) + 1,
    }
}

/// Snapshot fixture: the header plus on-chain storage matching every log.
pub(crate) struct SnapshotFixture {
    pub header: SnapshotHeader,
    pub storage: HashMap<(Address, H256), H256>,
}

/// Stores a version 0 snapshot with two chunks of storage logs in `store`.
pub(crate) async fn store_snapshot(store: &dyn ObjectStore) -> SnapshotFixture {
    store
        .put("snapshot_l1_batch_10_factory_deps.proto.gzip", &factory_deps(32))
        .await
        .unwrap();

    let mut storage = HashMap::new();
    let mut storage_logs_chunks = vec![];
    for chunk_id in 0..2_u8 {
        let storage_logs: Vec<_> = (0..5)
            .map(|i| storage_log(chunk_id * 5 + i + 1, L1BatchNumber(u32::from(i) + 1)))
            .collect();
        for log in &storage_logs {
            if let SnapshotStorageKey::Plain { address, key } = log.key {
                storage.insert((address, key), log.value);
            }
        }
        let filepath = format!("snapshot_l1_batch_10_storage_logs_part_{chunk_id:0>4}.proto.gzip");
        store
            .put(filepath.as_str(), &SnapshotStorageLogsChunk { storage_logs })
            .await
            .unwrap();
        storage_logs_chunks.push(SnapshotStorageLogsChunkMetadata {
            chunk_id: chunk_id.into(),
            filepath,
        });
    }

    SnapshotFixture {
        header: SnapshotHeader {
            version: 0,
            l1_batch_number: SNAPSHOT_L1_BATCH,
            miniblock_number: SNAPSHOT_MINIBLOCK,
            storage_logs_chunks,
            factory_deps_filepath: "snapshot_l1_batch_10_factory_deps.proto.gzip".to_owned(),
        },
        storage,
    }
}
