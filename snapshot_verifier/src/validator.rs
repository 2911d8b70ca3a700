//! Structural and on-chain validation of snapshot artifacts.

use ola_types::snapshots::{
    SnapshotFactoryDependencies, SnapshotHeader, SnapshotStorageKey, SnapshotStorageLogsChunk,
    SnapshotStorageLogsChunkMetadata, SnapshotVersion,
};
use olaos_object_store::ObjectStore;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{errors::VerificationError, node::NodeApi};

/// First bytes of bytecodes produced by EVM compilers (`PUSH1 0x80`).
pub const EVM_BYTECODE_PREFIX: [u8; 2] = [0x60, 0x80];

const FACTORY_DEP_HASH_LEN: usize = 32;

/// Selects storage logs to be cross-checked with the ground truth node.
/// Every log is picked independently with the configured probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingStrategy {
    probability: f64,
    seed: Option<u64>,
}

impl SamplingStrategy {
    pub fn new(probability: f64, seed: Option<u64>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&probability),
            "storage log sample probability must be in [0, 1], got {probability}"
        );
        Ok(Self { probability, seed })
    }

    /// Checks every storage log.
    pub fn exhaustive() -> Self {
        Self {
            probability: 1.0,
            seed: None,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub factory_deps: usize,
    pub evm_bytecodes: usize,
    pub chunks: usize,
    pub storage_logs: usize,
    /// Storage logs cross-checked against the ground truth node.
    pub sampled_storage_logs: usize,
}

#[derive(Debug)]
pub struct SnapshotValidator<'a> {
    object_store: &'a dyn ObjectStore,
    ground_truth: &'a dyn NodeApi,
    sampling: SamplingStrategy,
    expect_evm_bytecode: bool,
}

impl<'a> SnapshotValidator<'a> {
    pub fn new(
        object_store: &'a dyn ObjectStore,
        ground_truth: &'a dyn NodeApi,
        sampling: SamplingStrategy,
    ) -> Self {
        Self {
            object_store,
            ground_truth,
            sampling,
            expect_evm_bytecode: false,
        }
    }

    /// Requires the snapshot to contain at least one EVM bytecode.
    pub fn expect_evm_bytecode(mut self, expect: bool) -> Self {
        self.expect_evm_bytecode = expect;
        self
    }

    pub async fn validate(
        &self,
        header: &SnapshotHeader,
    ) -> Result<ValidationReport, VerificationError> {
        let version = SnapshotVersion::try_from(header.version).map_err(|version| {
            VerificationError::Assertion(format!(
                "snapshot for L1 batch {} has unsupported version {version}",
                header.l1_batch_number
            ))
        })?;
        olaos_logs::info!(
            "Validating snapshot for L1 batch {} (miniblock {}, version {:?}, {} chunks)",
            header.l1_batch_number,
            header.miniblock_number,
            version,
            header.storage_logs_chunks.len()
        );

        let mut report = ValidationReport::default();
        self.validate_factory_deps(header, &mut report).await?;

        let mut rng = self.sampling.rng();
        for chunk in &header.storage_logs_chunks {
            self.validate_chunk(header, version, chunk, &mut rng, &mut report)
                .await?;
        }
        olaos_logs::info!("Snapshot is valid: {report:?}");
        Ok(report)
    }

    async fn validate_factory_deps(
        &self,
        header: &SnapshotHeader,
        report: &mut ValidationReport,
    ) -> Result<(), VerificationError> {
        let path = header.factory_deps_filepath.as_str();
        let deps: SnapshotFactoryDependencies = self.object_store.get(path).await?;
        verify!(
            !deps.factory_deps.is_empty(),
            "snapshot factory dependencies at `{path}` are empty"
        );

        for (i, dep) in deps.factory_deps.iter().enumerate() {
            let hash_len = dep.hash.as_ref().map_or(0, Vec::len);
            verify!(
                hash_len == FACTORY_DEP_HASH_LEN,
                "factory dependency #{i} at `{path}` has {hash_len}-byte hash, expected {FACTORY_DEP_HASH_LEN} bytes"
            );
            if dep.bytecode.starts_with(&EVM_BYTECODE_PREFIX) {
                report.evm_bytecodes += 1;
            }
        }
        report.factory_deps = deps.factory_deps.len();
        olaos_logs::info!(
            "Checked {} factory dependencies, {} of them are EVM bytecodes",
            report.factory_deps,
            report.evm_bytecodes
        );

        if self.expect_evm_bytecode {
            verify!(
                report.evm_bytecodes > 0,
                "snapshot factory dependencies at `{path}` contain no EVM bytecode"
            );
        }
        Ok(())
    }

    async fn validate_chunk(
        &self,
        header: &SnapshotHeader,
        version: SnapshotVersion,
        metadata: &SnapshotStorageLogsChunkMetadata,
        rng: &mut StdRng,
        report: &mut ValidationReport,
    ) -> Result<(), VerificationError> {
        let path = metadata.filepath.as_str();
        let chunk: SnapshotStorageLogsChunk = self.object_store.get(path).await?;
        verify!(
            !chunk.storage_logs.is_empty(),
            "storage logs chunk {} at `{path}` is empty",
            metadata.chunk_id
        );

        let mut sampled = 0;
        for log in &chunk.storage_logs {
            verify!(
                log.l1_batch_number_of_initial_write <= header.l1_batch_number,
                "storage log {:?} in chunk {} was initially written in L1 batch {}, after snapshot L1 batch {}",
                log.key,
                metadata.chunk_id,
                log.l1_batch_number_of_initial_write,
                header.l1_batch_number
            );
            // Logs with hashed keys cannot be looked up via `eth_getStorageAt`.
            if version != SnapshotVersion::Version0 || !rng.gen_bool(self.sampling.probability) {
                continue;
            }

            let SnapshotStorageKey::Plain { address, key } = log.key else {
                return Err(VerificationError::Assertion(format!(
                    "version 0 snapshot chunk {} contains a storage log with hashed key {:?}",
                    metadata.chunk_id, log.key
                )));
            };
            let value_on_chain = self
                .ground_truth
                .storage_value(address, key, header.miniblock_number)
                .await?;
            verify!(
                value_on_chain == log.value,
                "storage value mismatch for ({address:?}, {key:?}) in chunk {}: snapshot has {:?}, node has {value_on_chain:?} at miniblock {}",
                metadata.chunk_id,
                log.value,
                header.miniblock_number
            );
            sampled += 1;
        }

        olaos_logs::debug!(
            "Checked storage logs chunk {} ({} logs, {sampled} cross-checked on chain)",
            metadata.chunk_id,
            chunk.storage_logs.len()
        );
        report.chunks += 1;
        report.storage_logs += chunk.storage_logs.len();
        report.sampled_storage_logs += sampled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use assert_matches::assert_matches;
    use ola_types::{
        snapshots::{SnapshotFactoryDependency, SnapshotStorageLog},
        L1BatchNumber, H256,
    };
    use olaos_object_store::{ObjectStoreError, ObjectStoreFactory};

    use super::*;
    use crate::testonly::{factory_deps, storage_log, store_snapshot, MockNode, SNAPSHOT_L1_BATCH};

    async fn validate_with(
        store: &dyn ObjectStore,
        node: &MockNode,
        header: &SnapshotHeader,
        sampling: SamplingStrategy,
    ) -> Result<ValidationReport, VerificationError> {
        SnapshotValidator::new(store, node, sampling)
            .expect_evm_bytecode(true)
            .validate(header)
            .await
    }

    async fn validate_exhaustively(
        store: &dyn ObjectStore,
        header: &SnapshotHeader,
    ) -> Result<ValidationReport, VerificationError> {
        let node = MockNode::default();
        validate_with(store, &node, header, SamplingStrategy::exhaustive()).await
    }

    #[tokio::test]
    async fn valid_snapshot_with_exhaustive_sampling() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let node = MockNode {
            storage: fixture.storage,
            ..MockNode::default()
        };

        let report = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap();
        assert_eq!(
            report,
            ValidationReport {
                factory_deps: 2,
                evm_bytecodes: 1,
                chunks: 2,
                storage_logs: 10,
                sampled_storage_logs: 10,
            }
        );
        assert_eq!(node.storage_requests.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn zero_probability_skips_on_chain_checks() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        // Storage is empty, so any on-chain check would fail.
        let node = MockNode::default();

        let sampling = SamplingStrategy::new(0.0, Some(1)).unwrap();
        let report = validate_with(&*store, &node, &fixture.header, sampling)
            .await
            .unwrap();
        assert_eq!(report.sampled_storage_logs, 0);
        assert_eq!(report.storage_logs, 10);
        assert_eq!(node.storage_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn seeded_sampling_is_reproducible() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let node = MockNode {
            storage: fixture.storage,
            ..MockNode::default()
        };

        let sampling = SamplingStrategy::new(0.5, Some(42)).unwrap();
        let first = validate_with(&*store, &node, &fixture.header, sampling)
            .await
            .unwrap();
        let second = validate_with(&*store, &node, &fixture.header, sampling)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn sampling_probability_is_checked() {
        assert!(SamplingStrategy::new(1.5, None).is_err());
        assert!(SamplingStrategy::new(-0.1, None).is_err());
        assert!(SamplingStrategy::new(f64::NAN, None).is_err());
    }

    #[tokio::test]
    async fn unsupported_version() {
        let store = ObjectStoreFactory::mock().create_store();
        let mut fixture = store_snapshot(&*store).await;
        fixture.header.version = 2;

        let err = validate_exhaustively(&*store, &fixture.header).await.unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("version 2")
        );
    }

    #[tokio::test]
    async fn factory_dep_hash_must_have_32_bytes() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let path = fixture.header.factory_deps_filepath.as_str();
        store.put(path, &factory_deps(31)).await.unwrap();

        let err = validate_exhaustively(&*store, &fixture.header).await.unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("31-byte hash")
        );
    }

    #[tokio::test]
    async fn missing_factory_dep_hash_is_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let deps = SnapshotFactoryDependencies {
            factory_deps: vec![SnapshotFactoryDependency {
                bytecode: vec![1, 2, 3],
                hash: None,
            }],
        };
        store
            .put(fixture.header.factory_deps_filepath.as_str(), &deps)
            .await
            .unwrap();

        let node = MockNode::default();
        let err = SnapshotValidator::new(&*store, &node, SamplingStrategy::exhaustive())
            .validate(&fixture.header)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("0-byte hash")
        );
    }

    #[tokio::test]
    async fn evm_bytecode_expectation() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let mut deps = factory_deps(32);
        deps.factory_deps.retain(|dep| !dep.bytecode.starts_with(&EVM_BYTECODE_PREFIX));
        store
            .put(fixture.header.factory_deps_filepath.as_str(), &deps)
            .await
            .unwrap();
        let node = MockNode {
            storage: fixture.storage,
            ..MockNode::default()
        };

        let err = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("no EVM bytecode")
        );

        // Without the expectation, the same snapshot is valid.
        let report = SnapshotValidator::new(&*store, &node, SamplingStrategy::exhaustive())
            .validate(&fixture.header)
            .await
            .unwrap();
        assert_eq!(report.evm_bytecodes, 0);
    }

    #[tokio::test]
    async fn empty_factory_deps_are_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        store
            .put(
                fixture.header.factory_deps_filepath.as_str(),
                &SnapshotFactoryDependencies::default(),
            )
            .await
            .unwrap();

        let err = validate_exhaustively(&*store, &fixture.header).await.unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("are empty")
        );
    }

    #[tokio::test]
    async fn empty_chunk_is_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let path = fixture.header.storage_logs_chunks[1].filepath.as_str();
        store
            .put(path, &SnapshotStorageLogsChunk::default())
            .await
            .unwrap();
        let node = MockNode {
            storage: fixture.storage,
            ..MockNode::default()
        };

        let err = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap_err();
        assert_matches!(err, VerificationError::Assertion(message) if message.contains("chunk 1"));
    }

    #[tokio::test]
    async fn initial_write_after_snapshot_batch_is_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let path = fixture.header.storage_logs_chunks[0].filepath.as_str();
        let chunk = SnapshotStorageLogsChunk {
            storage_logs: vec![
                storage_log(1, SNAPSHOT_L1_BATCH),
                storage_log(2, SNAPSHOT_L1_BATCH + 1),
            ],
        };
        store.put(path, &chunk).await.unwrap();

        // The batch invariant is checked for every log, sampled or not.
        let sampling = SamplingStrategy::new(0.0, None).unwrap();
        let err = validate_with(&*store, &MockNode::default(), &fixture.header, sampling)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message)
                if message.contains("initially written in L1 batch 11")
        );
    }

    #[tokio::test]
    async fn on_chain_mismatch_is_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let mut storage = fixture.storage;
        let log = storage_log(3, L1BatchNumber(1));
        let SnapshotStorageKey::Plain { address, key } = log.key else {
            unreachable!();
        };
        storage.insert((address, key), H256::repeat_byte(0xee));
        let node = MockNode {
            storage,
            ..MockNode::default()
        };

        let err = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("storage value mismatch")
        );
    }

    #[tokio::test]
    async fn version_1_snapshot_is_not_cross_checked() {
        let store = ObjectStoreFactory::mock().create_store();
        let mut fixture = store_snapshot(&*store).await;
        fixture.header.version = 1;
        let path = fixture.header.storage_logs_chunks[0].filepath.as_str();
        let chunk = SnapshotStorageLogsChunk {
            storage_logs: vec![SnapshotStorageLog {
                key: SnapshotStorageKey::Hashed(H256::repeat_byte(7)),
                ..storage_log(7, L1BatchNumber(3))
            }],
        };
        store.put(path, &chunk).await.unwrap();
        let node = MockNode::default();

        let report = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap();
        assert_eq!(report.sampled_storage_logs, 0);
        assert_eq!(report.storage_logs, 6);
        assert_eq!(node.storage_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn hashed_key_in_version_0_snapshot_is_rejected() {
        let store = ObjectStoreFactory::mock().create_store();
        let fixture = store_snapshot(&*store).await;
        let path = fixture.header.storage_logs_chunks[0].filepath.as_str();
        let chunk = SnapshotStorageLogsChunk {
            storage_logs: vec![SnapshotStorageLog {
                key: SnapshotStorageKey::Hashed(H256::repeat_byte(7)),
                ..storage_log(7, L1BatchNumber(3))
            }],
        };
        store.put(path, &chunk).await.unwrap();

        let err = validate_exhaustively(&*store, &fixture.header).await.unwrap_err();
        assert_matches!(
            err,
            VerificationError::Assertion(message) if message.contains("hashed key")
        );
    }

    #[tokio::test]
    async fn missing_chunk_is_an_artifact_error() {
        let store = ObjectStoreFactory::mock().create_store();
        let mut fixture = store_snapshot(&*store).await;
        fixture.header.storage_logs_chunks[1].filepath = "missing.proto.gzip".to_owned();
        let node = MockNode {
            storage: fixture.storage,
            ..MockNode::default()
        };

        let err = validate_with(&*store, &node, &fixture.header, SamplingStrategy::exhaustive())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            VerificationError::Artifact(ObjectStoreError::KeyNotFound { key })
                if key == "missing.proto.gzip"
        );
    }
}
