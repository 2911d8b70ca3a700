//! End-to-end snapshot recovery and pruning scenario.

use ola_config::{
    external_node::ExternalNodePruningConfig, snapshot_verifier::SnapshotVerifierConfig,
};
use ola_types::{snapshots::SnapshotHeader, L1BatchNumber};
use olaos_object_store::ObjectStore;
use tokio::sync::watch;

use crate::{
    errors::VerificationError,
    health::HealthSource,
    node::{NodeApi, NodeLifecycle, ProcessLiveness},
    poller::HealthPoller,
    pruning::PruningMonitor,
    recovery::{RecoveryExpectations, RecoveryMonitor},
    tokens::compare_token_sets,
    validator::{SamplingStrategy, SnapshotValidator, ValidationReport},
};

#[derive(Debug)]
pub struct ScenarioOutcome {
    pub snapshot: SnapshotHeader,
    pub validation: ValidationReport,
    /// L1 batch up to which the external node has pruned its data.
    pub pruned_up_to: L1BatchNumber,
}

/// Verifies that the external node recovers from the latest snapshot of the main node
/// and then prunes its data.
#[derive(Debug)]
pub struct SnapshotRecoveryScenario<'a> {
    pub config: &'a SnapshotVerifierConfig,
    pub pruning_config: &'a ExternalNodePruningConfig,
    pub main_node: &'a dyn NodeApi,
    pub external_node: &'a dyn NodeApi,
    pub external_node_health: &'a dyn HealthSource,
    pub object_store: &'a dyn ObjectStore,
    pub process: &'a dyn ProcessLiveness,
    pub lifecycle: &'a dyn NodeLifecycle,
    pub stop_receiver: watch::Receiver<bool>,
}

impl SnapshotRecoveryScenario<'_> {
    pub async fn run(&self) -> Result<ScenarioOutcome, VerificationError> {
        let config = self.config;
        let sampling = SamplingStrategy::new(
            config.storage_log_sample_probability(),
            config.sampling_seed,
        )?;

        let snapshot = self.latest_snapshot().await?;
        let validation = SnapshotValidator::new(self.object_store, self.main_node, sampling)
            .expect_evm_bytecode(config.expect_evm_bytecode)
            .validate(&snapshot)
            .await?;

        let poller = HealthPoller::new(
            self.external_node_health,
            config.poll_interval(),
            self.stop_receiver.clone(),
        );
        let mut recovery = RecoveryMonitor::new(
            RecoveryExpectations::from(&snapshot),
            config.regression_policy,
            self.process,
        );
        recovery
            .wait_until_ready(&poller, config.recovery_timeout())
            .await?;

        self.check_external_node_endpoints(&snapshot).await?;
        self.check_tokens(&snapshot).await?;

        let tree_enabled = config.tree_enabled_during_pruning();
        self.lifecycle
            .restart_with_pruning(self.pruning_config, tree_enabled)
            .await?;
        let mut pruning = PruningMonitor::new(tree_enabled, config.regression_policy, self.process);
        pruning
            .wait_for_pruners(&poller, config.pruning_timeout())
            .await?;

        let pruned_batch_count = config.pruned_batch_count();
        self.lifecycle
            .generate_l1_batches(pruned_batch_count + 1)
            .await?;
        let mut watermark = pruning.watermark(snapshot.l1_batch_number + pruned_batch_count);
        watermark.wait(&poller, config.pruning_timeout()).await?;

        Ok(ScenarioOutcome {
            pruned_up_to: watermark.target(),
            snapshot,
            validation,
        })
    }

    async fn latest_snapshot(&self) -> Result<SnapshotHeader, VerificationError> {
        let all_snapshots = self.main_node.all_snapshots().await?;
        olaos_logs::info!("Main node has snapshots: {all_snapshots:?}");
        let Some(l1_batch_number) = all_snapshots.latest() else {
            return Err(VerificationError::Assertion(
                "main node has no snapshots".to_owned(),
            ));
        };

        let header = self.main_node.snapshot(l1_batch_number).await?;
        let Some(header) = header else {
            return Err(VerificationError::Assertion(format!(
                "snapshot for L1 batch {l1_batch_number} is listed but cannot be fetched"
            )));
        };
        verify!(
            header.l1_batch_number == l1_batch_number,
            "requested snapshot for L1 batch {l1_batch_number}, got one for L1 batch {}",
            header.l1_batch_number
        );
        olaos_logs::info!("Latest snapshot: {header:?}");
        Ok(header)
    }

    async fn check_external_node_endpoints(
        &self,
        snapshot: &SnapshotHeader,
    ) -> Result<(), VerificationError> {
        let miniblock_number = self.external_node.block_number().await?;
        verify!(
            miniblock_number > snapshot.miniblock_number,
            "external node is at miniblock {miniblock_number}, expected it to be past snapshot miniblock {}",
            snapshot.miniblock_number
        );
        let l1_batch_number = self.external_node.l1_batch_number().await?;
        verify!(
            l1_batch_number > snapshot.l1_batch_number,
            "external node is at L1 batch {l1_batch_number}, expected it to be past snapshot L1 batch {}",
            snapshot.l1_batch_number
        );
        olaos_logs::info!(
            "External node is at miniblock {miniblock_number}, L1 batch {l1_batch_number}"
        );
        Ok(())
    }

    async fn check_tokens(&self, snapshot: &SnapshotHeader) -> Result<(), VerificationError> {
        let external_node_tokens = self.external_node.sync_tokens(None).await?;
        verify!(
            !external_node_tokens.is_empty(),
            "external node has no tokens"
        );
        let main_node_tokens = self
            .main_node
            .sync_tokens(Some(snapshot.miniblock_number))
            .await?;
        olaos_logs::info!(
            "Comparing {} external node tokens with {} main node tokens",
            external_node_tokens.len(),
            main_node_tokens.len()
        );
        verify!(
            compare_token_sets(&external_node_tokens, &main_node_tokens)?,
            "external node tokens {external_node_tokens:?} differ from main node tokens {main_node_tokens:?} at miniblock {}",
            snapshot.miniblock_number
        );
        Ok(())
    }
}
