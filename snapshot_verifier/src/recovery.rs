//! Tracking of snapshot recovery on the external node.

use std::time::Duration;

use ola_config::snapshot_verifier::RegressionPolicy;
use ola_types::{snapshots::SnapshotHeader, L1BatchNumber, MiniblockNumber};
use olaos_health_check::{
    AppHealthReport, ComponentHealth, ConsistencyCheckerDetails, HealthStatus,
    ReorgDetectorDetails, SnapshotRecoveryDetails,
};

use crate::{
    errors::VerificationError,
    node::ProcessLiveness,
    poller::{HealthPoller, PollStep},
};

/// Readiness of a single tracked component. Transitions only from `NotReady` to `Ready`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Readiness {
    #[default]
    NotReady,
    Ready,
}

/// Snapshot the external node is expected to recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryExpectations {
    pub l1_batch_number: L1BatchNumber,
    pub miniblock_number: MiniblockNumber,
}

impl From<&SnapshotHeader> for RecoveryExpectations {
    fn from(header: &SnapshotHeader) -> Self {
        Self {
            l1_batch_number: header.l1_batch_number,
            miniblock_number: header.miniblock_number,
        }
    }
}

/// Follows snapshot recovery, consistency checker and reorg detector until all of them are ready.
#[derive(Debug)]
pub struct RecoveryMonitor<'a> {
    expected: RecoveryExpectations,
    policy: RegressionPolicy,
    process: &'a dyn ProcessLiveness,
    recovery: Readiness,
    consistency_checker: Readiness,
    reorg_detector: Readiness,
    chunks_left_to_process: Option<u64>,
    last_checked_batch: Option<L1BatchNumber>,
    last_correct_l1_batch: Option<L1BatchNumber>,
}

impl<'a> RecoveryMonitor<'a> {
    pub fn new(
        expected: RecoveryExpectations,
        policy: RegressionPolicy,
        process: &'a dyn ProcessLiveness,
    ) -> Self {
        Self {
            expected,
            policy,
            process,
            recovery: Readiness::NotReady,
            consistency_checker: Readiness::NotReady,
            reorg_detector: Readiness::NotReady,
            chunks_left_to_process: None,
            last_checked_batch: None,
            last_correct_l1_batch: None,
        }
    }

    pub fn recovery(&self) -> Readiness {
        self.recovery
    }

    pub fn consistency_checker(&self) -> Readiness {
        self.consistency_checker
    }

    pub fn reorg_detector(&self) -> Readiness {
        self.reorg_detector
    }

    pub fn is_ready(&self) -> bool {
        self.recovery == Readiness::Ready
            && self.consistency_checker == Readiness::Ready
            && self.reorg_detector == Readiness::Ready
    }

    /// Polls node health until recovery and both post-recovery checkers are ready.
    pub async fn wait_until_ready(
        &mut self,
        poller: &HealthPoller<'_>,
        timeout: Option<Duration>,
    ) -> Result<(), VerificationError> {
        poller
            .poll("snapshot recovery", timeout, self.process, |report| {
                self.observe(report)
            })
            .await?;
        olaos_logs::info!("Snapshot recovery and post-recovery checks are complete");
        Ok(())
    }

    /// Folds a health report into the monitor state.
    pub fn observe(&mut self, report: &AppHealthReport) -> Result<PollStep, VerificationError> {
        let components = &report.components;
        if self.tracks(self.recovery) {
            self.observe_recovery(&components.snapshot_recovery)?;
        }
        if self.tracks(self.consistency_checker) {
            self.observe_consistency_checker(&components.consistency_checker)?;
        }
        if self.tracks(self.reorg_detector) {
            self.observe_reorg_detector(&components.reorg_detector)?;
        }

        Ok(if self.is_ready() {
            PollStep::Done
        } else {
            PollStep::Continue
        })
    }

    fn tracks(&self, readiness: Readiness) -> bool {
        readiness == Readiness::NotReady || self.policy == RegressionPolicy::Fail
    }

    fn observe_recovery(
        &mut self,
        health: &ComponentHealth<SnapshotRecoveryDetails>,
    ) -> Result<(), VerificationError> {
        let status = health.status();
        verify!(
            matches!(status, None | Some(HealthStatus::Affected | HealthStatus::Ready)),
            "snapshot recovery status must be absent, `affected` or `ready`, got {status:?}"
        );
        let Some(details) = health.details() else {
            verify!(
                self.recovery == Readiness::NotReady,
                "snapshot recovery details disappeared after recovery has finished"
            );
            return Ok(());
        };
        olaos_logs::info!("Received snapshot recovery health details: {details:?}");

        verify!(
            details.snapshot_l1_batch == Some(self.expected.l1_batch_number),
            "snapshot recovery reports L1 batch {:?}, expected {}",
            details.snapshot_l1_batch,
            self.expected.l1_batch_number
        );
        verify!(
            details.snapshot_l2_block == Some(self.expected.miniblock_number),
            "snapshot recovery reports L2 block {:?}, expected {}",
            details.snapshot_l2_block,
            self.expected.miniblock_number
        );

        if self.policy == RegressionPolicy::Fail {
            if let (Some(prev), Some(current)) = (
                self.chunks_left_to_process,
                details.storage_logs_chunks_left_to_process,
            ) {
                verify!(
                    current <= prev,
                    "storage log chunks left to process increased from {prev} to {current}"
                );
            }
        }
        if details.storage_logs_chunks_left_to_process.is_some() {
            self.chunks_left_to_process = details.storage_logs_chunks_left_to_process;
        }

        if details.is_finished() {
            if self.recovery == Readiness::NotReady {
                olaos_logs::info!("Snapshot recovery is finished");
                self.recovery = Readiness::Ready;
            }
        } else {
            verify!(
                self.recovery == Readiness::NotReady,
                "snapshot recovery regressed after finishing: {details:?}"
            );
        }
        Ok(())
    }

    fn observe_consistency_checker(
        &mut self,
        health: &ComponentHealth<ConsistencyCheckerDetails>,
    ) -> Result<(), VerificationError> {
        let status = health.status();
        verify!(
            matches!(status, None | Some(HealthStatus::NotReady | HealthStatus::Ready)),
            "consistency checker status must be absent, `not_ready` or `ready`, got {status:?}"
        );
        if let Some(details) = health.details() {
            olaos_logs::info!("Received consistency checker health details: {details:?}");
        }

        if self.consistency_checker == Readiness::Ready {
            verify!(
                status == Some(HealthStatus::Ready),
                "consistency checker regressed to {status:?} after being ready"
            );
            let last_checked_batch = health
                .details()
                .and_then(|details| details.last_checked_batch);
            if let (Some(prev), Some(current)) = (self.last_checked_batch, last_checked_batch) {
                verify!(
                    current >= prev,
                    "consistency checker's last checked batch decreased from {prev} to {current}"
                );
                self.last_checked_batch = Some(current);
            }
            return Ok(());
        }

        if status != Some(HealthStatus::Ready) {
            return Ok(());
        }
        let Some(ConsistencyCheckerDetails {
            first_checked_batch: Some(first),
            last_checked_batch: Some(last),
        }) = health.details()
        else {
            return Ok(());
        };
        let first = *first;
        let last = *last;
        verify!(
            first == self.expected.l1_batch_number.next(),
            "consistency checker started from L1 batch {first}, expected {} (first batch after the snapshot)",
            self.expected.l1_batch_number.next()
        );
        verify!(
            last > self.expected.l1_batch_number,
            "consistency checker's last checked batch {last} is not after the snapshot L1 batch {}",
            self.expected.l1_batch_number
        );
        olaos_logs::info!("Consistency checker is ready (checked L1 batches {first}..={last})");
        self.consistency_checker = Readiness::Ready;
        self.last_checked_batch = Some(last);
        Ok(())
    }

    fn observe_reorg_detector(
        &mut self,
        health: &ComponentHealth<ReorgDetectorDetails>,
    ) -> Result<(), VerificationError> {
        let status = health.status();
        verify!(
            matches!(status, None | Some(HealthStatus::NotReady | HealthStatus::Ready)),
            "reorg detector status must be absent, `not_ready` or `ready`, got {status:?}"
        );
        if let Some(details) = health.details() {
            olaos_logs::info!("Received reorg detector health details: {details:?}");
        }

        if self.reorg_detector == Readiness::Ready {
            verify!(
                status == Some(HealthStatus::Ready),
                "reorg detector regressed to {status:?} after being ready"
            );
            let last_correct = health.details().and_then(|details| details.last_correct_l1_batch);
            if let (Some(prev), Some(current)) = (self.last_correct_l1_batch, last_correct) {
                verify!(
                    current >= prev,
                    "reorg detector's last correct L1 batch decreased from {prev} to {current}"
                );
                self.last_correct_l1_batch = Some(current);
            }
            return Ok(());
        }

        if status != Some(HealthStatus::Ready) {
            return Ok(());
        }
        let Some(ReorgDetectorDetails {
            last_correct_l1_batch: Some(l1_batch),
            last_correct_l2_block: Some(l2_block),
        }) = health.details()
        else {
            return Ok(());
        };
        verify!(
            *l1_batch > self.expected.l1_batch_number,
            "reorg detector's last correct L1 batch {l1_batch} is not after the snapshot L1 batch {}",
            self.expected.l1_batch_number
        );
        verify!(
            *l2_block > self.expected.miniblock_number,
            "reorg detector's last correct L2 block {l2_block} is not after the snapshot L2 block {}",
            self.expected.miniblock_number
        );
        olaos_logs::info!(
            "Reorg detector is ready (last correct L1 batch {l1_batch}, L2 block {l2_block})"
        );
        self.reorg_detector = Readiness::Ready;
        self.last_correct_l1_batch = Some(*l1_batch);
        Ok(())
    }
}
