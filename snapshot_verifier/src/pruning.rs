//! Tracking of data pruning on the external node.

use std::time::Duration;

use ola_config::snapshot_verifier::RegressionPolicy;
use ola_types::L1BatchNumber;
use olaos_health_check::{AppHealthReport, ComponentName, HealthStatus};

use crate::{
    errors::VerificationError,
    node::ProcessLiveness,
    poller::{HealthPoller, PollStep},
    recovery::Readiness,
};

/// Waits until pruning components start and then until pruning reaches a watermark.
#[derive(Debug)]
pub struct PruningMonitor<'a> {
    tree_enabled: bool,
    policy: RegressionPolicy,
    process: &'a dyn ProcessLiveness,
    db_pruner: Readiness,
    tree_pruner: Readiness,
    tree_data_fetcher: Readiness,
}

impl<'a> PruningMonitor<'a> {
    pub fn new(
        tree_enabled: bool,
        policy: RegressionPolicy,
        process: &'a dyn ProcessLiveness,
    ) -> Self {
        Self {
            tree_enabled,
            policy,
            process,
            db_pruner: Readiness::NotReady,
            // Tree pruner never starts if the tree is disabled.
            tree_pruner: if tree_enabled {
                Readiness::NotReady
            } else {
                Readiness::Ready
            },
            tree_data_fetcher: Readiness::NotReady,
        }
    }

    pub fn pruners_ready(&self) -> bool {
        self.db_pruner == Readiness::Ready
            && self.tree_pruner == Readiness::Ready
            && self.tree_data_fetcher == Readiness::Ready
    }

    pub async fn wait_for_pruners(
        &mut self,
        poller: &HealthPoller<'_>,
        timeout: Option<Duration>,
    ) -> Result<(), VerificationError> {
        poller
            .poll("pruner readiness", timeout, self.process, |report| {
                self.observe_pruners(report)
            })
            .await?;
        olaos_logs::info!("All pruning components are ready");
        Ok(())
    }

    pub fn observe_pruners(
        &mut self,
        report: &AppHealthReport,
    ) -> Result<PollStep, VerificationError> {
        let mut tracked = vec![
            (ComponentName::DbPruner, &mut self.db_pruner),
            (ComponentName::TreeDataFetcher, &mut self.tree_data_fetcher),
        ];
        if self.tree_enabled {
            tracked.push((ComponentName::TreePruner, &mut self.tree_pruner));
        }
        for (name, readiness) in tracked {
            let status = report.components.status(name);
            verify!(
                matches!(
                    status,
                    None | Some(
                        HealthStatus::NotReady | HealthStatus::Affected | HealthStatus::Ready
                    )
                ),
                "{name} status must be absent, `not_ready`, `affected` or `ready`, got {status:?}"
            );
            match *readiness {
                Readiness::NotReady if status == Some(HealthStatus::Ready) => {
                    olaos_logs::info!("Component {name} is ready");
                    *readiness = Readiness::Ready;
                }
                Readiness::NotReady => {
                    olaos_logs::debug!("Component {name} is not ready yet: {status:?}");
                }
                Readiness::Ready => {
                    if self.policy == RegressionPolicy::Fail {
                        verify!(
                            status.map_or(false, HealthStatus::is_ready),
                            "{name} regressed to {status:?} after being ready"
                        );
                    }
                }
            }
        }
        Ok(if self.pruners_ready() {
            PollStep::Done
        } else {
            PollStep::Continue
        })
    }

    /// Switches to waiting for the pruning watermark.
    pub fn watermark(&self, target: L1BatchNumber) -> PruningWatermark<'a> {
        PruningWatermark {
            target,
            tree_enabled: self.tree_enabled,
            policy: self.policy,
            process: self.process,
            last_hard_pruned_l1_batch: None,
        }
    }
}

/// Second phase of pruning monitoring: waits until data up to `target` is pruned.
#[derive(Debug)]
pub struct PruningWatermark<'a> {
    target: L1BatchNumber,
    tree_enabled: bool,
    policy: RegressionPolicy,
    process: &'a dyn ProcessLiveness,
    last_hard_pruned_l1_batch: Option<L1BatchNumber>,
}

impl PruningWatermark<'_> {
    pub fn target(&self) -> L1BatchNumber {
        self.target
    }

    pub async fn wait(
        &mut self,
        poller: &HealthPoller<'_>,
        timeout: Option<Duration>,
    ) -> Result<(), VerificationError> {
        poller
            .poll("pruning watermark", timeout, self.process, |report| {
                self.observe(report)
            })
            .await?;
        olaos_logs::info!("Data up to L1 batch {} is pruned", self.target);
        Ok(())
    }

    pub fn observe(&mut self, report: &AppHealthReport) -> Result<PollStep, VerificationError> {
        let components = &report.components;

        let db_pruner_status = components.db_pruner.status();
        verify!(
            db_pruner_status == Some(HealthStatus::Ready),
            "DB pruner status must be `ready`, got {db_pruner_status:?}"
        );
        let details = components.db_pruner.details();
        olaos_logs::info!("Received DB pruner health details: {details:?}");
        let last_hard_pruned = details.and_then(|details| details.last_hard_pruned_l1_batch);
        if self.policy == RegressionPolicy::Fail {
            if let (Some(prev), Some(current)) =
                (self.last_hard_pruned_l1_batch, last_hard_pruned)
            {
                verify!(
                    current >= prev,
                    "DB pruner's last hard-pruned L1 batch decreased from {prev} to {current}"
                );
            }
        }
        if last_hard_pruned.is_some() {
            self.last_hard_pruned_l1_batch = last_hard_pruned;
        }
        let db_pruned = last_hard_pruned.map_or(false, |batch| batch >= self.target);

        let tree_pruned = if self.tree_enabled {
            let tree_status = components.tree.status();
            verify!(
                tree_status == Some(HealthStatus::Ready),
                "tree status must be `ready`, got {tree_status:?}"
            );
            let details = components.tree.details();
            olaos_logs::info!("Received tree health details: {details:?}");
            details
                .and_then(|details| details.last_pruned_l1_batch())
                .map_or(false, |batch| batch >= self.target)
        } else {
            verify!(
                components.tree.is_absent(),
                "tree must be absent when it's disabled during pruning, got {:?}",
                components.tree
            );
            true
        };

        Ok(if db_pruned && tree_pruned {
            PollStep::Done
        } else {
            PollStep::Continue
        })
    }
}
