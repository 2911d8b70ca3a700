//! Typed view of the `/health` endpoint exposed by Ola nodes.
//!
//! The endpoint returns `{"status": .., "components": {<name>: {"status": .., "details": ..}}}`.
//! Components the verifier cares about are decoded into [`ComponentHealth`] with strongly typed
//! details; components missing from the response decode to [`ComponentHealth::Absent`], and
//! components the verifier doesn't know are ignored.

use serde::{Deserialize, Deserializer, Serialize};

pub use self::details::{
    ConsistencyCheckerDetails, DbPrunerDetails, ReorgDetectorDetails, SnapshotRecoveryDetails,
    TreeDetails,
};

mod details;

/// Health status returned as a part of `Health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Component is initializing and is not ready yet.
    NotReady,
    /// Component is ready for operations.
    Ready,
    /// Component is affected by some non-fatal issue. The component is still considered healthy.
    Affected,
    /// Component has received a termination request and is in the process of shutting down.
    ShuttingDown,
    /// Component is shut down.
    ShutDown,
    /// Component has been abnormally interrupted by a panic.
    Panicked,
}

impl HealthStatus {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::Affected)
    }
}

/// Health of a single component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health<D> {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<D>,
}

impl<D> Health<D> {
    pub fn with_details(mut self, details: D) -> Self {
        self.details = Some(details);
        self
    }
}

impl<D> From<HealthStatus> for Health<D> {
    fn from(status: HealthStatus) -> Self {
        Self {
            status,
            details: None,
        }
    }
}

/// Health of a component as observed in a report.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentHealth<D> {
    /// The component is not (yet) registered by the node.
    Absent,
    Present(Health<D>),
}

impl<D> Default for ComponentHealth<D> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<D> ComponentHealth<D> {
    /// Status of the component, or `None` if it is absent.
    pub fn status(&self) -> Option<HealthStatus> {
        match self {
            Self::Absent => None,
            Self::Present(health) => Some(health.status),
        }
    }

    pub fn details(&self) -> Option<&D> {
        match self {
            Self::Absent => None,
            Self::Present(health) => health.details.as_ref(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<D> From<Health<D>> for ComponentHealth<D> {
    fn from(health: Health<D>) -> Self {
        Self::Present(health)
    }
}

impl<'de, D: Deserialize<'de>> Deserialize<'de> for ComponentHealth<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        Ok(Option::<Health<D>>::deserialize(deserializer)?.map_or(Self::Absent, Self::Present))
    }
}

/// Opaque details of components whose details are only logged.
pub type UntypedDetails = serde_json::Value;

/// Names of components tracked by the verifier, as they appear in the health report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentName {
    SnapshotRecovery,
    ConsistencyChecker,
    ReorgDetector,
    DbPruner,
    TreePruner,
    TreeDataFetcher,
    Tree,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub snapshot_recovery: ComponentHealth<SnapshotRecoveryDetails>,
    #[serde(default)]
    pub consistency_checker: ComponentHealth<ConsistencyCheckerDetails>,
    #[serde(default)]
    pub reorg_detector: ComponentHealth<ReorgDetectorDetails>,
    #[serde(default)]
    pub db_pruner: ComponentHealth<DbPrunerDetails>,
    #[serde(default)]
    pub tree_pruner: ComponentHealth<UntypedDetails>,
    #[serde(default)]
    pub tree_data_fetcher: ComponentHealth<UntypedDetails>,
    #[serde(default)]
    pub tree: ComponentHealth<TreeDetails>,
}

impl Components {
    /// Status of a component by name, `None` if the component is absent.
    pub fn status(&self, name: ComponentName) -> Option<HealthStatus> {
        match name {
            ComponentName::SnapshotRecovery => self.snapshot_recovery.status(),
            ComponentName::ConsistencyChecker => self.consistency_checker.status(),
            ComponentName::ReorgDetector => self.reorg_detector.status(),
            ComponentName::DbPruner => self.db_pruner.status(),
            ComponentName::TreePruner => self.tree_pruner.status(),
            ComponentName::TreeDataFetcher => self.tree_data_fetcher.status(),
            ComponentName::Tree => self.tree.status(),
        }
    }
}

/// Point-in-time health report of a node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppHealthReport {
    /// Aggregated status of the node; older nodes don't report it.
    #[serde(default)]
    pub status: Option<HealthStatus>,
    #[serde(default)]
    pub components: Components,
}

impl AppHealthReport {
    pub fn is_ready(&self) -> bool {
        self.status.map_or(false, HealthStatus::is_ready)
    }
}
