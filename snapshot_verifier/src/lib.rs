//! Verification of snapshot recovery and pruning on Ola external nodes.
//!
//! The verifier validates the latest snapshot produced by the main node, then follows
//! the external node's health report while it recovers from that snapshot and
//! prunes its data afterwards.

pub use self::{
    client::NodeClient,
    errors::VerificationError,
    health::{HealthSource, HttpHealthSource},
    node::{
        ExternallyManagedNode, NodeApi, NodeLifecycle, PidLiveness, ProcessExit, ProcessLiveness,
        UnobservedProcess,
    },
    poller::{HealthPoller, PollStep},
    pruning::{PruningMonitor, PruningWatermark},
    recovery::{Readiness, RecoveryExpectations, RecoveryMonitor},
    scenario::{ScenarioOutcome, SnapshotRecoveryScenario},
    tokens::compare_token_sets,
    validator::{SamplingStrategy, SnapshotValidator, ValidationReport, EVM_BYTECODE_PREFIX},
};

#[macro_use]
mod errors;
mod client;
mod health;
mod node;
mod poller;
mod pruning;
mod recovery;
mod scenario;
#[cfg(test)]
mod testonly;
mod tokens;
mod validator;
