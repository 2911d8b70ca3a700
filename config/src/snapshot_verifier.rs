use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{envy_try_load, load_config};

/// What to do when a component that already reached `ready` is observed in a worse state.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegressionPolicy {
    /// Stop observing a component once it is ready.
    #[default]
    Tolerate,
    /// Keep observing ready components and fail on any regression.
    Fail,
}

/// Configuration of the snapshot recovery / pruning verifier.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SnapshotVerifierConfig {
    /// JSON-RPC endpoint of the main node (snapshot producer and ground truth).
    pub main_node_url: String,
    /// JSON-RPC endpoint of the external node recovered from the snapshot.
    pub external_node_url: String,
    /// Health endpoint of the external node, e.g. `http://127.0.0.1:3081/health`.
    pub external_node_health_url: String,
    /// Root that snapshot artifact paths are relative to.
    pub artifacts_base_path: String,
    pub poll_interval_ms: Option<u64>,
    /// Probability of cross-checking a storage log against the main node.
    pub storage_log_sample_probability: Option<f64>,
    pub sampling_seed: Option<u64>,
    /// Number of L1 batches after the snapshot awaited to be pruned.
    pub pruned_batch_count: Option<u32>,
    #[serde(default)]
    pub disable_tree_during_pruning: bool,
    /// Whether the snapshot must contain at least one EVM bytecode.
    #[serde(default)]
    pub expect_evm_bytecode: bool,
    pub recovery_timeout_sec: Option<u64>,
    pub pruning_timeout_sec: Option<u64>,
    #[serde(default)]
    pub regression_policy: RegressionPolicy,
    /// PID of the external node process; liveness is not checked if unset.
    pub external_node_pid: Option<u32>,
    /// Directory for JSON log files; stdout only if unset.
    pub log_directory: Option<String>,
}

impl SnapshotVerifierConfig {
    const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
    const DEFAULT_SAMPLE_PROBABILITY: f64 = 0.1;
    const DEFAULT_PRUNED_BATCH_COUNT: u32 = 1;

    pub fn from_env() -> Result<Self, envy::Error> {
        envy_try_load("OLAOS_SNAPSHOT_VERIFIER_")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(Self::DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn storage_log_sample_probability(&self) -> f64 {
        self.storage_log_sample_probability.unwrap_or(Self::DEFAULT_SAMPLE_PROBABILITY)
    }

    pub fn pruned_batch_count(&self) -> u32 {
        self.pruned_batch_count.unwrap_or(Self::DEFAULT_PRUNED_BATCH_COUNT)
    }

    pub fn tree_enabled_during_pruning(&self) -> bool {
        !self.disable_tree_during_pruning
    }

    pub fn recovery_timeout(&self) -> Option<Duration> {
        self.recovery_timeout_sec.map(Duration::from_secs)
    }

    pub fn pruning_timeout(&self) -> Option<Duration> {
        self.pruning_timeout_sec.map(Duration::from_secs)
    }

    pub fn artifacts_base_path(&self) -> PathBuf {
        PathBuf::from(&self.artifacts_base_path)
    }

    pub fn log_directory(&self) -> Option<PathBuf> {
        self.log_directory.as_ref().map(PathBuf::from)
    }
}

pub fn load_snapshot_verifier_config() -> Result<SnapshotVerifierConfig, config::ConfigError> {
    load_config("configuration/snapshot_verifier", "OLAOS_SNAPSHOT_VERIFIER")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::EnvMutex;

    static MUTEX: EnvMutex = EnvMutex::new();

    fn expected_config() -> SnapshotVerifierConfig {
        SnapshotVerifierConfig {
            main_node_url: "http://127.0.0.1:3050".to_string(),
            external_node_url: "http://127.0.0.1:3060".to_string(),
            external_node_health_url: "http://127.0.0.1:3081/health".to_string(),
            artifacts_base_path: "/opt/olaos".to_string(),
            poll_interval_ms: Some(500),
            storage_log_sample_probability: Some(0.25),
            sampling_seed: Some(42),
            pruned_batch_count: None,
            disable_tree_during_pruning: true,
            expect_evm_bytecode: false,
            recovery_timeout_sec: Some(600),
            pruning_timeout_sec: None,
            regression_policy: RegressionPolicy::Fail,
            external_node_pid: None,
            log_directory: None,
        }
    }

    #[test]
    fn test_from_env() {
        let mut lock = MUTEX.lock();
        let config = r#"
            OLAOS_SNAPSHOT_VERIFIER_MAIN_NODE_URL="http://127.0.0.1:3050"
            OLAOS_SNAPSHOT_VERIFIER_EXTERNAL_NODE_URL="http://127.0.0.1:3060"
            OLAOS_SNAPSHOT_VERIFIER_EXTERNAL_NODE_HEALTH_URL="http://127.0.0.1:3081/health"
            OLAOS_SNAPSHOT_VERIFIER_ARTIFACTS_BASE_PATH="/opt/olaos"
            OLAOS_SNAPSHOT_VERIFIER_POLL_INTERVAL_MS=500
            OLAOS_SNAPSHOT_VERIFIER_STORAGE_LOG_SAMPLE_PROBABILITY=0.25
            OLAOS_SNAPSHOT_VERIFIER_SAMPLING_SEED=42
            OLAOS_SNAPSHOT_VERIFIER_DISABLE_TREE_DURING_PRUNING=true
            OLAOS_SNAPSHOT_VERIFIER_RECOVERY_TIMEOUT_SEC=600
            OLAOS_SNAPSHOT_VERIFIER_REGRESSION_POLICY="Fail"
        "#;
        lock.set_env(config);
        lock.remove_env(&[
            "OLAOS_SNAPSHOT_VERIFIER_PRUNED_BATCH_COUNT",
            "OLAOS_SNAPSHOT_VERIFIER_EXPECT_EVM_BYTECODE",
            "OLAOS_SNAPSHOT_VERIFIER_PRUNING_TIMEOUT_SEC",
            "OLAOS_SNAPSHOT_VERIFIER_EXTERNAL_NODE_PID",
            "OLAOS_SNAPSHOT_VERIFIER_LOG_DIRECTORY",
        ]);

        let config = SnapshotVerifierConfig::from_env().expect("failed to load verifier config");
        assert_eq!(config, expected_config());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.pruned_batch_count(), 1);
        assert!(!config.tree_enabled_during_pruning());
        assert_eq!(config.pruning_timeout(), None);
    }

    #[test]
    fn defaults_are_applied() {
        let mut lock = MUTEX.lock();
        let config = r#"
            OLAOS_SNAPSHOT_VERIFIER_MAIN_NODE_URL="http://127.0.0.1:3050"
            OLAOS_SNAPSHOT_VERIFIER_EXTERNAL_NODE_URL="http://127.0.0.1:3060"
            OLAOS_SNAPSHOT_VERIFIER_EXTERNAL_NODE_HEALTH_URL="http://127.0.0.1:3081/health"
            OLAOS_SNAPSHOT_VERIFIER_ARTIFACTS_BASE_PATH="."
        "#;
        lock.set_env(config);
        lock.remove_env(&[
            "OLAOS_SNAPSHOT_VERIFIER_POLL_INTERVAL_MS",
            "OLAOS_SNAPSHOT_VERIFIER_STORAGE_LOG_SAMPLE_PROBABILITY",
            "OLAOS_SNAPSHOT_VERIFIER_SAMPLING_SEED",
            "OLAOS_SNAPSHOT_VERIFIER_DISABLE_TREE_DURING_PRUNING",
            "OLAOS_SNAPSHOT_VERIFIER_RECOVERY_TIMEOUT_SEC",
            "OLAOS_SNAPSHOT_VERIFIER_REGRESSION_POLICY",
        ]);

        let config = SnapshotVerifierConfig::from_env().unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.storage_log_sample_probability(), 0.1);
        assert_eq!(config.regression_policy, RegressionPolicy::Tolerate);
        assert!(config.tree_enabled_during_pruning());
    }
}
