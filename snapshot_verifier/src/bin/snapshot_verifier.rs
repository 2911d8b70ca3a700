use anyhow::Context as _;
use ola_config::{
    external_node::{ExternalNodePruningConfig, ExternalNodeRecoveryConfig},
    snapshot_verifier::{load_snapshot_verifier_config, SnapshotVerifierConfig},
};
use olaos_logs::telemetry::{get_subscriber, init_subscriber};
use olaos_object_store::ObjectStoreFactory;
use olaos_snapshot_verifier::{
    ExternallyManagedNode, HttpHealthSource, NodeClient, PidLiveness, ProcessLiveness,
    SnapshotRecoveryScenario, UnobservedProcess,
};
use tokio::sync::{oneshot, watch};

fn load_config() -> anyhow::Result<SnapshotVerifierConfig> {
    match SnapshotVerifierConfig::from_env() {
        Ok(config) => Ok(config),
        Err(env_err) => load_snapshot_verifier_config().with_context(|| {
            format!("failed to load verifier config from env ({env_err}) and config files")
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let (subscriber, _guard) = get_subscriber(
        "olaos_snapshot_verifier".into(),
        "info".into(),
        config.log_directory(),
    );
    init_subscriber(subscriber);
    olaos_logs::info!("Loaded verifier config: {config:?}");

    let recovery_config =
        ExternalNodeRecoveryConfig::from_env().context("failed to load EN recovery config")?;
    anyhow::ensure!(
        recovery_config.snapshots_recovery_enabled,
        "snapshot recovery must be enabled on the external node"
    );
    olaos_logs::info!("External node recovery config: {recovery_config:?}");
    let pruning_config = match ExternalNodePruningConfig::from_env() {
        Ok(pruning_config) if pruning_config.pruning_enabled => pruning_config,
        Ok(_) => ExternalNodePruningConfig::aggressive(),
        Err(err) => {
            olaos_logs::warn!("Failed loading EN pruning config ({err}), using aggressive pruning");
            ExternalNodePruningConfig::aggressive()
        }
    };

    let main_node = NodeClient::http("main node", &config.main_node_url)?;
    let external_node = NodeClient::http("external node", &config.external_node_url)?;
    let external_node_health = HttpHealthSource::new(&config.external_node_health_url)?;
    let object_store = ObjectStoreFactory::file_backed(config.artifacts_base_path()).create_store();
    let process: Box<dyn ProcessLiveness> = match config.external_node_pid {
        Some(pid) => Box::new(PidLiveness::new(pid)),
        None => Box::new(UnobservedProcess),
    };

    let (sigint_sender, sigint_receiver) = oneshot::channel();
    let mut sigint_sender = Some(sigint_sender);
    ctrlc::set_handler(move || {
        if let Some(sender) = sigint_sender.take() {
            sender.send(()).ok();
        }
    })
    .context("Error setting Ctrl+C handler")?;
    let (stop_sender, stop_receiver) = watch::channel(false);
    tokio::spawn(async move {
        if sigint_receiver.await.is_ok() {
            olaos_logs::info!("Stop signal received, shutting down");
            stop_sender.send_replace(true);
        }
    });

    let scenario = SnapshotRecoveryScenario {
        config: &config,
        pruning_config: &pruning_config,
        main_node: &main_node,
        external_node: &external_node,
        external_node_health: &external_node_health,
        object_store: &*object_store,
        process: &*process,
        lifecycle: &ExternallyManagedNode,
        stop_receiver,
    };
    match scenario.run().await {
        Ok(outcome) => {
            olaos_logs::info!(
                "Verified recovery from snapshot for L1 batch {} and pruning up to L1 batch {}: {:?}",
                outcome.snapshot.l1_batch_number,
                outcome.pruned_up_to,
                outcome.validation
            );
            Ok(())
        }
        Err(err) => {
            olaos_logs::error!("Verification failed: {err}");
            Err(err.into())
        }
    }
}
