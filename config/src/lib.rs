use std::path::{Path, PathBuf};

use environment::Environment;
use serde::de::DeserializeOwned;

pub mod environment;
pub mod external_node;
pub mod snapshot_verifier;
#[cfg(test)]
pub(crate) mod utils;

pub fn envy_try_load<T: DeserializeOwned>(prefix: &str) -> Result<T, envy::Error> {
    envy::prefixed(prefix).from_env()
}

pub fn load_config<P: AsRef<Path>, T: DeserializeOwned>(
    path: P,
    prefix: &str,
) -> Result<T, config::ConfigError> {
    let mut settings = config::Config::default();
    let base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let configuration_directory = base_path.join(path);
    // Read the "default" configuration file
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("OLAOS_APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(false),
    )?;
    // E.g. `OLAOS_SNAPSHOT_VERIFIER__POLL_INTERVAL_MS=500` sets `poll_interval_ms`
    settings.merge(config::Environment::with_prefix(prefix).separator("__"))?;
    settings.try_into()
}
