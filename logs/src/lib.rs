pub use tracing::{debug, error, info, instrument, trace, warn};

pub mod telemetry;
