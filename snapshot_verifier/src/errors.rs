use std::time::Duration;

use ola_types::Address;
use olaos_object_store::ObjectStoreError;
use thiserror::Error;

use crate::node::ProcessExit;

/// Returns [`VerificationError::Assertion`] from the enclosing function unless the condition holds.
macro_rules! verify {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::errors::VerificationError::Assertion(format!($($arg)+)));
        }
    };
}

#[derive(Debug, Error)]
pub enum VerificationError {
    /// An invariant about the snapshot or the node under test doesn't hold.
    #[error("verification failed: {0}")]
    Assertion(String),
    #[error("token list contains multiple tokens with L2 address {0:?}")]
    DuplicateKey(Address),
    #[error("external node process exited unexpectedly ({0})")]
    ProcessExited(ProcessExit),
    #[error("{phase} did not finish in {timeout:?}")]
    DeadlineExceeded {
        phase: &'static str,
        timeout: Duration,
    },
    #[error("{phase} was interrupted by a stop signal")]
    Cancelled { phase: &'static str },
    #[error("cannot read snapshot artifact: {0}")]
    Artifact(#[from] ObjectStoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

