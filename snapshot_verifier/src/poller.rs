//! Periodic polling of node health.

use std::time::Duration;

use olaos_health_check::AppHealthReport;
use tokio::sync::watch;

use crate::{errors::VerificationError, health::HealthSource, node::ProcessLiveness};

/// Decision returned by a health report observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    Done,
}

/// Fetches health reports at a fixed interval and feeds them to an observer until
/// the observer is done or fails. Polling also stops on a deadline, a stop signal
/// or the exit of the node process.
#[derive(Debug)]
pub struct HealthPoller<'a> {
    source: &'a dyn HealthSource,
    interval: Duration,
    stop_receiver: watch::Receiver<bool>,
}

impl<'a> HealthPoller<'a> {
    pub fn new(
        source: &'a dyn HealthSource,
        interval: Duration,
        stop_receiver: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source,
            interval,
            stop_receiver,
        }
    }

    /// Polls until `observer` returns [`PollStep::Done`]. Unreachable-node responses are skipped;
    /// observer errors are returned as is. `process` is checked on every tick, whether or not
    /// the node responded.
    pub async fn poll<F>(
        &self,
        phase: &'static str,
        timeout: Option<Duration>,
        process: &dyn ProcessLiveness,
        mut observer: F,
    ) -> Result<(), VerificationError>
    where
        F: FnMut(&AppHealthReport) -> Result<PollStep, VerificationError>,
    {
        olaos_logs::info!("Polling node health: {phase}");
        let poll_loop = async {
            tokio::select! {
                result = self.poll_until_done(process, &mut observer) => result,
                () = wait_for_stop_signal(self.stop_receiver.clone()) => {
                    olaos_logs::warn!("Stop signal received, interrupting {phase}");
                    Err(VerificationError::Cancelled { phase })
                }
            }
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, poll_loop)
                .await
                .map_err(|_| VerificationError::DeadlineExceeded { phase, timeout })?,
            None => poll_loop.await,
        }
    }

    async fn poll_until_done<F>(
        &self,
        process: &dyn ProcessLiveness,
        observer: &mut F,
    ) -> Result<(), VerificationError>
    where
        F: FnMut(&AppHealthReport) -> Result<PollStep, VerificationError>,
    {
        loop {
            tokio::time::sleep(self.interval).await;
            let report = self.source.fetch_health().await?;
            if let Some(exit) = process.exit_status() {
                return Err(VerificationError::ProcessExited(exit));
            }
            let Some(report) = report else {
                olaos_logs::debug!("Node is unreachable, retrying in {:?}", self.interval);
                continue;
            };
            if observer(&report)? == PollStep::Done {
                return Ok(());
            }
        }
    }
}

async fn wait_for_stop_signal(mut stop_receiver: watch::Receiver<bool>) {
    if stop_receiver.wait_for(|&stop| stop).await.is_err() {
        // The sender is dropped, so a stop can never be requested.
        std::future::pending::<()>().await;
    }
}
