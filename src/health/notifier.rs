// src/health/notifier.rs
use super::Transition;
use async_trait::async_trait;
use tracing::{info, warn};

/// Alert sink. Only receives transitions where [`Transition::is_notifying`]
/// is true, so a long outage produces one failure and one recovery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, probe: &str, transition: &Transition);

    fn name(&self) -> &'static str;
}

/// Writes notifications to the log stream.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, probe: &str, transition: &Transition) {
        match transition {
            Transition::FirstFailure { error } => {
                warn!(probe = %probe, kind = error.kind(), "Probe {} failed: {}", probe, error);
            }
            Transition::Recovered { previous, down_for } => {
                info!(
                    probe = %probe,
                    down_secs = down_for.num_seconds(),
                    "Probe {} recovered from failure: {}",
                    probe,
                    previous
                );
            }
            Transition::Steady | Transition::StillFailing { .. } => {}
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
