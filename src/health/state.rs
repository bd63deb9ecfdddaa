// src/health/state.rs
use crate::probe::ProbeError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Good,
    Bad,
}

impl Health {
    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Good => "good",
            Health::Bad => "bad",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single run did to a probe's health.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Good before, good now.
    Steady,
    /// Good -> Bad.
    FirstFailure { error: Arc<ProbeError> },
    /// Bad -> Bad. Never forwarded to a notifier.
    StillFailing { error: Arc<ProbeError> },
    /// Bad -> Good, carrying the error that was stored while down.
    Recovered {
        previous: Arc<ProbeError>,
        down_for: chrono::Duration,
    },
}

impl Transition {
    /// True only for edges that should reach an alert sink.
    pub fn is_notifying(&self) -> bool {
        matches!(
            self,
            Transition::FirstFailure { .. } | Transition::Recovered { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transition::Steady => "steady",
            Transition::FirstFailure { .. } => "first_failure",
            Transition::StillFailing { .. } => "still_failing",
            Transition::Recovered { .. } => "recovered",
        }
    }
}

/// Good/Bad state of one probe. Owned by that probe's runner task alone.
#[derive(Debug)]
pub struct HealthState {
    health: Health,
    last_error: Option<Arc<ProbeError>>,
    since: DateTime<Utc>,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            health: Health::Good,
            last_error: None,
            since: Utc::now(),
        }
    }

    pub fn health(&self) -> Health {
        self.health
    }

    /// Present only while `Bad`.
    pub fn last_error(&self) -> Option<&ProbeError> {
        self.last_error.as_deref()
    }

    /// When the current state was entered.
    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    /// Fold one run outcome into the state.
    pub fn observe(&mut self, outcome: Result<(), ProbeError>) -> Transition {
        self.observe_at(outcome, Utc::now())
    }

    pub fn observe_at(&mut self, outcome: Result<(), ProbeError>, now: DateTime<Utc>) -> Transition {
        match (self.health, outcome) {
            (Health::Good, Ok(())) => Transition::Steady,
            (Health::Good, Err(e)) => {
                let error = Arc::new(e);
                self.health = Health::Bad;
                self.last_error = Some(error.clone());
                self.since = now;
                Transition::FirstFailure { error }
            }
            (Health::Bad, Err(e)) => {
                let error = Arc::new(e);
                self.last_error = Some(error.clone());
                Transition::StillFailing { error }
            }
            (Health::Bad, Ok(())) => {
                let down_for = now - self.since;
                self.health = Health::Good;
                self.since = now;
                match self.last_error.take() {
                    Some(previous) => Transition::Recovered { previous, down_for },
                    // Bad always carries an error; treat a missing one as no edge
                    None => Transition::Steady,
                }
            }
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
