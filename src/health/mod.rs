// src/health/mod.rs
mod notifier;
mod state;

pub use notifier::{LogNotifier, Notifier};
pub use state::{Health, HealthState, Transition};
