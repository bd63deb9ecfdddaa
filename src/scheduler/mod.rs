// src/scheduler/mod.rs
mod jitter;
mod runner;
mod supervisor;

pub use jitter::{Jitter, DEFAULT_MAX_JITTER};
pub use runner::ProbeRunner;
pub use supervisor::Supervisor;
