//! Training of independent traffic-signal controllers.
//!
//! The binaries `run_idqn` and `run_ours` parse a [`RunConfig`] and call
//! [`run_idqn`] or [`run_ours`], which train one learner per intersection of
//! a signal grid for every seed of the configuration.
mod config;
mod models;
mod run;
pub use config::{RunConfig, Task};
pub use models::{run_idqn, run_ours};
pub use run::{run, RunSummary};
