//! Traffic-signal environments.
//!
//! [`SignalGridEnv`] simulates a grid of signalized intersections at one
//! second resolution, with one agent per intersection. [`BlockStreet`] wraps
//! it and blocks random approaches in every episode.
//!
//! ```no_run
//! use tsc_core::Env;
//! use tsc_env::{Level, SignalGridConfig, SignalGridEnv};
//!
//! let config = SignalGridConfig::default().level(Level::Hard).num_seconds(3600);
//! let mut env = SignalGridEnv::build(&config, 42)?;
//! let obs = env.reset()?;
//! assert_eq!(obs.len(), 9);
//! # Ok::<(), anyhow::Error>(())
//! ```
mod base;
mod block;
mod config;
pub use base::{Blockage, SignalGridEnv, N_APPROACHES, N_PHASES, OBS_DIM};
pub use block::{BlockStreet, BlockStreetConfig};
pub use config::{Level, SignalGridConfig};
