//! Actor-critic learner updated once per episode.
mod base;
mod config;
pub use base::{gae, ActorCritic};
pub use config::ActorCriticConfig;
