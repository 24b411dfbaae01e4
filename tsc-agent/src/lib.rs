//! Learners for multi-agent traffic-signal control.
//!
//! All learners implement [`tsc_core::Learner`] and are trained independently,
//! one per intersection:
//!
//! * [`dqn::Dqn`] - independent DQN, updated at every step from the shared
//!   [`ExperienceStore`](tsc_core::ExperienceStore).
//! * [`actor_critic::ActorCritic`] - clipped-ratio actor-critic, updated once
//!   per episode from its own rollout.
//!
//! [`latent::LinearAutoencoder`] is a [`Representation`](tsc_core::Representation)
//! of the joint observation whose latent vector can be appended to the
//! observation of every agent.
pub mod actor_critic;
pub mod dqn;
pub mod latent;
pub mod model;
pub mod util;
