//! Experience store shared by replay-based learners.
//!
//! The store keeps joint [`Transition`](crate::Transition)s, one slot per
//! timestep covering all agents. Each replay-based learner draws its own
//! batch and takes its own slice with [`JointBatch::agent_slice`].
//!
//! ```rust
//! use tsc_core::{ExperienceStore, ExperienceStoreConfig};
//!
//! let config = ExperienceStoreConfig::default()
//!     .capacity(10000)
//!     .minimal_fill(1000)
//!     .seed(42);
//! let store = ExperienceStore::build(&config);
//! assert!(!store.is_ready());
//! ```
mod base;
mod batch;
mod config;
pub use base::ExperienceStore;
pub use batch::{AgentBatch, JointBatch};
pub use config::ExperienceStoreConfig;
