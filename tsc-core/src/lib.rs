#![warn(missing_docs)]
//! Core components for training independent learners on a multi-agent
//! traffic-signal environment.
//!
//! * [`Env`] is a multi-agent environment stepped with a joint action.
//! * [`Learner`] is one agent's trainable policy, collected in a [`LearnerPool`].
//! * [`ExperienceStore`] keeps joint transitions for replay-based learners.
//! * [`Trainer`] runs the episodic training loop and reports to an [`Evaluator`].
pub mod dummy;
pub mod error;
pub mod experience_store;
pub mod record;
pub mod util;

mod base;
pub use base::{
    Act, AgentId, AgentSpec, AgentTransition, Env, Info, JointAct, JointFlag, JointObs,
    JointReward, Learner, Obs, Representation, Step, Transition, UpdateSchedule,
};

mod pool;
pub use pool::LearnerPool;

mod evaluator;
pub use evaluator::{EpisodeEvaluator, EpisodeRecord, Evaluator};

mod trainer;
pub use experience_store::{ExperienceStore, ExperienceStoreConfig};
pub use trainer::{Checkpointer, TrainOutcome, Trainer, TrainerConfig, TrainerState};
