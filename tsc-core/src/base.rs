//! Core functionalities.
mod env;
mod learner;
mod representation;
mod step;
mod transition;
mod types;
pub use env::Env;
pub use learner::{Learner, UpdateSchedule};
pub use representation::Representation;
pub use step::{Info, Step};
pub use transition::{AgentTransition, Transition};
pub use types::{Act, AgentId, AgentSpec, JointAct, JointFlag, JointObs, JointReward, Obs};
