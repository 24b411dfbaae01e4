//! Collects per-episode returns of a training run.
use crate::AgentId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
mod episode_evaluator;
pub use episode_evaluator::EpisodeEvaluator;

/// Return of one agent in one episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Seed of the run.
    pub seed: u64,

    /// Index of the episode in the run, starting from 0.
    pub episode: usize,

    /// Agent.
    pub agent_id: String,

    /// Undiscounted sum of rewards over the episode.
    pub episode_return: f32,

    /// Wall-clock duration of the episode in seconds.
    pub duration_secs: f64,
}

impl EpisodeRecord {
    /// Constructs a record.
    pub fn new(
        seed: u64,
        episode: usize,
        agent_id: &AgentId,
        episode_return: f32,
        duration: Duration,
    ) -> Self {
        Self {
            seed,
            episode,
            agent_id: agent_id.to_string(),
            episode_return,
            duration_secs: duration.as_secs_f64(),
        }
    }
}

/// Accumulates episode records and optionally persists them.
///
/// Records are append-only across a run.
pub trait Evaluator {
    /// Appends the return of an agent for an episode.
    fn record_episode(&mut self, record: EpisodeRecord);

    /// Writes the accumulated records to the evaluator's destination.
    fn persist(&mut self) -> Result<()>;
}
