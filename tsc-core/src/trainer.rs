//! Train a [`LearnerPool`] on an [`Env`].
mod checkpoint;
mod config;
mod sampler;
use crate::{
    record::{
        AggregateRecorder, Record,
        RecordValue::{Array1, DateTime, Scalar},
    },
    util::mean_return,
    Env, EpisodeRecord, Evaluator, ExperienceStore, JointReward, Learner, LearnerPool,
    Representation, UpdateSchedule,
};
use anyhow::Result;
use chrono::Local;
pub use checkpoint::Checkpointer;
pub use config::TrainerConfig;
use log::{debug, info};
pub use sampler::Sampler;
use std::time::{Duration, Instant};

/// Phase of [`Trainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    /// Components are built and seeded, training has not started.
    Init,

    /// An episode is being sampled.
    EpisodeRunning,

    /// Deferred updates and bookkeeping of a finished episode.
    EpisodeDone,

    /// All episodes are done.
    Terminated,
}

/// Result of [`Trainer::train`].
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Mean return across agents of each episode.
    pub returns: Vec<f32>,

    /// Return of each agent in each episode.
    pub agent_returns: Vec<JointReward>,

    /// Number of environment steps.
    pub env_steps: usize,

    /// Number of optimization steps of learners updated at every step.
    pub opt_steps: usize,

    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episodic training loop.
///
/// # Training loop
///
/// 0. Given an environment, a [`LearnerPool`] built from the environment's
///    agent specs, an [`ExperienceStore`] and optionally a [`Representation`].
///    All of them are seeded from the run seed before training
///    (see [`derive_seed`](crate::util::derive_seed)).
/// 1. Reset the environment. If a representation is given, its latent vector
///    is appended to each agent's observation.
/// 2. Collect the joint action with [`LearnerPool::act_all`] and step the
///    environment, which yields a joint [`Transition`](crate::Transition).
///    `env_steps += 1`
/// 3. Depending on the [`UpdateSchedule`] of the pool:
///     * [`UpdateSchedule::EveryStep`]: push the transition to the store. If
///       the store has reached its minimal fill and
///       `env_steps % opt_interval == 0`, update all learners.
///     * [`UpdateSchedule::EndOfEpisode`]: hand each learner its slice of the
///       transition.
/// 4. Back to step 2 until all agents are done or `max_steps_per_episode` is
///    reached.
/// 5. At the end of the episode, update end-of-episode learners and the
///    representation, record the return of each agent to the [`Evaluator`]
///    and flush the recorder with the episode index.
/// 6. If the episode has the best mean return so far, the parameters are
///    saved in `(model_dir)/best` (see [`Checkpointer`]).
/// 7. Back to step 1 until `n_episodes` episodes are done, then save the
///    parameters in `(model_dir)/final`.
///
/// # States
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Init
///     Init --> EpisodeRunning
///     EpisodeRunning --> EpisodeRunning: step
///     EpisodeRunning --> EpisodeDone: done or step limit
///     EpisodeDone --> EpisodeRunning: episodes left
///     EpisodeDone --> Terminated: no episode left
///     Terminated --> [*]
/// ```
///
/// An error from the environment or a learner ends the run and is returned
/// by [`Trainer::train`].
pub struct Trainer {
    /// Number of episodes.
    n_episodes: usize,

    /// Step limit of an episode.
    max_steps_per_episode: Option<usize>,

    /// Interval of optimization in environment steps.
    opt_interval: usize,

    /// Seed of the run.
    seed: u64,

    /// Saves parameters.
    checkpointer: Checkpointer,

    /// Current phase.
    state: TrainerState,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            n_episodes: config.n_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            opt_interval: config.opt_interval.max(1),
            seed: config.seed,
            checkpointer: Checkpointer::new(config.checkpoint_level, config.model_dir),
            state: TrainerState::Init,
        }
    }

    /// Returns the current phase.
    pub fn state(&self) -> TrainerState {
        self.state
    }

    fn enter(&mut self, state: TrainerState) {
        debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Train the learners in the pool.
    ///
    /// In the training loop, the following values will be pushed into the
    /// given recorder and flushed at the end of each episode:
    ///
    /// * `episode_return` - mean return across agents.
    /// * `{agent}/episode_return` - return of each agent.
    /// * `agent_returns` - returns of all agents, in agent order.
    /// * `episode_steps` - number of steps of the episode.
    /// * `episode_start` - local time at which the episode started.
    /// * `{agent}/...` - values returned by the update of each learner.
    /// * `representation/...` - values returned by the update of the representation.
    pub fn train<E, L, V>(
        &mut self,
        env: E,
        pool: &mut LearnerPool<L>,
        store: &mut ExperienceStore,
        mut representation: Option<&mut dyn Representation>,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut V,
    ) -> Result<TrainOutcome>
    where
        E: Env,
        L: Learner,
        V: Evaluator,
    {
        let schedule = pool.update_schedule();
        let mut sampler = Sampler::new(env);
        let mut returns = Vec::with_capacity(self.n_episodes);
        let mut agent_returns = Vec::with_capacity(self.n_episodes);
        let mut env_steps = 0;
        let mut opt_steps = 0;
        let timer = Instant::now();
        pool.train();

        info!(
            "Start training: {} episodes, {} agents, seed {}",
            self.n_episodes,
            pool.len(),
            self.seed
        );

        for episode in 0..self.n_episodes {
            self.enter(TrainerState::EpisodeRunning);
            let episode_timer = Instant::now();
            let episode_start = Local::now();
            let mut ep_return: JointReward = pool.agent_ids().map(|id| (id.clone(), 0.0)).collect();
            let mut ep_steps = 0;

            loop {
                let (tr, record) = sampler.sample(pool, representation.as_deref_mut())?;
                env_steps += 1;
                ep_steps += 1;
                for (id, r) in tr.reward().iter() {
                    *ep_return.entry(id.clone()).or_insert(0.0) += r;
                }
                let done = tr.done();
                if !record.is_empty() {
                    recorder.store(record);
                }

                match schedule {
                    UpdateSchedule::EveryStep => {
                        store.push(tr);
                        if store.is_ready() && env_steps % self.opt_interval == 0 {
                            let record = pool.update_all(store)?;
                            opt_steps += 1;
                            recorder.store(record);
                        }
                    }
                    UpdateSchedule::EndOfEpisode => pool.observe_all(&tr)?,
                }

                let limit = self.max_steps_per_episode.map_or(false, |m| ep_steps >= m);
                if done || limit {
                    break;
                }
            }
            sampler.end_episode();

            self.enter(TrainerState::EpisodeDone);
            if schedule == UpdateSchedule::EndOfEpisode {
                let record = pool.update_all(store)?;
                recorder.store(record);
            }
            if let Some(repr) = representation.as_deref_mut() {
                if let Some(record) = repr.update()? {
                    recorder.store(record.with_prefix("representation"));
                }
            }

            let duration = episode_timer.elapsed();
            let mut record = Record::empty();
            for (id, r) in ep_return.iter() {
                evaluator.record_episode(EpisodeRecord::new(self.seed, episode, id, *r, duration));
                record.insert(format!("{}/episode_return", id), Scalar(*r));
            }
            let mean = mean_return(&ep_return);
            record.insert("episode_return", Scalar(mean));
            record.insert("agent_returns", Array1(ep_return.values().copied().collect()));
            record.insert("episode_steps", Scalar(ep_steps as f32));
            record.insert("episode_start", DateTime(episode_start));
            recorder.store(record);
            recorder.flush(episode as i64);

            info!(
                "Episode {}/{}: mean return {:.3}, {} steps, {:.2}s",
                episode + 1,
                self.n_episodes,
                mean,
                ep_steps,
                duration.as_secs_f32()
            );

            self.checkpointer
                .on_episode(pool, representation.as_deref(), mean);
            returns.push(mean);
            agent_returns.push(ep_return);
        }

        self.checkpointer
            .on_terminate(pool, representation.as_deref());
        self.enter(TrainerState::Terminated);

        Ok(TrainOutcome {
            returns,
            agent_returns,
            env_steps,
            opt_steps,
            elapsed: timer.elapsed(),
        })
    }
}
