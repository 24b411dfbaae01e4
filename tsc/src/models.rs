//! Hyperparameters of the trained models.
use crate::{run, RunConfig, RunSummary};
use anyhow::Result;
use tsc_agent::{
    actor_critic::{ActorCritic, ActorCriticConfig},
    dqn::{Dqn, DqnConfig, DqnExplorer, EpsilonGreedy},
    latent::LatentConfig,
};
use tsc_core::{AgentId, AgentSpec, ExperienceStoreConfig};

const IDQN: &str = "IDQN";
const OURS: &str = "Ours";

fn latent_config() -> LatentConfig {
    LatentConfig::default().latent_dim(10)
}

/// Trains independent DQN learners.
///
/// The latent representation is off unless the configuration turns it on.
pub fn run_idqn(config: &RunConfig) -> Result<Vec<RunSummary>> {
    let model = config.model_name_or(IDQN);
    let store_config = ExperienceStoreConfig::default()
        .capacity(10000)
        .minimal_fill(1000);
    let explorer = EpsilonGreedy::new()
        .eps_start(0.8)
        .eps_final(0.02)
        .final_step(config.env_config().grid.steps_per_episode() * config.episodes / 2);

    run(
        config,
        model,
        &store_config,
        &latent_config(),
        |id: &AgentId, spec: &AgentSpec, seed| {
            let agent_config = DqnConfig::default()
                .obs_dim(spec.obs_dim)
                .n_actions(spec.n_actions)
                .lr(1e-3)
                .discount_factor(0.98)
                .target_update_interval(5)
                .batch_size(20)
                .explorer(DqnExplorer::EpsilonGreedy(explorer.clone()));
            Ok(Dqn::build(id.clone(), agent_config, seed))
        },
    )
}

/// Trains independent actor-critic learners.
///
/// The latent representation is on unless the configuration turns it off.
pub fn run_ours(config: &RunConfig) -> Result<Vec<RunSummary>> {
    let config = config.clone().representation_or(true);
    let model = config.model_name_or(OURS);

    run(
        &config,
        model,
        &ExperienceStoreConfig::default(),
        &latent_config(),
        |id: &AgentId, spec: &AgentSpec, seed| {
            let agent_config = ActorCriticConfig::default()
                .obs_dim(spec.obs_dim)
                .n_actions(spec.n_actions)
                .actor_lr(1e-4)
                .critic_lr(1e-3)
                .discount_factor(0.99)
                .lambda(0.95)
                .epochs(10)
                .clip_eps(0.2);
            Ok(ActorCritic::build(id.clone(), agent_config, seed))
        },
    )
}
