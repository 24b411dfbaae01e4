use anyhow::Result;
use std::collections::BTreeMap;
use tsc_agent::{
    actor_critic::{ActorCritic, ActorCriticConfig},
    dqn::{Dqn, DqnConfig},
    latent::{LatentConfig, LinearAutoencoder},
};
use tsc_core::{
    dummy::{DummyEnv, DummyEnvConfig},
    error::MarlError,
    record::NullRecorder,
    util::derive_seed,
    AgentId, AgentSpec, EpisodeEvaluator, Env, ExperienceStore, ExperienceStoreConfig,
    LearnerPool, Representation, Trainer, TrainerConfig,
};

fn actor_critic_pool(
    env: &DummyEnv,
    extra_dim: usize,
    seed: u64,
) -> Result<LearnerPool<ActorCritic>> {
    let specs = env
        .agent_specs()
        .into_iter()
        .map(|(id, spec)| (id, spec.augmented(extra_dim)))
        .collect::<BTreeMap<_, _>>();
    LearnerPool::build(&specs, true, seed, |id: &AgentId, spec: &AgentSpec, seed| {
        let config = ActorCriticConfig::default()
            .obs_dim(spec.obs_dim)
            .n_actions(spec.n_actions);
        Ok(ActorCritic::build(id.clone(), config, seed))
    })
}

fn dqn_pool(env: &DummyEnv, seed: u64) -> Result<LearnerPool<Dqn>> {
    LearnerPool::build(&env.agent_specs(), true, seed, |id: &AgentId, spec: &AgentSpec, seed| {
        let config = DqnConfig::default()
            .obs_dim(spec.obs_dim)
            .n_actions(spec.n_actions)
            .batch_size(4);
        Ok(Dqn::build(id.clone(), config, seed))
    })
}

#[test]
fn actor_critic_updates_once_after_last_step() -> Result<()> {
    let env = DummyEnv::build(&DummyEnvConfig::new(3, 4, 10), 0)?;
    let mut pool = actor_critic_pool(&env, 0, 42)?;
    let mut store = ExperienceStore::build(&ExperienceStoreConfig::default());
    let mut trainer = Trainer::build(TrainerConfig::default().n_episodes(1));

    let outcome = trainer.train(
        env,
        &mut pool,
        &mut store,
        None,
        &mut NullRecorder::new(),
        &mut EpisodeEvaluator::new(),
    )?;

    assert_eq!(outcome.env_steps, 10);
    assert_eq!(pool.len(), 3);
    for (_, learner) in pool.iter() {
        assert_eq!(learner.n_updates(), 1);
        assert_eq!(learner.rollout_len(), 0);
    }
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn dqn_trains_after_minimal_fill() -> Result<()> {
    let env = DummyEnv::build(&DummyEnvConfig::new(2, 3, 10), 0)?;
    let mut pool = dqn_pool(&env, 42)?;
    let mut store = ExperienceStore::build(
        &ExperienceStoreConfig::default()
            .capacity(15)
            .minimal_fill(6)
            .seed(derive_seed(42, 0)),
    );
    let mut trainer = Trainer::build(TrainerConfig::default().n_episodes(2));

    let outcome = trainer.train(
        env,
        &mut pool,
        &mut store,
        None,
        &mut NullRecorder::new(),
        &mut EpisodeEvaluator::new(),
    )?;

    // Updates at steps 6 to 20.
    assert_eq!(outcome.opt_steps, 15);
    assert_eq!(store.len(), 15);
    for (_, learner) in pool.iter() {
        assert_eq!(learner.n_opts(), 15);
    }
    Ok(())
}

#[test]
fn mismatched_dims_rejected_before_training() -> Result<()> {
    let env_config = DummyEnvConfig::new(2, 4, 10).obs_dims(vec![4, 5]);
    let env = DummyEnv::build(&env_config, 0)?;
    let err = dqn_pool(&env, 0).err().ok_or_else(|| anyhow::anyhow!("pool was built"))?;
    assert!(matches!(
        err.downcast_ref::<MarlError>(),
        Some(MarlError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn latent_is_appended_to_observations() -> Result<()> {
    let env = DummyEnv::build(&DummyEnvConfig::new(2, 3, 5), 0)?;
    let latent_config = LatentConfig::default().input_dim(6).latent_dim(4);
    let mut repr = LinearAutoencoder::build(&latent_config, 1)?;
    let mut pool = actor_critic_pool(&env, repr.latent_dim(), 42)?;
    let mut store = ExperienceStore::build(&ExperienceStoreConfig::default());
    let mut trainer = Trainer::build(TrainerConfig::default().n_episodes(2));

    let outcome = trainer.train(
        env,
        &mut pool,
        &mut store,
        Some(&mut repr),
        &mut NullRecorder::new(),
        &mut EpisodeEvaluator::new(),
    )?;

    assert_eq!(outcome.returns.len(), 2);
    for (_, learner) in pool.iter() {
        assert_eq!(learner.n_updates(), 2);
    }
    Ok(())
}

#[test]
fn same_seed_same_returns() -> Result<()> {
    let run = |seed: u64| -> Result<Vec<f32>> {
        let env = DummyEnv::build(&DummyEnvConfig::new(2, 3, 10), 0)?;
        let mut pool = actor_critic_pool(&env, 0, seed)?;
        let mut store = ExperienceStore::build(&ExperienceStoreConfig::default());
        let mut trainer = Trainer::build(TrainerConfig::default().n_episodes(3).seed(seed));
        let outcome = trainer.train(
            env,
            &mut pool,
            &mut store,
            None,
            &mut NullRecorder::new(),
            &mut EpisodeEvaluator::new(),
        )?;
        Ok(outcome.returns)
    };
    assert_eq!(run(42)?, run(42)?);
    Ok(())
}
