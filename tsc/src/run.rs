//! Runs training for every seed of a [`RunConfig`].
use crate::RunConfig;
use anyhow::Result;
use log::info;
use std::{collections::BTreeMap, fs};
use tsc_agent::latent::{LatentConfig, LinearAutoencoder};
use tsc_core::{
    record::LogRecorder, util::derive_seed, AgentId, AgentSpec, EpisodeEvaluator, Env, Evaluator,
    ExperienceStore, ExperienceStoreConfig, Learner, LearnerPool, Representation, TrainOutcome,
    Trainer,
};
use tsc_env::BlockStreet;

/// Seed stream of the latent representation, disjoint from learner streams.
const REPRESENTATION_STREAM: u64 = 1 << 32;

/// Summary of training with one seed.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Seed of the run.
    pub seed: u64,

    /// Outcome of the training loop.
    pub outcome: TrainOutcome,
}

impl RunSummary {
    /// Mean return of the last `n` episodes.
    pub fn last_mean_return(&self, n: usize) -> f32 {
        let returns = &self.outcome.returns;
        let tail = &returns[returns.len().saturating_sub(n)..];
        match tail.len() {
            0 => 0.0,
            k => tail.iter().sum::<f32>() / k as f32,
        }
    }

    /// Best mean episode return.
    pub fn best_return(&self) -> f32 {
        self.outcome
            .returns
            .iter()
            .copied()
            .fold(f32::MIN, f32::max)
    }
}

/// Trains one pool of independent learners per seed.
///
/// * `model` - model name used in logs and output paths.
/// * `store_config` - configuration of the experience store. Its seed is
///   replaced by one derived from the run seed.
/// * `latent_config` - configuration of the latent representation, used when
///   [`RunConfig::uses_representation`] is `true`. Its input dimension is set from
///   the environment.
/// * `factory` - builds the learner of an agent given its spec and seed.
///
/// Episode returns of all seeds are written to
/// [`RunConfig::result_path`] when [`RunConfig::writes`] is `true`.
pub fn run<L, F>(
    config: &RunConfig,
    model: &str,
    store_config: &ExperienceStoreConfig,
    latent_config: &LatentConfig,
    mut factory: F,
) -> Result<Vec<RunSummary>>
where
    L: Learner,
    F: FnMut(&AgentId, &AgentSpec, u64) -> Result<L>,
{
    let seeds = config.seeds()?;
    let env_config = config.env_config();
    let mut evaluator = match config.writes() {
        true => EpisodeEvaluator::new().output_path(config.result_path(model)),
        false => EpisodeEvaluator::new(),
    };
    info!("{}", config.banner(model));

    let mut summaries = vec![];
    for seed in seeds {
        let env = BlockStreet::build(&env_config, seed as i64)?;
        let specs = env.agent_specs();

        let mut repr = match config.uses_representation() {
            true => {
                let input_dim = specs.values().map(|s| s.obs_dim).sum();
                let latent_config = latent_config.clone().input_dim(input_dim);
                Some(LinearAutoencoder::build(
                    &latent_config,
                    derive_seed(seed, REPRESENTATION_STREAM),
                )?)
            }
            false => None,
        };
        let extra_dim = repr.as_ref().map_or(0, |r| r.latent_dim());
        let specs = specs
            .into_iter()
            .map(|(id, spec)| (id, spec.augmented(extra_dim)))
            .collect::<BTreeMap<_, _>>();

        let mut pool = LearnerPool::build(&specs, true, seed, &mut factory)?;
        let mut store =
            ExperienceStore::build(&store_config.clone().seed(derive_seed(seed, 0)));
        let mut recorder = LogRecorder::new();
        let trainer_config = config.trainer_config(model, seed);

        if config.writes() {
            let model_dir = config.model_dir(model, seed);
            fs::create_dir_all(&model_dir)?;
            env_config.save(model_dir.join("env.yaml"))?;
            trainer_config.save(model_dir.join("trainer.yaml"))?;
        }

        let mut trainer = Trainer::build(trainer_config);
        let outcome = trainer.train(
            env,
            &mut pool,
            &mut store,
            repr.as_mut().map(|r| r as &mut dyn Representation),
            &mut recorder,
            &mut evaluator,
        )?;

        let summary = RunSummary { seed, outcome };
        info!(
            "Seed {}: {} episodes, best return {:.3}, last-10 mean return {:.3}, {:.1}s",
            seed,
            summary.outcome.returns.len(),
            summary.best_return(),
            summary.last_mean_return(10),
            summary.outcome.elapsed.as_secs_f32()
        );
        summaries.push(summary);
    }

    evaluator.persist()?;
    Ok(summaries)
}
