//! In-memory evaluator with optional CSV output.
use super::{EpisodeRecord, Evaluator};
use anyhow::Result;
use log::info;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Keeps [`EpisodeRecord`]s in memory.
///
/// If an output path is given, [`Evaluator::persist`] writes all records to
/// it as CSV, one row per (seed, episode, agent). Otherwise persisting does
/// nothing.
///
/// ```ignore
/// let mut evaluator = EpisodeEvaluator::new().output_path("result/block_normal/IDQN.csv");
/// trainer.train(env, &mut pool, &mut store, None, &mut recorder, &mut evaluator)?;
/// evaluator.persist()?;
/// ```
#[derive(Default)]
pub struct EpisodeEvaluator {
    records: Vec<EpisodeRecord>,
    output_path: Option<PathBuf>,
}

impl EpisodeEvaluator {
    /// Constructs an evaluator without output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CSV file written by [`Evaluator::persist`].
    pub fn output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Returns all records in insertion order.
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// Returns the mean return across agents of each (seed, episode).
    pub fn episode_returns(&self) -> Vec<f32> {
        let mut sums: BTreeMap<(u64, usize), (f32, usize)> = BTreeMap::new();
        for r in self.records.iter() {
            let e = sums.entry((r.seed, r.episode)).or_insert((0.0, 0));
            e.0 += r.episode_return;
            e.1 += 1;
        }
        sums.values().map(|(s, n)| s / *n as f32).collect()
    }
}

impl Evaluator for EpisodeEvaluator {
    fn record_episode(&mut self, record: EpisodeRecord) {
        self.records.push(record);
    }

    fn persist(&mut self) -> Result<()> {
        let path = match &self.output_path {
            Some(path) => path,
            None => return Ok(()),
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut wtr = csv::Writer::from_path(path)?;
        for r in self.records.iter() {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
        info!("Saved {} episode records in {:?}", self.records.len(), path);

        Ok(())
    }
}
