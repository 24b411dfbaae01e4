//! Saving parameters of learners during training.
use crate::{Learner, LearnerPool, Representation};
use anyhow::Result;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Decides when the parameters of a [`LearnerPool`] are written.
///
/// With level 0 nothing is written. With level 1 and above, the parameters
/// are written to `{model_dir}/best` whenever an episode reaches a new best
/// mean return, and to `{model_dir}/final` at the end of the run. A
/// representation, if any, is written next to the learners under
/// `representation`.
///
/// A failure to write is logged and does not stop training.
pub struct Checkpointer {
    level: usize,
    model_dir: Option<PathBuf>,
    max_return: f32,
}

impl Checkpointer {
    /// Constructs a checkpointer.
    pub fn new(level: usize, model_dir: Option<impl AsRef<Path>>) -> Self {
        Self {
            level,
            model_dir: model_dir.map(|p| p.as_ref().to_path_buf()),
            max_return: f32::MIN,
        }
    }

    /// Returns the best mean episode return seen so far.
    pub fn max_return(&self) -> f32 {
        self.max_return
    }

    fn enabled(&self) -> Option<&Path> {
        match self.level {
            0 => None,
            _ => self.model_dir.as_deref(),
        }
    }

    /// Called at the end of each episode with its mean return across agents.
    ///
    /// Returns `true` if parameters were written.
    pub fn on_episode<L: Learner>(
        &mut self,
        pool: &LearnerPool<L>,
        repr: Option<&(dyn Representation + '_)>,
        mean_return: f32,
    ) -> bool {
        if mean_return <= self.max_return {
            return false;
        }
        self.max_return = mean_return;

        match self.enabled() {
            Some(dir) => {
                let path = dir.join("best");
                save(pool, repr, &path, mean_return)
            }
            None => false,
        }
    }

    /// Called once when training terminates.
    pub fn on_terminate<L: Learner>(
        &self,
        pool: &LearnerPool<L>,
        repr: Option<&(dyn Representation + '_)>,
    ) -> bool {
        match self.enabled() {
            Some(dir) => save(pool, repr, &dir.join("final"), self.max_return),
            None => false,
        }
    }
}

fn save_all<L: Learner>(
    pool: &LearnerPool<L>,
    repr: Option<&(dyn Representation + '_)>,
    path: &Path,
) -> Result<()> {
    pool.save_params(path)?;
    if let Some(repr) = repr {
        repr.save_params(&path.join("representation"))?;
    }
    Ok(())
}

fn save<L: Learner>(
    pool: &LearnerPool<L>,
    repr: Option<&(dyn Representation + '_)>,
    path: &Path,
    ret: f32,
) -> bool {
    match save_all(pool, repr, path) {
        Ok(()) => {
            info!("Saved the model in {:?} (mean return {:.3})", path, ret);
            true
        }
        Err(e) => {
            warn!("Failed to save the model in {:?}: {}", path, e);
            false
        }
    }
}
