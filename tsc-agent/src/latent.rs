//! Latent representation of the joint observation.
use crate::{model::Linear, util::stack_rows};
use anyhow::Result;
use log::{debug, info};
use ndarray::{Array1, Array2};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};
use tsc_core::{
    error::MarlError,
    record::{Record, RecordValue},
    util::flatten_obs,
    JointObs, Representation,
};

/// Configuration of [`LinearAutoencoder`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LatentConfig {
    /// Length of the concatenated joint observation.
    pub input_dim: usize,

    /// Length of the latent vector.
    pub latent_dim: usize,

    /// Learning rate.
    pub lr: f32,

    /// Number of passes over the observations of an episode per update.
    pub epochs: usize,
}

impl Default for LatentConfig {
    fn default() -> Self {
        Self {
            input_dim: 0,
            latent_dim: 10,
            lr: 1e-3,
            epochs: 1,
        }
    }
}

impl LatentConfig {
    /// Sets the input dimension.
    pub fn input_dim(mut self, v: usize) -> Self {
        self.input_dim = v;
        self
    }

    /// Sets the latent dimension.
    pub fn latent_dim(mut self, v: usize) -> Self {
        self.latent_dim = v;
        self
    }

    /// Sets the learning rate.
    pub fn lr(mut self, v: f32) -> Self {
        self.lr = v;
        self
    }

    /// Sets the number of epochs per update.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Loads [`LatentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`LatentConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Autoencoder `x -> tanh(E x) -> D h` of the concatenated joint observation.
///
/// The latent vector is `tanh(E x)`. Observations are collected during an
/// episode and [`Representation::update`] fits the reconstruction on them
/// by gradient descent on the mean squared error.
pub struct LinearAutoencoder {
    encoder: Linear,
    decoder: Linear,
    lr: f32,
    epochs: usize,
    buf: Vec<Array1<f32>>,
}

impl LinearAutoencoder {
    /// Constructs the autoencoder.
    ///
    /// Fails if the input or latent dimension is zero.
    pub fn build(config: &LatentConfig, seed: u64) -> Result<Self> {
        if config.input_dim == 0 || config.latent_dim == 0 {
            return Err(MarlError::Configuration(format!(
                "autoencoder needs positive dimensions, got {} -> {}",
                config.input_dim, config.latent_dim
            ))
            .into());
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let encoder = Linear::new(config.input_dim, config.latent_dim, &mut rng);
        let decoder = Linear::new(config.latent_dim, config.input_dim, &mut rng);
        info!(
            "Built autoencoder: {} -> {} features",
            config.input_dim, config.latent_dim
        );

        Ok(Self {
            encoder,
            decoder,
            lr: config.lr,
            epochs: config.epochs.max(1),
            buf: vec![],
        })
    }

    /// Mean squared reconstruction error of a joint observation.
    pub fn reconstruction_error(&self, obs: &JointObs) -> f32 {
        let x = flatten_obs(obs);
        let h = self.encoder.forward(&x).mapv(f32::tanh);
        let r = self.decoder.forward(&h);
        (r - &x).mapv(|e| e * e).mean().unwrap_or(0.0)
    }

    fn step(&mut self, x: &Array2<f32>) -> f32 {
        let (n, d) = (x.nrows() as f32, x.ncols() as f32);
        let h = self.encoder.forward_batch(x).mapv(f32::tanh);
        let r = self.decoder.forward_batch(&h);
        let err = r - x;
        let loss = err.mapv(|e| e * e).sum() / (n * d);

        let grad_r = err * (2.0 / (n * d));
        let grad_h = grad_r.dot(self.decoder.weights());
        let grad_z = grad_h * h.mapv(|v| 1.0 - v * v);

        self.decoder.sgd_step(&h, &grad_r, self.lr);
        self.encoder.sgd_step(x, &grad_z, self.lr);
        loss
    }
}

impl Representation for LinearAutoencoder {
    fn latent_dim(&self) -> usize {
        self.encoder.out_dim()
    }

    fn encode(&self, obs: &JointObs) -> Array1<f32> {
        self.encoder.forward(&flatten_obs(obs)).mapv(f32::tanh)
    }

    fn observe(&mut self, obs: &JointObs) {
        self.buf.push(flatten_obs(obs));
    }

    fn update(&mut self) -> Result<Option<Record>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let x = stack_rows(self.buf.iter())?;
        self.buf.clear();

        let mut loss = 0.0;
        for _ in 0..self.epochs {
            loss = self.step(&x);
        }
        debug!("Autoencoder loss {:.5} on {} observations", loss, x.nrows());

        Ok(Some(Record::from_slice(&[(
            "loss_recon",
            RecordValue::Scalar(loss),
        )])))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.encoder.save(path.join("encoder.bincode"))?;
        self.decoder.save(path.join("decoder.bincode"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.encoder = Linear::load(path.join("encoder.bincode"))?;
        self.decoder = Linear::load(path.join("decoder.bincode"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempdir::TempDir;
    use tsc_core::AgentId;

    fn joint_obs(t: usize) -> JointObs {
        let v = (t % 4) as f32 / 4.0;
        BTreeMap::from([
            (AgentId::from("J0_0"), Array1::from_elem(3, v)),
            (AgentId::from("J0_1"), Array1::from_elem(3, 1.0 - v)),
        ])
    }

    fn autoencoder(seed: u64) -> LinearAutoencoder {
        let config = LatentConfig::default()
            .input_dim(6)
            .latent_dim(2)
            .lr(0.05)
            .epochs(20);
        LinearAutoencoder::build(&config, seed).unwrap()
    }

    #[test]
    fn test_zero_input_dim_rejected() {
        let err = LinearAutoencoder::build(&LatentConfig::default(), 0)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<MarlError>(),
            Some(MarlError::Configuration(_))
        ));
    }

    #[test]
    fn test_encode_dim() {
        let ae = autoencoder(0);
        assert_eq!(ae.latent_dim(), 2);
        let z = ae.encode(&joint_obs(1));
        assert_eq!(z.len(), 2);
        assert!(z.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn test_update_reduces_reconstruction_error() -> Result<()> {
        let mut ae = autoencoder(0);
        let obs = joint_obs(1);
        let before = ae.reconstruction_error(&obs);

        assert!(ae.update()?.is_none());
        for _ in 0..50 {
            for t in 0..8 {
                ae.observe(&joint_obs(t));
            }
            let record = ae.update()?.unwrap_or_default();
            assert!(record.get_scalar("loss_recon").is_ok());
        }
        assert!(ae.reconstruction_error(&obs) < before);
        Ok(())
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let ae = autoencoder(0);
        let dir = TempDir::new("latent")?;
        ae.save_params(dir.path())?;
        let mut restored = autoencoder(1);
        restored.load_params(dir.path())?;
        assert_eq!(restored.encode(&joint_obs(2)), ae.encode(&joint_obs(2)));
        Ok(())
    }
}
