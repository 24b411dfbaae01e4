//! Linear function approximator.
use anyhow::Result;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Affine map `y = W x + b`.
///
/// Parameters are initialized uniformly in `[-1/sqrt(in_dim), 1/sqrt(in_dim)]`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Linear {
    /// Weights, `out_dim x in_dim`.
    w: Array2<f32>,

    /// Biases, `out_dim`.
    b: Array1<f32>,
}

impl Linear {
    /// Constructs a randomly initialized model.
    pub fn new(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Self {
        let k = 1.0 / (in_dim.max(1) as f32).sqrt();
        let w = Array2::from_shape_simple_fn((out_dim, in_dim), || rng.gen_range(-k..=k));
        let b = Array1::from_shape_simple_fn(out_dim, || rng.gen_range(-k..=k));
        Self { w, b }
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.w.ncols()
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.w.nrows()
    }

    /// Applies the model to a single input.
    pub fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        self.w.dot(x) + &self.b
    }

    /// Applies the model to a batch of inputs, one per row.
    pub fn forward_batch(&self, x: &Array2<f32>) -> Array2<f32> {
        x.dot(&self.w.t()) + &self.b
    }

    /// Takes a gradient descent step.
    ///
    /// * `x` - inputs of the batch, one per row.
    /// * `grad_out` - gradient of the loss with respect to the outputs,
    ///   one row per input.
    /// * `lr` - learning rate.
    pub fn sgd_step(&mut self, x: &Array2<f32>, grad_out: &Array2<f32>, lr: f32) {
        let grad_w = grad_out.t().dot(x);
        let grad_b = grad_out.sum_axis(Axis(0));
        self.w.scaled_add(-lr, &grad_w);
        self.b.scaled_add(-lr, &grad_b);
    }

    /// Copies the parameters of `src`.
    pub fn copy_from(&mut self, src: &Linear) {
        self.w.assign(&src.w);
        self.b.assign(&src.b);
    }

    /// Returns the weights.
    pub fn weights(&self) -> &Array2<f32> {
        &self.w
    }

    /// Saves the parameters with bincode.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    /// Loads parameters saved with [`Linear::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use rand::{rngs::SmallRng, SeedableRng};
    use tempdir::TempDir;

    #[test]
    fn test_forward() {
        let model = Linear {
            w: arr2(&[[1.0, 2.0], [0.0, -1.0], [0.5, 0.5]]),
            b: arr1(&[0.0, 1.0, -1.0]),
        };
        let expected: Array1<f32> = arr1(&[3.0, 0.0, 0.0]);
        assert_eq!(model.forward(&arr1(&[1.0, 1.0])), expected);
        let y = model.forward_batch(&arr2(&[[1.0, 1.0], [2.0, 0.0]]));
        let expected: Array2<f32> = arr2(&[[3.0, 0.0, 0.0], [2.0, 1.0, 0.0]]);
        assert_eq!(y, expected);
    }

    #[test]
    fn test_sgd_reduces_squared_error() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut model = Linear::new(2, 1, &mut rng);
        let x: Array2<f32> = arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let y: Array2<f32> = arr2(&[[1.0], [-1.0], [0.0]]);
        let loss = |m: &Linear| (m.forward_batch(&x) - &y).mapv(|e| e * e).mean().unwrap_or(0.0);

        let before = loss(&model);
        for _ in 0..1000 {
            let grad = (model.forward_batch(&x) - &y) * (2.0 / 3.0);
            model.sgd_step(&x, &grad, 0.1);
        }
        assert!(loss(&model) < before);
        assert!(loss(&model) < 1e-3);
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(1);
        let model = Linear::new(11, 2, &mut rng);
        let dir = TempDir::new("linear")?;
        let path = dir.path().join("model.bincode");
        model.save(&path)?;
        assert_eq!(Linear::load(&path)?, model);
        Ok(())
    }
}
