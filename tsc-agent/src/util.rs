//! Utilities.
use anyhow::Result;
use ndarray::{stack, Array1, Array2, ArrayView1, Axis};
use rand::{distributions::WeightedIndex, Rng};

/// Softmax of a vector of preferences.
pub fn softmax(x: &Array1<f32>) -> Array1<f32> {
    let max = x.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let e = x.mapv(|v| (v - max).exp());
    let s = e.sum();
    e / s
}

/// Row-wise softmax.
pub fn softmax_rows(x: &Array2<f32>) -> Array2<f32> {
    let mut y = x.clone();
    for mut row in y.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let s = row.sum();
        row /= s;
    }
    y
}

/// Index of the largest value, the first one on ties.
pub fn argmax(x: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in x.iter().enumerate() {
        if v > x[best] {
            best = i;
        }
    }
    best
}

/// Samples an index with probabilities `probs`.
///
/// Falls back to the most probable index if `probs` are not valid weights.
pub fn sample_categorical(probs: &Array1<f32>, rng: &mut impl Rng) -> usize {
    match WeightedIndex::new(probs.iter()) {
        Ok(dist) => rng.sample(dist),
        Err(_) => argmax(probs.view()),
    }
}

/// Stacks 1-dimensional arrays as the rows of a matrix.
pub fn stack_rows<'a>(rows: impl Iterator<Item = &'a Array1<f32>>) -> Result<Array2<f32>> {
    let views: Vec<ArrayView1<f32>> = rows.map(|r| r.view()).collect();
    Ok(stack(Axis(0), &views)?)
}
