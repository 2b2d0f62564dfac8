//! Окна для последовательных моделей и разбиение train/test

#![allow(non_snake_case)]

use ndarray::{s, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::FeatureError;

/// Скользящие окна длины `time_steps`: X[i..i+time_steps] -> y[i+time_steps].
pub fn create_sequences(
    X: &Array2<f64>,
    y: &Array2<f64>,
    time_steps: usize,
) -> Result<(Array3<f64>, Array2<f64>), FeatureError> {
    if time_steps == 0 {
        return Err(FeatureError::ZeroTimeSteps);
    }
    if X.nrows() != y.nrows() {
        return Err(FeatureError::ShapeMismatch(format!(
            "X has {} rows, y has {}",
            X.nrows(),
            y.nrows()
        )));
    }

    let n_windows = X.nrows().saturating_sub(time_steps);
    if n_windows == 0 {
        // длина окна не больше числа строк, иначе форма может не поместиться в isize
        let steps = time_steps.min(X.nrows());
        return Ok((Array3::zeros((0, steps, X.ncols())), Array2::zeros((0, y.ncols()))));
    }

    let mut Xs = Array3::zeros((n_windows, time_steps, X.ncols()));
    let mut ys = Array2::zeros((n_windows, y.ncols()));

    for i in 0..n_windows {
        Xs.slice_mut(s![i, .., ..])
            .assign(&X.slice(s![i..i + time_steps, ..]));
        ys.row_mut(i).assign(&y.row(i + time_steps));
    }

    tracing::info!("Sequence shapes: X={:?}, y={:?}", Xs.dim(), ys.dim());
    Ok((Xs, ys))
}

/// Индексы train/test. Сид передаётся явно, глобального состояния нет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    pub fn new(n_rows: usize, test_ratio: f64, seed: u64) -> Self {
        let ratio = test_ratio.clamp(0.0, 1.0);
        let n_test = (n_rows as f64 * ratio).ceil() as usize;

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test.min(n_rows));
        Self {
            train,
            test: indices,
        }
    }

    pub fn select<D: ndarray::RemoveAxis>(
        data: &ndarray::Array<f64, D>,
        rows: &[usize],
    ) -> ndarray::Array<f64, D> {
        data.select(Axis(0), rows)
    }
}
