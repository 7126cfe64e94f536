//! K-fold cross-validated selection of the Lasso regularization strength

use super::lasso::{alpha_grid, CenteredData, LassoSolver};
use crate::common::InferenceConfig;
use crate::error::{InferenceError, InferenceResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Seeded k-fold splitter.
#[derive(Clone, Copy, Debug)]
pub struct KFold {
    pub folds: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(folds: usize, shuffle: bool, seed: u64) -> Self {
        Self { folds, shuffle, seed }
    }

    /// (train, test) index pairs. The first `n % folds` folds hold one extra sample.
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut order: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
        }

        let base = n_samples / self.folds;
        let extra = n_samples % self.folds;
        let mut start = 0;
        let mut splits = Vec::with_capacity(self.folds);
        for fold in 0..self.folds {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let test = order[start..end].to_vec();
            let train = order[..start].iter().chain(&order[end..]).copied().collect();
            splits.push((train, test));
            start = end;
        }
        splits
    }
}

/// Result of a cross-validated fit for one target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LassoCvFit {
    /// Selected regularization strength
    pub alpha: f64,
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Regularization path that was searched (descending)
    pub alphas: Vec<f64>,
    /// Held-out MSE, alphas x folds
    pub mse_path: Array2<f64>,
    /// Whether every solve on the path and the final refit converged
    pub converged: bool,
}

impl LassoCvFit {
    pub fn nonzero(&self) -> usize {
        self.coefficients.iter().filter(|&&c| c != 0.0).count()
    }
}

/// Lasso with the alpha chosen by minimum mean cross-validated error.
pub struct LassoCv {
    pub config: InferenceConfig,
}

impl LassoCv {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Fit `y` (length = samples) on `x` (samples x features).
    pub fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> InferenceResult<LassoCvFit> {
        let n_samples = x.nrows();
        if y.len() != n_samples {
            return Err(InferenceError::DimensionMismatch {
                context: "target length vs design rows".to_string(),
                expected: n_samples,
                actual: y.len(),
            });
        }
        if n_samples <= self.config.folds {
            return Err(InferenceError::InsufficientData(format!(
                "{} samples cannot support {}-fold cross-validation",
                n_samples, self.config.folds
            )));
        }

        let full = CenteredData::new(x, y);
        // Subsets centred on their own mean never have larger moments.
        if !full.has_finite_moments() {
            return Err(InferenceError::NonFiniteInput(
                "sums of squares overflow f64; rescale the expression values".to_string(),
            ));
        }
        let alpha_max = full.alpha_max();
        if alpha_max == 0.0 {
            // Constant target or constant design: nothing to regress on.
            let coefficients = Array1::zeros(x.ncols());
            return Ok(LassoCvFit {
                alpha: 0.0,
                intercept: full.intercept(&coefficients),
                coefficients,
                alphas: Vec::new(),
                mse_path: Array2::zeros((0, self.config.folds)),
                converged: true,
            });
        }

        let alphas = alpha_grid(alpha_max, self.config.eps, self.config.n_alphas);
        let solver = LassoSolver::new(self.config.max_iter, self.config.tol);
        let splits =
            KFold::new(self.config.folds, self.config.shuffle, self.config.seed).split(n_samples);

        let mut mse_path = Array2::zeros((alphas.len(), splits.len()));
        let mut converged = true;

        for (fold, (train, test)) in splits.iter().enumerate() {
            let train_data = CenteredData::new(
                x.select(Axis(0), train).view(),
                y.select(Axis(0), train).view(),
            );
            let x_test = x.select(Axis(0), test);
            let y_test = y.select(Axis(0), test);

            let mut w = Array1::zeros(x.ncols());
            for (a, &alpha) in alphas.iter().enumerate() {
                let outcome = solver.fit(&train_data, alpha, &mut w);
                if !outcome.converged {
                    self.on_non_convergence(alpha, outcome.iterations)?;
                    converged = false;
                }
                let intercept = train_data.intercept(&w);
                let residual = &y_test - &(x_test.dot(&w) + intercept);
                mse_path[[a, fold]] = residual.dot(&residual) / test.len() as f64;
            }
        }

        let mean_mse = mse_path
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(alphas.len()));
        let best = mean_mse
            .iter()
            .enumerate()
            .fold(0, |best, (i, &mse)| if mse < mean_mse[best] { i } else { best });
        let alpha = alphas[best];

        let mut coefficients = Array1::zeros(x.ncols());
        let outcome = solver.fit(&full, alpha, &mut coefficients);
        if !outcome.converged {
            self.on_non_convergence(alpha, outcome.iterations)?;
            converged = false;
        }

        Ok(LassoCvFit {
            alpha,
            intercept: full.intercept(&coefficients),
            coefficients,
            alphas,
            mse_path,
            converged,
        })
    }

    fn on_non_convergence(&self, alpha: f64, iterations: usize) -> InferenceResult<()> {
        if self.config.strict_convergence {
            return Err(InferenceError::ConvergenceFailed { alpha, iterations });
        }
        tracing::warn!(
            alpha,
            iterations,
            "coordinate descent did not converge; keeping last iterate"
        );
        Ok(())
    }
}
