//! L1-regularized least squares by cyclic coordinate descent
//!
//! Minimizes `(1 / 2n) * ||y - Xw||^2 + alpha * ||w||_1` on centred data, so
//! the intercept is recovered from the column means afterwards.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Design matrix and target with their means removed.
#[derive(Clone, Debug)]
pub struct CenteredData {
    /// samples x features
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_mean: Array1<f64>,
    pub y_mean: f64,
}

impl CenteredData {
    pub fn new(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Self {
        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);
        let x = &x - &x_mean;
        let y = y.mapv(|v| v - y_mean);
        Self { x, y, x_mean, y_mean }
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Smallest alpha for which every coefficient is zero.
    pub fn alpha_max(&self) -> f64 {
        let n = self.n_samples() as f64;
        self.x
            .t()
            .dot(&self.y)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            / n
    }

    /// False when a sum of squares or a cross-product overflows f64.
    pub fn has_finite_moments(&self) -> bool {
        self.y.dot(&self.y).is_finite()
            && self.x.axis_iter(Axis(1)).all(|c| c.dot(&c).is_finite())
            && self.alpha_max().is_finite()
    }

    pub fn intercept(&self, coefficients: &Array1<f64>) -> f64 {
        self.y_mean - self.x_mean.dot(coefficients)
    }
}

/// Descending, log-spaced regularization path from `alpha_max` to `alpha_max * eps`.
pub fn alpha_grid(alpha_max: f64, eps: f64, n_alphas: usize) -> Vec<f64> {
    if n_alphas <= 1 {
        return vec![alpha_max];
    }
    let log_eps = eps.log10();
    (0..n_alphas)
        .map(|i| {
            let frac = i as f64 / (n_alphas - 1) as f64;
            alpha_max * 10f64.powf(frac * log_eps)
        })
        .collect()
}

#[inline]
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Outcome of one coordinate descent solve.
#[derive(Clone, Copy, Debug)]
pub struct DescentOutcome {
    pub iterations: usize,
    pub duality_gap: f64,
    pub converged: bool,
}

/// Cyclic coordinate descent solver.
#[derive(Clone, Copy, Debug)]
pub struct LassoSolver {
    pub max_iter: usize,
    pub tol: f64,
}

impl LassoSolver {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self { max_iter, tol }
    }

    /// Solve at `alpha`, starting from (and overwriting) `w`.
    pub fn fit(&self, data: &CenteredData, alpha: f64, w: &mut Array1<f64>) -> DescentOutcome {
        let x = &data.x;
        let y = &data.y;
        let n = data.n_samples() as f64;
        let l1_reg = alpha * n;

        let y_norm2 = y.dot(y);
        if y_norm2 == 0.0 {
            w.fill(0.0);
            return DescentOutcome { iterations: 0, duality_gap: 0.0, converged: true };
        }
        let gap_tol = self.tol * y_norm2;

        let col_norms: Vec<f64> = x.axis_iter(Axis(1)).map(|c| c.dot(&c)).collect();
        let mut residual = y - &x.dot(&*w);
        let mut gap = f64::INFINITY;

        for iteration in 0..self.max_iter {
            let mut w_max = 0.0_f64;
            let mut d_w_max = 0.0_f64;

            for j in 0..data.n_features() {
                if col_norms[j] == 0.0 {
                    continue;
                }
                let column = x.column(j);
                let w_old = w[j];
                if w_old != 0.0 {
                    residual.scaled_add(w_old, &column);
                }
                let rho = column.dot(&residual);
                let w_new = soft_threshold(rho, l1_reg) / col_norms[j];
                w[j] = w_new;
                if w_new != 0.0 {
                    residual.scaled_add(-w_new, &column);
                }
                d_w_max = d_w_max.max((w_new - w_old).abs());
                w_max = w_max.max(w_new.abs());
            }

            let last = iteration + 1 == self.max_iter;
            if w_max == 0.0 || d_w_max / w_max < self.tol || last {
                gap = duality_gap(x, y, &residual, w, l1_reg);
                if gap < gap_tol {
                    return DescentOutcome {
                        iterations: iteration + 1,
                        duality_gap: gap,
                        converged: true,
                    };
                }
            }
        }

        DescentOutcome { iterations: self.max_iter, duality_gap: gap, converged: false }
    }
}

fn duality_gap(
    x: &Array2<f64>,
    y: &Array1<f64>,
    residual: &Array1<f64>,
    w: &Array1<f64>,
    l1_reg: f64,
) -> f64 {
    let xt_r = x.t().dot(residual);
    let dual_norm = xt_r.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let r_norm2 = residual.dot(residual);

    let (scale, mut gap) = if dual_norm > l1_reg {
        let scale = l1_reg / dual_norm;
        (scale, 0.5 * (r_norm2 + r_norm2 * scale * scale))
    } else {
        (1.0, r_norm2)
    };

    let l1_norm: f64 = w.iter().map(|v| v.abs()).sum();
    gap += l1_reg * l1_norm - scale * residual.dot(y);
    gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_alpha_grid_is_descending_log_spaced() {
        let grid = alpha_grid(2.0, 1e-2, 3);
        assert_eq!(grid.len(), 3);
        assert!((grid[0] - 2.0).abs() < 1e-12);
        assert!((grid[1] - 0.2).abs() < 1e-12);
        assert!((grid[2] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_max_zeroes_everything() {
        let x = array![[1.0, 0.5], [2.0, -1.0], [3.0, 0.2], [4.0, 1.1]];
        let y = array![2.0, 4.1, 5.9, 8.0];
        let data = CenteredData::new(x.view(), y.view());
        let mut w = Array1::zeros(2);
        let outcome = LassoSolver::new(1000, 1e-6).fit(&data, data.alpha_max() * 1.0001, &mut w);
        assert!(outcome.converged);
        assert!(w.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_feature_matches_closed_form() {
        // y = 3x exactly; with one feature the lasso solution is
        // (x.y/n - alpha) / (x.x/n)
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = x.column(0).mapv(|v| 3.0 * v);
        let data = CenteredData::new(x.view(), y.view());
        let alpha = 0.1;
        let mut w = Array1::zeros(1);
        let outcome = LassoSolver::new(100, 1e-8).fit(&data, alpha, &mut w);
        assert!(outcome.converged);

        let var_x = 2.0; // population variance of 0..=4
        let expected = 3.0 - alpha / var_x;
        assert!((w[0] - expected).abs() < 1e-10, "w = {}", w[0]);
        assert!((data.intercept(&w) - (6.0 - 2.0 * expected)).abs() < 1e-10);
    }

    #[test]
    fn test_small_alpha_recovers_least_squares() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0], [1.0, 3.0], [0.5, 2.0]];
        let y: Array1<f64> = x.rows().into_iter().map(|r| 1.5 * r[0] - 0.5 * r[1] + 2.0).collect();
        let data = CenteredData::new(x.view(), y.view());
        let mut w = Array1::zeros(2);
        LassoSolver::new(10_000, 1e-12).fit(&data, 1e-9, &mut w);
        assert!((w[0] - 1.5).abs() < 1e-5);
        assert!((w[1] + 0.5).abs() < 1e-5);
        assert!((data.intercept(&w) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_constant_column_stays_zero() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let data = CenteredData::new(x.view(), y.view());
        let mut w = Array1::zeros(2);
        LassoSolver::new(1000, 1e-8).fit(&data, 1e-4, &mut w);
        assert_eq!(w[1], 0.0);
        assert!(w[0] > 0.99);
    }
}
