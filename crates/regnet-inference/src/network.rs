//! Per-gene network assembly
//!
//! Row `i` of the interaction matrix holds the coefficients of the model that
//! predicts gene `i` from all other genes. Rows are placed by gene index, not
//! by completion order, so parallel and serial fits give the same matrix.

use crate::algorithms::{LassoCv, LassoCvFit};
use crate::common::{ExpressionMatrix, InferenceConfig, InteractionMatrix};
use crate::error::{InferenceError, InferenceResult};
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-gene fit diagnostics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneFitSummary {
    pub gene: String,
    pub alpha: f64,
    pub intercept: f64,
    pub nonzero: usize,
    pub converged: bool,
}

/// Interaction matrix together with the per-gene diagnostics that built it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkFit {
    pub matrix: InteractionMatrix,
    pub genes: Vec<GeneFitSummary>,
}

/// Infer the interaction matrix for `expression`.
pub fn infer(
    expression: &ExpressionMatrix,
    config: &InferenceConfig,
) -> InferenceResult<InteractionMatrix> {
    infer_with_diagnostics(expression, config).map(|fit| fit.matrix)
}

/// Same as [`infer`], also returning the chosen alpha and sparsity per gene.
pub fn infer_with_diagnostics(
    expression: &ExpressionMatrix,
    config: &InferenceConfig,
) -> InferenceResult<NetworkFit> {
    config.validate()?;
    check_input(expression, config)?;

    let n_genes = expression.n_genes();
    let values = expression.values();
    let solver = LassoCv::new(config.clone());

    tracing::info!(
        genes = n_genes,
        samples = expression.n_samples(),
        folds = config.folds,
        "Inferring interaction network"
    );

    let fit_gene = |i: usize| -> InferenceResult<(Vec<usize>, LassoCvFit)> {
        let predictors = predictor_genes(i, n_genes);
        let design = values.select(Axis(0), &predictors).reversed_axes();
        let target = values.row(i);
        let fit = solver.fit(design.view(), target).map_err(|source| InferenceError::GeneFit {
            index: i,
            gene: expression.genes()[i].clone(),
            source: Box::new(source),
        })?;
        tracing::debug!(
            gene = %expression.genes()[i],
            alpha = fit.alpha,
            nonzero = fit.nonzero(),
            "Fitted gene model"
        );
        Ok((predictors, fit))
    };

    let fits: Vec<InferenceResult<(Vec<usize>, LassoCvFit)>> = if config.parallel {
        (0..n_genes).into_par_iter().map(fit_gene).collect()
    } else {
        (0..n_genes).map(fit_gene).collect()
    };

    let mut weights = Array2::zeros((n_genes, n_genes));
    let mut summaries = Vec::with_capacity(n_genes);

    for (i, fit) in fits.into_iter().enumerate() {
        let (predictors, fit) = fit?;
        place_row(&mut weights, i, &predictors, &fit)?;
        summaries.push(GeneFitSummary {
            gene: expression.genes()[i].clone(),
            alpha: fit.alpha,
            intercept: fit.intercept,
            nonzero: fit.nonzero(),
            converged: fit.converged,
        });
    }

    let matrix = InteractionMatrix::from_parts_unchecked(expression.genes().to_vec(), weights);
    tracing::info!(
        genes = n_genes,
        nonzero = matrix.nonzero_count(),
        "Number of non-zero interactions"
    );

    Ok(NetworkFit { matrix, genes: summaries })
}

fn check_input(expression: &ExpressionMatrix, config: &InferenceConfig) -> InferenceResult<()> {
    if expression.n_genes() < 2 {
        return Err(InferenceError::InsufficientData(format!(
            "at least 2 genes required, got {}",
            expression.n_genes()
        )));
    }
    if expression.n_samples() <= config.folds {
        return Err(InferenceError::InsufficientData(format!(
            "{} samples cannot support {}-fold cross-validation",
            expression.n_samples(),
            config.folds
        )));
    }
    if let Some((gene, sample)) = expression.first_non_finite() {
        return Err(InferenceError::NonFiniteInput(format!(
            "expression of {} in sample {}",
            gene, sample
        )));
    }
    Ok(())
}

/// Full gene index of each regression column when gene `target` is left out.
fn predictor_genes(target: usize, n_genes: usize) -> Vec<usize> {
    (0..n_genes).filter(|&g| g != target).collect()
}

fn place_row(
    weights: &mut Array2<f64>,
    target: usize,
    predictors: &[usize],
    fit: &LassoCvFit,
) -> InferenceResult<()> {
    let n_genes = weights.ncols();
    if predictors.len() + 1 != n_genes || fit.coefficients.len() != predictors.len() {
        return Err(InferenceError::DimensionMismatch {
            context: format!("coefficient row for gene index {}", target),
            expected: n_genes,
            actual: fit.coefficients.len() + 1,
        });
    }

    let mut row = weights.row_mut(target);
    for (&gene, &coef) in predictors.iter().zip(fit.coefficients.iter()) {
        row[gene] = coef;
    }
    debug_assert_eq!(row[target], 0.0);
    Ok(())
}
