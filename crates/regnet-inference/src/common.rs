use crate::error::{InferenceError, InferenceResult};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn ensure_unique(genes: &[String]) -> InferenceResult<()> {
    let mut seen = HashSet::with_capacity(genes.len());
    for gene in genes {
        if !seen.insert(gene.as_str()) {
            return Err(InferenceError::DuplicateGene(gene.clone()));
        }
    }
    Ok(())
}

fn rows_to_array(rows: Vec<Vec<f64>>, ncols: usize, context: &str) -> InferenceResult<Array2<f64>> {
    let nrows = rows.len();
    let mut flat = Vec::with_capacity(nrows * ncols);
    for row in rows {
        if row.len() != ncols {
            return Err(InferenceError::DimensionMismatch {
                context: context.to_string(),
                expected: ncols,
                actual: row.len(),
            });
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| InferenceError::InvalidParameter(format!("{}: {}", context, e)))
}

/// Genes x samples matrix of normalized expression values (e.g. log2CPM).
///
/// Row order is the gene ordering used by every downstream structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpressionRecord", into = "ExpressionRecord")]
pub struct ExpressionMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    values: Array2<f64>,
}

impl ExpressionMatrix {
    /// Build a labeled matrix. Shapes and gene uniqueness are checked here;
    /// finiteness is checked by [`crate::infer`] before any fitting starts.
    pub fn new(
        genes: Vec<String>,
        samples: Vec<String>,
        values: Array2<f64>,
    ) -> InferenceResult<Self> {
        if values.nrows() != genes.len() {
            return Err(InferenceError::DimensionMismatch {
                context: "expression rows vs gene labels".to_string(),
                expected: genes.len(),
                actual: values.nrows(),
            });
        }
        if values.ncols() != samples.len() {
            return Err(InferenceError::DimensionMismatch {
                context: "expression columns vs sample labels".to_string(),
                expected: samples.len(),
                actual: values.ncols(),
            });
        }
        ensure_unique(&genes)?;
        Ok(Self { genes, samples, values })
    }

    pub fn from_rows(
        genes: Vec<String>,
        samples: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> InferenceResult<Self> {
        let ncols = samples.len();
        let values = rows_to_array(rows, ncols, "expression row length vs sample labels")?;
        Self::new(genes, samples, values)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Expression of one gene across all samples.
    pub fn gene(&self, gene: &str) -> Option<ArrayView1<'_, f64>> {
        self.genes
            .iter()
            .position(|g| g == gene)
            .map(|i| self.values.row(i))
    }

    /// Location of the first NaN/Inf cell, as (gene, sample).
    pub fn first_non_finite(&self) -> Option<(&str, &str)> {
        self.values
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|((g, s), _)| (self.genes[g].as_str(), self.samples[s].as_str()))
    }
}

/// Plain serde shape of an [`ExpressionMatrix`]: nested rows, one per gene.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub genes: Vec<String>,
    pub samples: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl TryFrom<ExpressionRecord> for ExpressionMatrix {
    type Error = InferenceError;

    fn try_from(record: ExpressionRecord) -> InferenceResult<Self> {
        Self::from_rows(record.genes, record.samples, record.values)
    }
}

impl From<ExpressionMatrix> for ExpressionRecord {
    fn from(matrix: ExpressionMatrix) -> Self {
        Self {
            values: matrix.values.outer_iter().map(|r| r.to_vec()).collect(),
            genes: matrix.genes,
            samples: matrix.samples,
        }
    }
}

/// Square gene-by-gene coefficient matrix.
///
/// `weights[[i, j]]` is the contribution of gene `j` to predicting gene `i`.
/// The diagonal is exactly zero and the matrix is not symmetric in general.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InteractionRecord", into = "InteractionRecord")]
pub struct InteractionMatrix {
    genes: Vec<String>,
    weights: Array2<f64>,
}

impl InteractionMatrix {
    /// Wrap an externally supplied matrix. Rejects non-square shapes,
    /// label mismatches, NaN/Inf and non-zero self-coefficients.
    pub fn new(genes: Vec<String>, weights: Array2<f64>) -> InferenceResult<Self> {
        if weights.nrows() != weights.ncols() {
            return Err(InferenceError::DimensionMismatch {
                context: "interaction matrix must be square".to_string(),
                expected: weights.nrows(),
                actual: weights.ncols(),
            });
        }
        if weights.nrows() != genes.len() {
            return Err(InferenceError::DimensionMismatch {
                context: "interaction matrix vs gene labels".to_string(),
                expected: genes.len(),
                actual: weights.nrows(),
            });
        }
        ensure_unique(&genes)?;
        if let Some(((i, j), _)) = weights.indexed_iter().find(|(_, w)| !w.is_finite()) {
            return Err(InferenceError::NonFiniteInput(format!(
                "interaction weight {} <- {}",
                genes[i], genes[j]
            )));
        }
        if let Some(i) = (0..genes.len()).find(|&i| weights[[i, i]] != 0.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "self-interaction of {} must be zero, found {}",
                genes[i],
                weights[[i, i]]
            )));
        }
        Ok(Self { genes, weights })
    }

    pub fn from_rows(genes: Vec<String>, rows: Vec<Vec<f64>>) -> InferenceResult<Self> {
        let n = genes.len();
        let weights = rows_to_array(rows, n, "interaction row length vs gene labels")?;
        Self::new(genes, weights)
    }

    /// Used by the engine, which already guarantees the invariants.
    pub(crate) fn from_parts_unchecked(genes: Vec<String>, weights: Array2<f64>) -> Self {
        Self { genes, weights }
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.genes.iter().position(|g| g == gene)
    }

    /// Coefficient of `regulator` in the model of `target`.
    pub fn get(&self, target: &str, regulator: &str) -> Option<f64> {
        let i = self.gene_index(target)?;
        let j = self.gene_index(regulator)?;
        Some(self.weights[[i, j]])
    }

    /// Number of non-zero coefficients (sparsity diagnostic).
    pub fn nonzero_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w != 0.0).count()
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.genes, self.weights)
    }
}

/// Plain serde shape of an [`InteractionMatrix`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub genes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
}

impl TryFrom<InteractionRecord> for InteractionMatrix {
    type Error = InferenceError;

    fn try_from(record: InteractionRecord) -> InferenceResult<Self> {
        Self::from_rows(record.genes, record.weights)
    }
}

impl From<InteractionMatrix> for InteractionRecord {
    fn from(matrix: InteractionMatrix) -> Self {
        Self {
            weights: matrix.weights.outer_iter().map(|r| r.to_vec()).collect(),
            genes: matrix.genes,
        }
    }
}

/// Configuration for the per-gene cross-validated Lasso fits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of cross-validation folds
    pub folds: usize,
    /// Length of the regularization path
    pub n_alphas: usize,
    /// Ratio alpha_min / alpha_max of the path
    pub eps: f64,
    /// Coordinate descent sweeps per alpha
    pub max_iter: usize,
    /// Duality-gap tolerance, relative to ||y||^2
    pub tol: f64,
    /// Seed for fold assignment
    pub seed: u64,
    /// Shuffle samples before cutting folds
    pub shuffle: bool,
    /// Treat non-convergence as an error instead of a warning
    pub strict_convergence: bool,
    /// Fit genes on the rayon pool
    pub parallel: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            n_alphas: 100,
            eps: 1e-3,
            max_iter: 5000,
            tol: 1e-4,
            seed: 42,
            shuffle: true,
            strict_convergence: false,
            parallel: true,
        }
    }
}

impl InferenceConfig {
    pub fn validate(&self) -> InferenceResult<()> {
        if self.folds < 2 {
            return Err(InferenceError::InvalidParameter(format!(
                "folds must be at least 2, got {}",
                self.folds
            )));
        }
        if self.n_alphas == 0 {
            return Err(InferenceError::InvalidParameter("n_alphas must be positive".to_string()));
        }
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "eps must lie in (0, 1), got {}",
                self.eps
            )));
        }
        if self.max_iter == 0 {
            return Err(InferenceError::InvalidParameter("max_iter must be positive".to_string()));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}
