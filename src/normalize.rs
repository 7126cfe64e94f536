//! Count normalization ahead of network inference
//!
//! Raw per-gene read counts become log2(CPM + 1), computed per sample column.

use crate::error::{RegnetError, RegnetResult};
use ndarray::{Array2, ArrayView2, Axis};
use regnet_inference::ExpressionMatrix;

/// log2(count / column_total * 1e6 + 1) for a genes x samples count matrix.
pub fn log2_cpm(
    genes: Vec<String>,
    samples: Vec<String>,
    counts: ArrayView2<f64>,
) -> RegnetResult<ExpressionMatrix> {
    if let Some(((g, s), v)) = counts.indexed_iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        return Err(RegnetError::InvalidInput(format!(
            "count for gene index {} in sample index {} must be a non-negative number, got {}",
            g, s, v
        )));
    }

    let totals = counts.sum_axis(Axis(0));
    if let Some(s) = totals.iter().position(|&t| t == 0.0) {
        return Err(RegnetError::InvalidInput(format!(
            "sample index {} has no counts; CPM is undefined",
            s
        )));
    }

    let mut values = Array2::zeros(counts.raw_dim());
    for ((mut out, column), &total) in values
        .axis_iter_mut(Axis(1))
        .zip(counts.axis_iter(Axis(1)))
        .zip(totals.iter())
    {
        out.zip_mut_with(&column, |o, &c| *o = (c / total * 1e6 + 1.0).log2());
    }

    Ok(ExpressionMatrix::new(genes, samples, values)?)
}

/// Keep the genes for which `keep` returns true, in their original order.
pub fn retain_genes<F>(matrix: &ExpressionMatrix, mut keep: F) -> RegnetResult<ExpressionMatrix>
where
    F: FnMut(&str, ndarray::ArrayView1<f64>) -> bool,
{
    let values = matrix.values();
    let rows: Vec<usize> = matrix
        .genes()
        .iter()
        .enumerate()
        .filter(|(i, gene)| keep(gene, values.row(*i)))
        .map(|(i, _)| i)
        .collect();

    let genes = rows.iter().map(|&i| matrix.genes()[i].clone()).collect();
    let kept = values.select(Axis(0), &rows);
    Ok(ExpressionMatrix::new(genes, matrix.samples().to_vec(), kept)?)
}

/// Drop genes whose expression is zero in every sample.
pub fn drop_unexpressed(matrix: &ExpressionMatrix) -> RegnetResult<ExpressionMatrix> {
    let before = matrix.n_genes();
    let filtered = retain_genes(matrix, |_, row| row.iter().any(|&v| v != 0.0))?;
    tracing::debug!(before, after = filtered.n_genes(), "Dropped unexpressed genes");
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_log2_cpm_per_sample() {
        let counts = array![[250_000.0, 0.0], [750_000.0, 10.0]];
        let m = log2_cpm(labels(&["A", "B"]), labels(&["s1", "s2"]), counts.view()).unwrap();
        let v = m.values();
        assert!((v[[0, 0]] - (250_000.0f64 + 1.0).log2()).abs() < 1e-12);
        assert!((v[[1, 0]] - (750_000.0f64 + 1.0).log2()).abs() < 1e-12);
        assert_eq!(v[[0, 1]], 0.0);
        assert!((v[[1, 1]] - (1e6f64 + 1.0).log2()).abs() < 1e-12);
    }

    #[test]
    fn test_log2_cpm_rejects_bad_counts() {
        let counts = array![[1.0, -1.0], [2.0, 3.0]];
        assert!(log2_cpm(labels(&["A", "B"]), labels(&["s1", "s2"]), counts.view()).is_err());

        let counts = array![[1.0, 0.0], [2.0, 0.0]];
        assert!(log2_cpm(labels(&["A", "B"]), labels(&["s1", "s2"]), counts.view()).is_err());
    }

    #[test]
    fn test_drop_unexpressed_keeps_order() {
        let m = ExpressionMatrix::new(
            labels(&["A", "B", "C"]),
            labels(&["s1", "s2"]),
            array![[1.0, 0.0], [0.0, 0.0], [0.0, 2.0]],
        )
        .unwrap();
        let filtered = drop_unexpressed(&m).unwrap();
        assert_eq!(filtered.genes(), &["A", "C"]);
        assert_eq!(filtered.values()[[1, 1]], 2.0);
    }

    #[test]
    fn test_retain_by_gene_set() {
        let m = ExpressionMatrix::new(
            labels(&["A", "B", "C"]),
            labels(&["s1"]),
            array![[1.0], [2.0], [3.0]],
        )
        .unwrap();
        let wanted = ["C", "A"];
        let subset = retain_genes(&m, |gene, _| wanted.contains(&gene)).unwrap();
        assert_eq!(subset.genes(), &["A", "C"]);
    }
}
