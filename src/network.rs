//! Bridge between inference output and the simulator
//!
//! Network inference produces a labeled [`InteractionMatrix`]; the simulator
//! runs on a dense-indexed [`NetworkView`]. This module carries the gene labels
//! across so positions are never trusted without their identifiers.

use crate::error::{RegnetError, RegnetResult};
use regnet_dynamics::NetworkView;
use regnet_inference::InteractionMatrix;

/// Build a simulator view that keeps the matrix's gene ordering.
pub fn build_view(matrix: &InteractionMatrix) -> RegnetResult<NetworkView> {
    let view = NetworkView::from_dense(matrix.genes().to_vec(), matrix.weights())?;
    tracing::debug!(genes = view.node_count, edges = view.edge_count(), "Built network view");
    Ok(view)
}

/// Reorder a matrix to `order`, moving rows and columns together with their labels.
pub fn reorder(matrix: &InteractionMatrix, order: &[String]) -> RegnetResult<InteractionMatrix> {
    if order.len() != matrix.n_genes() {
        return Err(RegnetError::InvalidInput(format!(
            "reorder expects {} genes, got {}",
            matrix.n_genes(),
            order.len()
        )));
    }
    let positions = order
        .iter()
        .map(|gene| {
            matrix
                .gene_index(gene)
                .ok_or_else(|| {
                    RegnetError::InvalidInput(format!("gene {} is not in the network", gene))
                })
        })
        .collect::<RegnetResult<Vec<usize>>>()?;

    let weights = matrix.weights();
    let reordered = ndarray::Array2::from_shape_fn((order.len(), order.len()), |(i, j)| {
        weights[[positions[i], positions[j]]]
    });
    Ok(InteractionMatrix::new(order.to_vec(), reordered)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix() -> InteractionMatrix {
        InteractionMatrix::new(
            vec!["A".into(), "B".into(), "C".into()],
            array![[0.0, 1.0, 0.0], [0.0, 0.0, -2.0], [0.5, 0.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_view_keeps_labels() {
        let view = build_view(&matrix()).unwrap();
        assert_eq!(view.genes(), &["A", "B", "C"]);
        assert_eq!(view.edge_count(), 3);
        let b = view.gene_index("B").unwrap();
        assert_eq!(view.regulators(b), &[2]);
    }

    #[test]
    fn test_reorder_moves_labels_with_values() {
        let m = matrix();
        let order: Vec<String> = vec!["C".into(), "A".into(), "B".into()];
        let r = reorder(&m, &order).unwrap();
        for target in ["A", "B", "C"] {
            for regulator in ["A", "B", "C"] {
                assert_eq!(r.get(target, regulator), m.get(target, regulator));
            }
        }
        assert_eq!(r.weights()[[0, 1]], 0.5);

        assert!(reorder(&m, &["A".to_string()]).is_err());
        assert!(reorder(&m, &["A".into(), "B".into(), "Z".into()]).is_err());
    }
}
