use ndarray::{Array2, array};
use regnet_inference::*;

fn labels(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect()
}

/// Deterministic pseudo-noise so the fixtures need no RNG.
fn wobble(i: usize, j: usize) -> f64 {
    (((i * 7919 + j * 104_729) % 1000) as f64 / 1000.0 - 0.5) * 0.2
}

fn three_gene_expression() -> ExpressionMatrix {
    // C depends on A, B is independent noise
    let n_samples = 30;
    let mut values = Array2::zeros((3, n_samples));
    for s in 0..n_samples {
        let a = (s as f64 * 0.37).sin() * 2.0 + 5.0;
        let b = (s as f64 * 1.3).cos() + wobble(s, 1) + 3.0;
        values[[0, s]] = a;
        values[[1, s]] = b;
        values[[2, s]] = 0.8 * a + wobble(s, 2);
    }
    ExpressionMatrix::new(vec!["A".into(), "B".into(), "C".into()], labels("s", n_samples), values)
        .unwrap()
}

#[test]
fn test_diagonal_is_zero() {
    let expression = three_gene_expression();
    let matrix = infer(&expression, &InferenceConfig::default()).unwrap();
    assert_eq!(matrix.n_genes(), 3);
    for i in 0..3 {
        assert_eq!(matrix.weights()[[i, i]], 0.0);
    }
    assert_eq!(matrix.genes(), expression.genes());
}

#[test]
fn test_recovers_dependency_without_symmetrizing() {
    let matrix = infer(&three_gene_expression(), &InferenceConfig::default()).unwrap();
    let c_from_a = matrix.get("C", "A").unwrap();
    let a_from_c = matrix.get("A", "C").unwrap();
    assert!((c_from_a - 0.8).abs() < 0.1, "C <- A = {}", c_from_a);
    assert!(a_from_c > 0.5, "A <- C = {}", a_from_c);
    assert_ne!(c_from_a, a_from_c);
}

#[test]
fn test_two_gene_perfect_linear_relation() {
    let b: Vec<f64> = (0..10).map(|s| s as f64 * 0.7 + 1.0).collect();
    let a: Vec<f64> = b.iter().map(|v| 2.0 * v + 0.5).collect();
    let expression = ExpressionMatrix::from_rows(
        vec!["A".into(), "B".into()],
        labels("s", 10),
        vec![a, b],
    )
    .unwrap();

    let matrix = infer(&expression, &InferenceConfig::default()).unwrap();
    let a_from_b = matrix.get("A", "B").unwrap();
    let b_from_a = matrix.get("B", "A").unwrap();

    assert!(a_from_b > 1.9 && a_from_b <= 2.0, "A <- B = {}", a_from_b);
    assert!(b_from_a > 0.45 && b_from_a <= 0.5, "B <- A = {}", b_from_a);
    assert!((a_from_b * b_from_a - 1.0).abs() < 0.05);
    assert_eq!(matrix.nonzero_count(), 2);
}

#[test]
fn test_single_sample_is_insufficient() {
    let expression = ExpressionMatrix::new(
        vec!["A".into(), "B".into()],
        vec!["s0".into()],
        array![[1.0], [2.0]],
    )
    .unwrap();
    let err = infer(&expression, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, InferenceError::InsufficientData(_)));
}

#[test]
fn test_single_gene_is_insufficient() {
    let expression =
        ExpressionMatrix::new(vec!["A".into()], labels("s", 8), Array2::ones((1, 8))).unwrap();
    let err = infer(&expression, &InferenceConfig::default()).unwrap_err();
    assert!(matches!(err, InferenceError::InsufficientData(_)));
}

#[test]
fn test_non_finite_rejected_up_front() {
    let mut values = Array2::from_shape_fn((2, 8), |(g, s)| (g + s) as f64);
    values[[1, 3]] = f64::NAN;
    let expression =
        ExpressionMatrix::new(vec!["A".into(), "B".into()], labels("s", 8), values).unwrap();
    let err = infer(&expression, &InferenceConfig::default()).unwrap_err();
    assert_eq!(err, InferenceError::NonFiniteInput("expression of B in sample s3".to_string()));
}

#[test]
fn test_overflowing_scale_is_an_error() {
    // finite values whose sums of squares overflow f64
    let values = Array2::from_shape_fn((3, 10), |(g, s)| (1.0 + ((g * 3 + s) % 7) as f64) * 1e155);
    let genes = vec!["A".into(), "B".into(), "C".into()];
    let expression = ExpressionMatrix::new(genes, labels("s", 10), values).unwrap();
    match infer(&expression, &InferenceConfig::default()).unwrap_err() {
        InferenceError::GeneFit { index, gene, source } => {
            assert_eq!(index, 0);
            assert_eq!(gene, "A");
            assert!(matches!(*source, InferenceError::NonFiniteInput(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parallel_and_serial_agree() {
    let expression = three_gene_expression();
    let parallel = infer(&expression, &InferenceConfig::default()).unwrap();
    let serial =
        infer(&expression, &InferenceConfig { parallel: false, ..Default::default() }).unwrap();
    assert_eq!(parallel, serial);
}

#[test]
fn test_strict_convergence_surfaces_gene() {
    let config = InferenceConfig {
        max_iter: 1,
        tol: 1e-15,
        strict_convergence: true,
        ..Default::default()
    };
    let err = infer(&three_gene_expression(), &config).unwrap_err();
    match err {
        InferenceError::GeneFit { index, gene, source } => {
            assert_eq!(index, 0);
            assert_eq!(gene, "A");
            assert!(matches!(*source, InferenceError::ConvergenceFailed { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_diagnostics_report_alpha_per_gene() {
    let fit =
        infer_with_diagnostics(&three_gene_expression(), &InferenceConfig::default()).unwrap();
    assert_eq!(fit.genes.len(), 3);
    assert_eq!(fit.genes[2].gene, "C");
    assert!(fit.genes.iter().all(|g| g.alpha > 0.0));
    let total: usize = fit.genes.iter().map(|g| g.nonzero).sum();
    assert_eq!(total, fit.matrix.nonzero_count());
}
