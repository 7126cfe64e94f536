use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use regnet_dynamics::*;

fn feed_forward_loop() -> NetworkView {
    let w = array![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
    NetworkView::from_dense(vec!["A".into(), "B".into(), "C".into()], w.view()).unwrap()
}

fn five_steps() -> SimulationParams {
    SimulationParams { decay_rate: 1.0, dt: 0.1, time_steps: 5 }
}

fn random_network(n: usize, seed: u64) -> NetworkView {
    use rand::Rng;
    let mut rng = StdRng::seed_from_u64(seed);
    let w = Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j || rng.gen::<f64>() < 0.6 {
            0.0
        } else {
            rng.gen_range(-2.0..2.0)
        }
    });
    let genes = (0..n).map(|i| format!("G{}", i)).collect();
    NetworkView::from_dense(genes, w.view()).unwrap()
}

#[test]
fn test_golden_trajectory() {
    let view = feed_forward_loop();
    let initial = array![0.5, 0.5, 0.5];
    let mut rng = StdRng::seed_from_u64(0);
    let trajectory =
        simulate(&view, &InhibitionSet::new(), Some(initial.view()), &five_steps(), &mut rng)
            .unwrap();

    let expected = [
        0.5122459331201854,
        0.5235546223941148,
        0.5339970181091115,
        0.5436388032497348,
        0.5525407718617176,
    ];
    assert_eq!(trajectory.len(), 5);
    for (step, &value) in expected.iter().enumerate() {
        for gene in 0..3 {
            let got = trajectory.state(step)[gene];
            assert!(
                (got - value).abs() < 1e-12,
                "step {} gene {}: {} vs {}",
                step,
                gene,
                got,
                value
            );
        }
    }
}

#[test]
fn test_golden_trajectory_with_inhibition() {
    let view = feed_forward_loop();
    let initial = array![0.5, 0.5, 0.5];
    let mut rng = StdRng::seed_from_u64(0);
    let trajectory =
        simulate(&view, &InhibitionSet::single(1), Some(initial.view()), &five_steps(), &mut rng)
            .unwrap();

    let expected_c = [
        0.5122459331201854,
        0.5232672729283523,
        0.5331864787557026,
        0.5421137640003177,
        0.5501483207204714,
    ];
    for step in 0..5 {
        let state = trajectory.state(step);
        assert_eq!(state[1], 0.0);
        // A is driven only by the clamped B: sigmoid(0) balances decay at 0.5
        assert!((state[0] - 0.5).abs() < 1e-15);
        assert!((state[2] - expected_c[step]).abs() < 1e-12);
    }
}

#[test]
fn test_inhibited_genes_are_zero_at_every_step() {
    let view = random_network(12, 5);
    let inhibited: InhibitionSet = [0, 4, 11].into_iter().collect();
    let mut rng = StdRng::seed_from_u64(77);
    let params = SimulationParams::default();
    let trajectory = simulate(&view, &inhibited, None, &params, &mut rng).unwrap();

    for step in 0..trajectory.len() {
        for idx in inhibited.iter() {
            assert_eq!(trajectory.state(step)[idx], 0.0);
        }
    }
}

#[test]
fn test_simulation_is_bit_identical_for_same_seed() {
    let view = random_network(10, 1);
    let inhibited = InhibitionSet::single(3);
    let params = SimulationParams::default();
    let first =
        simulate(&view, &inhibited, None, &params, &mut StdRng::seed_from_u64(2024)).unwrap();
    let second =
        simulate(&view, &inhibited, None, &params, &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!(first, second);

    let other =
        simulate(&view, &inhibited, None, &params, &mut StdRng::seed_from_u64(2025)).unwrap();
    assert_ne!(first, other);
}

#[test]
fn test_trajectory_shape() {
    let view = random_network(7, 3);
    for steps in [1, 2, 50] {
        let params = SimulationParams { time_steps: steps, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(0);
        let trajectory = simulate(&view, &InhibitionSet::new(), None, &params, &mut rng).unwrap();
        assert_eq!(trajectory.len(), steps);
        assert_eq!(trajectory.gene_count(), 7);
        assert_eq!(trajectory.final_state().len(), 7);
    }
}

#[test]
fn test_invalid_configuration_fails_fast() {
    let view = feed_forward_loop();
    let mut rng = StdRng::seed_from_u64(0);
    let bad_state = array![0.5, 0.5];
    assert!(matches!(
        simulate(&view, &InhibitionSet::new(), Some(bad_state.view()), &five_steps(), &mut rng),
        Err(DynamicsError::DimensionMismatch { expected: 3, actual: 2, .. })
    ));

    let nan_state = array![0.5, f64::NAN, 0.5];
    assert!(matches!(
        simulate(&view, &InhibitionSet::new(), Some(nan_state.view()), &five_steps(), &mut rng),
        Err(DynamicsError::NonFiniteInput(_))
    ));

    let params = SimulationParams { dt: 0.0, ..five_steps() };
    assert!(matches!(
        simulate(&view, &InhibitionSet::new(), None, &params, &mut rng),
        Err(DynamicsError::InvalidParameter(_))
    ));
}

#[test]
fn test_single_replicate_has_zero_spread() {
    let view = random_network(6, 11);
    let summary =
        run_stability_batch(&view, 1, &SimulationParams::default(), &SeedPolicy::new(5)).unwrap();
    assert_eq!(summary.replicates, 1);
    for gene in &summary.genes {
        assert_eq!(gene.std_dev, 0.0);
        if gene.mean == 0.0 {
            assert!(gene.cv.is_nan());
        } else {
            assert_eq!(gene.cv, 0.0);
        }
    }
}

#[test]
fn test_stability_batch_is_reproducible_and_ordered() {
    let view = random_network(8, 21);
    let params = SimulationParams { time_steps: 30, ..Default::default() };
    let first = run_stability_batch(&view, 10, &params, &SeedPolicy::new(42)).unwrap();
    let second = run_stability_batch(&view, 10, &params, &SeedPolicy::new(42)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.genes.len(), 8);
    for pair in first.genes.windows(2) {
        assert!(pair[0].cv >= pair[1].cv);
    }
}

#[test]
fn test_stability_replicates_match_individual_runs() {
    let view = random_network(5, 8);
    let params = SimulationParams { time_steps: 15, ..Default::default() };
    let seeds = SeedPolicy::new(100);
    let summary = run_stability_batch(&view, 3, &params, &seeds).unwrap();

    let finals: Vec<_> = (0..3)
        .map(|run| {
            simulate(&view, &InhibitionSet::new(), None, &params, &mut seeds.rng_for(run))
                .unwrap()
                .final_state()
                .to_owned()
        })
        .collect();
    for gene in &summary.genes {
        let mean = finals.iter().map(|f| f[gene.index]).sum::<f64>() / 3.0;
        assert!((gene.mean - mean).abs() < 1e-12);
    }
}

#[test]
fn test_atlas_runs_match_direct_simulation() {
    let view = random_network(6, 2);
    let params = SimulationParams { time_steps: 25, ..Default::default() };
    let seeds = SeedPolicy::new(9);
    let atlas = run_full_atlas(&view, &params, &seeds).unwrap();
    assert_eq!(atlas.len(), 6);

    for (idx, gene) in view.genes().iter().enumerate() {
        let mut rng = seeds.rng_for(idx);
        let direct =
            simulate(&view, &InhibitionSet::single(idx), None, &params, &mut rng).unwrap();
        assert_eq!(atlas.get(gene), Some(&direct));
    }
}

#[test]
fn test_batches_check_parameters_before_running() {
    let view = feed_forward_loop();
    let params = SimulationParams { time_steps: 0, ..Default::default() };
    assert!(matches!(
        run_full_atlas(&view, &params, &SeedPolicy::new(0)),
        Err(DynamicsError::InvalidParameter(_))
    ));
    assert!(matches!(
        run_stability_batch(&view, 3, &params, &SeedPolicy::new(0)),
        Err(DynamicsError::InvalidParameter(_))
    ));
}
