//! Replicate-run variability of the unperturbed network
//!
//! The final state of every replicate is collected in replicate order and
//! reduced once into per-gene mean, population standard deviation and
//! coefficient of variation.

use crate::common::{InhibitionSet, NetworkView, SeedPolicy, SimulationParams};
use crate::error::{DynamicsError, DynamicsResult};
use crate::simulate::simulate;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Endpoint statistics for one gene.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneStability {
    pub gene: String,
    /// Position of the gene in the network ordering
    pub index: usize,
    pub mean: f64,
    /// Population standard deviation (divides by the replicate count)
    pub std_dev: f64,
    /// `std_dev / mean`; NaN when both are zero, infinite when only the mean is
    pub cv: f64,
}

/// Per-gene statistics ordered by descending coefficient of variation.
///
/// Ties keep network order; NaN CVs sort last.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StabilitySummary {
    pub replicates: usize,
    pub genes: Vec<GeneStability>,
}

impl StabilitySummary {
    /// Reduce a replicates x genes matrix of final states.
    pub fn from_final_states(
        genes: &[String],
        final_states: ArrayView2<f64>,
    ) -> DynamicsResult<Self> {
        if final_states.ncols() != genes.len() {
            return Err(DynamicsError::DimensionMismatch {
                context: "final-state columns vs gene list".to_string(),
                expected: genes.len(),
                actual: final_states.ncols(),
            });
        }
        let replicates = final_states.nrows();
        if replicates == 0 {
            return Err(DynamicsError::InvalidParameter(
                "replicate count must be positive".to_string(),
            ));
        }

        let mean = final_states
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(genes.len()));
        let std_dev = final_states.std_axis(Axis(0), 0.0);

        let mut rows: Vec<GeneStability> = genes
            .iter()
            .enumerate()
            .map(|(index, gene)| GeneStability {
                gene: gene.clone(),
                index,
                mean: mean[index],
                std_dev: std_dev[index],
                cv: std_dev[index] / mean[index],
            })
            .collect();
        rows.sort_by(|a, b| descending_cv(a.cv, b.cv));

        Ok(Self { replicates, genes: rows })
    }

    pub fn get(&self, gene: &str) -> Option<&GeneStability> {
        self.genes.iter().find(|g| g.gene == gene)
    }

    /// The `n` most variable genes.
    pub fn top(&self, n: usize) -> &[GeneStability] {
        &self.genes[..n.min(self.genes.len())]
    }

    /// Per-gene means in network order, for use as a perturbation baseline.
    pub fn mean_state(&self) -> Array1<f64> {
        let mut state = Array1::zeros(self.genes.len());
        for row in &self.genes {
            state[row.index] = row.mean;
        }
        state
    }
}

fn descending_cv(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Run `replicates` uninhibited simulations from independent random initial
/// states and summarize their final states.
pub fn run_stability_batch(
    view: &NetworkView,
    replicates: usize,
    params: &SimulationParams,
    seeds: &SeedPolicy,
) -> DynamicsResult<StabilitySummary> {
    params.validate()?;
    if replicates == 0 {
        return Err(DynamicsError::InvalidParameter("replicate count must be positive".to_string()));
    }

    tracing::info!(replicates, steps = params.time_steps, "Running stability batch");

    let no_inhibition = InhibitionSet::new();
    let results: Vec<DynamicsResult<Array1<f64>>> = (0..replicates)
        .into_par_iter()
        .map(|run| {
            let mut rng = seeds.rng_for(run);
            simulate(view, &no_inhibition, None, params, &mut rng)
                .map(|t| t.final_state().to_owned())
        })
        .collect();

    let mut final_states = Array2::zeros((replicates, view.node_count));
    for (run, result) in results.into_iter().enumerate() {
        let state = result.map_err(|source| DynamicsError::RunFailed {
            index: run,
            label: format!("replicate {}", run),
            source: Box::new(source),
        })?;
        final_states.row_mut(run).assign(&state);
    }

    StabilitySummary::from_final_states(&view.index_to_gene, final_states.view())
}
