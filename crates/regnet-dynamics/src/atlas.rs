//! Single-gene inhibition atlas
//!
//! One run per target gene, with that gene clamped to zero and a freshly drawn
//! initial state. Runs are independent and evaluated on the rayon pool; the
//! output keeps the order of the requested targets.

use crate::common::{InhibitionSet, NetworkView, SeedPolicy, SimulationParams};
use crate::error::{DynamicsError, DynamicsResult};
use crate::simulate::{simulate, Trajectory};
use indexmap::IndexMap;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use std::collections::HashSet;

/// Trajectories keyed by the inhibited gene.
#[derive(Clone, Debug)]
pub struct PerturbationAtlas {
    /// Column labels of every trajectory (the network's gene order)
    pub genes: Vec<String>,
    pub runs: IndexMap<String, Trajectory>,
}

impl PerturbationAtlas {
    pub fn get(&self, inhibited_gene: &str) -> Option<&Trajectory> {
        self.runs.get(inhibited_gene)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Trajectory)> {
        self.runs.iter()
    }

    /// Final-state shift of every gene under each inhibition, relative to a
    /// baseline state (typically the stability-batch mean).
    pub fn knockdown_effects(&self, baseline: ArrayView1<f64>) -> DynamicsResult<KnockdownEffects> {
        if baseline.len() != self.genes.len() {
            return Err(DynamicsError::DimensionMismatch {
                context: "baseline length vs gene count".to_string(),
                expected: self.genes.len(),
                actual: baseline.len(),
            });
        }

        let mut deltas = Array2::zeros((self.runs.len(), self.genes.len()));
        for (mut row, trajectory) in deltas.outer_iter_mut().zip(self.runs.values()) {
            row.assign(&(&trajectory.final_state() - &baseline));
        }

        Ok(KnockdownEffects {
            inhibited: self.runs.keys().cloned().collect(),
            genes: self.genes.clone(),
            deltas,
        })
    }
}

/// Rows: inhibited gene. Columns: affected gene. Values: final state minus baseline.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnockdownEffects {
    pub inhibited: Vec<String>,
    pub genes: Vec<String>,
    pub deltas: Array2<f64>,
}

impl KnockdownEffects {
    /// Largest absolute shift caused by inhibiting `gene`, excluding the gene itself.
    pub fn strongest_effect(&self, gene: &str) -> Option<(&str, f64)> {
        let row = self.inhibited.iter().position(|g| g == gene)?;
        self.deltas
            .row(row)
            .iter()
            .enumerate()
            .filter(|(j, _)| self.genes[*j] != gene)
            .fold(None, |best: Option<(usize, f64)>, (j, &d)| match best {
                Some((_, b)) if b.abs() >= d.abs() => best,
                _ => Some((j, d)),
            })
            .map(|(j, d)| (self.genes[j].as_str(), d))
    }
}

/// Inhibit each gene of `targets` in turn.
///
/// Run seeds follow the gene's index in the network, so the trajectory for a
/// given gene does not depend on which other targets were requested.
pub fn run_perturbation_atlas<S: AsRef<str>>(
    view: &NetworkView,
    targets: &[S],
    params: &SimulationParams,
    seeds: &SeedPolicy,
) -> DynamicsResult<PerturbationAtlas> {
    params.validate()?;
    if targets.is_empty() {
        return Err(DynamicsError::InvalidParameter("gene list is empty".to_string()));
    }

    let mut seen = HashSet::with_capacity(targets.len());
    let mut indices = Vec::with_capacity(targets.len());
    for target in targets {
        let gene = target.as_ref();
        let idx = view
            .gene_index(gene)
            .ok_or_else(|| DynamicsError::UnknownGene(gene.to_string()))?;
        if !seen.insert(idx) {
            return Err(DynamicsError::DuplicateGene(gene.to_string()));
        }
        indices.push(idx);
    }

    tracing::info!(runs = indices.len(), steps = params.time_steps, "Running perturbation atlas");

    let results: Vec<DynamicsResult<Trajectory>> = indices
        .par_iter()
        .map(|&idx| {
            let mut rng = seeds.rng_for(idx);
            simulate(view, &InhibitionSet::single(idx), None, params, &mut rng)
        })
        .collect();

    let mut runs = IndexMap::with_capacity(indices.len());
    for (&idx, result) in indices.iter().zip(results) {
        let gene = &view.index_to_gene[idx];
        let trajectory = result.map_err(|source| DynamicsError::RunFailed {
            index: idx,
            label: gene.clone(),
            source: Box::new(source),
        })?;
        runs.insert(gene.clone(), trajectory);
    }

    Ok(PerturbationAtlas {
        genes: view.index_to_gene.clone(),
        runs,
    })
}

/// Atlas over every gene of the network, in network order.
pub fn run_full_atlas(
    view: &NetworkView,
    params: &SimulationParams,
    seeds: &SeedPolicy,
) -> DynamicsResult<PerturbationAtlas> {
    run_perturbation_atlas(view, view.index_to_gene.as_slice(), params, seeds)
}
