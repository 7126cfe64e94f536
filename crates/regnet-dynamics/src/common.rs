//! Shared structures for network simulation
//!
//! Provides a read-only, dense-indexed view of an interaction matrix for the
//! integrator, plus the parameter, inhibition and seeding types every run uses.

use crate::error::{DynamicsError, DynamicsResult};
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap};

/// A dense, integer-indexed view of the interaction network.
///
/// Regulators of each gene are stored in Compressed Sparse Row form: row `k`
/// lists every `j` with a non-zero weight `W[k][j]`, in ascending order.
/// Lasso networks are sparse, so the per-step product `W · x` only touches
/// actual interactions.
#[derive(Clone, Debug)]
pub struct NetworkView {
    /// Number of genes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to gene identifier
    pub index_to_gene: Vec<String>,
    /// Mapping from gene identifier to dense index
    pub gene_to_index: HashMap<String, usize>,

    /// Offsets into `in_sources`. Size = node_count + 1
    pub in_offsets: Vec<usize>,
    /// Contiguous array of regulator indices
    pub in_sources: Vec<usize>,
    /// Interaction weights, aligned with `in_sources`
    pub in_weights: Vec<f64>,
}

impl NetworkView {
    /// Build a view from a square weight matrix whose rows and columns both
    /// follow the order of `genes`.
    pub fn from_dense(genes: Vec<String>, weights: ArrayView2<f64>) -> DynamicsResult<Self> {
        if genes.is_empty() {
            return Err(DynamicsError::InvalidParameter("gene list is empty".to_string()));
        }
        if weights.nrows() != weights.ncols() {
            return Err(DynamicsError::DimensionMismatch {
                context: "interaction matrix must be square".to_string(),
                expected: weights.nrows(),
                actual: weights.ncols(),
            });
        }
        if weights.nrows() != genes.len() {
            return Err(DynamicsError::DimensionMismatch {
                context: "interaction matrix vs gene list".to_string(),
                expected: genes.len(),
                actual: weights.nrows(),
            });
        }

        let node_count = genes.len();
        let mut gene_to_index = HashMap::with_capacity(node_count);
        for (idx, gene) in genes.iter().enumerate() {
            if gene_to_index.insert(gene.clone(), idx).is_some() {
                return Err(DynamicsError::DuplicateGene(gene.clone()));
            }
        }

        let mut in_offsets = Vec::with_capacity(node_count + 1);
        let mut in_sources = Vec::new();
        let mut in_weights = Vec::new();

        in_offsets.push(0);
        for (k, row) in weights.outer_iter().enumerate() {
            for (j, &w) in row.iter().enumerate() {
                if !w.is_finite() {
                    return Err(DynamicsError::NonFiniteInput(format!(
                        "interaction weight {} <- {}",
                        genes[k], genes[j]
                    )));
                }
                if w != 0.0 {
                    in_sources.push(j);
                    in_weights.push(w);
                }
            }
            in_offsets.push(in_sources.len());
        }

        Ok(NetworkView {
            node_count,
            index_to_gene: genes,
            gene_to_index,
            in_offsets,
            in_sources,
            in_weights,
        })
    }

    /// Get the regulators of a gene (by index)
    pub fn regulators(&self, idx: usize) -> &[usize] {
        &self.in_sources[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }

    /// Get the weights aligned with [`NetworkView::regulators`]
    pub fn regulator_weights(&self, idx: usize) -> &[f64] {
        &self.in_weights[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }

    /// Number of non-zero interactions
    pub fn edge_count(&self) -> usize {
        self.in_sources.len()
    }

    pub fn gene_index(&self, gene: &str) -> Option<usize> {
        self.gene_to_index.get(gene).copied()
    }

    pub fn genes(&self) -> &[String] {
        &self.index_to_gene
    }

    /// Compute `W · x` into `out`.
    pub fn regulatory_input(&self, x: &Array1<f64>, out: &mut Array1<f64>) {
        for k in 0..self.node_count {
            let mut total = 0.0;
            for (&j, &w) in self.regulators(k).iter().zip(self.regulator_weights(k)) {
                total += w * x[j];
            }
            out[k] = total;
        }
    }
}

/// Integration parameters shared by every run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationParams {
    /// λ in dx/dt = -λx + σ(Wx)
    pub decay_rate: f64,
    /// Euler step size
    pub dt: f64,
    /// Number of recorded steps
    pub time_steps: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            decay_rate: 1.0,
            dt: 0.1,
            time_steps: 100,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> DynamicsResult<()> {
        if !(self.decay_rate.is_finite() && self.decay_rate > 0.0) {
            return Err(DynamicsError::InvalidParameter(format!(
                "decay_rate must be positive, got {}",
                self.decay_rate
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(DynamicsError::InvalidParameter(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if self.time_steps == 0 {
            return Err(DynamicsError::InvalidParameter("time_steps must be positive".to_string()));
        }
        Ok(())
    }
}

/// Gene indices held at zero for a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InhibitionSet {
    indices: BTreeSet<usize>,
}

impl InhibitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(idx: usize) -> Self {
        let mut set = Self::new();
        set.insert(idx);
        set
    }

    /// Resolve gene identifiers against a network.
    pub fn from_genes<S: AsRef<str>>(view: &NetworkView, genes: &[S]) -> DynamicsResult<Self> {
        let mut set = Self::new();
        for gene in genes {
            let gene = gene.as_ref();
            let idx = view
                .gene_index(gene)
                .ok_or_else(|| DynamicsError::UnknownGene(gene.to_string()))?;
            set.insert(idx);
        }
        Ok(set)
    }

    pub fn insert(&mut self, idx: usize) -> bool {
        self.indices.insert(idx)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.indices.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Largest index, used to check the set against a network size.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().next_back().copied()
    }

    pub fn clamp(&self, x: &mut Array1<f64>) {
        for &idx in &self.indices {
            x[idx] = 0.0;
        }
    }
}

impl FromIterator<usize> for InhibitionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self { indices: iter.into_iter().collect() }
    }
}

/// Seeding policy for batches: run `i` draws from `StdRng::seed_from_u64(base_seed + i)`.
///
/// Every run gets its own generator, so results do not depend on execution
/// order or thread count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedPolicy {
    pub base_seed: u64,
}

impl SeedPolicy {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn rng_for(&self, run_index: usize) -> StdRng {
        StdRng::seed_from_u64(self.base_seed.wrapping_add(run_index as u64))
    }
}
