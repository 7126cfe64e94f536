//! Explicit-Euler integration of the activation/decay network model
//!
//! dx/dt = -λ x + σ(W x), with σ the logistic function applied element-wise.
//! Inhibited genes are clamped to zero before the first step and after every
//! update, so they only act on the rest of the network through propagation.

use crate::common::{InhibitionSet, NetworkView, SimulationParams};
use crate::error::{DynamicsError, DynamicsResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;

/// Largest f64 strictly below 1.
const SIGMOID_CEIL: f64 = 1.0 - f64::EPSILON / 2.0;

/// Logistic function, evaluated without overflow for any finite input.
///
/// Saturated tails are held at the nearest representable values inside (0, 1).
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    let s = if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    };
    s.clamp(f64::MIN_POSITIVE, SIGMOID_CEIL)
}

/// Per-step states of one run: `time_steps` rows, one column per gene.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    states: Array2<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.states.nrows() == 0
    }

    pub fn gene_count(&self) -> usize {
        self.states.ncols()
    }

    pub fn state(&self, step: usize) -> ArrayView1<'_, f64> {
        self.states.row(step)
    }

    /// State after the last step.
    pub fn final_state(&self) -> ArrayView1<'_, f64> {
        self.states.row(self.states.nrows() - 1)
    }

    /// Time course of a single gene.
    pub fn gene(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.states.column(idx)
    }

    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.states.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.states
    }
}

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Initialized,
    Stepping,
    Completed,
}

/// A single run, advanced one step at a time.
pub struct Simulation<'a> {
    view: &'a NetworkView,
    inhibited: &'a InhibitionSet,
    params: SimulationParams,
    x: Array1<f64>,
    drive: Array1<f64>,
    states: Array2<f64>,
    step: usize,
}

impl<'a> Simulation<'a> {
    /// Validate the configuration and set up the initial state. When
    /// `initial_state` is `None`, each gene is drawn uniformly from [0, 1).
    pub fn new<R: Rng + ?Sized>(
        view: &'a NetworkView,
        inhibited: &'a InhibitionSet,
        initial_state: Option<ArrayView1<f64>>,
        params: &SimulationParams,
        rng: &mut R,
    ) -> DynamicsResult<Self> {
        params.validate()?;
        let n = view.node_count;

        if let Some(max) = inhibited.max_index() {
            if max >= n {
                return Err(DynamicsError::DimensionMismatch {
                    context: format!("inhibited gene index {}", max),
                    expected: n,
                    actual: max + 1,
                });
            }
        }

        let mut x = match initial_state {
            Some(state) => {
                if state.len() != n {
                    return Err(DynamicsError::DimensionMismatch {
                        context: "initial state length vs gene count".to_string(),
                        expected: n,
                        actual: state.len(),
                    });
                }
                if let Some(idx) = state.iter().position(|v| !v.is_finite()) {
                    return Err(DynamicsError::NonFiniteInput(format!(
                        "initial state of {}",
                        view.index_to_gene[idx]
                    )));
                }
                state.to_owned()
            }
            None => Array1::from_shape_fn(n, |_| rng.gen::<f64>()),
        };
        inhibited.clamp(&mut x);

        if params.decay_rate * params.dt > 1.0 {
            tracing::warn!(
                decay_rate = params.decay_rate,
                dt = params.dt,
                "decay_rate * dt exceeds 1; forward Euler may oscillate"
            );
        }

        Ok(Self {
            view,
            inhibited,
            params: params.clone(),
            x,
            drive: Array1::zeros(n),
            states: Array2::zeros((params.time_steps, n)),
            step: 0,
        })
    }

    pub fn phase(&self) -> RunPhase {
        match self.step {
            0 => RunPhase::Initialized,
            s if s < self.params.time_steps => RunPhase::Stepping,
            _ => RunPhase::Completed,
        }
    }

    /// Current state vector.
    pub fn state(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    /// Advance one Euler step. Returns `false` once the run is complete.
    pub fn step(&mut self) -> bool {
        if self.phase() == RunPhase::Completed {
            return false;
        }

        self.view.regulatory_input(&self.x, &mut self.drive);
        let decay = self.params.decay_rate;
        let dt = self.params.dt;
        for (x, &z) in self.x.iter_mut().zip(self.drive.iter()) {
            let dxdt = -decay * *x + sigmoid(z);
            *x += dxdt * dt;
        }
        self.inhibited.clamp(&mut self.x);

        self.states.row_mut(self.step).assign(&self.x);
        self.step += 1;
        true
    }

    /// Run the remaining steps and hand over the trajectory.
    pub fn run(mut self) -> Trajectory {
        while self.step() {}
        Trajectory { states: self.states }
    }
}

/// Simulate one run of the network.
///
/// Deterministic given its inputs: with an explicit `initial_state` the
/// generator is never touched, otherwise the same seed gives the same run.
pub fn simulate<R: Rng + ?Sized>(
    view: &NetworkView,
    inhibited: &InhibitionSet,
    initial_state: Option<ArrayView1<f64>>,
    params: &SimulationParams,
    rng: &mut R,
) -> DynamicsResult<Trajectory> {
    let sim = Simulation::new(view, inhibited, initial_state, params, rng)?;
    tracing::trace!(
        genes = view.node_count,
        inhibited = inhibited.len(),
        steps = params.time_steps,
        "Starting simulation run"
    );
    Ok(sim.run())
}
