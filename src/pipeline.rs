//! End-to-end run: expression -> network -> stability -> perturbation atlas

use crate::config::PipelineConfig;
use crate::error::RegnetResult;
use crate::network::build_view;
use regnet_dynamics::{
    run_perturbation_atlas, run_stability_batch, KnockdownEffects, PerturbationAtlas,
    StabilitySummary,
};
use regnet_inference::{infer_with_diagnostics, ExpressionMatrix, GeneFitSummary, InteractionMatrix};
use serde::{Deserialize, Serialize};

/// Everything a pipeline run produces, in the network's gene order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineReport {
    pub matrix: InteractionMatrix,
    pub fits: Vec<GeneFitSummary>,
    pub stability: StabilitySummary,
    /// Absent when the atlas is disabled
    pub knockdown: Option<KnockdownEffects>,
}

impl PipelineReport {
    pub fn edge_count(&self) -> usize {
        self.matrix.nonzero_count()
    }
}

/// Intermediate products kept for callers that need full trajectories.
pub struct PipelineRun {
    pub report: PipelineReport,
    pub atlas: Option<PerturbationAtlas>,
}

pub fn run_pipeline(
    expression: &ExpressionMatrix,
    config: &PipelineConfig,
) -> RegnetResult<PipelineReport> {
    run_pipeline_with_atlas(expression, config).map(|run| run.report)
}

/// Run the pipeline and keep the atlas trajectories.
pub fn run_pipeline_with_atlas(
    expression: &ExpressionMatrix,
    config: &PipelineConfig,
) -> RegnetResult<PipelineRun> {
    config.validate()?;

    let fit = infer_with_diagnostics(expression, &config.inference)?;
    let view = build_view(&fit.matrix)?;
    let stability = run_stability_batch(
        &view,
        config.stability.replicates,
        &config.simulation,
        &config.seeds(),
    )?;

    let atlas = if config.atlas.disabled {
        None
    } else {
        let targets = match &config.atlas.targets {
            Some(targets) => targets.clone(),
            None => view.genes().to_vec(),
        };
        Some(run_perturbation_atlas(
            &view,
            targets.as_slice(),
            &config.simulation,
            &config.atlas_seeds(),
        )?)
    };

    let knockdown = match &atlas {
        Some(atlas) => Some(atlas.knockdown_effects(stability.mean_state().view())?),
        None => None,
    };

    tracing::info!(
        genes = view.node_count,
        edges = fit.matrix.nonzero_count(),
        knockdowns = atlas.as_ref().map(|a| a.len()).unwrap_or(0),
        "Pipeline complete"
    );

    Ok(PipelineRun {
        report: PipelineReport {
            matrix: fit.matrix,
            fits: fit.genes,
            stability,
            knockdown,
        },
        atlas,
    })
}
