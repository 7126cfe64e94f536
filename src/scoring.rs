//! Signed pathway-score aggregation
//!
//! Collapses a pathway x sample enrichment table into one score per sample
//! using a fixed table of signed pathway weights, then z-standardizes the
//! result. Independent of the network core.

use crate::error::{RegnetError, RegnetResult};
use indexmap::IndexMap;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Pathway term -> signed weight (+1 promotes the phenotype, -1 opposes it).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathwayWeights {
    pub name: String,
    pub weights: IndexMap<String, f64>,
}

impl PathwayWeights {
    pub fn new(name: impl Into<String>, weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            name: name.into(),
            weights: weights.into_iter().collect(),
        }
    }

    fn from_table(name: &str, table: &[(&str, f64)]) -> Self {
        Self::new(name, table.iter().map(|(p, w)| (p.to_string(), *w)))
    }

    /// Lipid droplet formation, storage and uptake (+1) against export and
    /// breakdown (-1).
    pub fn lipid_accumulation() -> Self {
        Self::from_table(
            "lipid_accumulation",
            &[
                ("GOBP_LIPID_DROPLET_FORMATION", 1.0),
                ("GOBP_LIPID_DROPLET_DISASSEMBLY", -1.0),
                ("GOBP_LIPID_EXPORT_FROM_CELL", -1.0),
                ("GOBP_LIPID_HOMEOSTASIS", 1.0),
                ("GOBP_LIPID_IMPORT_INTO_CELL", 1.0),
                ("GOBP_LIPID_LOCALIZATION", 1.0),
                ("GOBP_LIPID_METABOLIC_PROCESS", 1.0),
                ("GOBP_LIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_LIPID_BIOSYNTHETIC_PROCESS", 1.0),
                ("GOBP_LIPID_DROPLET_FUSION", 1.0),
                ("GOBP_LIPOPROTEIN_METABOLIC_PROCESS", 1.0),
                ("GOBP_NEGATIVE_REGULATION_OF_LIPID_STORAGE", -1.0),
                ("GOBP_POSITIVE_REGULATION_OF_LIPID_STORAGE", 1.0),
                ("GOBP_POSITIVE_REGULATION_OF_LIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_POSITIVE_REGULATION_OF_MACROPHAGE_DERIVED_FOAM_CELL_DIFFERENTIATION", 1.0),
                ("GOBP_LIPOPHAGY", -1.0),
            ],
        )
    }

    /// Lipid catabolism pathways, all weighted -1.
    pub fn lipid_catabolism() -> Self {
        Self::from_table(
            "lipid_catabolism",
            &[
                ("GOBP_LIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_NEGATIVE_REGULATION_OF_LIPID_BIOSYNTHETIC_PROCESS", -1.0),
                ("GOBP_POSITIVE_REGULATION_OF_LIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_LIPOPHAGY", -1.0),
                ("REACTOME_GLYCEROPHOSPHOLIPID_CATABOLISM", -1.0),
                ("REACTOME_SPHINGOLIPID_CATABOLISM", -1.0),
                ("REACTOME_PHOSPHOLIPID_METABOLISM", -1.0),
                ("GOBP_LIPID_DROPLET_DISASSEMBLY", -1.0),
                ("GOBP_NEGATIVE_REGULATION_OF_LIPID_STORAGE", -1.0),
                ("WP_DEGRADATION_PATHWAY_OF_SPHINGOLIPIDS_INCLUDING_DISEASES", -1.0),
                ("GOBP_NEUTRAL_LIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_PHOSPHOLIPID_CATABOLIC_PROCESS", -1.0),
                ("GOBP_LIPOPROTEIN_CATABOLIC_PROCESS", -1.0),
                ("REACTOME_GLYCOSPHINGOLIPID_CATABOLISM", -1.0),
            ],
        )
    }
}

/// Per-sample scores and the pathways that contributed to them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhenotypeScores {
    pub samples: Vec<String>,
    pub scores: Array1<f64>,
    /// Standardized scores, using the sample standard deviation (n - 1)
    pub z_scores: Array1<f64>,
    pub used_pathways: Vec<String>,
    pub missing_pathways: Vec<String>,
}

/// Apply `weights` to a pathway x sample score table.
///
/// Pathways absent from the table are skipped and listed in `missing_pathways`;
/// at least one must be present.
pub fn score_samples(
    pathways: &[String],
    samples: &[String],
    table: ArrayView2<f64>,
    weights: &PathwayWeights,
) -> RegnetResult<PhenotypeScores> {
    if table.dim() != (pathways.len(), samples.len()) {
        return Err(RegnetError::InvalidInput(format!(
            "score table is {:?}, labels describe ({}, {})",
            table.dim(),
            pathways.len(),
            samples.len()
        )));
    }

    let mut scores = Array1::<f64>::zeros(samples.len());
    let mut used = Vec::new();
    let mut missing = Vec::new();
    for (pathway, &weight) in &weights.weights {
        match pathways.iter().position(|p| p == pathway) {
            Some(row) => {
                scores.scaled_add(weight, &table.row(row));
                used.push(pathway.clone());
            }
            None => missing.push(pathway.clone()),
        }
    }

    if used.is_empty() {
        return Err(RegnetError::InvalidInput(format!(
            "none of the {} pathways of {} are present",
            weights.weights.len(),
            weights.name
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(RegnetError::InvalidInput(
            "pathway scores contain NaN or infinite values".to_string(),
        ));
    }

    tracing::debug!(
        weights = %weights.name,
        used = used.len(),
        missing = missing.len(),
        "Scored samples"
    );

    let z_scores = z_standardize(&scores)?;
    Ok(PhenotypeScores {
        samples: samples.to_vec(),
        scores,
        z_scores,
        used_pathways: used,
        missing_pathways: missing,
    })
}

/// (x - mean) / sd with the sample standard deviation.
pub fn z_standardize(values: &Array1<f64>) -> RegnetResult<Array1<f64>> {
    if values.len() < 2 {
        return Err(RegnetError::InvalidInput("z-scores need at least two samples".to_string()));
    }
    let mean = values.mean().unwrap_or(0.0);
    let sd = values.std(1.0);
    if sd == 0.0 {
        return Err(RegnetError::InvalidInput(
            "scores are constant; z-scores are undefined".to_string(),
        ));
    }
    Ok(values.mapv(|v| (v - mean) / sd))
}
