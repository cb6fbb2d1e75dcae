//! Configuration for the ingestion pipeline

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for one `IngestionPipeline` instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Relative tolerance for the MRI/fMRI in-plane comparison.
    /// 0.0 requires exact equality.
    #[serde(default)]
    pub spatial_tolerance: f32,
    /// Duration ratio beyond which a `ModalityImbalance` warning is attached
    #[serde(default = "default_imbalance_ratio")]
    pub imbalance_ratio: f32,
    /// Sample rate assumed for CSV uploads, which carry none themselves
    #[serde(default = "default_csv_sample_rate")]
    pub csv_sample_rate: f32,
    /// Scale decoded arrays into the canonical range the model expects
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    /// Optional per-modality decode deadline
    #[serde(default)]
    pub deadline: Option<Duration>,
}

fn default_imbalance_ratio() -> f32 {
    10.0
}

fn default_csv_sample_rate() -> f32 {
    256.0
}

fn default_normalize() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            spatial_tolerance: 0.0,
            imbalance_ratio: default_imbalance_ratio(),
            csv_sample_rate: default_csv_sample_rate(),
            normalize: default_normalize(),
            deadline: None,
        }
    }
}
