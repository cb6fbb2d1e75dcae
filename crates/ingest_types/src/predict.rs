//! Prediction stage seam
//!
//! The model is an external collaborator: it receives the canonical sample
//! and returns a probability plus a label. Implementations run in their own
//! async tasks, so the trait mirrors the plugin seams elsewhere in the
//! workspace.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sample::MultimodalSample;

/// Result returned by the prediction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability of a seizure, in [0, 1]
    pub seizure_probability: f32,
    /// Human-readable seizure classification
    pub seizure_type: String,
    /// Per-modality contribution scores, each in [0, 1]
    pub modality_scores: ModalityScores,
}

/// Per-modality contribution to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalityScores {
    pub eeg: f32,
    pub mri: f32,
    pub fmri: f32,
}

/// The collaborator that turns a canonical sample into a prediction
#[async_trait]
pub trait SeizurePredictor: Send + Sync {
    /// Name of this predictor, for diagnostics
    fn name(&self) -> &'static str;

    /// Produce a prediction from a validated sample
    async fn predict(&self, sample: &MultimodalSample) -> Result<Prediction>;
}
