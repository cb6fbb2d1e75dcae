//! Error and warning kinds for the ingestion pipeline
//!
//! Failures are collected, never thrown mid-pipeline: one `ingest` call
//! returns either a complete sample or one `IngestionError` enumerating every
//! failing modality. All kinds serialize so the transport layer can shape its
//! own wire format from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modality::Modality;

/// A fatal validation failure for a single modality
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ModalityError {
    /// Declared extension and detected payload content disagree
    #[error("declared format '{declared}' does not match detected content ({detected})")]
    FormatMismatch { declared: String, detected: String },

    /// Payload could not be decoded past the given byte offset
    #[error("corrupt payload at byte offset {offset}: {reason}")]
    CorruptPayload { offset: u64, reason: String },

    /// Payload size or a decoded bound is out of range
    #[error("size mismatch: {reason}")]
    SizeMismatch { reason: String },

    /// Decode did not finish before the caller-supplied deadline
    #[error("decode did not complete before the deadline")]
    Timeout,
}

impl ModalityError {
    /// Stable kind name for transport-layer dispatch
    pub fn kind(&self) -> &'static str {
        match self {
            ModalityError::FormatMismatch { .. } => "FormatMismatch",
            ModalityError::CorruptPayload { .. } => "CorruptPayload",
            ModalityError::SizeMismatch { .. } => "SizeMismatch",
            ModalityError::Timeout => "Timeout",
        }
    }
}

/// A failure of the checks run over the joined, successfully decoded set
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CrossCheckError {
    /// MRI and fMRI disagree on in-plane resolution or spacing
    #[error("spatial mismatch between MRI and fMRI: {detail}")]
    SpatialMismatch { detail: String },
}

/// Non-fatal findings attached to a successful sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IngestWarning {
    /// One modality's duration dwarfs the other's
    ModalityImbalance {
        eeg_duration_secs: f32,
        fmri_duration_secs: f32,
        ratio: f32,
    },
}

/// A modality paired with its failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityFailure {
    pub modality: Modality,
    pub error: ModalityError,
}

/// Aggregated report of everything that failed in one `ingest` call.
///
/// Every modality is validated even after an earlier one fails, so the
/// caller can report all problems in a single response. Cross-modality
/// failures appear only when all three modalities decoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngestionError {
    /// Per-modality failures, at most one per modality
    pub modalities: Vec<ModalityFailure>,
    /// Failures of the joined consistency checks
    pub cross: Vec<CrossCheckError>,
}

impl IngestionError {
    /// True when nothing failed
    pub fn is_empty(&self) -> bool {
        self.modalities.is_empty() && self.cross.is_empty()
    }

    /// Record a modality failure
    pub fn push_modality(&mut self, modality: Modality, error: ModalityError) {
        self.modalities.push(ModalityFailure { modality, error });
    }

    /// Look up the failure recorded for a modality, if any
    pub fn modality_error(&self, modality: Modality) -> Option<&ModalityError> {
        self.modalities
            .iter()
            .find(|f| f.modality == modality)
            .map(|f| &f.error)
    }
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ingestion failed ({} modality failure(s), {} cross-check failure(s))",
            self.modalities.len(),
            self.cross.len()
        )?;
        for failure in &self.modalities {
            write!(f, "; {}: {}", failure.modality, failure.error)?;
        }
        for cross in &self.cross {
            write!(f, "; {}", cross)?;
        }
        Ok(())
    }
}

impl std::error::Error for IngestionError {}
