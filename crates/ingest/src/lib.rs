//! Multimodal Upload Ingestion Pipeline
//!
//! This crate validates and decodes heterogeneous neuroimaging uploads (EEG,
//! MRI, fMRI) into a canonical in-memory representation. Each modality is
//! checked and decoded independently, the outcomes are joined, cross-modality
//! consistency checks run over the joined set, and the caller receives either
//! a complete `MultimodalSample` or one aggregated error report naming every
//! failing modality.

pub mod consistency;
pub mod decode;
pub mod format;
pub mod normalize;
pub mod pipeline;


// Re-export commonly used types
pub use format::*;
pub use pipeline::*;

pub use ingest_types::{
    CrossCheckError, DecodedSignal, DecodedVolume, FileFormat, IngestConfig, IngestWarning,
    IngestionError, Modality, ModalityError, ModalityFailure, ModalityStats, MultimodalSample,
    RawUpload, VolumeShape,
};
