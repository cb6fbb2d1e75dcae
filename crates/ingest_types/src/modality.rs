//! Modality and upload types
//!
//! A `RawUpload` is the unit handed over by the transport layer: the payload
//! bytes plus the modality and filename the caller declared for them. It is
//! immutable once received; everything the pipeline learns about the payload
//! comes from decoding, never from mutating the upload.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The three independent data sources accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modality {
    /// Multi-channel electroencephalography time series
    Eeg,
    /// Structural MRI volume (3D)
    Mri,
    /// Functional MRI volume (3D + time)
    Fmri,
}

impl Modality {
    /// Lowercase name as used in filenames and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Eeg => "eeg",
            Modality::Mri => "mri",
            Modality::Fmri => "fmri",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk formats the pipeline can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileFormat {
    /// European Data Format (16-bit samples)
    Edf,
    /// BioSemi Data Format (24-bit samples)
    Bdf,
    /// Plain numeric CSV, one row per sample instant
    Csv,
    /// NIfTI-1 single-file volume
    Nifti,
    /// Gzip-compressed NIfTI-1 single-file volume
    NiftiGz,
}

impl FileFormat {
    /// Canonical extension as it appears at the end of a filename
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Edf => "edf",
            FileFormat::Bdf => "bdf",
            FileFormat::Csv => "csv",
            FileFormat::Nifti => "nii",
            FileFormat::NiftiGz => "nii.gz",
        }
    }

    /// Map a lowercase extension (without the leading dot) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "edf" => Some(FileFormat::Edf),
            "bdf" => Some(FileFormat::Bdf),
            "csv" => Some(FileFormat::Csv),
            "nii" => Some(FileFormat::Nifti),
            "nii.gz" => Some(FileFormat::NiftiGz),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An upload as handed over by the transport layer. Immutable once received.
///
/// The payload is already fully materialized in memory; streaming, size
/// limits, and backpressure are the transport layer's concern.
#[derive(Debug, Clone)]
pub struct RawUpload {
    /// Which of the three sources the caller says this is
    pub modality: Modality,
    /// Original filename, used only for extension extraction and reports
    pub filename: String,
    /// Lowercase extension derived from the filename ("nii.gz" stays compound)
    pub declared_extension: String,
    /// The payload bytes
    pub bytes: Bytes,
}

impl RawUpload {
    /// Build an upload, deriving the declared extension from the filename.
    pub fn new(modality: Modality, filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let declared_extension = extension_of(&filename);
        Self {
            modality,
            filename,
            declared_extension,
            bytes: bytes.into(),
        }
    }
}

/// Extract the lowercase extension of a filename, keeping the compound
/// ".nii.gz" intact. Returns an empty string when there is none.
pub fn extension_of(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".nii.gz") {
        return "nii.gz".to_string();
    }
    match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_string(),
        _ => String::new(),
    }
}
