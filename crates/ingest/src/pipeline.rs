//! The ingestion pipeline
//!
//! Each modality decodes on its own blocking worker; the join below is the
//! only synchronization point. Failures are collected, never thrown: the
//! caller always receives either a complete sample or one report naming every
//! failing modality.

use tokio::task::JoinError;
use tracing::{debug, warn};

use ingest_types::{
    DecodedSignal, DecodedVolume, FileFormat, IngestConfig, IngestionError, Modality,
    ModalityError, ModalityStats, MultimodalSample, RawUpload,
};

use crate::consistency::{check_durations, check_spatial};
use crate::decode::{csv_signal, edf, nifti};
use crate::format::resolve_format;
use crate::normalize::{normalize_volume, zscore_signal};

/// Output of a single modality's decode step
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedModality {
    Signal(DecodedSignal),
    Volume(DecodedVolume),
}

impl DecodedModality {
    fn into_signal(self) -> Option<DecodedSignal> {
        match self {
            DecodedModality::Signal(signal) => Some(signal),
            DecodedModality::Volume(_) => None,
        }
    }

    fn into_volume(self) -> Option<DecodedVolume> {
        match self {
            DecodedModality::Volume(volume) => Some(volume),
            DecodedModality::Signal(_) => None,
        }
    }
}

/// Validate and decode one upload. Pure: no I/O, no shared state.
pub fn decode_upload(
    upload: &RawUpload,
    config: &IngestConfig,
) -> Result<DecodedModality, ModalityError> {
    if upload.bytes.is_empty() {
        return Err(ModalityError::SizeMismatch {
            reason: "payload is empty".to_string(),
        });
    }

    let format = resolve_format(upload)?;
    let decoded = match format {
        FileFormat::Edf => DecodedModality::Signal(edf::decode(&upload.bytes, false)?),
        FileFormat::Bdf => DecodedModality::Signal(edf::decode(&upload.bytes, true)?),
        FileFormat::Csv => {
            DecodedModality::Signal(csv_signal::decode(&upload.bytes, config.csv_sample_rate)?)
        }
        FileFormat::Nifti => DecodedModality::Volume(nifti::decode(&upload.bytes)?),
        FileFormat::NiftiGz => DecodedModality::Volume(nifti::decode_gz(&upload.bytes)?),
    };

    // Dimensional invariants tied to the modality, not the format
    match (&decoded, upload.modality) {
        (DecodedModality::Volume(volume), Modality::Mri) => {
            if volume.shape.frames() > 1 {
                return Err(ModalityError::SizeMismatch {
                    reason: format!(
                        "structural MRI must be a single frame, got {}",
                        volume.shape.frames()
                    ),
                });
            }
        }
        (DecodedModality::Volume(volume), Modality::Fmri) => {
            if volume.shape.frames() <= 1 {
                return Err(ModalityError::SizeMismatch {
                    reason: "fMRI must carry a temporal dimension greater than 1".to_string(),
                });
            }
        }
        _ => {}
    }

    Ok(decoded)
}

/// Validates three concurrent uploads and joins them into one sample
#[derive(Debug, Clone, Default)]
pub struct IngestionPipeline {
    config: IngestConfig,
}

impl IngestionPipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline with default configuration
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// The active configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one EEG, one MRI, and one fMRI upload.
    ///
    /// All three modalities are validated even when one fails; the error
    /// report enumerates every failure. Cross-modality checks run only over
    /// a fully decoded set.
    pub async fn ingest(
        &self,
        eeg: RawUpload,
        mri: RawUpload,
        fmri: RawUpload,
    ) -> Result<MultimodalSample, IngestionError> {
        debug!(
            eeg = %eeg.filename,
            mri = %mri.filename,
            fmri = %fmri.filename,
            "ingesting multimodal upload set"
        );

        let (eeg_out, mri_out, fmri_out) = tokio::join!(
            self.decode_task(eeg),
            self.decode_task(mri),
            self.decode_task(fmri),
        );

        let mut report = IngestionError::default();
        let eeg_decoded = collect(eeg_out, &mut report);
        let mri_decoded = collect(mri_out, &mut report);
        let fmri_decoded = collect(fmri_out, &mut report);

        if !report.is_empty() {
            return Err(report);
        }

        // All three decoded; the format table guarantees the representations
        let mut eeg_signal = match eeg_decoded.and_then(DecodedModality::into_signal) {
            Some(signal) => signal,
            None => {
                report.push_modality(Modality::Eeg, wrong_representation());
                return Err(report);
            }
        };
        let mut mri_volume = match mri_decoded.and_then(DecodedModality::into_volume) {
            Some(volume) => volume,
            None => {
                report.push_modality(Modality::Mri, wrong_representation());
                return Err(report);
            }
        };
        let mut fmri_volume = match fmri_decoded.and_then(DecodedModality::into_volume) {
            Some(volume) => volume,
            None => {
                report.push_modality(Modality::Fmri, wrong_representation());
                return Err(report);
            }
        };

        if let Some(cross) = check_spatial(&mri_volume, &fmri_volume, self.config.spatial_tolerance)
        {
            report.cross.push(cross);
            return Err(report);
        }

        let (duration_ratio, warning) =
            check_durations(&eeg_signal, &fmri_volume, self.config.imbalance_ratio);

        let eeg_stats = ModalityStats::from_samples(&eeg_signal.samples);
        let mri_stats = ModalityStats::from_samples(&mri_volume.data);
        let fmri_stats = ModalityStats::from_samples(&fmri_volume.data);
        let eeg_duration_secs = eeg_signal.duration_secs();
        let fmri_duration_secs = fmri_volume.duration_secs();

        if self.config.normalize {
            zscore_signal(&mut eeg_signal);
            normalize_volume(&mut mri_volume);
            normalize_volume(&mut fmri_volume);
        }

        let warnings: Vec<_> = warning.into_iter().collect();
        debug!(
            eeg_duration_secs,
            fmri_duration_secs,
            duration_ratio,
            warnings = warnings.len(),
            "ingest complete"
        );

        Ok(MultimodalSample {
            eeg: eeg_signal,
            mri: mri_volume,
            fmri: fmri_volume,
            eeg_stats,
            mri_stats,
            fmri_stats,
            eeg_duration_secs,
            fmri_duration_secs,
            duration_ratio,
            warnings,
        })
    }

    /// Run one modality's decode on a blocking worker, honoring the deadline
    async fn decode_task(
        &self,
        upload: RawUpload,
    ) -> (Modality, Result<DecodedModality, ModalityError>) {
        let modality = upload.modality;
        let config = self.config.clone();
        let handle = tokio::task::spawn_blocking(move || decode_upload(&upload, &config));

        let result = match self.config.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, handle).await {
                Ok(joined) => flatten_join(joined),
                Err(_) => {
                    warn!(%modality, ?deadline, "decode exceeded deadline");
                    Err(ModalityError::Timeout)
                }
            },
            None => flatten_join(handle.await),
        };

        (modality, result)
    }
}

fn collect(
    outcome: (Modality, Result<DecodedModality, ModalityError>),
    report: &mut IngestionError,
) -> Option<DecodedModality> {
    let (modality, result) = outcome;
    match result {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            report.push_modality(modality, error);
            None
        }
    }
}

fn wrong_representation() -> ModalityError {
    ModalityError::CorruptPayload {
        offset: 0,
        reason: "decoder produced a mismatched representation".to_string(),
    }
}

fn flatten_join(
    joined: Result<Result<DecodedModality, ModalityError>, JoinError>,
) -> Result<DecodedModality, ModalityError> {
    match joined {
        Ok(inner) => inner,
        Err(e) => Err(ModalityError::CorruptPayload {
            offset: 0,
            reason: format!("decode worker failed: {e}"),
        }),
    }
}
