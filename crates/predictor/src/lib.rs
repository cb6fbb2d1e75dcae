//! Baseline seizure predictor
//!
//! Deterministic stand-in for the future multi-branch fusion model. Scores
//! are derived from bounded statistics of the canonical arrays, so identical
//! samples always produce identical predictions; the prototype's randomly
//! generated confidence values are gone. Replace this crate with the real
//! model behind the same trait.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use ingest_types::{ModalityScores, MultimodalSample, Prediction, SeizurePredictor};

const FOCAL_SEIZURE: &str = "Focal Seizure";
const NO_SEIZURE: &str = "No Seizure";

/// Combined score at or above which the sample is labeled a seizure
const DECISION_THRESHOLD: f32 = 0.5;

/// Statistics-driven placeholder implementation of `SeizurePredictor`
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselinePredictor;

impl BaselinePredictor {
    pub fn new() -> Self {
        Self
    }
}

/// Fraction of EEG samples more than two standard deviations from the mean,
/// scaled into [0, 1]. A spike-heavy recording scores high.
fn signal_score(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f32;
    let mean = samples.iter().sum::<f32>() / n;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    let outliers = samples
        .iter()
        .filter(|v| ((**v - mean) / std).abs() > 2.0)
        .count();
    (outliers as f32 / n * 10.0).clamp(0.0, 1.0)
}

/// Relative dispersion of voxel intensities, in [0, 1]
fn volume_score(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f32;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f32;
    for &v in data {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    let range = max - min;
    if range <= 0.0 {
        return 0.0;
    }
    let mean = sum / n;
    let variance = data.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (2.0 * variance.sqrt() / range).clamp(0.0, 1.0)
}

#[async_trait]
impl SeizurePredictor for BaselinePredictor {
    fn name(&self) -> &'static str {
        "baseline"
    }

    async fn predict(&self, sample: &MultimodalSample) -> Result<Prediction> {
        let modality_scores = ModalityScores {
            eeg: signal_score(&sample.eeg.samples),
            mri: volume_score(&sample.mri.data),
            fmri: volume_score(&sample.fmri.data),
        };

        // EEG dominates: it is the modality with temporal seizure signatures
        let seizure_probability = (0.5 * modality_scores.eeg
            + 0.25 * modality_scores.mri
            + 0.25 * modality_scores.fmri)
            .clamp(0.0, 1.0);

        let seizure_type = if seizure_probability >= DECISION_THRESHOLD {
            FOCAL_SEIZURE
        } else {
            NO_SEIZURE
        };

        debug!(
            eeg = modality_scores.eeg,
            mri = modality_scores.mri,
            fmri = modality_scores.fmri,
            seizure_probability,
            "baseline prediction"
        );

        Ok(Prediction {
            seizure_probability,
            seizure_type: seizure_type.to_string(),
            modality_scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::{DecodedSignal, DecodedVolume, ModalityStats, VolumeShape};

    fn sample() -> MultimodalSample {
        let eeg = DecodedSignal::new(
            1,
            4.0,
            vec!["ch0".to_string()],
            vec![0.0, 0.1, -0.1, 5.0, 0.0, -0.2, 0.1, 0.0],
        );
        let mri = DecodedVolume {
            shape: VolumeShape {
                x: 2,
                y: 2,
                z: 1,
                t: None,
            },
            voxel_spacing: (1.0, 1.0, 1.0),
            repetition_time: 0.0,
            data: vec![0.0, 0.25, 0.75, 1.0],
        };
        let fmri = DecodedVolume {
            shape: VolumeShape {
                x: 2,
                y: 2,
                z: 1,
                t: Some(2),
            },
            voxel_spacing: (1.0, 1.0, 1.0),
            repetition_time: 2.0,
            data: vec![0.0, 0.5, 0.5, 1.0, 0.25, 0.5, 0.75, 1.0],
        };
        MultimodalSample {
            eeg_stats: ModalityStats::from_samples(&eeg.samples),
            mri_stats: ModalityStats::from_samples(&mri.data),
            fmri_stats: ModalityStats::from_samples(&fmri.data),
            eeg_duration_secs: eeg.duration_secs(),
            fmri_duration_secs: fmri.duration_secs(),
            duration_ratio: fmri.duration_secs() / eeg.duration_secs(),
            eeg,
            mri,
            fmri,
            warnings: vec![],
        }
    }

    #[tokio::test]
    async fn test_prediction_is_deterministic() {
        let predictor = BaselinePredictor::new();
        let sample = sample();

        let first = predictor.predict(&sample).await.unwrap();
        let second = predictor.predict(&sample).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_probability_and_scores_bounded() {
        let predictor = BaselinePredictor::new();
        let prediction = predictor.predict(&sample()).await.unwrap();

        assert!((0.0..=1.0).contains(&prediction.seizure_probability));
        assert!((0.0..=1.0).contains(&prediction.modality_scores.eeg));
        assert!((0.0..=1.0).contains(&prediction.modality_scores.mri));
        assert!((0.0..=1.0).contains(&prediction.modality_scores.fmri));
        assert!(!prediction.seizure_type.is_empty());
    }

    #[test]
    fn test_constant_arrays_score_zero() {
        assert_eq!(signal_score(&[1.0; 32]), 0.0);
        assert_eq!(volume_score(&[3.0; 16]), 0.0);
        assert_eq!(signal_score(&[]), 0.0);
        assert_eq!(volume_score(&[]), 0.0);
    }
}
