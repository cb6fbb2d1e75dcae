//! Cross-modality consistency checks
//!
//! These run only over a fully decoded set: MRI and fMRI must agree on
//! in-plane geometry, and the EEG/fMRI durations are compared to flag gross
//! imbalance without enforcing equality (the acquisitions are independent).

use tracing::{debug, warn};

use ingest_types::{CrossCheckError, DecodedSignal, DecodedVolume, IngestWarning};

/// Check that MRI and fMRI share the same in-plane resolution and spacing
/// within a relative tolerance (0.0 = exact match).
pub fn check_spatial(
    mri: &DecodedVolume,
    fmri: &DecodedVolume,
    tolerance: f32,
) -> Option<CrossCheckError> {
    let (mri_x, mri_y) = mri.shape.in_plane();
    let (fmri_x, fmri_y) = fmri.shape.in_plane();
    if !within(mri_x as f32, fmri_x as f32, tolerance)
        || !within(mri_y as f32, fmri_y as f32, tolerance)
    {
        return Some(CrossCheckError::SpatialMismatch {
            detail: format!("in-plane resolution {mri_x}x{mri_y} vs {fmri_x}x{fmri_y}"),
        });
    }

    let (msx, msy) = mri.in_plane_spacing();
    let (fsx, fsy) = fmri.in_plane_spacing();
    if !within(msx, fsx, tolerance) || !within(msy, fsy, tolerance) {
        return Some(CrossCheckError::SpatialMismatch {
            detail: format!("in-plane voxel spacing ({msx},{msy}) vs ({fsx},{fsy})"),
        });
    }

    debug!(
        mri_plane = ?mri.shape.in_plane(),
        fmri_plane = ?fmri.shape.in_plane(),
        "spatial consistency check passed"
    );
    None
}

/// Relative comparison: |a - b| <= tolerance * max(|a|, |b|)
fn within(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

/// Compare EEG and fMRI durations.
///
/// Returns the recorded ratio (fMRI / EEG) and a warning when one duration
/// exceeds `imbalance_ratio` times the other.
pub fn check_durations(
    eeg: &DecodedSignal,
    fmri: &DecodedVolume,
    imbalance_ratio: f32,
) -> (f32, Option<IngestWarning>) {
    let eeg_secs = eeg.duration_secs();
    let fmri_secs = fmri.duration_secs();
    let ratio = fmri_secs / eeg_secs;

    let warning = if ratio > imbalance_ratio || ratio < 1.0 / imbalance_ratio {
        warn!(eeg_secs, fmri_secs, ratio, "modality durations are imbalanced");
        Some(IngestWarning::ModalityImbalance {
            eeg_duration_secs: eeg_secs,
            fmri_duration_secs: fmri_secs,
            ratio,
        })
    } else {
        None
    };

    (ratio, warning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::VolumeShape;

    fn volume(x: u32, y: u32, spacing: (f32, f32, f32), t: Option<u32>, tr: f32) -> DecodedVolume {
        let shape = VolumeShape { x, y, z: 1, t };
        DecodedVolume {
            shape,
            voxel_spacing: spacing,
            repetition_time: tr,
            data: vec![0.0; shape.voxel_count()],
        }
    }

    #[test]
    fn test_exact_match_passes() {
        let mri = volume(256, 256, (1.0, 1.0, 1.0), None, 0.0);
        let fmri = volume(256, 256, (1.0, 1.0, 1.0), Some(3), 2.0);
        assert!(check_spatial(&mri, &fmri, 0.0).is_none());
    }

    #[test]
    fn test_resolution_mismatch_detected() {
        let mri = volume(256, 256, (1.0, 1.0, 1.0), None, 0.0);
        let fmri = volume(128, 128, (1.0, 1.0, 1.0), Some(3), 2.0);
        let err = check_spatial(&mri, &fmri, 0.0).unwrap();
        assert!(matches!(err, CrossCheckError::SpatialMismatch { .. }));
    }

    #[test]
    fn test_spacing_mismatch_detected() {
        let mri = volume(64, 64, (1.0, 1.0, 1.0), None, 0.0);
        let fmri = volume(64, 64, (2.0, 2.0, 1.0), Some(3), 2.0);
        assert!(check_spatial(&mri, &fmri, 0.0).is_some());
    }

    #[test]
    fn test_tolerance_admits_near_match() {
        let mri = volume(100, 100, (1.0, 1.0, 1.0), None, 0.0);
        let fmri = volume(98, 98, (1.02, 1.0, 1.0), Some(3), 2.0);
        assert!(check_spatial(&mri, &fmri, 0.0).is_some());
        assert!(check_spatial(&mri, &fmri, 0.05).is_none());
    }

    #[test]
    fn test_duration_imbalance_flagged_both_ways() {
        // 10 s EEG at 4 Hz
        let eeg = DecodedSignal::new(1, 4.0, vec![], vec![0.0; 40]);

        let balanced = volume(4, 4, (1.0, 1.0, 1.0), Some(5), 2.0); // 10 s
        let (ratio, warning) = check_durations(&eeg, &balanced, 10.0);
        assert!((ratio - 1.0).abs() < 1e-6);
        assert!(warning.is_none());

        let long = volume(4, 4, (1.0, 1.0, 1.0), Some(101), 1.0); // 101 s
        let (_, warning) = check_durations(&eeg, &long, 10.0);
        assert!(warning.is_some());

        let short = volume(4, 4, (1.0, 1.0, 1.0), Some(2), 0.25); // 0.5 s
        let (ratio, warning) = check_durations(&eeg, &short, 10.0);
        assert!(ratio < 0.1);
        assert!(warning.is_some());
    }
}
