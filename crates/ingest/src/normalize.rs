//! Canonical-range normalization
//!
//! Applied after validation so the prediction stage receives arrays in the
//! range the model expects: volumes scaled to [0, 1], EEG channels z-scored.
//! Constant-valued inputs pass through unchanged.

use ingest_types::{DecodedSignal, DecodedVolume};

/// Min-max scale a volume's voxels into [0, 1] in place
pub fn normalize_volume(volume: &mut DecodedVolume) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in &volume.data {
        min = min.min(v);
        max = max.max(v);
    }
    if max > min {
        let range = max - min;
        for v in &mut volume.data {
            *v = (*v - min) / range;
        }
    }
}

/// Z-score each channel of a signal in place.
/// Channels with zero variance are left untouched.
pub fn zscore_signal(signal: &mut DecodedSignal) {
    let per_channel = signal.samples_per_channel();
    if per_channel == 0 {
        return;
    }
    for channel in 0..signal.channel_count {
        let start = channel * per_channel;
        let slice = &mut signal.samples[start..start + per_channel];

        let mean = slice.iter().sum::<f32>() / per_channel as f32;
        let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / per_channel as f32;
        let std = variance.sqrt();
        if std > 0.0 {
            for v in slice.iter_mut() {
                *v = (*v - mean) / std;
            }
        }
    }
}
