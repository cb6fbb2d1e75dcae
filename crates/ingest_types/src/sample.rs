//! Canonical decoded representations
//!
//! Decoders turn raw upload bytes into these types. Sample data is stored in
//! flat channel-major buffers so downstream consumers can slice per channel
//! without reshaping.

use serde::{Deserialize, Serialize};

use crate::error::IngestWarning;

/// Decoded multi-channel EEG signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSignal {
    /// Number of channels in this signal
    pub channel_count: usize,
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Channel labels, one per channel
    pub channel_names: Vec<String>,
    /// Flattened samples in physical units, laid out `[channel][time]`
    pub samples: Vec<f32>,
}

impl DecodedSignal {
    /// Create a new decoded signal
    pub fn new(
        channel_count: usize,
        sample_rate: f32,
        channel_names: Vec<String>,
        samples: Vec<f32>,
    ) -> Self {
        Self {
            channel_count,
            sample_rate,
            channel_names,
            samples,
        }
    }

    /// Number of samples held per channel
    pub fn samples_per_channel(&self) -> usize {
        if self.channel_count == 0 {
            0
        } else {
            self.samples.len() / self.channel_count
        }
    }

    /// Get the samples for a specific channel
    pub fn channel_samples(&self, channel: usize) -> Option<&[f32]> {
        if channel >= self.channel_count {
            return None;
        }

        let per_channel = self.samples_per_channel();
        let start = channel * per_channel;
        let end = start + per_channel;

        self.samples.get(start..end)
    }

    /// Recording duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples_per_channel() as f32 / self.sample_rate
    }
}

/// Spatial (and optionally temporal) extent of a decoded volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeShape {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    /// Temporal extent; `None` for structural volumes
    pub t: Option<u32>,
}

impl VolumeShape {
    /// Total number of voxels across all frames
    pub fn voxel_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize * self.frames() as usize
    }

    /// In-plane resolution, the axes shared by MRI and fMRI acquisitions
    pub fn in_plane(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Number of temporal frames (1 for structural volumes)
    pub fn frames(&self) -> u32 {
        self.t.unwrap_or(1)
    }
}

impl std::fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.t {
            Some(t) => write!(f, "({},{},{},{})", self.x, self.y, self.z, t),
            None => write!(f, "({},{},{})", self.x, self.y, self.z),
        }
    }
}

/// Decoded volumetric image (MRI or fMRI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedVolume {
    /// Volume dimensions
    pub shape: VolumeShape,
    /// Voxel spacing in millimeters along x, y, z
    pub voxel_spacing: (f32, f32, f32),
    /// Seconds per temporal frame as recorded in the header; 0 when absent
    pub repetition_time: f32,
    /// Flattened voxel data, x varying fastest, of length `shape.voxel_count()`
    pub data: Vec<f32>,
}

impl DecodedVolume {
    /// Acquisition duration in seconds.
    ///
    /// Headers frequently carry a zero repetition time; fall back to one
    /// second per frame so the duration stays positive and comparable.
    pub fn duration_secs(&self) -> f32 {
        let tr = if self.repetition_time > 0.0 {
            self.repetition_time
        } else {
            1.0
        };
        self.shape.frames() as f32 * tr
    }

    /// In-plane voxel spacing (x, y)
    pub fn in_plane_spacing(&self) -> (f32, f32) {
        (self.voxel_spacing.0, self.voxel_spacing.1)
    }
}

/// Per-modality extrema, captured before any normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalityStats {
    pub min: f32,
    pub max: f32,
}

impl ModalityStats {
    /// Compute extrema over a sample buffer
    pub fn from_samples(samples: &[f32]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &value in samples {
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }
        if samples.is_empty() {
            Self { min: 0.0, max: 0.0 }
        } else {
            Self { min, max }
        }
    }
}

/// The joined, validated sample handed to the prediction stage.
///
/// Constructed only after all three inputs pass validation and the
/// cross-modality checks; a failed ingest never produces a partial sample.
/// Transient: held only until the prediction stage has consumed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultimodalSample {
    pub eeg: DecodedSignal,
    pub mri: DecodedVolume,
    pub fmri: DecodedVolume,
    /// Extrema of each modality before normalization
    pub eeg_stats: ModalityStats,
    pub mri_stats: ModalityStats,
    pub fmri_stats: ModalityStats,
    /// EEG recording duration in seconds
    pub eeg_duration_secs: f32,
    /// fMRI acquisition duration in seconds
    pub fmri_duration_secs: f32,
    /// fMRI duration divided by EEG duration, recorded for the model
    pub duration_ratio: f32,
    /// Non-fatal findings attached during ingestion
    pub warnings: Vec<IngestWarning>,
}
