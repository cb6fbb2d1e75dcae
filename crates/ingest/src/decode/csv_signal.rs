//! CSV signal decoder
//!
//! One row per sample instant, one column per channel. An optional leading
//! header row names the channels; otherwise channels are named `ch0..chN`.
//! CSV carries no sample rate, so the caller supplies one.

use csv::ReaderBuilder;
use tracing::trace;

use ingest_types::{DecodedSignal, ModalityError};

/// Decode a numeric CSV payload into a channel-major signal
pub fn decode(bytes: &[u8], sample_rate: f32) -> Result<DecodedSignal, ModalityError> {
    if sample_rate <= 0.0 {
        return Err(ModalityError::SizeMismatch {
            reason: format!("configured CSV sample rate must be positive, got {sample_rate}"),
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut channel_names: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<f32>> = Vec::new();
    let mut channel_count = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| corrupt_at(&e, "malformed CSV record"))?;
        let offset = record.position().map(|p| p.byte()).unwrap_or(0);

        if record.is_empty() || (record.len() == 1 && record[0].trim().is_empty()) {
            continue;
        }

        let parsed: Result<Vec<f32>, _> = record.iter().map(|f| f.trim().parse::<f32>()).collect();
        match parsed {
            Ok(values) => {
                if rows.is_empty() && channel_names.is_empty() {
                    channel_count = values.len();
                    channel_names = (0..channel_count).map(|i| format!("ch{i}")).collect();
                } else if values.len() != channel_count {
                    return Err(ModalityError::CorruptPayload {
                        offset,
                        reason: format!(
                            "row has {} columns, expected {channel_count}",
                            values.len()
                        ),
                    });
                }
                rows.push(values);
            }
            Err(_) => {
                // A non-numeric first row is the header; anywhere else it is corrupt
                if rows.is_empty() && channel_names.is_empty() {
                    channel_count = record.len();
                    channel_names = record.iter().map(|f| f.trim().to_string()).collect();
                } else {
                    return Err(ModalityError::CorruptPayload {
                        offset,
                        reason: "non-numeric value in data row".to_string(),
                    });
                }
            }
        }
    }

    if channel_count == 0 {
        return Err(ModalityError::SizeMismatch {
            reason: "CSV payload has no columns".to_string(),
        });
    }
    if rows.is_empty() {
        return Err(ModalityError::SizeMismatch {
            reason: "CSV payload has no data rows".to_string(),
        });
    }

    trace!(
        channels = channel_count,
        samples = rows.len(),
        "decoded CSV signal"
    );

    // Transpose row-major input into the channel-major layout
    let per_channel = rows.len();
    let mut samples = vec![0.0f32; channel_count * per_channel];
    for (time, row) in rows.iter().enumerate() {
        for (channel, &value) in row.iter().enumerate() {
            samples[channel * per_channel + time] = value;
        }
    }

    Ok(DecodedSignal::new(
        channel_count,
        sample_rate,
        channel_names,
        samples,
    ))
}

fn corrupt_at(error: &csv::Error, reason: &str) -> ModalityError {
    let offset = error.position().map(|p| p.byte()).unwrap_or(0);
    ModalityError::CorruptPayload {
        offset,
        reason: format!("{reason}: {error}"),
    }
}
