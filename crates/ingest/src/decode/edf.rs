//! EDF/BDF signal decoder
//!
//! Both formats share the same ASCII header layout: a fixed 256-byte block
//! followed by 256 bytes of field-major metadata per signal, then data
//! records interleaved signal-by-signal. EDF stores 16-bit little-endian
//! samples, BDF 24-bit. Digital values are scaled to physical units with the
//! per-signal calibration fields.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use ingest_types::{DecodedSignal, ModalityError};

use crate::format::{BDF_MAGIC, EDF_MAGIC};

const FIXED_HEADER_LEN: usize = 256;
const PER_SIGNAL_HEADER_LEN: usize = 256;

/// Calibration and layout for one signal, parsed from the header block
struct SignalHeader {
    label: String,
    physical_min: f64,
    physical_max: f64,
    digital_min: f64,
    digital_max: f64,
    samples_per_record: usize,
}

impl SignalHeader {
    /// Digital-to-physical conversion for one sample
    fn to_physical(&self, digital: f64) -> f32 {
        let gain = (self.physical_max - self.physical_min) / (self.digital_max - self.digital_min);
        (self.physical_min + (digital - self.digital_min) * gain) as f32
    }
}

/// Decode an EDF (`bdf == false`) or BDF (`bdf == true`) payload
pub fn decode(bytes: &[u8], bdf: bool) -> Result<DecodedSignal, ModalityError> {
    let magic: &[u8] = if bdf { &BDF_MAGIC } else { &EDF_MAGIC };
    if bytes.len() < magic.len() || &bytes[..magic.len()] != magic {
        return Err(corrupt(0, "bad EDF/BDF version field"));
    }
    if bytes.len() < FIXED_HEADER_LEN {
        return Err(corrupt(bytes.len(), "fixed header truncated"));
    }

    let header_bytes = ascii_usize(bytes, 184, 8, "header byte count")?;
    let record_count = ascii_i64(bytes, 236, 8, "record count")?;
    let record_duration = ascii_f64(bytes, 244, 8, "record duration")?;
    let signal_count = ascii_usize(bytes, 252, 4, "signal count")?;

    if signal_count == 0 {
        return Err(size("signal count must be positive"));
    }
    if record_duration <= 0.0 {
        return Err(size(format!(
            "record duration must be positive, got {record_duration}"
        )));
    }

    let header_end = FIXED_HEADER_LEN + signal_count * PER_SIGNAL_HEADER_LEN;
    if header_bytes != header_end {
        return Err(corrupt(
            184,
            format!(
                "header byte count {header_bytes} disagrees with {signal_count} signals \
                 (expected {header_end})"
            ),
        ));
    }
    if bytes.len() < header_end {
        return Err(corrupt(bytes.len(), "signal headers truncated"));
    }

    let signals = parse_signal_headers(bytes, signal_count)?;

    // Rectangular output requires one rate across signals
    let samples_per_record = signals[0].samples_per_record;
    if let Some(odd) = signals
        .iter()
        .position(|s| s.samples_per_record != samples_per_record)
    {
        let offset = FIXED_HEADER_LEN + signal_count * 216 + odd * 8;
        return Err(corrupt(
            offset,
            "mixed per-signal sample rates are not supported",
        ));
    }

    let sample_width = if bdf { 3 } else { 2 };
    let record_len = signal_count * samples_per_record * sample_width;
    let payload = &bytes[header_end..];

    let records = if record_count >= 0 {
        let expected = record_count as usize * record_len;
        if payload.len() != expected {
            return Err(size(format!(
                "header declares {record_count} data records ({expected} bytes), \
                 found {} bytes",
                payload.len()
            )));
        }
        record_count as usize
    } else {
        // Record count of -1 means "unknown"; derive it from the payload
        let records = payload.len() / record_len;
        if payload.len() % record_len != 0 {
            return Err(corrupt(
                header_end + records * record_len,
                "truncated data record",
            ));
        }
        records
    };
    if records == 0 {
        return Err(size("payload holds no data records"));
    }

    trace!(
        signals = signal_count,
        records,
        samples_per_record,
        bdf,
        "decoding biosignal payload"
    );

    let per_channel = records * samples_per_record;
    let mut samples = vec![0.0f32; signal_count * per_channel];
    let mut cursor = 0usize;
    for record in 0..records {
        for (sig_idx, signal) in signals.iter().enumerate() {
            for k in 0..samples_per_record {
                let digital = if bdf {
                    read_i24(&payload[cursor..cursor + 3])
                } else {
                    LittleEndian::read_i16(&payload[cursor..cursor + 2]) as i32
                };
                cursor += sample_width;
                let out = sig_idx * per_channel + record * samples_per_record + k;
                samples[out] = signal.to_physical(digital as f64);
            }
        }
    }

    let sample_rate = (samples_per_record as f64 / record_duration) as f32;
    let channel_names = signals.into_iter().map(|s| s.label).collect();

    Ok(DecodedSignal::new(
        signal_count,
        sample_rate,
        channel_names,
        samples,
    ))
}

fn parse_signal_headers(bytes: &[u8], ns: usize) -> Result<Vec<SignalHeader>, ModalityError> {
    let base = FIXED_HEADER_LEN;
    let mut signals = Vec::with_capacity(ns);
    for i in 0..ns {
        let label = ascii_str(bytes, base + i * 16, 16, "signal label")?.to_string();
        let physical_min = ascii_f64(bytes, base + ns * 104 + i * 8, 8, "physical minimum")?;
        let physical_max = ascii_f64(bytes, base + ns * 112 + i * 8, 8, "physical maximum")?;
        let dig_min_offset = base + ns * 120 + i * 8;
        let digital_min = ascii_f64(bytes, dig_min_offset, 8, "digital minimum")?;
        let digital_max = ascii_f64(bytes, base + ns * 128 + i * 8, 8, "digital maximum")?;
        let samples_per_record =
            ascii_usize(bytes, base + ns * 216 + i * 8, 8, "samples per record")?;

        if samples_per_record == 0 {
            return Err(size(format!(
                "signal '{label}' declares zero samples per record"
            )));
        }
        if digital_max == digital_min {
            return Err(corrupt(
                dig_min_offset,
                format!("signal '{label}' has an empty digital calibration range"),
            ));
        }

        signals.push(SignalHeader {
            label,
            physical_min,
            physical_max,
            digital_min,
            digital_max,
            samples_per_record,
        });
    }
    Ok(signals)
}

/// Sign-extend a 3-byte little-endian integer
fn read_i24(bytes: &[u8]) -> i32 {
    let raw = bytes[0] as i32 | (bytes[1] as i32) << 8 | (bytes[2] as i32) << 16;
    (raw << 8) >> 8
}

fn ascii_str<'a>(
    bytes: &'a [u8],
    offset: usize,
    len: usize,
    what: &str,
) -> Result<&'a str, ModalityError> {
    let raw = bytes
        .get(offset..offset + len)
        .ok_or_else(|| corrupt(bytes.len(), format!("{what} field truncated")))?;
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|_| corrupt(offset, format!("{what} field is not ASCII")))
}

fn ascii_f64(bytes: &[u8], offset: usize, len: usize, what: &str) -> Result<f64, ModalityError> {
    let text = ascii_str(bytes, offset, len, what)?;
    text.parse::<f64>()
        .map_err(|_| corrupt(offset, format!("{what} field is not numeric: '{text}'")))
}

fn ascii_i64(bytes: &[u8], offset: usize, len: usize, what: &str) -> Result<i64, ModalityError> {
    let text = ascii_str(bytes, offset, len, what)?;
    text.parse::<i64>()
        .map_err(|_| corrupt(offset, format!("{what} field is not an integer: '{text}'")))
}

fn ascii_usize(bytes: &[u8], offset: usize, len: usize, what: &str) -> Result<usize, ModalityError> {
    let text = ascii_str(bytes, offset, len, what)?;
    text.parse::<usize>()
        .map_err(|_| corrupt(offset, format!("{what} field is not an unsigned integer: '{text}'")))
}

fn corrupt(offset: usize, reason: impl Into<String>) -> ModalityError {
    ModalityError::CorruptPayload {
        offset: offset as u64,
        reason: reason.into(),
    }
}

fn size(reason: impl Into<String>) -> ModalityError {
    ModalityError::SizeMismatch { reason: reason.into() }
}
