//! NIfTI-1 volume decoder
//!
//! Parses the 348-byte header (dimensions, voxel spacing, datatype, data
//! offset), detecting endianness from the `sizeof_hdr` field, then widens the
//! voxel payload to f32. Gzip-compressed payloads are inflated transparently
//! before parsing.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::GzDecoder;
use tracing::trace;

use ingest_types::{DecodedVolume, ModalityError, VolumeShape};

use crate::format::{NIFTI1_MAGIC_OFFSET, NIFTI1_MAGIC_PAIR, NIFTI1_MAGIC_SINGLE};

const HEADER_LEN: usize = 348;

// NIfTI-1 datatype codes
const DT_UINT8: i16 = 2;
const DT_INT16: i16 = 4;
const DT_INT32: i16 = 8;
const DT_FLOAT32: i16 = 16;
const DT_FLOAT64: i16 = 64;

/// Inflate a gzip member and decode the contained NIfTI-1 volume
pub fn decode_gz(bytes: &[u8]) -> Result<DecodedVolume, ModalityError> {
    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut inflated)
        .map_err(|e| ModalityError::CorruptPayload {
            offset: 0,
            reason: format!("gzip inflation failed: {e}"),
        })?;
    decode(&inflated)
}

/// Decode an uncompressed NIfTI-1 volume
pub fn decode(bytes: &[u8]) -> Result<DecodedVolume, ModalityError> {
    if bytes.len() < HEADER_LEN {
        return Err(corrupt(bytes.len(), "header truncated"));
    }

    // sizeof_hdr doubles as the byte-order sentinel
    if LittleEndian::read_i32(&bytes[0..4]) == HEADER_LEN as i32 {
        parse::<LittleEndian>(bytes)
    } else if BigEndian::read_i32(&bytes[0..4]) == HEADER_LEN as i32 {
        parse::<BigEndian>(bytes)
    } else {
        Err(corrupt(0, "unrecognized header size field"))
    }
}

fn parse<E: ByteOrder>(bytes: &[u8]) -> Result<DecodedVolume, ModalityError> {
    let magic = &bytes[NIFTI1_MAGIC_OFFSET..NIFTI1_MAGIC_OFFSET + 4];
    if magic == NIFTI1_MAGIC_PAIR {
        return Err(corrupt(
            NIFTI1_MAGIC_OFFSET,
            "detached .hdr/.img pairs are not supported",
        ));
    }
    if magic != NIFTI1_MAGIC_SINGLE {
        return Err(corrupt(NIFTI1_MAGIC_OFFSET, "bad NIfTI-1 magic"));
    }

    let mut dim = [0i16; 8];
    for (i, d) in dim.iter_mut().enumerate() {
        *d = E::read_i16(&bytes[40 + i * 2..42 + i * 2]);
    }
    let ndim = dim[0];
    if !(1..=7).contains(&ndim) {
        return Err(corrupt(40, format!("dimension count {ndim} out of range")));
    }
    if ndim < 3 {
        return Err(size(format!("expected a 3D or 4D volume, got {ndim}D")));
    }
    // Trailing dims beyond t must be degenerate
    for d in dim.iter().take(1 + ndim as usize).skip(5) {
        if *d > 1 {
            return Err(size(format!("unsupported higher dimension of extent {d}")));
        }
    }

    let (x, y, z) = (dim[1], dim[2], dim[3]);
    if x <= 0 || y <= 0 || z <= 0 {
        return Err(size(format!("non-positive spatial dimensions ({x},{y},{z})")));
    }
    let t = if ndim >= 4 {
        let t = dim[4];
        if t <= 0 {
            return Err(size(format!("non-positive temporal dimension {t}")));
        }
        Some(t as u32)
    } else {
        None
    };

    let datatype = E::read_i16(&bytes[70..72]);
    let bitpix = E::read_i16(&bytes[72..74]);
    let sample_width = match datatype {
        DT_UINT8 => 1usize,
        DT_INT16 => 2,
        DT_INT32 | DT_FLOAT32 => 4,
        DT_FLOAT64 => 8,
        other => {
            return Err(corrupt(70, format!("unsupported datatype code {other}")));
        }
    };
    if bitpix as usize != sample_width * 8 {
        return Err(corrupt(
            72,
            format!("bitpix {bitpix} disagrees with datatype {datatype}"),
        ));
    }

    let mut pixdim = [0.0f32; 8];
    for (i, p) in pixdim.iter_mut().enumerate() {
        *p = E::read_f32(&bytes[76 + i * 4..80 + i * 4]);
    }
    let voxel_spacing = (pixdim[1], pixdim[2], pixdim[3]);
    if voxel_spacing.0 <= 0.0 || voxel_spacing.1 <= 0.0 || voxel_spacing.2 <= 0.0 {
        return Err(size(format!(
            "non-positive voxel spacing ({},{},{})",
            voxel_spacing.0, voxel_spacing.1, voxel_spacing.2
        )));
    }
    let repetition_time = pixdim[4];

    let vox_offset = E::read_f32(&bytes[108..112]);
    if vox_offset < HEADER_LEN as f32 || vox_offset.fract() != 0.0 {
        return Err(corrupt(108, format!("invalid voxel offset {vox_offset}")));
    }
    let vox_offset = vox_offset as usize;

    let shape = VolumeShape {
        x: x as u32,
        y: y as u32,
        z: z as u32,
        t,
    };
    let voxel_count = shape.voxel_count();
    let expected = voxel_count * sample_width;
    let actual = bytes.len().saturating_sub(vox_offset);
    if actual != expected {
        return Err(size(format!(
            "header declares {voxel_count} voxels ({expected} bytes), found {actual} bytes"
        )));
    }

    trace!(%shape, datatype, "decoding NIfTI-1 volume");

    let payload = &bytes[vox_offset..];
    let mut data = Vec::with_capacity(voxel_count);
    match datatype {
        DT_UINT8 => data.extend(payload.iter().map(|&v| v as f32)),
        DT_INT16 => {
            for chunk in payload.chunks_exact(2) {
                data.push(E::read_i16(chunk) as f32);
            }
        }
        DT_INT32 => {
            for chunk in payload.chunks_exact(4) {
                data.push(E::read_i32(chunk) as f32);
            }
        }
        DT_FLOAT32 => {
            for chunk in payload.chunks_exact(4) {
                data.push(E::read_f32(chunk));
            }
        }
        DT_FLOAT64 => {
            for chunk in payload.chunks_exact(8) {
                data.push(E::read_f64(chunk) as f32);
            }
        }
        _ => unreachable!("datatype validated above"),
    }

    Ok(DecodedVolume {
        shape,
        voxel_spacing,
        repetition_time,
        data,
    })
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
