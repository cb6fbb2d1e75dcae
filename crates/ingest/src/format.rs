//! Format descriptors and magic-byte detection
//!
//! One static table drives the per-modality validation path: which formats a
//! modality accepts and which decoder handles each format. This replaces
//! per-modality branching with a single uniform routine.

use ingest_types::{FileFormat, Modality, ModalityError, RawUpload};

/// Leading bytes of a gzip member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// First eight header bytes of an EDF file
pub const EDF_MAGIC: [u8; 8] = *b"0       ";
/// First eight header bytes of a BDF (BioSemi) file
pub const BDF_MAGIC: [u8; 8] = [0xff, b'B', b'I', b'O', b'S', b'E', b'M', b'I'];
/// NIfTI-1 magic at byte offset 344, single-file flavor
pub const NIFTI1_MAGIC_SINGLE: [u8; 4] = *b"n+1\0";
/// NIfTI-1 magic at byte offset 344, detached-header flavor
pub const NIFTI1_MAGIC_PAIR: [u8; 4] = *b"ni1\0";

/// Byte offset of the NIfTI-1 magic within the header
pub const NIFTI1_MAGIC_OFFSET: usize = 344;

/// Formats a modality is allowed to arrive in
#[derive(Debug, Clone, Copy)]
pub struct FormatDescriptor {
    pub modality: Modality,
    pub allowed: &'static [FileFormat],
}

/// The allowed-format table, one entry per modality
pub const DESCRIPTORS: &[FormatDescriptor] = &[
    FormatDescriptor {
        modality: Modality::Eeg,
        allowed: &[FileFormat::Edf, FileFormat::Bdf, FileFormat::Csv],
    },
    FormatDescriptor {
        modality: Modality::Mri,
        allowed: &[FileFormat::Nifti, FileFormat::NiftiGz],
    },
    FormatDescriptor {
        modality: Modality::Fmri,
        allowed: &[FileFormat::Nifti, FileFormat::NiftiGz],
    },
];

/// Look up the descriptor for a modality
pub fn descriptor(modality: Modality) -> &'static FormatDescriptor {
    DESCRIPTORS
        .iter()
        .find(|d| d.modality == modality)
        .expect("every modality has a descriptor entry")
}

/// Best-effort identification of a payload from its leading bytes.
///
/// Returns `None` when nothing recognizable is present; the caller then
/// decodes with the declared format and lets the decoder report the precise
/// failure offset.
pub fn sniff(bytes: &[u8]) -> Option<FileFormat> {
    if bytes.starts_with(&GZIP_MAGIC) {
        return Some(FileFormat::NiftiGz);
    }
    if bytes.len() >= 8 {
        if bytes[..8] == EDF_MAGIC {
            return Some(FileFormat::Edf);
        }
        if bytes[..8] == BDF_MAGIC {
            return Some(FileFormat::Bdf);
        }
    }
    if bytes.len() >= NIFTI1_MAGIC_OFFSET + 4 {
        let magic = &bytes[NIFTI1_MAGIC_OFFSET..NIFTI1_MAGIC_OFFSET + 4];
        if magic == NIFTI1_MAGIC_SINGLE || magic == NIFTI1_MAGIC_PAIR {
            return Some(FileFormat::Nifti);
        }
    }
    if looks_like_csv(bytes) {
        return Some(FileFormat::Csv);
    }
    None
}

/// A CSV signal file has no magic; accept printable ASCII whose head contains
/// at least one digit.
fn looks_like_csv(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    !head.is_empty()
        && head
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..0x7f).contains(&b))
        && head.iter().any(|b| b.is_ascii_digit())
}

/// Resolve the format to decode an upload with.
///
/// The declared extension must be in the modality's allowed set, and must not
/// be contradicted by a positive detection of a different format. An
/// unrecognizable payload passes through here so the decoder can report the
/// byte offset where parsing actually fails.
pub fn resolve_format(upload: &RawUpload) -> Result<FileFormat, ModalityError> {
    let desc = descriptor(upload.modality);

    let declared = FileFormat::from_extension(&upload.declared_extension)
        .filter(|format| desc.allowed.contains(format))
        .ok_or_else(|| ModalityError::FormatMismatch {
            declared: upload.declared_extension.clone(),
            detected: describe_detection(sniff(&upload.bytes)),
        })?;

    match sniff(&upload.bytes) {
        Some(found) if found != declared => Err(ModalityError::FormatMismatch {
            declared: declared.extension().to_string(),
            detected: describe_detection(Some(found)),
        }),
        _ => Ok(declared),
    }
}

fn describe_detection(found: Option<FileFormat>) -> String {
    match found {
        Some(format) => format.extension().to_string(),
        None => "unrecognized".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_magic_bytes() {
        let mut edf = vec![0u8; 16];
        edf[..8].copy_from_slice(&EDF_MAGIC);
        assert_eq!(sniff(&edf), Some(FileFormat::Edf));

        let mut bdf = vec![0u8; 16];
        bdf[..8].copy_from_slice(&BDF_MAGIC);
        assert_eq!(sniff(&bdf), Some(FileFormat::Bdf));

        assert_eq!(sniff(&[0x1f, 0x8b, 0x08]), Some(FileFormat::NiftiGz));

        let mut nii = vec![0u8; 348];
        nii[344..348].copy_from_slice(&NIFTI1_MAGIC_SINGLE);
        assert_eq!(sniff(&nii), Some(FileFormat::Nifti));

        assert_eq!(sniff(b"1.0,2.0\n3.0,4.0\n"), Some(FileFormat::Csv));
        assert_eq!(sniff(&[0u8; 64]), None);
    }

    #[test]
    fn test_descriptor_table_covers_all_modalities() {
        assert_eq!(
            descriptor(Modality::Eeg).allowed,
            &[FileFormat::Edf, FileFormat::Bdf, FileFormat::Csv]
        );
        assert_eq!(
            descriptor(Modality::Mri).allowed,
            &[FileFormat::Nifti, FileFormat::NiftiGz]
        );
        assert_eq!(
            descriptor(Modality::Fmri).allowed,
            &[FileFormat::Nifti, FileFormat::NiftiGz]
        );
    }

    #[test]
    fn test_resolve_rejects_disallowed_extension() {
        let upload = RawUpload::new(Modality::Eeg, "signal.nii", vec![0u8; 16]);
        let err = resolve_format(&upload).unwrap_err();
        assert!(matches!(err, ModalityError::FormatMismatch { .. }));
    }

    #[test]
    fn test_resolve_rejects_contradicting_magic() {
        // gzip content declared as uncompressed NIfTI
        let upload = RawUpload::new(Modality::Mri, "scan.nii", vec![0x1f, 0x8b, 0x08, 0x00]);
        let err = resolve_format(&upload).unwrap_err();
        match err {
            ModalityError::FormatMismatch { declared, detected } => {
                assert_eq!(declared, "nii");
                assert_eq!(detected, "nii.gz");
            }
            other => panic!("expected FormatMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_passes_unrecognized_payload_through() {
        // junk bytes declared as EDF: the decoder owns the precise error
        let upload = RawUpload::new(Modality::Eeg, "rec.edf", vec![0u8; 32]);
        assert_eq!(resolve_format(&upload).unwrap(), FileFormat::Edf);
    }
}
