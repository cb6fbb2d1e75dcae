//! Per-format decoders
//!
//! Each decoder is a pure function of its input bytes: same bytes in, same
//! arrays out, no I/O. Failures carry the byte offset where parsing stopped.

pub mod csv_signal;
pub mod edf;
pub mod nifti;
