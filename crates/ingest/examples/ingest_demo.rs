//! End-to-end ingestion example: build three synthetic uploads, run the
//! pipeline, and hand the sample to the baseline predictor.

use byteorder::{ByteOrder, LittleEndian};
use ingest::pipeline::IngestionPipeline;
use ingest_types::{IngestConfig, Modality, RawUpload, SeizurePredictor};
use predictor::BaselinePredictor;

/// A minimal CSV EEG recording: two channels, forty sample instants.
fn csv_eeg() -> Vec<u8> {
    let mut text = String::from("Fp1,Fp2\n");
    for i in 0..40 {
        let phase = i as f32 * 0.3;
        text.push_str(&format!("{:.4},{:.4}\n", phase.sin(), phase.cos()));
    }
    text.into_bytes()
}

/// A minimal single-file NIfTI-1 volume with u8 voxels.
fn nifti_volume(shape: &[i16], repetition_time: f32) -> Vec<u8> {
    let vox_offset = 352usize;
    let voxels: usize = shape.iter().map(|&d| d as usize).product();
    let mut buf = vec![0u8; vox_offset + voxels];

    LittleEndian::write_i32(&mut buf[0..4], 348);
    LittleEndian::write_i16(&mut buf[40..42], shape.len() as i16);
    for (i, &d) in shape.iter().enumerate() {
        LittleEndian::write_i16(&mut buf[42 + i * 2..44 + i * 2], d);
    }
    LittleEndian::write_i16(&mut buf[70..72], 2); // uint8
    LittleEndian::write_i16(&mut buf[72..74], 8);
    LittleEndian::write_f32(&mut buf[76..80], 1.0);
    LittleEndian::write_f32(&mut buf[80..84], 2.0);
    LittleEndian::write_f32(&mut buf[84..88], 2.0);
    LittleEndian::write_f32(&mut buf[88..92], 2.5);
    LittleEndian::write_f32(&mut buf[92..96], repetition_time);
    LittleEndian::write_f32(&mut buf[108..112], vox_offset as f32);
    buf[344..348].copy_from_slice(b"n+1\0");

    for i in 0..voxels {
        buf[vox_offset + i] = (i % 251) as u8;
    }
    buf
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    println!("Multimodal Ingestion Example");
    println!("============================");

    let eeg = RawUpload::new(Modality::Eeg, "session.csv", csv_eeg());
    let mri = RawUpload::new(Modality::Mri, "t1.nii", nifti_volume(&[16, 16, 8], 0.0));
    let fmri = RawUpload::new(
        Modality::Fmri,
        "bold.nii",
        nifti_volume(&[16, 16, 8, 5], 2.0),
    );

    // the CSV recording carries no rate of its own: 4 Hz makes it a 10 s session
    let pipeline = IngestionPipeline::new(IngestConfig {
        csv_sample_rate: 4.0,
        ..IngestConfig::default()
    });
    match pipeline.ingest(eeg, mri, fmri).await {
        Ok(sample) => {
            println!(
                "sample: eeg {} ch @ {} Hz ({:.1} s), mri {}, fmri {} ({:.1} s)",
                sample.eeg.channel_count,
                sample.eeg.sample_rate,
                sample.eeg_duration_secs,
                sample.mri.shape,
                sample.fmri.shape,
                sample.fmri_duration_secs,
            );
            for warning in &sample.warnings {
                println!("warning: {}", serde_json::to_string(warning)?);
            }

            let predictor = BaselinePredictor::new();
            let prediction = predictor.predict(&sample).await?;
            println!(
                "prediction ({}): p={:.3} type={}",
                predictor.name(),
                prediction.seizure_probability,
                prediction.seizure_type
            );
        }
        Err(report) => {
            println!("ingestion failed:");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
