//! Audio front end for the accent classifiers

pub mod decoder;
pub mod resampler;

pub use decoder::{decode_audio_file, DecodedAudio};
pub use resampler::{resample_to_model_rate, MODEL_SAMPLE_RATE};

use anyhow::Result;
use std::path::Path;

/// Decode a file and bring it to mono at the model sample rate
pub fn load_model_input(path: &Path) -> Result<Vec<f32>> {
    let decoded = decode_audio_file(path)?;
    tracing::debug!(
        path = %path.display(),
        duration_seconds = format!("{:.2}", decoded.duration_seconds()),
        "Loaded audio for classification"
    );
    resample_to_model_rate(decoded.samples, decoded.sample_rate)
}
