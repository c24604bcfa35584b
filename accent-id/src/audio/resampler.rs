//! Mono resampling to the classifier input rate using rubato

use anyhow::{Context, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Sample rate both accent classifiers were trained on
pub const MODEL_SAMPLE_RATE: u32 = 16_000;

/// Resample mono audio from `input_rate` to [`MODEL_SAMPLE_RATE`]
///
/// Input already at the model rate is returned unchanged.
pub fn resample_to_model_rate(input: Vec<f32>, input_rate: u32) -> Result<Vec<f32>> {
    resample_mono(input, input_rate, MODEL_SAMPLE_RATE)
}

/// Resample mono audio between arbitrary rates in a single pass
pub fn resample_mono(input: Vec<f32>, input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate || input.is_empty() {
        return Ok(input);
    }

    debug!(
        "Resampling {} frames from {}Hz to {}Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .context("Failed to create resampler")?;

    let waves = vec![input];
    let mut output = resampler
        .process(&waves, None)
        .context("Resampling failed")?;

    Ok(output.pop().unwrap_or_default())
}
