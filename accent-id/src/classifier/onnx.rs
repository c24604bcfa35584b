//! ONNX Runtime backed accent classifier
//!
//! Both supported checkpoints are exported with the same graph signature:
//! `wavs: f32[1, samples]` and `wav_lens: f32[1]` (relative length) in,
//! one `[1, n_labels]` score tensor out. Scores are normalized with softmax.

use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use accent_common::{Error, Result};
use anyhow::{anyhow, ensure, Context};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::{softmax, AccentClassifier, AccentModel, Classification, LabelEncoder, ModelArtifacts};
use crate::audio;

/// Accent classifier running an exported graph through ONNX Runtime
pub struct OnnxAccentClassifier {
    model: AccentModel,
    // `Session::run` takes `&mut self`; concurrent requests queue here.
    session: Mutex<Session>,
    labels: LabelEncoder,
}

fn model_err(context: &str, e: impl Display) -> Error {
    Error::Model(format!("{}: {}", context, e))
}

impl OnnxAccentClassifier {
    /// Build a session from resolved artifacts
    pub fn load(model: AccentModel, artifacts: &ModelArtifacts, intra_threads: usize) -> Result<Self> {
        let labels = LabelEncoder::load(&artifacts.label_encoder)?;

        let builder = Session::builder().map_err(|e| model_err("ONNX session builder", e))?;
        let builder = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_err("ONNX optimization level", e))?;
        let builder = builder
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| model_err("ONNX intra threads", e))?;
        let session = builder
            .commit_from_file(&artifacts.graph)
            .map_err(|e| model_err(&format!("Load {}", artifacts.graph.display()), e))?;

        Ok(Self {
            model,
            session: Mutex::new(session),
            labels,
        })
    }

    /// Run the graph on a mono 16 kHz waveform and return raw scores
    fn infer(&self, wav: Vec<f32>) -> anyhow::Result<Vec<f32>> {
        let frames = wav.len();
        let wavs = Tensor::from_array(([1usize, frames], wav.into_boxed_slice()))
            .map_err(|e| anyhow!("Build waveform tensor: {}", e))?;
        let wav_lens = Tensor::from_array(([1usize], vec![1.0f32].into_boxed_slice()))
            .map_err(|e| anyhow!("Build length tensor: {}", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("inference session poisoned by an earlier panic"))?;
        let outputs = session
            .run(ort::inputs!["wavs" => wavs, "wav_lens" => wav_lens])
            .map_err(|e| anyhow!("ONNX inference failed: {}", e))?;
        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Read classifier output: {}", e))?;

        Ok(scores.to_vec())
    }
}

impl AccentClassifier for OnnxAccentClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        let mut wav = audio::load_model_input(path)
            .with_context(|| format!("Failed to load audio for {}", self.model))?;
        ensure!(!wav.is_empty(), "audio is empty after resampling");

        if self.model.normalizes_waveform() {
            normalize_waveform(&mut wav);
        }

        let scores = self.infer(wav)?;
        ensure!(
            scores.len() == self.labels.len(),
            "classifier produced {} scores for {} labels",
            scores.len(),
            self.labels.len()
        );

        let classification = Classification::from_probabilities(softmax(&scores), &self.labels)?;
        debug!(
            model = %self.model,
            label = %classification.label,
            score = classification.score,
            "Classified upload"
        );
        Ok(classification)
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// Scale a waveform to zero mean and unit variance
pub fn normalize_waveform(wav: &mut [f32]) {
    if wav.is_empty() {
        return;
    }
    let n = wav.len() as f32;
    let mean = wav.iter().sum::<f32>() / n;
    let variance = wav.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    let std = (variance + 1e-7).sqrt();
    for s in wav.iter_mut() {
        *s = (*s - mean) / std;
    }
}
