//! Shared fixtures for accent-id integration tests
//!
//! Stub classifiers, multipart request builders and WAV generation.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accent_id::classifier::{AccentClassifier, Classification, LabelEncoder};
use accent_id::{AppState, UploadSettings};
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;

pub const BOUNDARY: &str = "accent-test-boundary";

pub const LABELS: [&str; 4] = ["england", "us", "canada", "australia"];

/// Paths handed to a stub classifier, in call order
#[derive(Debug, Default, Clone)]
pub struct SeenPaths(Arc<Mutex<Vec<PathBuf>>>);

impl SeenPaths {
    pub fn record(&self, path: &Path) {
        self.0.lock().unwrap().push(path.to_path_buf());
    }

    pub fn all(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap().clone()
    }
}

/// Returns the same distribution for every file
pub struct FixedClassifier {
    pub labels: LabelEncoder,
    pub probs: Vec<f32>,
    pub seen: SeenPaths,
}

impl FixedClassifier {
    pub fn new(labels: &[&str], probs: &[f32]) -> Self {
        Self {
            labels: LabelEncoder::from_labels(labels.iter().copied()),
            probs: probs.to_vec(),
            seen: SeenPaths::default(),
        }
    }
}

impl AccentClassifier for FixedClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        anyhow::ensure!(path.is_file(), "staged file missing");
        self.seen.record(path);
        Classification::from_probabilities(self.probs.clone(), &self.labels)
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// Fails every classification, as a model would on unreadable audio
pub struct FailingClassifier {
    pub labels: LabelEncoder,
    pub seen: SeenPaths,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            labels: LabelEncoder::from_labels(LABELS),
            seen: SeenPaths::default(),
        }
    }
}

impl AccentClassifier for FailingClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        self.seen.record(path);
        anyhow::bail!("Failed to probe audio file: {}", path.display())
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// Panics inside classification
pub struct PanickingClassifier {
    pub labels: LabelEncoder,
    pub seen: SeenPaths,
}

impl AccentClassifier for PanickingClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        self.seen.record(path);
        panic!("model crashed");
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// Derives the "us" probability from the first byte of the upload
///
/// Sleeps briefly so concurrent requests overlap.
pub struct ContentClassifier {
    pub labels: LabelEncoder,
    pub delay: Duration,
}

impl ContentClassifier {
    pub fn new(delay: Duration) -> Self {
        Self {
            labels: LabelEncoder::from_labels(["other", "us"]),
            delay,
        }
    }
}

impl AccentClassifier for ContentClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        let bytes = std::fs::read(path)?;
        let first = *bytes.first().ok_or_else(|| anyhow::anyhow!("empty upload"))?;
        std::thread::sleep(self.delay);
        let us = first as f32 / 255.0;
        Classification::from_probabilities(vec![1.0 - us, us], &self.labels)
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// Runs the real audio front end, then returns a fixed distribution
pub struct DecodingClassifier {
    pub labels: LabelEncoder,
    pub probs: Vec<f32>,
    pub decoded_frames: Arc<Mutex<Vec<usize>>>,
}

impl DecodingClassifier {
    pub fn new(probs: &[f32]) -> Self {
        Self {
            labels: LabelEncoder::from_labels(LABELS),
            probs: probs.to_vec(),
            decoded_frames: Arc::default(),
        }
    }
}

impl AccentClassifier for DecodingClassifier {
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification> {
        let wav = accent_id::audio::load_model_input(path)?;
        self.decoded_frames.lock().unwrap().push(wav.len());
        Classification::from_probabilities(self.probs.clone(), &self.labels)
    }

    fn label_encoder(&self) -> &LabelEncoder {
        &self.labels
    }
}

/// App state around `classifier`, staging uploads into `temp_dir`
pub fn app_state(classifier: Arc<dyn AccentClassifier>, temp_dir: &Path) -> AppState {
    let upload = UploadSettings {
        temp_dir: Some(temp_dir.to_path_buf()),
        ..UploadSettings::default()
    };
    AppState::new(classifier, "stub", upload)
}

/// Multipart body with one field
pub fn multipart_body(field: &str, filename: Option<&str>, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(filename) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: audio/wav\r\n\r\n",
                field, filename
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST /classify-us-accent with `bytes` as the `file` field
pub fn classify_request(bytes: &[u8]) -> Request<Body> {
    raw_classify_request(multipart_body("file", Some("sample.wav"), bytes))
}

pub fn raw_classify_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classify-us-accent")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Files left in a staging directory
pub fn staged_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

/// 16-bit PCM WAV of a sine tone, in memory
pub fn sine_wav(seconds: f64, sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (seconds * sample_rate as f64) as usize;
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let sample = ((t * 220.0 * 2.0 * std::f64::consts::PI).sin() * 0.5 * i16::MAX as f64) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
