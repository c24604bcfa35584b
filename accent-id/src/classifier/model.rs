//! Classifier selection and loading

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use accent_common::config::ModelConfig;
use accent_common::{Error, Result};
use tracing::{info, warn};

use super::{AccentClassifier, ModelArtifacts, OnnxAccentClassifier};

/// Supported pretrained accent classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccentModel {
    /// ECAPA-TDNN encoder-classifier on CommonAccent
    CommonAccentEcapa,
    /// XLSR wav2vec2 classifier on CommonAccent (English)
    CommonAccentXlsrEnglish,
}

impl AccentModel {
    pub const ECAPA_NAME: &'static str = "Jzuluaga/accent-id-commonaccent_ecapa";
    pub const XLSR_NAME: &'static str = "Jzuluaga/accent-id-commonaccent_xlsr-en-english";

    pub const ALL: [AccentModel; 2] = [
        AccentModel::CommonAccentEcapa,
        AccentModel::CommonAccentXlsrEnglish,
    ];

    /// Resolve a configured model identifier
    ///
    /// Unknown identifiers are a configuration error; the caller is expected
    /// to abort startup on it.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| Error::Config(format!("Unknown model name: {}", name)))
    }

    /// Model repository identifier
    pub fn name(&self) -> &'static str {
        match self {
            AccentModel::CommonAccentEcapa => Self::ECAPA_NAME,
            AccentModel::CommonAccentXlsrEnglish => Self::XLSR_NAME,
        }
    }

    /// Exported inference graph inside the model source
    pub fn graph_file(&self) -> &'static str {
        match self {
            AccentModel::CommonAccentEcapa => "embedding_classifier.onnx",
            AccentModel::CommonAccentXlsrEnglish => "wav2vec2_classifier.onnx",
        }
    }

    /// Interface class the checkpoint was exported from, for custom variants
    pub fn interface_class(&self) -> Option<&'static str> {
        match self {
            AccentModel::CommonAccentEcapa => None,
            AccentModel::CommonAccentXlsrEnglish => Some("CustomEncoderWav2vec2Classifier"),
        }
    }

    /// Whether the waveform is scaled to zero mean and unit variance before inference
    pub fn normalizes_waveform(&self) -> bool {
        matches!(self, AccentModel::CommonAccentXlsrEnglish)
    }

    /// Directory downloaded artifacts are gathered into, if this model uses one
    ///
    /// The ECAPA model keeps a flat save directory under the cache; the XLSR
    /// model is loaded straight from the hub cache.
    pub fn save_dir(&self, cache_dir: &Path) -> Option<PathBuf> {
        match self {
            AccentModel::CommonAccentEcapa => {
                Some(cache_dir.join("accent-id-commonaccent_ecapa"))
            }
            AccentModel::CommonAccentXlsrEnglish => None,
        }
    }
}

impl FromStr for AccentModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for AccentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Select, fetch and load the configured classifier
///
/// Runs once at startup. Any failure here is fatal: serving without a
/// classifier is meaningless, so there is no retry.
pub fn load_classifier(config: &ModelConfig) -> Result<Arc<dyn AccentClassifier>> {
    let model = AccentModel::from_name(&config.name)?;
    info!(
        model = %model,
        source = config.source(),
        cache_dir = %config.cache_dir.display(),
        interface = model.interface_class().unwrap_or("EncoderClassifier"),
        "Loading accent classifier"
    );

    let artifacts = ModelArtifacts::resolve(model, config)?;
    let classifier = OnnxAccentClassifier::load(model, &artifacts, config.intra_threads)?;

    let labels = classifier.label_encoder();
    if !labels.is_position_aligned() {
        warn!(
            model = %model,
            "Label encoder order differs from stored indices; distribution lookups use file order"
        );
    }
    if labels.position_of("us").is_none() {
        warn!(model = %model, "Label set has no 'us' entry; classify requests will fail");
    }
    info!(model = %model, labels = labels.len(), "Accent classifier ready");

    Ok(Arc::new(classifier))
}
