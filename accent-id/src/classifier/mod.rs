//! Pretrained accent classifiers
//!
//! One classifier is loaded per process at startup (see [`load_classifier`])
//! and shared read-only by every request.

mod artifacts;
mod label_encoder;
mod model;
mod onnx;

pub use artifacts::ModelArtifacts;
pub use label_encoder::LabelEncoder;
pub use model::{load_classifier, AccentModel};
pub use onnx::OnnxAccentClassifier;

use std::path::Path;

/// Output of one file classification
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Probability distribution over the label set, one row per batch item
    pub out_prob: Vec<Vec<f32>>,
    /// Highest probability of the first row
    pub score: f32,
    /// Position of `score` within the first row
    pub index: usize,
    /// Label decoded from `index`
    pub label: String,
}

impl Classification {
    /// Build a single-row classification from a probability distribution
    pub fn from_probabilities(probs: Vec<f32>, labels: &LabelEncoder) -> anyhow::Result<Self> {
        let (index, score) = argmax(&probs)
            .ok_or_else(|| anyhow::anyhow!("classifier produced an empty distribution"))?;
        let label = labels
            .decode(index)
            .ok_or_else(|| anyhow::anyhow!("no label encoded as index {}", index))?
            .to_string();

        Ok(Self {
            out_prob: vec![probs],
            score,
            index,
            label,
        })
    }
}

/// A loaded accent classifier
///
/// Implementations must tolerate concurrent calls from blocking worker threads.
pub trait AccentClassifier: Send + Sync {
    /// Classify the audio file at `path`
    fn classify_file(&self, path: &Path) -> anyhow::Result<Classification>;

    /// Label set the distribution is laid out against
    fn label_encoder(&self) -> &LabelEncoder;
}

/// Normalize raw scores into a probability distribution
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Position and value of the largest element; first wins on ties
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_recovers_log_probabilities() {
        let original = [0.7f32, 0.2, 0.1];
        let logs: Vec<f32> = original.iter().map(|p| p.ln()).collect();
        for (p, q) in softmax(&logs).iter().zip(original) {
            assert!((p - q).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_large_scores_stay_finite() {
        let probs = softmax(&[1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_from_probabilities_decodes_stored_index() {
        let labels = LabelEncoder::from_labels(["england", "us", "canada"]);
        let c = Classification::from_probabilities(vec![0.1, 0.8, 0.1], &labels).unwrap();
        assert_eq!(c.index, 1);
        assert_eq!(c.label, "us");
        assert_eq!(c.out_prob, vec![vec![0.1, 0.8, 0.1]]);
    }
}
