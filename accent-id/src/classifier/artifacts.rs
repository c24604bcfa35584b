//! Model artifact resolution
//!
//! A model source is either a local directory holding the exported files or
//! a Hugging Face Hub repository id, fetched once into the local cache.

use std::path::{Path, PathBuf};

use accent_common::config::ModelConfig;
use accent_common::{Error, Result};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use super::AccentModel;

/// Label set file shipped next to every checkpoint
pub const LABEL_ENCODER_FILE: &str = "label_encoder.txt";

/// Local paths of the files a classifier is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifacts {
    /// Exported ONNX inference graph
    pub graph: PathBuf,
    /// SpeechBrain label encoder
    pub label_encoder: PathBuf,
}

impl ModelArtifacts {
    /// Resolve artifacts for `model` from the configured source
    pub fn resolve(model: AccentModel, config: &ModelConfig) -> Result<Self> {
        let source = config.source();
        let local = Path::new(source);
        if local.is_dir() {
            info!(dir = %local.display(), "Using local model directory");
            return Self::from_dir(model, local);
        }

        let fetched = Self::fetch(model, source, &config.cache_dir)?;
        match model.save_dir(&config.cache_dir) {
            Some(save_dir) => fetched.collect_into(&save_dir),
            None => Ok(fetched),
        }
    }

    /// Artifacts already present in `dir`
    pub fn from_dir(model: AccentModel, dir: &Path) -> Result<Self> {
        let artifacts = Self {
            graph: dir.join(model.graph_file()),
            label_encoder: dir.join(LABEL_ENCODER_FILE),
        };
        for path in [&artifacts.graph, &artifacts.label_encoder] {
            if !path.is_file() {
                return Err(Error::Model(format!(
                    "Model artifact missing: {}",
                    path.display()
                )));
            }
        }
        Ok(artifacts)
    }

    /// Download (or reuse cached) artifacts from the hub
    fn fetch(model: AccentModel, repo_id: &str, cache_dir: &Path) -> Result<Self> {
        let hub_cache = cache_dir.join("hub");
        info!(repo = repo_id, cache = %hub_cache.display(), "Fetching model artifacts");

        let api = ApiBuilder::new()
            .with_cache_dir(hub_cache)
            .with_progress(false)
            .build()
            .map_err(|e| Error::Model(format!("Model hub client: {}", e)))?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

        let get = |file: &str| {
            repo.get(file)
                .map_err(|e| Error::Model(format!("Fetch {}/{} failed: {}", repo_id, file, e)))
        };

        Ok(Self {
            graph: get(model.graph_file())?,
            label_encoder: get(LABEL_ENCODER_FILE)?,
        })
    }

    /// Copy artifacts into a flat save directory and point at the copies
    fn collect_into(self, save_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(save_dir)?;

        let copy = |src: &Path| -> Result<PathBuf> {
            let name = src
                .file_name()
                .ok_or_else(|| Error::Model(format!("Bad artifact path: {}", src.display())))?;
            let dest = save_dir.join(name);
            if !dest.exists() {
                debug!(from = %src.display(), to = %dest.display(), "Saving model artifact");
                std::fs::copy(src, &dest)?;
            }
            Ok(dest)
        };

        Ok(Self {
            graph: copy(&self.graph)?,
            label_encoder: copy(&self.label_encoder)?,
        })
    }
}
