//! US accent classification endpoint
//!
//! POST /classify-us-accent
//!
//! Request lifecycle: receive the upload, stage it to a temp file, classify,
//! resolve the `"us"` position, scale to a percentage, remove the temp file.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    classifier::AccentClassifier,
    error::{ApiError, ApiResult},
    staging::StagedUpload,
    AppState,
};

pub const CLASSIFY_ROUTE: &str = "/classify-us-accent";

/// Multipart field carrying the audio file
pub const UPLOAD_FIELD: &str = "file";

/// Label whose probability is reported
pub const US_LABEL: &str = "us";

/// Detail returned when the loaded model has no `"us"` label
pub const LABEL_NOT_FOUND_DETAIL: &str = "US accent label not found in model.";

/// Response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// Probability of a US accent as a percentage, one decimal place
    pub us_confidence: f64,
}

/// POST /classify-us-accent
pub async fn classify_us_accent(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ClassifyResponse>> {
    let bytes = read_upload(&mut multipart).await?;
    let upload_bytes = bytes.len();

    let classifier = Arc::clone(&state.classifier);
    let temp_dir = state.upload.temp_dir.clone();
    // The staged file lives inside the blocking task, so it is removed when
    // the task ends even if this request is dropped or times out first.
    let task = tokio::task::spawn_blocking(move || {
        classify_upload(classifier.as_ref(), &bytes, temp_dir.as_deref())
    });

    let joined = match state.upload.classify_timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| ApiError::Timeout(limit))?,
        None => task.await,
    };
    let us_confidence = joined.map_err(|e| {
        ApiError::Classification(anyhow::anyhow!("classification task failed: {}", e))
    })??;

    info!(upload_bytes, us_confidence, "Classified upload");
    Ok(Json(ClassifyResponse { us_confidence }))
}

/// Read the `file` field of the multipart body into memory
///
/// Fields under any other name are skipped, even when they carry a filename.
async fn read_upload(multipart: &mut Multipart) -> ApiResult<Bytes> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(ApiError::MissingFile(format!(
        "expected a '{}' file field",
        UPLOAD_FIELD
    )))
}

/// Stage, classify and score one upload; the staged file never outlives this call
pub fn classify_upload(
    classifier: &dyn AccentClassifier,
    bytes: &[u8],
    temp_dir: Option<&Path>,
) -> ApiResult<f64> {
    let staged = StagedUpload::write(bytes, temp_dir)?;
    let result = score_file(classifier, staged.path());

    let path = staged.path().to_path_buf();
    if let Err(e) = staged.close() {
        warn!(path = %path.display(), "Failed to remove staged upload: {}", e);
    }
    result
}

/// Classify a file and return the `"us"` probability as a percentage
pub fn score_file(classifier: &dyn AccentClassifier, path: &Path) -> ApiResult<f64> {
    let classification = classifier
        .classify_file(path)
        .map_err(ApiError::Classification)?;

    let position = classifier
        .label_encoder()
        .position_of(US_LABEL)
        .ok_or_else(|| ApiError::LabelNotFound(LABEL_NOT_FOUND_DETAIL.to_string()))?;

    let probability = classification
        .out_prob
        .first()
        .and_then(|row| row.get(position))
        .copied()
        .ok_or_else(|| {
            ApiError::Internal(format!(
                "label position {} outside classifier output {:?}",
                position,
                classification.out_prob.first().map(Vec::len)
            ))
        })?;

    Ok(to_percentage(probability))
}

/// Scale a probability to a percentage rounded to one decimal place
///
/// Exact ties round to the even tenth (6.25 -> 6.2).
pub fn to_percentage(probability: f32) -> f64 {
    (f64::from(probability) * 100.0 * 10.0).round_ties_even() / 10.0
}

/// Build classification routes
///
/// The body limit replaces axum's 2 MB default so ordinary recordings fit.
pub fn classify_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(CLASSIFY_ROUTE, post(classify_us_accent))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
