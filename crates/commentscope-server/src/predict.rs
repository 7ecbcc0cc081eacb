//! Prediction orchestration
//!
//! The three fields are computed independently; a missing or failing model
//! only affects its own field. Every validated request is recorded in the
//! history, whatever the per-field outcome.

use crate::error::AppError;
use crate::state::AppState;
use commentscope_core::{Category, FieldOutcome};
use commentscope_models::ModelRegistry;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Response body of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub emotion: FieldOutcome,
    pub sentiment: FieldOutcome,
    pub like_count: FieldOutcome,
    pub history_id: u64,
    pub status: &'static str,
}

/// Run all three models on `text` and record the result
///
/// `text` must already be trimmed and non-empty.
pub async fn predict(state: &AppState, text: &str) -> Result<PredictionResult, AppError> {
    info!(chars = text.chars().count(), "Starting prediction");
    metrics::counter!("commentscope_predictions_total").increment(1);

    let emotion = classify_field(&state.registry, Category::Emotion, text).await;
    let sentiment = classify_field(&state.registry, Category::Sentiment, text).await;
    let like_count = like_count_field(&state.registry, text).await;

    for (category, outcome) in [
        (Category::Emotion, &emotion),
        (Category::Sentiment, &sentiment),
        (Category::LikeCount, &like_count),
    ] {
        metrics::counter!(
            "commentscope_field_outcomes_total",
            "field" => category.as_str(),
            "outcome" => outcome.kind()
        )
        .increment(1);
    }

    let entry = state.history.append(
        text,
        emotion.as_str(),
        sentiment.as_str(),
        like_count.as_str(),
    )?;

    info!(
        emotion = %emotion,
        sentiment = %sentiment,
        like_count = %like_count,
        history_id = entry.id,
        "Prediction complete"
    );

    Ok(PredictionResult {
        emotion,
        sentiment,
        like_count,
        history_id: entry.id,
        status: "success",
    })
}

/// Emotion or sentiment outcome for `text`
pub async fn classify_field(registry: &ModelRegistry, category: Category, text: &str) -> FieldOutcome {
    let Some(classifier) = registry.classifier(category) else {
        debug!("{} model not loaded", category);
        return FieldOutcome::ModelNotLoaded;
    };

    let start = Instant::now();
    let result = classifier.classify(text).await;
    record_latency(category, start);

    match result {
        Ok(index) => {
            let outcome = FieldOutcome::from_index(category.labels(), index);
            debug!(class_index = index, label = %outcome, "{} prediction", category);
            outcome
        }
        Err(e) => {
            warn!("Error in {} prediction: {}", category, e);
            FieldOutcome::Error
        }
    }
}

/// Like-count outcome for `text`
pub async fn like_count_field(registry: &ModelRegistry, text: &str) -> FieldOutcome {
    let Some(predictor) = registry.like_count_predictor() else {
        debug!(
            embedding_loaded = registry.embedder_loaded(),
            xgboost_loaded = registry.regressor_loaded(),
            "like_count model not loaded"
        );
        return FieldOutcome::ModelNotLoaded;
    };

    let start = Instant::now();
    let result = predictor.predict(text).await;
    record_latency(Category::LikeCount, start);

    match result {
        Ok(bucket) => FieldOutcome::from_index(Category::LikeCount.labels(), bucket),
        Err(e) => {
            warn!("Error in like_count prediction: {}", e);
            FieldOutcome::Error
        }
    }
}

fn record_latency(category: Category, start: Instant) {
    metrics::histogram!(
        "commentscope_inference_latency_us",
        "model" => category.as_str()
    )
    .record(start.elapsed().as_micros() as f64);
}
