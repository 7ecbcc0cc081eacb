//! HTTP handlers

use crate::error::AppError;
use crate::predict::{self, PredictionResult};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use commentscope_core::Category;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

/// Text used by `/test-like-count` when the request carries none
pub const DEFAULT_TEST_TEXT: &str = "This is a test comment";

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResult>, AppError> {
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    let text = payload
        .as_ref()
        .and_then(|value| value.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest("Missing 'text' field in request".to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".to_string()));
    }

    let result = predict::predict(&state, text).await?;
    Ok(Json(result))
}

/// `POST /test-like-count`
///
/// Diagnostic for the like-count pipeline; always answers 200.
pub async fn test_like_count(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let text = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get("text").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TEST_TEXT.to_string());

    info!("Testing like count prediction");
    debug!(text = %text, "Like count test input");

    let registry = &state.registry;
    let config = registry.config();
    let models_status = json!({
        "xgboost_loaded": registry.regressor_loaded(),
        "bert_tokenizer_loaded": registry.embedder_loaded(),
        "bert_model_loaded": registry.embedder_loaded(),
        "xgboost_path_exists": config.regressor_file.exists(),
        "bert_path_exists": config.like_count_dir.exists(),
        "xgboost_type": registry.regressor_descriptor(),
    });

    let Some(predictor) = registry.like_count_predictor() else {
        return Json(json!({
            "error": "Models not loaded",
            "models_status": models_status,
            "xgboost_path": config.regressor_file.display().to_string(),
            "bert_path": config.like_count_dir.display().to_string(),
        }));
    };

    match predictor.predict(&text).await {
        Ok(bucket) => Json(json!({
            "success": true,
            "raw_prediction": bucket,
            "label": Category::LikeCount.labels().label(bucket),
            "models_status": models_status,
        })),
        Err(e) => {
            warn!("Like count test prediction failed: {}", e);
            Json(json!({
                "error": "Prediction failed",
                "models_status": models_status,
            }))
        }
    }
}

/// `GET /history`
pub async fn list_history(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.history.load();
    Json(json!({
        "status": "success",
        "total": history.len(),
        "history": history,
    }))
}

/// `DELETE /history/:id`
pub async fn delete_history_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Non-integer ids do not match the route
    let Ok(id) = id.parse::<u64>() else {
        return Ok(not_found().into_response());
    };

    state.history.delete(id)?;
    Ok(Json(json!({
        "status": "success",
        "message": "History item deleted",
    }))
    .into_response())
}

/// `DELETE /history/clear`
pub async fn clear_history(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.history.clear()?;
    info!("History cleared");
    Ok(Json(json!({
        "status": "success",
        "message": "History cleared",
    })))
}

/// `GET /stats`
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "success",
        "stats": state.history.stats(),
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let registry = &state.registry;
    let all_loaded = registry.all_loaded();

    Json(json!({
        "status": if all_loaded { "healthy" } else { "models_not_loaded" },
        "message": if all_loaded { "All local AI models ready" } else { "Some models are not loaded" },
        "models": {
            "emotion_model": registry.status(Category::Emotion),
            "sentiment_model": registry.status(Category::Sentiment),
            "like_count_model": registry.status(Category::LikeCount),
        },
    }))
}

/// `GET /debug`
pub async fn debug_info(State(state): State<AppState>) -> impl IntoResponse {
    let registry = &state.registry;
    let config = registry.config();

    let mut info = Map::new();
    info.insert("emotion_model_loaded".into(), registry.is_loaded(Category::Emotion).into());
    info.insert("sentiment_model_loaded".into(), registry.is_loaded(Category::Sentiment).into());
    info.insert("embedding_model_loaded".into(), registry.embedder_loaded().into());
    info.insert("xgboost_model_loaded".into(), registry.regressor_loaded().into());
    info.insert("xgboost_path_exists".into(), config.regressor_file.exists().into());
    info.insert("like_count_path_exists".into(), config.like_count_dir.exists().into());
    info.insert("xgboost_path".into(), config.regressor_file.display().to_string().into());
    info.insert("like_count_path".into(), config.like_count_dir.display().to_string().into());

    if let Some(files) = registry.like_count_dir_listing() {
        info.insert("files_in_like_count_dir".into(), files.into());
    }

    if let Some(descriptor) = registry.regressor_descriptor() {
        info.insert("xgboost_type".into(), descriptor.into());
        info.insert(
            "xgboost_has_predict".into(),
            registry.regressor_supports_predict().unwrap_or(false).into(),
        );
    }

    Json(Value::Object(info))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

pub async fn fallback() -> impl IntoResponse {
    not_found()
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
