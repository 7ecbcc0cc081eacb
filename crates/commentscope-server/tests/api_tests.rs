//! End-to-end tests of the HTTP API with in-memory models

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use commentscope_core::{Error, Result};
use commentscope_history::HistoryStore;
use commentscope_models::{
    ModelRegistry, ModelsConfig, RawPrediction, Regressor, TextClassifier, TextEmbedder,
};
use commentscope_server::{build_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct FixedClassifier(usize);

#[async_trait]
impl TextClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<usize> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingClassifier;

#[async_trait]
impl TextClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<usize> {
        Err(Error::inference("forward pass failed"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct ConstEmbedder;

#[async_trait]
impl TextEmbedder for ConstEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.5; 8])
    }

    fn dimension(&self) -> Option<usize> {
        Some(8)
    }
}

struct ConstRegressor(f64);

impl Regressor for ConstRegressor {
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<RawPrediction>> {
        Ok(vec![RawPrediction::Value(self.0); rows.len()])
    }

    fn descriptor(&self) -> String {
        "const.regressor".to_string()
    }
}

struct TestApp {
    _dir: TempDir,
    router: Router,
}

impl TestApp {
    fn new(build: impl FnOnce(ModelsConfig) -> ModelRegistry) -> Self {
        let dir = TempDir::new().unwrap();
        let registry = build(ModelsConfig::rooted_at(dir.path().join("models")));
        let history = HistoryStore::new(dir.path().join("history.json"));
        let router = build_app(AppState::new(registry, history));
        Self { _dir: dir, router }
    }

    fn without_models() -> Self {
        Self::new(|config| ModelRegistry::builder(config).build())
    }

    fn with_like_count(raw: f64) -> Self {
        Self::new(|config| {
            ModelRegistry::builder(config)
                .emotion(Arc::new(FixedClassifier(0)))
                .sentiment(Arc::new(FixedClassifier(0)))
                .embedder(Arc::new(ConstEmbedder))
                .regressor(Arc::new(ConstRegressor(raw)))
                .build()
        })
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 16 * 1024 * 1024).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn predict(&self, text: &str) -> (StatusCode, Value) {
        self.send("POST", "/predict", Some(json!({ "text": text }))).await
    }

    async fn history_total(&self) -> u64 {
        let (_, body) = self.send("GET", "/history", None).await;
        body["total"].as_u64().unwrap()
    }
}

#[tokio::test]
async fn test_predict_without_models() {
    let app = TestApp::without_models();

    let (status, body) = app.predict("I love this!").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emotion"], "model_not_loaded");
    assert_eq!(body["sentiment"], "model_not_loaded");
    assert_eq!(body["like_count"], "model_not_loaded");
    assert_eq!(body["history_id"], 1);
    assert_eq!(body["status"], "success");

    let (_, history) = app.send("GET", "/history", None).await;
    assert_eq!(history["status"], "success");
    assert_eq!(history["total"], 1);
    assert_eq!(history["history"][0]["full_comment"], "I love this!");
    assert_eq!(history["history"][0]["emotion"], "model_not_loaded");
}

#[tokio::test]
async fn test_predict_rejects_empty_text() {
    let app = TestApp::without_models();

    let (status, body) = app.predict("").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Text cannot be empty" }));

    let (status, body) = app.predict("   \n\t ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text cannot be empty");

    assert_eq!(app.history_total().await, 0);
}

#[tokio::test]
async fn test_predict_rejects_missing_text() {
    let app = TestApp::without_models();

    let (status, body) = app.send("POST", "/predict", Some(json!({ "comment": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing 'text' field in request" }));

    let (status, _) = app.send("POST", "/predict", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.history_total().await, 0);
}

#[tokio::test]
async fn test_predict_records_trimmed_text() {
    let app = TestApp::without_models();
    app.predict("  spaced out  ").await;

    let (_, history) = app.send("GET", "/history", None).await;
    assert_eq!(history["history"][0]["full_comment"], "spaced out");
}

#[tokio::test]
async fn test_like_count_regression_buckets() {
    for (raw, label) in [(250.0, "medium"), (50.0, "low"), (2000.0, "viral"), (500.5, "viral")] {
        let app = TestApp::with_like_count(raw);
        let (status, body) = app.predict("Great video").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["like_count"], label, "raw value {}", raw);
        assert_eq!(body["emotion"], "joy");
        assert_eq!(body["sentiment"], "positive");
    }
}

#[tokio::test]
async fn test_fields_fail_independently() {
    let app = TestApp::new(|config| {
        ModelRegistry::builder(config)
            .emotion(Arc::new(FailingClassifier))
            .sentiment(Arc::new(FixedClassifier(42)))
            .embedder(Arc::new(ConstEmbedder))
            .build()
    });

    let (status, body) = app.predict("so-so").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emotion"], "error");
    assert_eq!(body["sentiment"], "unknown");
    assert_eq!(body["like_count"], "model_not_loaded");

    let (_, history) = app.send("GET", "/history", None).await;
    assert_eq!(history["history"][0]["emotion"], "error");
}

#[tokio::test]
async fn test_history_ids_and_display_truncation() {
    let app = TestApp::without_models();
    let long = "x".repeat(120);

    let (_, first) = app.predict("short").await;
    let (_, second) = app.predict(&long).await;
    assert_eq!(first["history_id"], 1);
    assert_eq!(second["history_id"], 2);

    let (_, history) = app.send("GET", "/history", None).await;
    let newest = &history["history"][0];
    assert_eq!(newest["id"], 2);
    assert_eq!(newest["comment"], format!("{}...", "x".repeat(100)));
    assert_eq!(newest["full_comment"], long);
}

#[tokio::test]
async fn test_delete_missing_id_is_noop() {
    let app = TestApp::without_models();
    app.predict("one").await;
    app.predict("two").await;

    let (status, body) = app.send("DELETE", "/history/99", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "success", "message": "History item deleted" })
    );
    assert_eq!(app.history_total().await, 2);

    app.send("DELETE", "/history/1", None).await;
    let (_, history) = app.send("GET", "/history", None).await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["history"][0]["id"], 2);

    let (status, _) = app.send("DELETE", "/history/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_then_list_is_empty() {
    let app = TestApp::without_models();
    app.predict("one").await;

    let (status, body) = app.send("DELETE", "/history/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "History cleared");

    let (_, history) = app.send("GET", "/history", None).await;
    assert_eq!(history["total"], 0);
    assert_eq!(history["history"], json!([]));
}

#[tokio::test]
async fn test_stats() {
    let app = TestApp::with_like_count(250.0);

    let (_, empty) = app.send("GET", "/stats", None).await;
    assert_eq!(
        empty,
        json!({
            "status": "success",
            "stats": {
                "total_predictions": 0,
                "emotion_stats": {},
                "sentiment_stats": {},
                "like_count_stats": {}
            }
        })
    );

    app.predict("one").await;
    app.predict("two").await;

    let (_, body) = app.send("GET", "/stats", None).await;
    assert_eq!(body["stats"]["total_predictions"], 2);
    assert_eq!(body["stats"]["emotion_stats"]["joy"], 2);
    assert_eq!(body["stats"]["like_count_stats"]["medium"], 2);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::without_models();
    let (status, body) = app.send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "models_not_loaded");
    assert_eq!(body["message"], "Some models are not loaded");
    assert_eq!(body["models"]["emotion_model"]["loaded"], false);
    assert_eq!(body["models"]["emotion_model"]["exists"], false);
    assert_eq!(body["models"]["like_count_model"]["xgboost_loaded"], false);
    assert!(body["models"]["like_count_model"]["xgboost_type"].is_null());

    let app = TestApp::with_like_count(10.0);
    let (_, body) = app.send("GET", "/health", None).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "All local AI models ready");
    assert_eq!(body["models"]["like_count_model"]["bert_loaded"], true);
    assert_eq!(
        body["models"]["like_count_model"]["xgboost_type"],
        "const.regressor"
    );
}

#[tokio::test]
async fn test_debug() {
    let app = TestApp::without_models();
    let (_, body) = app.send("GET", "/debug", None).await;
    assert_eq!(body["emotion_model_loaded"], false);
    assert_eq!(body["xgboost_model_loaded"], false);
    assert_eq!(body["like_count_path_exists"], false);
    assert!(body.get("files_in_like_count_dir").is_none());
    assert!(body.get("xgboost_type").is_none());

    let app = TestApp::with_like_count(10.0);
    let (_, body) = app.send("GET", "/debug", None).await;
    assert_eq!(body["embedding_model_loaded"], true);
    assert_eq!(body["xgboost_type"], "const.regressor");
    assert_eq!(body["xgboost_has_predict"], true);
}

#[tokio::test]
async fn test_like_count_diagnostic() {
    let app = TestApp::without_models();
    let (status, body) = app.send("POST", "/test-like-count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Models not loaded");
    assert_eq!(body["models_status"]["xgboost_loaded"], false);
    assert!(body["xgboost_path"]
        .as_str()
        .unwrap()
        .ends_with("xgboost_BERT_embeddings.json"));

    let app = TestApp::with_like_count(1000.0);
    let (status, body) = app
        .send("POST", "/test-like-count", Some(json!({ "text": "hello" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["raw_prediction"], 2);
    assert_eq!(body["label"], "high");

    // diagnostics never touch the history
    assert_eq!(app.history_total().await, 0);
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::without_models();
    let (status, body) = app.send("GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_history_write_failure_is_500() {
    let dir = TempDir::new().unwrap();
    // the history path is a directory, so writes fail
    let history = HistoryStore::new(dir.path());
    let registry = ModelRegistry::builder(ModelsConfig::rooted_at(dir.path())).build();
    let router = build_app(AppState::new(registry, history));

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": "hi"}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Failed to write"));
}
