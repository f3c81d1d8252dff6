use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::routes;
use server::state::AppState;
use service::errors::ServiceError;
use service::file::snapshot_store::FileSnapshotStore;
use service::snapshot::{Snapshot, SnapshotChange, SnapshotRepository};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    router: Router,
    data_file: PathBuf,
}

impl TestApp {
    async fn new() -> anyhow::Result<Self> {
        Self::with_document(None).await
    }

    /// Starts over an existing data file when `document` is given.
    async fn with_document(document: Option<&Value>) -> anyhow::Result<Self> {
        let data_file = std::env::temp_dir()
            .join(format!("webhook_flow_{}", Uuid::new_v4()))
            .join("latest_data.json");
        if let Some(doc) = document {
            if let Some(dir) = data_file.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            tokio::fs::write(&data_file, serde_json::to_vec_pretty(doc)?).await?;
        }
        let store = FileSnapshotStore::new(&data_file).await?;
        let router = routes::build_router(AppState::new(store), cors());
        Ok(Self { router, data_file })
    }

    async fn send(&self, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        send(&self.router, req).await
    }

    async fn post(&self, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
        self.send(post_json(uri, &body)?).await
    }

    async fn data(&self) -> anyhow::Result<Value> {
        let (status, body) = self.send(get("/api/data")?).await?;
        assert_eq!(status, StatusCode::OK);
        Ok(body)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(dir) = self.data_file.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().method("GET").uri(uri).body(Body::empty())?)
}

fn post_json(uri: &str, body: &Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

async fn send(router: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = router.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}

#[tokio::test]
async fn root_describes_every_endpoint() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.send(get("/")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bitcoin Overloard Webhook API");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["endpoints"].as_object().map(|m| m.len()), Some(8));
    assert!(body["endpoints"]["POST /api/webhook/price"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_is_always_healthy() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let (status, body) = app.send(get("/api/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn data_starts_with_documented_defaults() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let mut body = app.data().await?;
    assert!(body["last_updated"].is_string());

    let mut expected = serde_json::to_value(Snapshot::default())?;
    body["last_updated"] = Value::Null;
    expected["last_updated"] = Value::Null;
    assert_eq!(body, expected);
    Ok(())
}

#[tokio::test]
async fn price_update_example_scenario() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let before = app.data().await?["last_updated"].clone();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, body) = app
        .post("/api/webhook/price", json!({"btc_price": 44000.5, "btc_change_24h": 1.2}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Price updated");
    assert!(body["timestamp"].is_string());

    let data = app.data().await?;
    assert_eq!(data["btc_price"], 44000.5);
    assert_eq!(data["btc_change_24h"], 1.2);
    assert_ne!(data["last_updated"], before);

    // change stays put when omitted
    let (status, _) = app.post("/api/webhook/price", json!({"btc_price": 45000})).await?;
    assert_eq!(status, StatusCode::OK);
    let data = app.data().await?;
    assert_eq!(data["btc_price"], 45000.0);
    assert_eq!(data["btc_change_24h"], 1.2);
    Ok(())
}

#[tokio::test]
async fn predictions_set_active_models() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let predictions = json!([
        {"model": "LSTM Neural Net", "value": "$44,200", "confidence": 82},
        {"model": "Random Forest", "value": "$43,950", "confidence": 76},
        {"model": "XGBoost", "value": "$44,100", "confidence": 79}
    ]);
    let (status, body) = app
        .post("/api/webhook/predictions", json!({"predictions": predictions}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Predictions updated");

    let data = app.data().await?;
    assert_eq!(data["active_models"], 3);
    assert_eq!(data["predictions"], predictions);
    Ok(())
}

#[tokio::test]
async fn patterns_are_replaced_wholesale() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let first = json!([{"name": "Bullish Engulfing", "detected": "2h ago", "confidence": "High"}]);
    let second = json!([{"name": "Double Top", "detected": "10m ago", "confidence": "Medium"}]);
    app.post("/api/webhook/patterns", json!({"patterns": first})).await?;
    let (status, body) = app.post("/api/webhook/patterns", json!({"patterns": second})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Patterns updated");
    assert_eq!(app.data().await?["patterns"], second);
    Ok(())
}

#[tokio::test]
async fn twenty_five_signals_keep_newest_twenty() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    for i in 0..25 {
        let (status, body) = app
            .post(
                "/api/webhook/signals",
                json!({"signal": {"time": format!("14:{i:02}"), "text": format!("signal {i}"), "type": "bullish"}}),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Signal added");
    }
    let data = app.data().await?;
    let signals = data["signals"].as_array().cloned().unwrap_or_default();
    assert_eq!(signals.len(), 20);
    assert_eq!(signals[0]["text"], "signal 24");
    assert_eq!(signals[19]["text"], "signal 5");
    assert_eq!(signals[0]["type"], "bullish");
    Ok(())
}

#[tokio::test]
async fn twelve_reports_keep_newest_ten() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    for i in 0..12 {
        let (status, body) = app
            .post(
                "/api/webhook/reports",
                json!({"report": {"name": format!("Report {i}"), "date": "2025-11-13", "time": "08:00"}}),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Report added");
    }
    let data = app.data().await?;
    let reports = data["reports"].as_array().cloned().unwrap_or_default();
    assert_eq!(reports.len(), 10);
    assert_eq!(reports[0]["name"], "Report 11");
    assert_eq!(reports[9]["name"], "Report 2");
    Ok(())
}

#[tokio::test]
async fn general_webhook_adds_passthrough_field() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    app.post("/api/webhook/price", json!({"btc_price": 43750.25, "btc_change_24h": 2.47})).await?;
    let before = app.data().await?;

    let (status, body) = app.post("/api/webhook", json!({"foo": "bar"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data updated successfully");

    let mut after = app.data().await?;
    assert_eq!(after["foo"], "bar");
    if let Some(m) = after.as_object_mut() {
        m.remove("foo");
    }
    after["last_updated"] = before["last_updated"].clone();
    assert_eq!(after, before);
    Ok(())
}

#[tokio::test]
async fn general_webhook_overwrites_known_fields() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let (status, _) = app
        .post(
            "/api/webhook",
            json!({"ai_sentiment": "Bullish", "sentiment_score": 72, "market_trend": "Uptrend", "active_models": 5}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let data = app.data().await?;
    assert_eq!(data["ai_sentiment"], "Bullish");
    assert_eq!(data["sentiment_score"], 72);
    assert_eq!(data["market_trend"], "Uptrend");
    assert_eq!(data["active_models"], 5);
    Ok(())
}

#[tokio::test]
async fn entries_keep_loose_types_and_extra_fields() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let predictions = json!([{"model": "LSTM", "value": 44200, "confidence": 82.5}]);
    let (status, _) = app.post("/api/webhook/predictions", json!({"predictions": predictions})).await?;
    assert_eq!(status, StatusCode::OK);

    let signal = json!({"time": "14:23", "text": "Breakout", "type": "bullish", "price": 44000});
    let (status, _) = app.post("/api/webhook/signals", json!({"signal": signal})).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/api/webhook", json!({"sentiment_score": 72.0})).await?;
    assert_eq!(status, StatusCode::OK);

    let data = app.data().await?;
    assert_eq!(data["predictions"], predictions);
    assert_eq!(data["active_models"], 1);
    assert_eq!(data["signals"][0], signal);
    assert_eq!(data["sentiment_score"], 72.0);
    Ok(())
}

#[tokio::test]
async fn existing_data_file_is_served_and_kept_on_update() -> anyhow::Result<()> {
    let existing = json!({
        "btc_price": 43750.25,
        "btc_change_24h": 2.47,
        "ai_sentiment": "Bullish",
        "sentiment_score": 72.5,
        "market_trend": "Uptrend",
        "trend_confidence": 85,
        "consensus_score": 78,
        "active_models": 0,
        "predictions": [],
        "patterns": [],
        "signals": [{"time": "14:23", "text": "Strong buy signal detected", "type": "bullish"}],
        "reports": [],
        "last_updated": "2025-11-13T08:00:00.123456"
    });
    let app = TestApp::with_document(Some(&existing)).await?;
    assert_eq!(app.data().await?, existing);

    let (status, _) = app
        .post("/api/webhook/reports", json!({"report": {"name": "Daily", "date": "2025-11-14", "time": "08:00"}}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let on_disk: Value = serde_json::from_slice(&tokio::fs::read(&app.data_file).await?)?;
    assert_eq!(on_disk["btc_price"], 43750.25);
    assert_eq!(on_disk["ai_sentiment"], "Bullish");
    assert_eq!(on_disk["signals"], existing["signals"]);
    assert_eq!(on_disk["reports"][0]["name"], "Daily");
    assert_ne!(on_disk["last_updated"], existing["last_updated"]);
    Ok(())
}

#[tokio::test]
async fn missing_required_field_is_rejected_without_writing() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    app.post("/api/webhook", json!({"foo": "bar"})).await?;
    let before = tokio::fs::read(&app.data_file).await?;

    let cases = [
        ("/api/webhook", json!({}), "No JSON payload provided"),
        ("/api/webhook/price", json!({"btc_change_24h": 1.0}), "btc_price is required"),
        ("/api/webhook/predictions", json!({"models": []}), "predictions array is required"),
        ("/api/webhook/patterns", json!({"pattern": {}}), "patterns array is required"),
        ("/api/webhook/signals", json!({"signals": []}), "signal object is required"),
        ("/api/webhook/reports", json!({"name": "x"}), "report object is required"),
    ];
    for (uri, body, expected) in cases {
        let (status, resp) = app.post(uri, body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(resp["error"], expected, "{uri}");
    }

    assert_eq!(tokio::fs::read(&app.data_file).await?, before);
    Ok(())
}

#[tokio::test]
async fn unparsable_body_is_a_bad_request() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook/price")
        .header("content-type", "application/json")
        .body(Body::from("{\"btc_price\": "))?;
    let (status, body) = app.send(req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().starts_with("Invalid JSON payload"));

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .body(Body::from("foo=bar"))?;
    let (status, body) = app.send(req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON payload provided");
    Ok(())
}

/// Repository whose writes always fail, as an unwritable disk would.
struct ReadOnlyRepository;

#[async_trait::async_trait]
impl SnapshotRepository for ReadOnlyRepository {
    async fn load(&self) -> Snapshot { Snapshot::default() }
    async fn apply(&self, _change: SnapshotChange) -> Result<Snapshot, ServiceError> {
        Err(ServiceError::Storage("EROFS: read-only file system /srv/data".into()))
    }
}

/// Repository that panics mid-request.
struct BrokenRepository;

#[async_trait::async_trait]
impl SnapshotRepository for BrokenRepository {
    async fn load(&self) -> Snapshot { panic!("snapshot index out of bounds") }
    async fn apply(&self, _change: SnapshotChange) -> Result<Snapshot, ServiceError> {
        panic!("snapshot index out of bounds")
    }
}

#[tokio::test]
async fn storage_failure_is_a_generic_500() -> anyhow::Result<()> {
    let router = routes::build_router(AppState::new(Arc::new(ReadOnlyRepository)), cors());
    let (status, body) = send(&router, post_json("/api/webhook/price", &json!({"btc_price": 1}))?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to save data"}));

    // validation still comes first
    let (status, _) = send(&router, post_json("/api/webhook/price", &json!({}))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn handler_panic_is_caught() -> anyhow::Result<()> {
    let router = routes::build_router(AppState::new(Arc::new(BrokenRepository)), cors());
    let (status, body) = send(&router, get("/api/data")?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));

    let (status, body) = send(&router, post_json("/api/webhook/signals", &json!({"signal": {"text": "x"}}))?).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    // health has no dependencies
    let (status, _) = send(&router, get("/api/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
