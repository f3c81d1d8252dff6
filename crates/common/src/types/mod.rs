use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Service name reported by the root descriptor.
pub const SERVICE_NAME: &str = "Bitcoin Overloard Webhook API";

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Health {
    pub fn now() -> Self {
        Self { status: "healthy", timestamp: Utc::now() }
    }
}

/// Root descriptor: name, version and a `"METHOD path" -> description` map.
#[derive(Serialize, Debug)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl ServiceInfo {
    pub fn new(version: impl Into<String>) -> Self {
        let endpoints = BTreeMap::from([
            ("GET /api/data", "Get current dashboard data"),
            ("POST /api/webhook", "Receive updates from local system"),
            ("POST /api/webhook/price", "Update Bitcoin price data"),
            ("POST /api/webhook/predictions", "Update AI predictions"),
            ("POST /api/webhook/patterns", "Update pattern detections"),
            ("POST /api/webhook/signals", "Add trading signals"),
            ("POST /api/webhook/reports", "Add generated reports"),
            ("GET /api/health", "Health check endpoint"),
        ]);
        Self { name: SERVICE_NAME, version: version.into(), endpoints }
    }
}

/// Body returned by every successful webhook call.
#[derive(Serialize, Debug)]
pub struct UpdateAck {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl UpdateAck {
    pub fn success(message: &'static str) -> Self {
        Self { status: "success", message, timestamp: Utc::now() }
    }
}
