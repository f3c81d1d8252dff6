use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Most recent trading signals kept, newest first.
pub const MAX_SIGNALS: usize = 20;
/// Most recent generated reports kept, newest first.
pub const MAX_REPORTS: usize = 10;

/// Set by the store on every save; callers cannot write it.
pub const LAST_UPDATED: &str = "last_updated";

/// Latest known dashboard state. There is exactly one per deployment.
///
/// Stored as an open JSON object layered over the documented defaults: known
/// fields keep whatever value was last written to them, and unknown keys pass
/// through untouched. Nothing is decoded strictly, so one odd value in the file
/// never costs the rest of the document.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Snapshot {
    fields: Map<String, Value>,
}

impl Default for Snapshot {
    fn default() -> Self {
        let defaults = json!({
            "btc_price": 0,
            "btc_change_24h": 0,
            "ai_sentiment": "Unknown",
            "sentiment_score": 50,
            "market_trend": "Unknown",
            "trend_confidence": 0,
            "consensus_score": 0,
            "active_models": 0,
            "predictions": [],
            "patterns": [],
            "signals": [],
            "reports": [],
            "last_updated": null
        });
        match defaults {
            Value::Object(fields) => Self { fields },
            _ => Self { fields: Map::new() },
        }
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Snapshot::from_fields)
    }
}

impl Snapshot {
    /// Defaults with `fields` written over them.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        let mut snapshot = Self::default();
        snapshot.fields.extend(fields);
        snapshot
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn btc_price(&self) -> Option<f64> {
        self.get("btc_price").and_then(Value::as_f64)
    }

    pub fn btc_change_24h(&self) -> Option<f64> {
        self.get("btc_change_24h").and_then(Value::as_f64)
    }

    pub fn active_models(&self) -> Option<i64> {
        self.get("active_models").and_then(Value::as_i64)
    }

    pub fn predictions(&self) -> &[Value] {
        self.list("predictions")
    }

    pub fn patterns(&self) -> &[Value] {
        self.list("patterns")
    }

    pub fn signals(&self) -> &[Value] {
        self.list("signals")
    }

    pub fn reports(&self) -> &[Value] {
        self.list("reports")
    }

    /// Accepts RFC 3339 and offset-less ISO 8601 (read as UTC).
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let raw = self.get(LAST_UPDATED)?.as_str()?;
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub(crate) fn stamp(&mut self, at: DateTime<Utc>) {
        self.fields.insert(
            LAST_UPDATED.to_owned(),
            Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
    }

    /// Shallow overwrite; `last_updated` is skipped.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            if key != LAST_UPDATED {
                self.fields.insert(key, value);
            }
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_owned(), value);
    }

    pub fn replace_predictions(&mut self, predictions: Vec<Value>) {
        self.set("active_models", Value::from(predictions.len()));
        self.set("predictions", Value::Array(predictions));
    }

    pub fn replace_patterns(&mut self, patterns: Vec<Value>) {
        self.set("patterns", Value::Array(patterns));
    }

    pub fn push_signal(&mut self, signal: Value) {
        self.prepend_bounded("signals", signal, MAX_SIGNALS);
    }

    pub fn push_report(&mut self, report: Value) {
        self.prepend_bounded("reports", report, MAX_REPORTS);
    }

    fn list(&self, key: &str) -> &[Value] {
        self.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A non-array value under `key` is replaced by a fresh list.
    fn prepend_bounded(&mut self, key: &str, item: Value, cap: usize) {
        let slot = self.fields.entry(key).or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(list) = slot {
            list.insert(0, item);
            list.truncate(cap);
        }
    }
}
