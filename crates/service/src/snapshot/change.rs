use serde_json::{Map, Value};

use super::domain::Snapshot;
use crate::errors::ServiceError;

/// One validated webhook update, ready to be applied to the current snapshot.
///
/// Constructors check only that the required field is present with the right
/// container shape; values are stored as received. A rejected payload never
/// reaches the store.
#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotChange {
    /// Shallow overwrite of every supplied top-level key.
    Merge(Map<String, Value>),
    Price { btc_price: Value, btc_change_24h: Option<Value> },
    Predictions(Vec<Value>),
    Patterns(Vec<Value>),
    Signal(Value),
    Report(Value),
}

impl SnapshotChange {
    pub fn merge(payload: Value) -> Result<Self, ServiceError> {
        match payload {
            Value::Object(map) if !map.is_empty() => Ok(Self::Merge(map)),
            Value::Object(_) | Value::Null => Err(ServiceError::validation("No JSON payload provided")),
            _ => Err(ServiceError::validation("JSON payload must be an object")),
        }
    }

    pub fn price(payload: Value) -> Result<Self, ServiceError> {
        let mut fields = into_fields(payload);
        let btc_price = match fields.remove("btc_price") {
            None | Some(Value::Null) => return Err(ServiceError::validation("btc_price is required")),
            Some(v) => v,
        };
        let btc_change_24h = fields.remove("btc_change_24h").filter(|v| !v.is_null());
        Ok(Self::Price { btc_price, btc_change_24h })
    }

    pub fn predictions(payload: Value) -> Result<Self, ServiceError> {
        required_array(payload, "predictions").map(Self::Predictions)
    }

    pub fn patterns(payload: Value) -> Result<Self, ServiceError> {
        required_array(payload, "patterns").map(Self::Patterns)
    }

    pub fn signal(payload: Value) -> Result<Self, ServiceError> {
        required_object(payload, "signal").map(Self::Signal)
    }

    pub fn report(payload: Value) -> Result<Self, ServiceError> {
        required_object(payload, "report").map(Self::Report)
    }

    pub fn apply(self, snapshot: &mut Snapshot) {
        match self {
            Self::Merge(fields) => snapshot.merge(fields),
            Self::Price { btc_price, btc_change_24h } => {
                snapshot.set("btc_price", btc_price);
                if let Some(change) = btc_change_24h {
                    snapshot.set("btc_change_24h", change);
                }
            }
            Self::Predictions(list) => snapshot.replace_predictions(list),
            Self::Patterns(list) => snapshot.replace_patterns(list),
            Self::Signal(signal) => snapshot.push_signal(signal),
            Self::Report(report) => snapshot.push_report(report),
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Merge(_) => "Data updated successfully",
            Self::Price { .. } => "Price updated",
            Self::Predictions(_) => "Predictions updated",
            Self::Patterns(_) => "Patterns updated",
            Self::Signal(_) => "Signal added",
            Self::Report(_) => "Report added",
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Merge(_) => "merge",
            Self::Price { .. } => "price",
            Self::Predictions(_) => "predictions",
            Self::Patterns(_) => "patterns",
            Self::Signal(_) => "signal",
            Self::Report(_) => "report",
        }
    }
}

fn into_fields(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn required_array(payload: Value, field: &str) -> Result<Vec<Value>, ServiceError> {
    match into_fields(payload).remove(field) {
        Some(Value::Array(list)) => Ok(list),
        _ => Err(ServiceError::validation(format!("{field} array is required"))),
    }
}

fn required_object(payload: Value, field: &str) -> Result<Value, ServiceError> {
    match into_fields(payload).remove(field) {
        Some(obj @ Value::Object(_)) => Ok(obj),
        _ => Err(ServiceError::validation(format!("{field} object is required"))),
    }
}
