//! `POST /api/webhook*` handlers. Each one validates its payload into a
//! [`SnapshotChange`] and hands it to the repository.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::info;

use common::types::UpdateAck;
use service::snapshot::SnapshotChange;

use crate::errors::ApiError;
use crate::state::AppState;

type Payload = Result<Json<Value>, JsonRejection>;
type AckResult = Result<Json<UpdateAck>, ApiError>;

async fn apply(state: &AppState, change: SnapshotChange) -> AckResult {
    let message = change.success_message();
    let kind = change.kind();
    state.snapshots.apply(change).await?;
    info!(change = kind, "webhook applied");
    Ok(Json(UpdateAck::success(message)))
}

/// Shallow merge of an arbitrary JSON object into the snapshot.
pub async fn general(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::merge(body)?).await
}

pub async fn price(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::price(body)?).await
}

pub async fn predictions(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::predictions(body)?).await
}

pub async fn patterns(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::patterns(body)?).await
}

pub async fn signals(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::signal(body)?).await
}

pub async fn reports(State(state): State<AppState>, payload: Payload) -> AckResult {
    let Json(body) = payload?;
    apply(&state, SnapshotChange::report(body)?).await
}
