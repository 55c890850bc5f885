use super::AppState;
use crate::errors::ApiError;
use crate::segment_groups::{parse_assignment, parse_draft};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

type JsonBody = Result<Json<Value>, JsonRejection>;

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let groups = state.segment_groups.list().await?;
    Ok(Json(json!({"success": true, "data": groups})))
}

pub async fn create(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let group = state.segment_groups.create(parse_draft(&body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": group})),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let group = state.segment_groups.get(&id).await?;
    Ok(Json(json!({"success": true, "data": group})))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let group = state.segment_groups.update(&id, parse_draft(&body)?).await?;
    Ok(Json(json!({"success": true, "data": group})))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.segment_groups.delete(&id).await?;
    Ok(Json(
        json!({"success": true, "message": "Segment group deleted successfully"}),
    ))
}

pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (segment_id, assignment) = parse_assignment(&body)?;
    let group = state
        .segment_groups
        .assign(&id, &segment_id, assignment)
        .await?;
    Ok(Json(json!({"success": true, "data": group})))
}
