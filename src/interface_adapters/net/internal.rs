use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::client::spawn_area_serializer;
use crate::interface_adapters::protocol::{AreaSnapshotDto, parse_command};
use crate::interface_adapters::state::AppState;
use crate::use_cases::AreaError;

use axum::{
    extract::{Json, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

#[derive(Debug, serde::Deserialize)]
pub struct AreaInitRequest {
    // Area id chosen by the caller.
    area_id: String,
}

#[derive(Debug, serde::Serialize)]
struct AreaInitResponse {
    // The area id that was created.
    area_id: String,
}

#[derive(Debug, serde::Serialize)]
struct AreaListResponse {
    area_ids: Vec<String>,
}

// Body parse failures keep axum's status but use the shared JSON error schema.
fn json_rejection_response(rejection: JsonRejection) -> Response {
    error_response(rejection.status(), rejection.body_text())
}

// Maps area failures onto the JSON error schema shared by every route.
fn area_error_response(err: AreaError) -> Response {
    let status = match &err {
        AreaError::AlreadyExists | AreaError::Pinned => StatusCode::CONFLICT,
        AreaError::NotFound => StatusCode::NOT_FOUND,
        AreaError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        AreaError::Rejected(_) => StatusCode::BAD_REQUEST,
    };
    error_response(status, err)
}

pub async fn create_area_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AreaInitRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let area_id = payload.area_id.trim().to_string();
    if area_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "area_id is required");
    }

    // Created areas are not pinned and can be torn down again.
    match state.area_registry.create_area(area_id.clone(), false).await {
        Ok(area) => {
            // Create the serializer so clients can subscribe immediately.
            spawn_area_serializer(&area);
            (StatusCode::CREATED, Json(AreaInitResponse { area_id })).into_response()
        }
        Err(e) => area_error_response(e),
    }
}

pub async fn list_areas_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let area_ids = state.area_registry.area_ids().await;
    Json(AreaListResponse { area_ids })
}

pub async fn get_area_handler(
    State(state): State<Arc<AppState>>,
    Path(area_id): Path<String>,
) -> impl IntoResponse {
    let Some(area) = state.area_registry.get_area(&area_id).await else {
        return area_error_response(AreaError::NotFound);
    };

    match area.snapshot().await {
        Ok(snapshot) => Json(AreaSnapshotDto::from(&snapshot)).into_response(),
        Err(e) => area_error_response(e),
    }
}

pub async fn delete_area_handler(
    State(state): State<Arc<AppState>>,
    Path(area_id): Path<String>,
) -> impl IntoResponse {
    match state.area_registry.remove_area(&area_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => area_error_response(e),
    }
}

pub async fn area_command_handler(
    State(state): State<Arc<AppState>>,
    Path(area_id): Path<String>,
    command: Result<Json<serde_json::Value>, JsonRejection>,
) -> impl IntoResponse {
    let Json(command) = match command {
        Ok(command) => command,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let Some(area) = state.area_registry.get_area(&area_id).await else {
        return area_error_response(AreaError::NotFound);
    };

    // HTTP callers have no connection identity; player ids must be in the body.
    let command = match parse_command(command, None) {
        Ok(command) => command,
        Err(e) => return area_error_response(AreaError::Rejected(e)),
    };

    match area.submit(command).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => area_error_response(e),
    }
}
