// HTTP request handlers
use crate::application::dashboard_service::RenderRequest;
use crate::application::page_service::{ChartDraft, PageError};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

#[derive(Deserialize)]
pub struct CreatePage {
    pub title: String,
    #[serde(default)]
    pub with_title: bool,
}

#[derive(Deserialize)]
pub struct UpdatePage {
    pub title: String,
    pub with_title: Option<bool>,
}

#[derive(Deserialize)]
pub struct SchemaQuery {
    pub file: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

fn status_for(err: &PageError) -> StatusCode {
    match err {
        PageError::PageNotFound(_) | PageError::ChartNotFound { .. } => StatusCode::NOT_FOUND,
        PageError::DuplicateTitle(_) | PageError::PositionOccupied { .. } => StatusCode::CONFLICT,
        PageError::EmptyTitle
        | PageError::PositionOutsideGrid { .. }
        | PageError::Requirement { .. }
        | PageError::Layout(_)
        | PageError::Chart(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PageError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn send<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn reply<T: Serialize>(result: Result<T, PageError>, success: StatusCode, compress: bool) -> Response {
    match result {
        Ok(data) => send(success, &data, compress).await,
        Err(e) => error_reply(e, compress).await,
    }
}

async fn error_reply(e: PageError, compress: bool) -> Response {
    let status = status_for(&e);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {:#}", e);
    }
    let body = ErrorBody {
        code: match &e {
            PageError::Chart(chart_error) => Some(chart_error.code()),
            _ => None,
        },
        error: e.to_string(),
    };
    send(status, &body, compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_pages(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let result = state.page_service.list_pages().await;
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

pub async fn create_page(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePage>,
) -> Response {
    let result = state.page_service.create_page(&body.title, body.with_title).await;
    reply(result, StatusCode::CREATED, accepts_brotli(&headers)).await
}

pub async fn update_page(
    Path(title): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdatePage>,
) -> Response {
    let result = state
        .page_service
        .update_page(&title, &body.title, body.with_title)
        .await;
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

pub async fn delete_page(Path(title): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match state.page_service.delete_page(&title).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_reply(e, false).await,
    }
}

/// Grid occupancy for the chart setup form
pub async fn page_positions(
    Path(title): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state.page_service.available_positions(&title).await;
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

pub async fn add_chart(
    Path(title): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ChartDraft>,
) -> Response {
    let result = state.page_service.add_chart(&title, draft).await;
    reply(result, StatusCode::CREATED, accepts_brotli(&headers)).await
}

pub async fn edit_chart(
    Path((title, chart_id)): Path<(String, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ChartDraft>,
) -> Response {
    let result = state.page_service.edit_chart(&title, &chart_id, draft).await;
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

pub async fn delete_chart(
    Path((title, chart_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.page_service.delete_chart(&title, &chart_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_reply(e, false).await,
    }
}

/// Resolve the page layout and run every chart's data pipeline
pub async fn render_page(
    Path(title): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Response {
    let result = state.dashboard_service.render_page(&title, request).await;
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

pub async fn list_datasets(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let datasets = Arc::clone(&state.datasets);
    let result = match tokio::task::spawn_blocking(move || datasets.list_files()).await {
        Ok(listing) => listing.map_err(PageError::Store),
        Err(e) => Err(PageError::Store(e.into())),
    };
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

/// Column roles of one data file, for the chart setup form
pub async fn dataset_schema(
    Query(query): Query<SchemaQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let datasets = Arc::clone(&state.datasets);
    let result = match tokio::task::spawn_blocking(move || datasets.schema(&query.file)).await {
        Ok(schema) => schema.map_err(PageError::Chart),
        Err(e) => Err(PageError::Store(e.into())),
    };
    reply(result, StatusCode::OK, accepts_brotli(&headers)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{ChartError, LayoutError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&PageError::PageNotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&PageError::PositionOccupied {
                position: "ROW1, COL1".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&PageError::Layout(LayoutError::malformed("ROW", "no column"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PageError::Chart(ChartError::IncompleteRange)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PageError::Store(anyhow::anyhow!("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_chart_errors_carry_their_code() {
        let response = error_reply(PageError::Chart(ChartError::unknown_column("Profit")), false).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "unknown_column");
    }
}
