use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use tracing::debug;

use super::response::{ApiError, ApiResponse, StreamData};
use super::AppState;
use crate::error::ResolveError;
use crate::models::ContentId;

/// `GET /api/v1/stream/{video_id}`
pub async fn get_stream(
    State(state): State<AppState>,
    video_id: Result<Path<String>, PathRejection>,
) -> Result<Json<ApiResponse<StreamData>>, ApiError> {
    let Path(video_id) = video_id.map_err(|rejection| ResolveError::InvalidId(rejection.body_text()))?;
    let content_id = ContentId::parse(&video_id)?;
    debug!("📋 Petición de stream: {}", content_id);

    let descriptor = state.resolver.resolve_stream(&content_id).await?;

    Ok(Json(ApiResponse::ok(StreamData::from(descriptor))))
}
