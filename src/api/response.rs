//! Response envelope shared by every `/api/v1` endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::ResolveError;
use crate::models::StreamDescriptor;

/// `{ "success": bool, "data"?: T, "error"?: { code, message } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Stream payload as exposed to clients.
#[derive(Debug, Serialize)]
pub struct StreamData {
    pub video_id: String,
    pub stream_url: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub expires_in_seconds: u64,
}

impl From<StreamDescriptor> for StreamData {
    fn from(descriptor: StreamDescriptor) -> Self {
        Self {
            video_id: descriptor.content_id,
            stream_url: descriptor.url,
            format: descriptor.container_format,
            quality: descriptor.audio_quality,
            expires_in_seconds: descriptor.ttl_seconds,
        }
    }
}

/// Error that renders as an envelope with `success: false`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        let status = match &err {
            ResolveError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResolveError::NoAudioFormat => StatusCode::NOT_FOUND,
            ResolveError::ExtractionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("❌ {} {}: {}", self.status.as_u16(), self.code, self.message);
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: self.code,
                message: self.message,
            }),
        };

        (self.status, Json(body)).into_response()
    }
}
