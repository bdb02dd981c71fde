use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Catalog reply: `{"success": true, "data": ...}`, or
/// `{"success": false, "error": ..., "data": ...}` for degraded answers
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    data: T,
    status: StatusCode,
    error: Option<String>,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    data: &'a T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            error: None,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// A non-2xx reply that still carries a payload, e.g. a degraded health report
    pub fn failure(status: StatusCode, error: impl Into<String>, data: T) -> Self {
        Self {
            data,
            status,
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            ..Self::success(())
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }

        let envelope = Envelope {
            success: self.error.is_none(),
            error: self.error.as_deref(),
            data: &self.data,
        };
        (self.status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
