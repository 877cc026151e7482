use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// A request the extractors could not read at all, e.g. broken JSON or a wrong content type.
    #[error("{detail}")]
    BadRequest { status: StatusCode, detail: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    detail: String,
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "not_authenticated",
            AppError::Forbidden(_) => "not_authorized",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Upstream(_) => "upstream_unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest { status, .. } => *status,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

macro_rules! rejection_into_validation {
    ($($rejection:ty),*) => {
        $(impl From<$rejection> for AppError {
            fn from(r: $rejection) -> Self {
                match r.status() {
                    StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(r.body_text()),
                    status => AppError::BadRequest { status, detail: r.body_text() },
                }
            }
        })*
    };
}

rejection_into_validation!(JsonRejection, FormRejection, QueryRejection, PathRejection);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut res = (status, Json(ErrorBody { kind: self.kind(), detail })).into_response();
        if matches!(self, AppError::Unauthenticated) {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}
