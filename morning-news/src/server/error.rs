use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients. Every variant renders as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Wrap a store failure, embedding its cause after `context`
    pub fn internal(context: &str, err: anyhow::Error) -> Self {
        tracing::error!("{}: {:#}", context, err);
        ApiError::Internal(format!("{}: {:#}", context, err))
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        status::Custom(status, Json(json!({ "detail": self.to_string() }))).respond_to(req)
    }
}

#[rocket::catch(404)]
pub fn not_found(_req: &Request<'_>) -> Json<serde_json::Value> {
    Json(json!({ "detail": "Not Found" }))
}

#[rocket::catch(default)]
pub fn default_catcher(status: Status, _req: &Request<'_>) -> Json<serde_json::Value> {
    Json(json!({ "detail": status.reason().unwrap_or("Request failed") }))
}
