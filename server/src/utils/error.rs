use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not reach the API node: {source}")]
    ReqwestError {
        #[from]
        source: reqwest::Error,
    },
    #[error("API node {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("{0}")]
    BadServerResponse(&'static str),
    #[error("API node rejected the call ({code}): {message}")]
    Rpc { code: i64, message: String },
    #[error("All {attempts} API nodes failed for {method}")]
    UpstreamUnavailable { method: &'static str, attempts: usize },
    #[error("Could not fetch the accounts followed by {account}")]
    NoFollowingData { account: String },
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadConfig(&'static str),
}

impl Error {
    /// Whether the next API node should be tried after this error.
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self,
            Self::ReqwestError { .. } | Self::Timeout { .. } | Self::BadServerResponse(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ReqwestError { .. }
            | Self::Timeout { .. }
            | Self::BadServerResponse(_)
            | Self::Rpc { .. }
            | Self::UpstreamUnavailable { .. }
            | Self::NoFollowingData { .. } => StatusCode::BAD_GATEWAY,
            Self::BadConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
