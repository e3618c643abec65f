use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Why a send did not go through. Only its text leaves the dispatcher.
///
/// The reqwest error sits in the source chain; its own `Display` names only
/// the error kind.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    #[error("Slack API error: {status} {body}")]
    RemoteRejection { status: u16, body: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Delay amount must be a positive number")]
    InvalidDelay,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Webhook URL must not be empty")]
    EmptyWebhookUrl,
}

pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl DispatchError {
    /// The error and every cause below it, joined with `": "`.
    pub fn reason(self) -> String {
        format!("{:#}", anyhow::Error::from(self))
    }
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: err.into(),
        }
    }

    pub fn conflict(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error: err.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.error.to_string()
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}
