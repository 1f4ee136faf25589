//! Response mapping.
//!
//! # Responsibilities
//! - Encode successful action replies with the route's content type
//! - Map routing and action errors to HTTP status codes
//!
//! # Design Decisions
//! - Error responses carry a status and an empty body
//! - Server-side failures (500) are logged here, once

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::actions::{ActionError, Reply};
use crate::routing::RouteError;

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::NotFound { .. } => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RouteError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl ActionError {
    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::NotFound => StatusCode::NOT_FOUND,
            ActionError::Conflict { .. } => StatusCode::CONFLICT,
            ActionError::Store(_) | ActionError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Action failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Action rejected");
        }
        status.into_response()
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}
