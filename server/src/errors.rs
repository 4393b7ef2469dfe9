// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failures while obtaining credentials from a [`CredentialIssuer`](crate::issuer::CredentialIssuer).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IssuerError {
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error("iam error: {0}")]
    Iam(String),
    #[error("sts error: {0}")]
    Sts(String),
    #[error("issued credentials have no expiration")]
    MissingExpiration,
    #[error("malformed expiration: {0:?}")]
    MalformedExpiration(String),
    #[error("issuer timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("unable to assume role: {0}")]
    Issuer(#[from] IssuerError),
    #[error("malformed request path: {0}")]
    MalformedRequestPath(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            Self::Issuer(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to assume role".to_string(),
            ),
            Self::MalformedRequestPath(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(source: serde_json::Error) -> Self {
        tracing::error!("{:?}", source);
        AppError::ConfigError(source.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        tracing::error!("{:?}", source);
        AppError::ConfigError(source.to_string())
    }
}
