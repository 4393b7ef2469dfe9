// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the metadata API.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | GET | `/latest/meta-data` | [`metadata_root`] | List top-level metadata keys |
//! | GET | `/latest/meta-data/{path...}` | [`metadata`] | Metadata lookup or credential vending |
//!
//! `iam/security-credentials/{role}` is dispatched from [`metadata`] to
//! [`security_credentials`]; every other path is resolved against the
//! metadata tree.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

use crate::application::AppState;
use crate::constants::{IAM_SEGMENT, MAX_ROLE_NAME_LENGTH, SECURITY_CREDENTIALS_SEGMENT};
use crate::errors::AppError;
use crate::metadata::Resolution;
use crate::models::SecurityCredentials;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Lists the top-level metadata keys, one per line.
#[tracing::instrument(skip(state))]
pub async fn metadata_root(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    lookup(&state, "")
}

/// Resolves a metadata path, or vends credentials for
/// `iam/security-credentials/{role}`.
///
/// # Errors
///
/// - [`AppError::NotFound`] - Nothing is stored at the path
/// - [`AppError::MalformedRequestPath`] - The role name is not a valid IAM role name
/// - [`AppError::Issuer`] - Assuming the role failed
#[tracing::instrument(skip(state))]
pub async fn metadata(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [IAM_SEGMENT, SECURITY_CREDENTIALS_SEGMENT, role_name] => {
            let credentials = security_credentials(&state, role_name).await?;
            Ok(credentials.into_response())
        }
        _ => lookup(&state, &path).map(IntoResponse::into_response),
    }
}

fn lookup(state: &AppState, path: &str) -> Result<String, AppError> {
    match state.metadata.resolve(path) {
        Resolution::Leaf(value) => Ok(value.to_string()),
        Resolution::Listing(keys) => Ok(keys),
        Resolution::NotFound => {
            tracing::debug!("[imds] no metadata at {:?}", path);
            Err(AppError::NotFound)
        }
    }
}

/// Returns temporary credentials for `role_name` in the EC2 response shape.
///
/// # Request Flow
///
/// 1. Validate the role name
/// 2. Serve the cached credentials, or assume the role if they have expired
/// 3. Render the record as [`SecurityCredentials`]
#[tracing::instrument(skip(state))]
pub async fn security_credentials(
    state: &AppState,
    role_name: &str,
) -> Result<Json<SecurityCredentials>, AppError> {
    validate_role_name(role_name)?;

    let record = state
        .credentials
        .get_credentials(role_name, Utc::now())
        .await?;

    Ok(Json(SecurityCredentials::from(record.as_ref())))
}

/// IAM role names are 1-64 characters of `[A-Za-z0-9+=,.@_-]`.
fn validate_role_name(role_name: &str) -> Result<(), AppError> {
    let valid_chars = role_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c));

    if role_name.is_empty() || role_name.len() > MAX_ROLE_NAME_LENGTH || !valid_chars {
        tracing::warn!("[imds] rejecting role name {:?}", role_name);
        return Err(AppError::MalformedRequestPath(format!(
            "invalid role name: {}",
            role_name
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    // Integration tests using TestServer are in tests/http_integration.rs

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn test_validate_role_name_accepts_iam_charset() {
        assert!(validate_role_name("my-role").is_ok());
        assert!(validate_role_name("Role_1+=,.@").is_ok());
        assert!(validate_role_name(&"a".repeat(MAX_ROLE_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_role_name_rejects_invalid() {
        for role_name in ["", "role name", "role%2F", "rôle"] {
            assert!(matches!(
                validate_role_name(role_name),
                Err(AppError::MalformedRequestPath(_))
            ));
        }
        assert!(validate_role_name(&"a".repeat(MAX_ROLE_NAME_LENGTH + 1)).is_err());
    }
}
