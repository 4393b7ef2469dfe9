// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Credential vending through IAM and STS.
//!
//! [`CredentialIssuer`] is the narrow seam the [`CredentialCache`] calls when
//! its cached record is stale. [`StsIssuer`] is the production implementation:
//!
//! 1. `iam:GetRole` resolves the role name to its ARN
//! 2. `sts:AssumeRole` exchanges the caller's credentials for temporary ones
//!
//! Wrapping an issuer in [`TimeoutIssuer`] bounds each `assume` call, so a
//! hung AWS endpoint surfaces as [`IssuerError::Timeout`].
//!
//! [`CredentialCache`]: crate::credentials::CredentialCache

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_config::sts::AssumeRoleProvider;
use aws_credential_types::Credentials;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_iam::error::DisplayErrorContext;
use chrono::{DateTime, Utc};

use crate::constants::DATE_FORMAT;
use crate::errors::IssuerError;
use crate::models::IssuedCredentials;

/// Issues temporary credentials for a role.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn assume(&self, role_name: &str) -> Result<IssuedCredentials, IssuerError>;
}

/// Bounds every `assume` call of the wrapped issuer.
pub struct TimeoutIssuer<I> {
    inner: I,
    timeout: Duration,
}

impl<I: CredentialIssuer> TimeoutIssuer<I> {
    pub fn new(inner: I, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<I: CredentialIssuer> CredentialIssuer for TimeoutIssuer<I> {
    async fn assume(&self, role_name: &str) -> Result<IssuedCredentials, IssuerError> {
        tokio::time::timeout(self.timeout, self.inner.assume(role_name))
            .await
            .map_err(|_| {
                tracing::warn!("[imds] assuming {} timed out", role_name);
                IssuerError::Timeout(self.timeout)
            })?
    }
}

pub struct StsIssuer {
    config: SdkConfig,
    iam: aws_sdk_iam::Client,
    session_name: String,
}

impl StsIssuer {
    pub fn new(config: SdkConfig, session_name: impl Into<String>) -> Self {
        Self {
            iam: aws_sdk_iam::Client::new(&config),
            config,
            session_name: session_name.into(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn role_arn(&self, role_name: &str) -> Result<String, IssuerError> {
        let output = self
            .iam
            .get_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_no_such_entity_exception())
                {
                    IssuerError::RoleNotFound(role_name.to_string())
                } else {
                    IssuerError::Iam(DisplayErrorContext(&e).to_string())
                }
            })?;

        output
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| IssuerError::RoleNotFound(role_name.to_string()))
    }
}

#[async_trait]
impl CredentialIssuer for StsIssuer {
    #[tracing::instrument(skip(self))]
    async fn assume(&self, role_name: &str) -> Result<IssuedCredentials, IssuerError> {
        let role_arn = self.role_arn(role_name).await?;

        tracing::debug!("[imds] assuming role {}", role_arn);

        let provider = AssumeRoleProvider::builder(role_arn)
            .session_name(self.session_name.clone())
            .configure(&self.config)
            .build()
            .await;

        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| IssuerError::Sts(DisplayErrorContext(&e).to_string()))?;

        issued_credentials(&credentials)
    }
}

fn issued_credentials(credentials: &Credentials) -> Result<IssuedCredentials, IssuerError> {
    let expiry = credentials.expiry().ok_or(IssuerError::MissingExpiration)?;
    let expiration = DateTime::<Utc>::from(expiry).format(DATE_FORMAT).to_string();

    Ok(IssuedCredentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().unwrap_or_default().to_string(),
        expiration,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Issuer that waits `delay` before answering.
    struct SlowIssuer {
        delay: Duration,
    }

    #[async_trait]
    impl CredentialIssuer for SlowIssuer {
        async fn assume(&self, role_name: &str) -> Result<IssuedCredentials, IssuerError> {
            tokio::time::sleep(self.delay).await;
            Ok(IssuedCredentials {
                access_key_id: format!("ASIA-{}", role_name),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
                expiration: "2024-05-01T13:00:00Z".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_timeout_issuer_gives_up_on_slow_issuer() {
        let issuer = TimeoutIssuer::new(
            SlowIssuer {
                delay: Duration::from_secs(30),
            },
            Duration::from_millis(20),
        );
        let result = issuer.assume("my-role").await;
        assert_eq!(
            result.unwrap_err(),
            IssuerError::Timeout(Duration::from_millis(20))
        );
    }

    #[tokio::test]
    async fn test_timeout_issuer_passes_through_in_time() {
        let issuer = TimeoutIssuer::new(
            SlowIssuer {
                delay: Duration::ZERO,
            },
            Duration::from_secs(5),
        );
        let issued = issuer.assume("my-role").await.unwrap();
        assert_eq!(issued.access_key_id, "ASIA-my-role");
    }

    #[test]
    fn test_issued_credentials_formats_expiry() {
        // 2024-05-01T13:00:00Z
        let expiry = UNIX_EPOCH + Duration::from_secs(1_714_568_400);
        let credentials = Credentials::new(
            "ASIA",
            "secret",
            Some("token".to_string()),
            Some(expiry),
            "test",
        );
        let issued = issued_credentials(&credentials).unwrap();
        assert_eq!(issued.access_key_id, "ASIA");
        assert_eq!(issued.session_token, "token");
        assert_eq!(issued.expiration, "2024-05-01T13:00:00Z");
    }

    #[test]
    fn test_issued_credentials_truncates_subsecond_expiry() {
        let expiry = UNIX_EPOCH + Duration::from_millis(1_714_568_400_750);
        let credentials = Credentials::new("ASIA", "secret", None, Some(expiry), "test");
        let issued = issued_credentials(&credentials).unwrap();
        assert_eq!(issued.expiration, "2024-05-01T13:00:00Z");
        assert_eq!(issued.session_token, "");
    }

    #[test]
    fn test_issued_credentials_requires_expiry() {
        let credentials = Credentials::new("ASIA", "secret", None, None::<SystemTime>, "test");
        let result = issued_credentials(&credentials);
        assert_eq!(result.unwrap_err(), IssuerError::MissingExpiration);
    }
}
