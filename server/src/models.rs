// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::ZeroizeOnDrop;

use crate::constants::{CODE_SUCCESS, CREDENTIALS_TYPE, DATE_FORMAT};

/// Credentials as handed back by a [`CredentialIssuer`](crate::issuer::CredentialIssuer).
///
/// `expiration` is kept as the issuer's text so that the cache decides how to
/// parse it.
#[derive(Clone, ZeroizeOnDrop)]
pub struct IssuedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// A cached credential set together with when it was fetched and when it expires.
#[derive(Clone, ZeroizeOnDrop)]
pub struct CredentialRecord {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[zeroize(skip)]
    pub issued_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub expires_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub code: &'static str,
}

impl CredentialRecord {
    pub fn new(
        issued: &IssuedCredentials,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: issued.access_key_id.clone(),
            secret_access_key: issued.secret_access_key.clone(),
            session_token: issued.session_token.clone(),
            issued_at,
            expires_at,
            code: CODE_SUCCESS,
        }
    }

    /// Stale once `now` is strictly past the expiration.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("code", &self.code)
            .finish()
    }
}

/// Body of `GET /latest/meta-data/iam/security-credentials/{role}`, field
/// for field as EC2 returns it.
#[derive(Clone, Serialize, ZeroizeOnDrop)]
pub struct SecurityCredentials {
    #[serde(rename = "Code")]
    pub code: String,

    #[serde(rename = "LastUpdated")]
    pub last_updated: String,

    #[serde(rename = "Type")]
    pub credential_type: String,

    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "Token")]
    pub token: String,

    #[serde(rename = "Expiration")]
    pub expiration: String,
}

impl fmt::Debug for SecurityCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityCredentials")
            .field("code", &self.code)
            .field("last_updated", &self.last_updated)
            .field("credential_type", &self.credential_type)
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl From<&CredentialRecord> for SecurityCredentials {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            code: record.code.to_string(),
            last_updated: record.issued_at.format(DATE_FORMAT).to_string(),
            credential_type: CREDENTIALS_TYPE.to_string(),
            access_key_id: record.access_key_id.clone(),
            secret_access_key: record.secret_access_key.clone(),
            token: record.session_token.clone(),
            expiration: record.expires_at.format(DATE_FORMAT).to_string(),
        }
    }
}
