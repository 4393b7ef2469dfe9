// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # IMDS Mock
//!
//! A local stand-in for the EC2 instance metadata service.
//!
//! Static attributes (instance id, hostname, placement, ...) are served from a
//! JSON metadata tree loaded at startup. Requests for
//! `iam/security-credentials/{role}` assume the role through IAM and STS and
//! hand back the temporary credentials in the shape EC2 uses, cached until
//! they expire.
//!
//! ## Architecture
//!
//! ```text
//! Client -> HTTP API -> MetadataTree::resolve
//!                 |
//!                 +-> CredentialCache -> CredentialIssuer (IAM + STS)
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Configuration constants for the application
//! - [`credentials`]: Expiry-aware credential cache
//! - [`errors`]: Application error types with HTTP response mapping
//! - [`issuer`]: Role assumption through IAM and STS
//! - [`metadata`]: Metadata tree and path resolution
//! - [`models`]: Credential records and response types
//! - [`routes`]: HTTP route handlers
//!
//! ## Usage
//!
//! ```bash
//! imds-mock --port 8080 --region us-west-2 metadata.json
//! ```
//!
//! ## Security Considerations
//!
//! - Credentials are only refreshed once they have expired
//! - All sensitive credential data is zeroized on drop and redacted from `Debug`
//! - Role names are validated before any AWS call is made

pub mod application;
pub mod configuration;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod issuer;
pub mod metadata;
pub mod models;
pub mod routes;
