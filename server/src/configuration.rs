// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::constants::{DEFAULT_REGION, DEFAULT_SESSION_NAME};

/// How vended credentials are keyed in the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CachePolicy {
    /// One slot shared by every role. While the cached record is fresh it is
    /// returned for any role name, including roles that never populated it.
    #[default]
    SingleSlot,
    /// One slot per role name.
    PerRole,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ImdsOptions {
    #[arg(long, default_value = "0.0.0.0", env("IMDS_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "80", env("IMDS_HTTP_PORT"))]
    pub port: u16,
    #[arg(long, default_value = DEFAULT_REGION, env("IMDS_REGION"))]
    pub region: String,
    #[arg(long, default_value = DEFAULT_SESSION_NAME, env("IMDS_SESSION_NAME"))]
    pub session_name: String,
    #[arg(long, value_enum, default_value_t = CachePolicy::SingleSlot, env("IMDS_CACHE_POLICY"))]
    pub cache_policy: CachePolicy,
    /// JSON file holding the metadata tree
    #[arg(env("IMDS_METADATA_FILE"))]
    pub metadata: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let options = ImdsOptions::try_parse_from(["imds-mock"]).unwrap();
        assert_eq!(options.host, "0.0.0.0");
        assert_eq!(options.port, 80);
        assert_eq!(options.region, "us-west-2");
        assert_eq!(options.session_name, "Local");
        assert_eq!(options.cache_policy, CachePolicy::SingleSlot);
        assert!(options.metadata.is_none());
    }

    #[test]
    fn test_parse_metadata_file_and_policy() {
        let options = ImdsOptions::try_parse_from([
            "imds-mock",
            "--cache-policy",
            "per-role",
            "--port",
            "8080",
            "metadata.json",
        ])
        .unwrap();
        assert_eq!(options.cache_policy, CachePolicy::PerRole);
        assert_eq!(options.port, 8080);
        assert_eq!(options.metadata, Some(PathBuf::from("metadata.json")));
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let result = ImdsOptions::try_parse_from(["imds-mock", "--cache-policy", "lru"]);
        assert!(result.is_err());
    }
}
