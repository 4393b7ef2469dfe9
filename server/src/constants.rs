// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

/// UTC timestamp format used by EC2 for `LastUpdated` and `Expiration`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_SESSION_NAME: &str = "Local";

pub const METADATA_ROOT: &str = "/latest/meta-data";
pub const IAM_SEGMENT: &str = "iam";
pub const SECURITY_CREDENTIALS_SEGMENT: &str = "security-credentials";

pub const CODE_SUCCESS: &str = "Success";
pub const CREDENTIALS_TYPE: &str = "AWS-HMAC";

pub const ISSUER_TIMEOUT: Duration = Duration::from_secs(10);

/// https://docs.aws.amazon.com/IAM/latest/APIReference/API_GetRole.html
pub const MAX_ROLE_NAME_LENGTH: usize = 64;
