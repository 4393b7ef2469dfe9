// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use imds_mock::application::Application;
use imds_mock::configuration::ImdsOptions;
use imds_mock::constants::ISSUER_TIMEOUT;
use imds_mock::credentials::CredentialCache;
use imds_mock::issuer::{StsIssuer, TimeoutIssuer};
use imds_mock::metadata::MetadataTree;
use std::{io::Error, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    println!("[imds] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    // get configuration options from arguments and environment variables
    let options = ImdsOptions::parse();

    tracing::info!("[imds] {:?}", &options);

    let metadata = match &options.metadata {
        Some(path) => MetadataTree::from_file(path).map_err(|e| {
            tracing::error!("[imds] {}", e);
            Error::other(e.to_string())
        })?,
        None => {
            tracing::warn!("[imds] no metadata file given, serving an empty tree");
            MetadataTree::new()
        }
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(options.region.clone()))
        .load()
        .await;
    let issuer = TimeoutIssuer::new(
        StsIssuer::new(sdk_config, options.session_name.clone()),
        ISSUER_TIMEOUT,
    );

    tracing::info!("[imds] caching credentials with {:?}", options.cache_policy);

    let credentials = Arc::new(CredentialCache::new(options.cache_policy, Arc::new(issuer)));

    let application = Application::build(options, Arc::new(metadata), credentials).await?;

    application.run_until_stopped().await
}
