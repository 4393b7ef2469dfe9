// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::configuration::ImdsOptions;
use crate::constants::METADATA_ROOT;
use crate::credentials::CredentialCache;
use crate::metadata::MetadataTree;
use crate::routes;
use axum::Router;
use axum::routing::get;
use axum::serve::Serve;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Process-lifetime state shared by every request.
pub struct AppState {
    pub metadata: Arc<MetadataTree>,
    pub credentials: Arc<CredentialCache>,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(
        options: ImdsOptions,
        metadata: Arc<MetadataTree>,
        credentials: Arc<CredentialCache>,
    ) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let server = run(listener, metadata, credentials)?;
        let port = server.local_addr()?.port();

        tracing::info!("[imds] listening at http://{}:{}", options.host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Builds the router with its state. Kept separate from [`run`] so tests can
/// drive it without binding a socket.
pub fn create_router(metadata: Arc<MetadataTree>, credentials: Arc<CredentialCache>) -> Router {
    let state = Arc::new(AppState {
        metadata,
        credentials,
    });

    Router::new()
        .route("/health", get(routes::health))
        .route(METADATA_ROOT, get(routes::metadata_root))
        .route(
            &format!("{}/{{*path}}", METADATA_ROOT),
            get(routes::metadata),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(skip(listener, metadata, credentials))]
pub fn run(
    listener: TcpListener,
    metadata: Arc<MetadataTree>,
    credentials: Arc<CredentialCache>,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    let app = create_router(metadata, credentials);
    Ok(axum::serve(listener, app))
}
