// ABOUTME: HTTP route registration for the explore server
// ABOUTME: Builds the axum router over shared server resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! HTTP routes.

pub mod explore;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::resources::ServerResources;

/// Assemble the application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/explore", post(explore::explore_handler))
        .route("/health", get(health::health_handler))
        .with_state(resources)
}
