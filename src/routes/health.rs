// ABOUTME: Liveness endpoint for load balancers and uptime checks
// ABOUTME: Reports process liveness only, no dependency probing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Liveness endpoint.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
