// ABOUTME: The explore endpoint: admission gate, conversation kickoff, response mapping
// ABOUTME: Identity and quota checks run before any body field is trusted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Explore Route
//!
//! `POST /explore` runs the full pipeline: establish the caller identity,
//! charge the rate limit, validate the message, then hand the admitted
//! input to the conversation loop. Hard failures (identity, quota, bad
//! message) surface as 4xx; everything past admission is a 200, degraded
//! replies carrying `error: true`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::constants::admission;
use crate::conversation::{run_conversation, ConversationInput};
use crate::errors::{AppError, AppResult};
use crate::limits::retry_after_seconds;
use crate::models::{ChatMessage, ChatRole, Reference};
use crate::resources::ServerResources;

/// Header the caller identity is read from
pub const IDENTITY_HEADER: &str = "x-forwarded-for";

/// Body of a successful (possibly degraded) explore response
#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    /// Assistant reply text
    pub response: String,
    /// Deduplicated references backing the reply
    pub references: Vec<Reference>,
    /// Present and `true` only on degraded replies
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

/// `POST /explore`
///
/// # Errors
///
/// 400 for missing identity or invalid message, 429 with `Retry-After`
/// when the quota is exhausted.
pub async fn explore_handler(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<ExploreResponse>> {
    let identity = caller_identity(&headers)?;

    let decision = resources
        .rate_limiter
        .check(
            &identity,
            admission::RATE_LIMIT_BUCKET,
            admission::RATE_LIMIT_MAX_REQUESTS,
            admission::RATE_LIMIT_WINDOW_SECONDS,
        )
        .await?;
    if !decision.allowed {
        let retry_after = retry_after_seconds(decision.reset_at, resources.clock.now());
        return Err(AppError::rate_limited(retry_after));
    }

    let input = parse_input(&body)?;

    let request_id = Uuid::new_v4();
    let span = info_span!("explore", %request_id);
    let outcome = run_conversation(&resources, &input).instrument(span).await;
    info!(
        %request_id,
        references = outcome.references.len(),
        degraded = outcome.error,
        "explore request completed"
    );

    Ok(Json(ExploreResponse {
        response: outcome.reply,
        references: outcome.references,
        error: outcome.error,
    }))
}

/// First entry of the forwarding header, required for admission.
///
/// There is deliberately no shared fallback bucket: a request without an
/// identity is rejected rather than pooled with every other anonymous
/// caller.
fn caller_identity(headers: &HeaderMap) -> AppResult<String> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::unidentified(format!("caller identity required: {IDENTITY_HEADER} header"))
        })
}

fn parse_input(body: &Value) -> AppResult<ConversationInput> {
    let raw = body
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_input("message must be a string"))?;

    let message = raw.trim();
    if message.is_empty() {
        return Err(AppError::invalid_input("message must not be empty"));
    }
    if message.chars().count() > admission::MAX_MESSAGE_CHARS {
        return Err(AppError::invalid_input(format!(
            "message must be at most {} characters",
            admission::MAX_MESSAGE_CHARS
        )));
    }

    Ok(ConversationInput {
        message: message.to_owned(),
        history: parse_history(body.get("history")),
        activities: parse_activities(body.get("activities")),
    })
}

/// Malformed history entries are dropped without error; the caller keeps
/// the conversation going even if its stored transcript is damaged.
fn parse_history(value: Option<&Value>) -> Vec<ChatMessage> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut kept: Vec<ChatMessage> = entries
        .iter()
        .filter_map(|entry| {
            let role = match entry.get("role").and_then(Value::as_str)? {
                "user" => ChatRole::User,
                "assistant" => ChatRole::Assistant,
                _ => return None,
            };
            let content: String = entry
                .get("content")
                .and_then(Value::as_str)?
                .chars()
                .take(admission::MAX_MESSAGE_CHARS)
                .collect();
            if content.trim().is_empty() {
                return None;
            }
            Some(ChatMessage { role, content })
        })
        .collect();

    // Most recent entries win when over the cap
    if kept.len() > admission::MAX_HISTORY_MESSAGES {
        kept.drain(..kept.len() - admission::MAX_HISTORY_MESSAGES);
    }
    kept
}

fn parse_activities(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .take(admission::MAX_ACTIVITY_PREFERENCES)
                .map(|entry| entry.chars().take(admission::MAX_MESSAGE_CHARS).collect())
                .collect()
        })
        .unwrap_or_default()
}
