// ABOUTME: LLM provider abstraction for the tool-calling conversation loop
// ABOUTME: Transcript and turn types plus the credential-keyed provider handle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # LLM Provider Abstraction
//!
//! The conversation loop talks to [`ChatProvider`], which accepts a system
//! prompt, a transcript, and the tool catalogue, and returns a single turn
//! that is either tool-use or final text. [`anthropic::AnthropicProvider`]
//! is the production implementation; tests script their own.

pub mod anthropic;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppResult;

/// Static description of one callable tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// Tool name the model calls by
    pub name: &'static str,
    /// What the tool does, shown to the model
    pub description: &'static str,
    /// JSON schema of the tool input
    pub input_schema: Value,
}

/// A tool invocation requested by the model; untrusted until validated
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Requested tool name
    pub name: String,
    /// Raw argument map from the model
    pub input: Value,
    /// Provider-assigned id correlating the result turn
    pub call_id: String,
}

/// Result of one tool call, fed back to the provider
#[derive(Debug, Clone)]
pub struct ToolResultMessage {
    /// Id of the call this result answers
    pub call_id: String,
    /// JSON payload; validation failures carry `{"error": ...}`
    pub payload: Value,
}

/// One entry of the provider-facing transcript
#[derive(Debug, Clone)]
pub enum TranscriptMessage {
    /// End-user text
    User(String),
    /// Assistant turn, possibly mixing text with tool-use requests
    Assistant {
        /// Text portion of the turn, if any
        content: Option<String>,
        /// Tool calls requested in the turn
        tool_calls: Vec<ToolCall>,
    },
    /// Batch of tool results answering the preceding assistant turn
    ToolResults(Vec<ToolResultMessage>),
}

/// One request to the provider
#[derive(Debug)]
pub struct ChatRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// System prompt
    pub system: &'a str,
    /// Tool catalogue offered for this turn
    pub tools: &'a [ToolDefinition],
    /// Full transcript so far
    pub messages: &'a [TranscriptMessage],
    /// Token budget for the response
    pub max_tokens: u32,
}

/// A single provider response turn
#[derive(Debug, Clone)]
pub struct ProviderTurn {
    /// Text content, present on final-text turns and sometimes alongside
    /// tool use
    pub content: Option<String>,
    /// Tool calls; empty on a final-text turn
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderTurn {
    /// Whether this turn requests tool execution
    #[must_use]
    pub fn is_tool_use(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Provider contract consumed by the conversation loop
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete one turn against the provider.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider is unreachable or rejects the
    /// request.
    async fn complete(&self, request: ChatRequest<'_>) -> AppResult<ProviderTurn>;
}

struct CachedProvider {
    api_key: String,
    provider: Arc<anthropic::AnthropicProvider>,
}

/// Process-wide cache of the provider client.
///
/// One long-lived instance is reused across requests to avoid per-request
/// connection setup. The instance is rebuilt, not reused, when the
/// configured credential changes; the key value is compared on every
/// access.
#[derive(Default)]
pub struct ProviderHandle {
    cached: RwLock<Option<CachedProvider>>,
}

impl ProviderHandle {
    /// Create an empty handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the provider for the given credential, building or rebuilding
    /// as needed. Returns `None` when no credential is configured.
    #[must_use]
    pub fn get(&self, api_key: Option<&str>) -> Option<Arc<anthropic::AnthropicProvider>> {
        let api_key = api_key?;

        if let Ok(guard) = self.cached.read() {
            if let Some(cached) = guard.as_ref() {
                if cached.api_key == api_key {
                    return Some(Arc::clone(&cached.provider));
                }
            }
        }

        let provider = Arc::new(anthropic::AnthropicProvider::new(api_key));
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(CachedProvider {
                api_key: api_key.to_owned(),
                provider: Arc::clone(&provider),
            });
        }
        Some(provider)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn handle_absent_without_credential() {
        let handle = ProviderHandle::new();
        assert!(handle.get(None).is_none());
    }

    #[test]
    fn handle_reuses_instance_for_same_key() {
        let handle = ProviderHandle::new();
        let first = handle.get(Some("key-a")).unwrap();
        let second = handle.get(Some("key-a")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn handle_rebuilds_on_key_change() {
        let handle = ProviderHandle::new();
        let first = handle.get(Some("key-a")).unwrap();
        let second = handle.get(Some("key-b")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
