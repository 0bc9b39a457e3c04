// ABOUTME: Anthropic Messages API implementation of the ChatProvider contract
// ABOUTME: Converts the internal transcript to content blocks and back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Anthropic Messages API client.
//!
//! The transcript maps onto content blocks: assistant turns become `text`
//! plus `tool_use` blocks, tool results become a user message of
//! `tool_result` blocks. The response is folded back into a single
//! [`ProviderTurn`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::llm::{ChatProvider, ChatRequest, ProviderTurn, ToolCall, TranscriptMessage};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// HTTP client for the Anthropic Messages API
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a provider for the given API key
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider against a non-default endpoint (tests, proxies)
    #[must_use]
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    fn convert_messages(messages: &[TranscriptMessage]) -> Vec<Value> {
        let mut converted = Vec::with_capacity(messages.len());
        for message in messages {
            match message {
                TranscriptMessage::User(content) => {
                    converted.push(json!({ "role": "user", "content": content }));
                }
                TranscriptMessage::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut blocks = Vec::new();
                    if let Some(text) = content {
                        if !text.is_empty() {
                            blocks.push(json!({ "type": "text", "text": text }));
                        }
                    }
                    for call in tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.call_id,
                            "name": call.name,
                            "input": call.input,
                        }));
                    }
                    if !blocks.is_empty() {
                        converted.push(json!({ "role": "assistant", "content": blocks }));
                    }
                }
                TranscriptMessage::ToolResults(results) => {
                    let blocks: Vec<Value> = results
                        .iter()
                        .map(|result| {
                            json!({
                                "type": "tool_result",
                                "tool_use_id": result.call_id,
                                "content": result.payload.to_string(),
                            })
                        })
                        .collect();
                    converted.push(json!({ "role": "user", "content": blocks }));
                }
            }
        }
        converted
    }

    fn parse_turn(data: &Value) -> ProviderTurn {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        if let Some(blocks) = data["content"].as_array() {
            for block in blocks {
                match block["type"].as_str() {
                    Some("text") => {
                        if let Some(part) = block["text"].as_str() {
                            text.push_str(part);
                        }
                    }
                    Some("tool_use") => {
                        tool_calls.push(ToolCall {
                            name: block["name"].as_str().unwrap_or_default().to_owned(),
                            input: block["input"].clone(),
                            call_id: block["id"].as_str().unwrap_or_default().to_owned(),
                        });
                    }
                    _ => {}
                }
            }
        }

        ProviderTurn {
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(&self, request: ChatRequest<'_>) -> AppResult<ProviderTurn> {
        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "tools": request.tools,
            "messages": Self::convert_messages(request.messages),
        });

        debug!(model = request.model, "calling Anthropic messages API");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "provider returned {status}: {text}"
            )));
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| AppError::external_service(format!("malformed provider response: {e}")))?;

        Ok(Self::parse_turn(&data))
    }
}
