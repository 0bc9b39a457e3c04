// ABOUTME: Bounded tool-calling conversation loop against the LLM provider
// ABOUTME: System prompt assembly, breaker-guarded turns, soft-failure mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Conversation Loop
//!
//! Drives the provider through at most [`MAX_TOOL_ITERATIONS`] turns.
//! Tool-use turns are dispatched through the per-request scope and fed
//! back as tool results; the first text-only turn ends the loop. Provider
//! failures never surface as HTTP errors here — they map to soft replies
//! the route layer returns at 200 with `error: true`.

use tracing::{error, warn};

use crate::breaker::BreakerError;
use crate::constants::conversation::{MAX_TOKENS, MAX_TOOL_ITERATIONS};
use crate::llm::{ChatRequest, TranscriptMessage};
use crate::models::{ChatMessage, ChatRole, Reference};
use crate::references::dedupe_references;
use crate::resources::ServerResources;
use crate::tools::execute::{run_tool, RequestScope};
use crate::tools::tool_catalogue;

/// Reply used when no LLM credential is configured
pub const NEEDS_CONFIGURATION_MESSAGE: &str =
    "The assistant is not configured yet. Please try again later.";
/// Reply used while the circuit breaker is open
pub const UNAVAILABLE_MESSAGE: &str =
    "The assistant is temporarily unavailable. Please try again in a moment.";
/// Reply used when a provider call fails outright
pub const TROUBLE_MESSAGE: &str =
    "I had trouble processing that request. Please try again.";
/// Reply used when the loop exhausts its iteration budget without text
pub const EXHAUSTED_MESSAGE: &str =
    "I could not complete that request. Try asking in a simpler way.";

const PERSONA: &str = "You are the Veld Explore travel assistant for Zimbabwe. \
You help visitors plan around weather, destinations, and activities. \
Ground every factual claim in tool results; if a tool returns an error, \
adjust the arguments and retry or say what you could not find. \
Be concise and concrete.";

const SCOPE_FALLBACK: &str =
    "Destinations include Harare, Victoria Falls, Hwange, Mana Pools, \
Lake Kariba, Nyanga, Great Zimbabwe, and Bulawayo.";

/// Admitted request content handed to the loop
#[derive(Debug)]
pub struct ConversationInput {
    /// The user's current message
    pub message: String,
    /// Retained prior turns, oldest first
    pub history: Vec<ChatMessage>,
    /// Activity preferences declared by the caller
    pub activities: Vec<String>,
}

/// Final result of one conversation
#[derive(Debug)]
pub struct ChatOutcome {
    /// Assistant text returned to the caller
    pub reply: String,
    /// Deduplicated references gathered during tool execution
    pub references: Vec<Reference>,
    /// Whether this is a degraded (soft-failure) reply
    pub error: bool,
}

impl ChatOutcome {
    fn soft(reply: &str) -> Self {
        Self {
            reply: reply.to_owned(),
            references: Vec::new(),
            error: true,
        }
    }
}

/// Scope context through the shared TTL cell, with a static fallback when
/// the store is unavailable
async fn scope_context(resources: &ServerResources) -> String {
    let produced = resources
        .scope_context
        .get_or_refresh(|| async {
            let locations = resources.store.search_locations("", 50).await?;
            let listing: Vec<String> = locations
                .iter()
                .map(|l| format!("{} ({}): {}", l.name, l.slug, l.summary))
                .collect();
            Ok(format!("Known destinations:\n{}", listing.join("\n")))
        })
        .await;

    match produced {
        Ok(context) => context,
        Err(err) => {
            warn!(error = %err, "scope context refresh failed, using fallback");
            SCOPE_FALLBACK.to_owned()
        }
    }
}

fn build_system_prompt(scope_context: &str, activities: &[String]) -> String {
    let mut prompt = format!("{PERSONA}\n\n{scope_context}");
    if !activities.is_empty() {
        prompt.push_str("\n\nThe visitor is interested in: ");
        prompt.push_str(&activities.join(", "));
        prompt.push('.');
    }
    prompt
}

fn seed_transcript(input: &ConversationInput) -> Vec<TranscriptMessage> {
    let mut transcript: Vec<TranscriptMessage> = input
        .history
        .iter()
        .map(|entry| match entry.role {
            ChatRole::User => TranscriptMessage::User(entry.content.clone()),
            ChatRole::Assistant => TranscriptMessage::Assistant {
                content: Some(entry.content.clone()),
                tool_calls: Vec::new(),
            },
        })
        .collect();
    transcript.push(TranscriptMessage::User(input.message.clone()));
    transcript
}

/// Run the bounded conversation loop for one admitted request
pub async fn run_conversation(
    resources: &ServerResources,
    input: &ConversationInput,
) -> ChatOutcome {
    let Some(provider) = resources.provider() else {
        return ChatOutcome::soft(NEEDS_CONFIGURATION_MESSAGE);
    };

    let context = scope_context(resources).await;
    let system = build_system_prompt(&context, &input.activities);
    let tools = tool_catalogue();
    let mut transcript = seed_transcript(input);

    let scope = RequestScope::new();
    let mut last_text: Option<String> = None;

    for _ in 0..MAX_TOOL_ITERATIONS {
        let request = ChatRequest {
            model: &resources.config.llm_model,
            system: &system,
            tools: &tools,
            messages: &transcript,
            max_tokens: MAX_TOKENS,
        };

        let turn = match resources.breaker.execute(|| provider.complete(request)).await {
            Ok(turn) => turn,
            Err(BreakerError::Open) => return ChatOutcome::soft(UNAVAILABLE_MESSAGE),
            Err(BreakerError::Inner(err)) => {
                error!(error = %err, "provider call failed");
                return ChatOutcome::soft(TROUBLE_MESSAGE);
            }
        };

        if !turn.is_tool_use() {
            let reply = turn
                .content
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| EXHAUSTED_MESSAGE.to_owned());
            return ChatOutcome {
                reply,
                references: dedupe_references(&scope.references()),
                error: false,
            };
        }

        if let Some(text) = &turn.content {
            if !text.trim().is_empty() {
                last_text = Some(text.clone());
            }
        }

        let mut results = Vec::with_capacity(turn.tool_calls.len());
        for call in &turn.tool_calls {
            results.push(run_tool(resources, &scope, call).await);
        }
        transcript.push(TranscriptMessage::Assistant {
            content: turn.content,
            tool_calls: turn.tool_calls,
        });
        transcript.push(TranscriptMessage::ToolResults(results));
    }

    // Iteration budget exhausted mid-tool-use
    match last_text {
        Some(reply) => ChatOutcome {
            reply,
            references: dedupe_references(&scope.references()),
            error: false,
        },
        None => ChatOutcome {
            reply: EXHAUSTED_MESSAGE.to_owned(),
            references: dedupe_references(&scope.references()),
            error: true,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_includes_context_and_preferences() {
        let prompt = build_system_prompt(
            "Known destinations:\nHarare (harare): capital",
            &["hiking".to_owned(), "fishing".to_owned()],
        );
        assert!(prompt.contains("Known destinations"));
        assert!(prompt.contains("hiking, fishing"));
    }

    #[test]
    fn system_prompt_omits_preference_block_when_empty() {
        let prompt = build_system_prompt("context", &[]);
        assert!(!prompt.contains("interested in"));
    }

    #[test]
    fn transcript_maps_history_then_message() {
        let input = ConversationInput {
            message: "what now".to_owned(),
            history: vec![
                ChatMessage {
                    role: ChatRole::User,
                    content: "hi".to_owned(),
                },
                ChatMessage {
                    role: ChatRole::Assistant,
                    content: "hello".to_owned(),
                },
            ],
            activities: Vec::new(),
        };
        let transcript = seed_transcript(&input);
        assert_eq!(transcript.len(), 3);
        assert!(matches!(&transcript[0], TranscriptMessage::User(text) if text == "hi"));
        assert!(matches!(
            &transcript[1],
            TranscriptMessage::Assistant { content: Some(text), .. } if text == "hello"
        ));
        assert!(matches!(&transcript[2], TranscriptMessage::User(text) if text == "what now"));
    }
}
