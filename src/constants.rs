// ABOUTME: Application constants and limit values shared across modules
// ABOUTME: Groups admission, tool, cache, and conversation loop bounds by domain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Named constants for the explore pipeline.
//!
//! Every bound that shapes request cost (iteration caps, timeouts, payload
//! limits) lives here so the admission gate, the tool layer, and the
//! conversation loop agree on the same numbers.

/// Admission gate limits
pub mod admission {
    /// Maximum length of the user message and of each retained history entry
    pub const MAX_MESSAGE_CHARS: usize = 2000;
    /// Maximum number of history entries retained (most recent first kept)
    pub const MAX_HISTORY_MESSAGES: usize = 10;
    /// Maximum number of declared activity preferences retained
    pub const MAX_ACTIVITY_PREFERENCES: usize = 10;
    /// Rate limit bucket name for the explore endpoint
    pub const RATE_LIMIT_BUCKET: &str = "explore";
    /// Requests allowed per rate limit window
    pub const RATE_LIMIT_MAX_REQUESTS: u32 = 20;
    /// Rate limit window in seconds
    pub const RATE_LIMIT_WINDOW_SECONDS: u64 = 3600;
}

/// Tool input and execution bounds
pub mod tools {
    /// Per-tool execution timeout in seconds
    pub const EXECUTION_TIMEOUT_SECONDS: u64 = 15;
    /// Maximum length of a search query after trimming
    pub const MAX_QUERY_CHARS: usize = 200;
    /// Maximum length of a location slug
    pub const MAX_SLUG_CHARS: usize = 64;
    /// Maximum search results returned to the model
    pub const MAX_SEARCH_RESULTS: usize = 10;
    /// Maximum activity ids accepted by the advice tool
    pub const MAX_ADVICE_ACTIVITIES: usize = 10;
    /// Maximum locations returned by the tag listing tool
    pub const MAX_TAG_RESULTS: usize = 20;
    /// Sample size of valid activity ids included in mismatch errors
    pub const ACTIVITY_ID_SAMPLE: usize = 5;
}

/// Locale defaults
pub mod locale {
    /// Country most lookups resolve to; its season lookup is shared
    pub const DEFAULT_COUNTRY: &str = "ZW";
}

/// Conversation loop bounds
pub mod conversation {
    /// Maximum provider turns before the loop is forced to exit
    pub const MAX_TOOL_ITERATIONS: usize = 5;
    /// Token budget requested from the provider per turn
    pub const MAX_TOKENS: u32 = 1024;
    /// Maximum references returned in the final payload
    pub const MAX_REFERENCES: usize = 20;
}

/// Shared cache configuration
pub mod cache {
    /// TTL for the process-wide cells (scope context, activity catalogue)
    pub const SHARED_TTL_SECONDS: u64 = 300;
}

/// Circuit breaker configuration for the LLM provider
pub mod breaker {
    /// Consecutive failures before the breaker opens
    pub const FAILURE_THRESHOLD: u32 = 5;
    /// Cooldown before a new call is attempted, in seconds
    pub const COOLDOWN_SECONDS: u64 = 30;
    /// Deadline applied to each guarded provider call, in seconds
    pub const CALL_TIMEOUT_SECONDS: u64 = 60;
}
