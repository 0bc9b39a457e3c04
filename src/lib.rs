// ABOUTME: Main library entry point for the Veld Explore assistant server
// ABOUTME: Admission, caching, tool execution, and the bounded conversation loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

#![deny(unsafe_code)]

//! # Veld Explore Server
//!
//! Server-side pipeline for an AI travel assistant. `POST /explore`
//! admits a request, runs a bounded tool-calling conversation against an
//! LLM provider, and returns the assistant's reply together with
//! deduplicated references to the locations, weather, and activities the
//! reply is grounded in.
//!
//! ## Pipeline layers, in request order
//!
//! - **Routes**: identity, quota, and payload admission ([`routes::explore`])
//! - **Conversation**: system prompt assembly and the bounded tool loop
//! - **Breaker**: circuit breaker around every provider call
//! - **Tools**: validated, deadline-bounded tool execution
//! - **References**: deduplication for the final payload
//!
//! Shared state lives in [`resources::ServerResources`], constructed once
//! at startup and injected by `Arc`; there are no module-level statics.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use veld_explore_server::config::ServerConfig;
//! use veld_explore_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Veld Explore Server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Circuit breaker guarding LLM provider calls
pub mod breaker;
/// Clock abstraction and TTL cache cells
pub mod cache;
/// Environment-based server configuration
pub mod config;
/// Named limit constants shared across modules
pub mod constants;
/// Bounded tool-calling conversation loop
pub mod conversation;
/// Unified error types and HTTP mapping
pub mod errors;
/// Admission rate limiting
pub mod limits;
/// LLM provider abstraction and the Anthropic implementation
pub mod llm;
/// Chat, location, weather, and suitability data types
pub mod models;
/// Reference deduplication
pub mod references;
/// Process-wide shared state
pub mod resources;
/// HTTP routes
pub mod routes;
/// Document store contract and the in-memory implementation
pub mod store;
/// Tool catalogue, validation, and execution
pub mod tools;
