// ABOUTME: Environment-based server configuration
// ABOUTME: Port, LLM credential, and model resolution with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! Server configuration loaded from the environment.
//!
//! The LLM credential is deliberately optional: its absence is not a boot
//! error, the explore endpoint degrades to a fixed "needs configuration"
//! response instead.

use std::env;

use crate::errors::{AppError, AppResult};

/// Environment variable holding the HTTP port
pub const ENV_HTTP_PORT: &str = "VELD_HTTP_PORT";
/// Environment variable holding the LLM credential
pub const ENV_LLM_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Environment variable overriding the LLM model
pub const ENV_LLM_MODEL: &str = "VELD_LLM_MODEL";

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_LLM_MODEL: &str = "claude-3-5-haiku-latest";

/// Runtime configuration for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to
    pub http_port: u16,
    /// LLM credential; `None` degrades the assistant gracefully
    pub llm_api_key: Option<String>,
    /// Model requested from the provider
    pub llm_model: String,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the port variable is present but
    /// not a valid port number.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var(ENV_HTTP_PORT) {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                AppError::config(format!("{ENV_HTTP_PORT} must be a port number, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let llm_api_key = env::var(ENV_LLM_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty());

        let llm_model =
            env::var(ENV_LLM_MODEL).unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_owned());

        Ok(Self {
            http_port,
            llm_api_key,
            llm_model,
        })
    }

    /// Configuration for tests: no credential, default model
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            http_port: 0,
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_owned(),
        }
    }
}
