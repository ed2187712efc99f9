//! Process configuration
//!
//! Every setting is read once at startup from the environment (after `.env`
//! has been loaded by the binary). The CLI may override individual fields.

use crate::error::{ChatError, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "ipl_stats.db";
pub const DEFAULT_LOG_FILE: &str = "ipl_chatbot.log";
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-1.5-flash-latest";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Hosted text-generation service the translator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
            Provider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Gemini => GEMINI_BASE_URL,
            Provider::OpenAi => OPENAI_BASE_URL,
        }
    }

    /// Environment variable holding this provider's credential.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            other => Err(ChatError::Config(format!(
                "unknown LLM provider '{}' (expected 'gemini' or 'openai')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    /// Not validated here; a missing or bad key surfaces on the first call.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub db_path: PathBuf,
    pub log_file: PathBuf,
    pub prompt_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("LLM_PROVIDER") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => Provider::Gemini,
        };

        let llm = LlmConfig {
            provider,
            model: lookup("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: lookup("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            api_key: lookup(provider.api_key_var()).unwrap_or_default(),
        };

        Ok(Self {
            llm,
            db_path: lookup("IPL_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_file: lookup("IPL_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            prompt_file: lookup("IPL_PROMPT_FILE").map(PathBuf::from),
        })
    }

    /// Switches provider, resetting the model, endpoint and key to that
    /// provider's defaults.
    pub fn with_provider<F>(mut self, provider: Provider, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if provider != self.llm.provider {
            self.llm = LlmConfig {
                provider,
                model: provider.default_model().to_string(),
                base_url: provider.default_base_url().to_string(),
                api_key: lookup(provider.api_key_var()).unwrap_or_default(),
            };
        }
        self
    }
}
