// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Domain Interface (Anti-Corruption Layer)
//
// Defines the domain interface for chat providers. Each supported vendor is
// a variant of `ProviderId` and an implementation of `ChatProvider`; adding
// a provider means a new adapter, not a new string branch.
//
// Implementations in infrastructure/llm/ directory.

use crate::domain::chat::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" => Ok(ProviderId::Anthropic),
            other => Err(GatewayError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Domain interface for chat providers.
///
/// `system_prompt` travels separately from the turn list; each adapter
/// decides how its wire protocol carries it.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Send one conversation to the provider and return the reply text.
    async fn send(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError>;
}

/// Status code Anthropic uses to shed load; the only retryable signal.
pub const OVERLOADED_STATUS: u16 = 529;

/// Errors that can occur on the outbound provider path.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("{provider} returned HTTP {status}: {body}")]
    Provider {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("network error calling {provider}: {detail}")]
    Network { provider: ProviderId, detail: String },

    #[error("invalid response from {provider}: {detail}")]
    InvalidResponse { provider: ProviderId, detail: String },
}

impl GatewayError {
    /// True only for the messages-style provider's overload signal.
    pub fn is_overloaded(&self) -> bool {
        matches!(
            self,
            GatewayError::Provider {
                provider: ProviderId::Anthropic,
                status: OVERLOADED_STATUS,
                ..
            }
        )
    }
}
