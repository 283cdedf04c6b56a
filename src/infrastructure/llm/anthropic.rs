// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Anthropic Chat Provider Adapter
//
// Messages-style wire protocol: the system prompt is a top-level field, the
// turn list may only contain user/assistant roles, and the conversation must
// open with a user turn.

use crate::domain::chat::{ChatMessage, Role};
use crate::domain::llm::{ChatProvider, GatewayError, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";

pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20240620",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

/// Opening turn synthesized when the filtered history would violate the
/// "conversation starts with a user turn" wire contract.
const PLACEHOLDER_OPENING: &str = "(continuing the conversation)";

pub struct AnthropicAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<WireMessage>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

impl AnthropicAdapter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Drop blank and system-role turns, collapse every remaining role onto
    /// user/assistant, and guarantee a leading user turn.
    fn build_messages(messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire: Vec<WireMessage> = messages
            .iter()
            .filter(|m| !m.is_blank() && m.role != Role::System)
            .map(|m| WireMessage {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        if wire.first().is_none_or(|m| m.role != "user") {
            wire.insert(
                0,
                WireMessage {
                    role: "user".to_string(),
                    content: PLACEHOLDER_OPENING.to_string(),
                },
            );
        }

        wire
    }
}

#[async_trait]
impl ChatProvider for AnthropicAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn send(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let request = MessagesRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            system: system_prompt.to_string(),
            messages: Self::build_messages(messages),
        };

        debug!(
            provider = "anthropic",
            model,
            turns = request.messages.len(),
            "dispatching messages request"
        );

        let url = format!("{}/messages", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                provider: ProviderId::Anthropic,
                detail: e.to_string(),
            })?;

        let status = response.status();
        debug!(provider = "anthropic", model, status = status.as_u16(), "messages response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                provider: ProviderId::Anthropic,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| GatewayError::InvalidResponse {
                provider: ProviderId::Anthropic,
                detail: e.to_string(),
            })?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: ProviderId::Anthropic,
                detail: "no content blocks".to_string(),
            })
    }
}
