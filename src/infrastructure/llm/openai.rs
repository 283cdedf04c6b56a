// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Chat Provider Adapter
//
// Completions-style wire protocol: the system prompt rides as the first
// entry of the messages array. Also works with OpenAI-compatible APIs.

use crate::domain::chat::ChatMessage;
use crate::domain::llm::{ChatProvider, GatewayError, ProviderId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub const OPENAI_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
];

pub struct OpenAiAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: WireMessage,
}

impl OpenAiAdapter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// System prompt first, then the projected turns. Projection keeps only
    /// role and content and drops whitespace-only entries.
    fn build_messages(system_prompt: &str, messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire = vec![WireMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        }];
        wire.extend(messages.iter().filter(|m| !m.is_blank()).map(|m| WireMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));
        wire
    }
}

#[async_trait]
impl ChatProvider for OpenAiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn send(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: Self::build_messages(system_prompt, messages),
        };

        debug!(
            provider = "openai",
            model,
            turns = request.messages.len(),
            "dispatching chat completion"
        );

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                provider: ProviderId::OpenAi,
                detail: e.to_string(),
            })?;

        let status = response.status();
        debug!(provider = "openai", model, status = status.as_u16(), "chat completion response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                provider: ProviderId::OpenAi,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| GatewayError::InvalidResponse {
                provider: ProviderId::OpenAi,
                detail: e.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: ProviderId::OpenAi,
                detail: "no completion choices".to_string(),
            })
    }
}
