// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Message Domain Types
//
// Provider-agnostic representation of a single conversation turn.
// Adapters translate these into each vendor's wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
///
/// Aliases cover the role names browser clients have historically sent;
/// they normalize to `user`/`assistant` at the deserialization edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[serde(alias = "human")]
    User,
    #[serde(alias = "model", alias = "bot", alias = "ai")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation.
///
/// `timestamp` and `model` are bookkeeping for history and export; they are
/// never forwarded upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
            model: None,
        }
    }

    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
            model: Some(model.into()),
        }
    }

    /// Whitespace-only turns must never reach a provider.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
