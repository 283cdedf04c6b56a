// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Conversation Buffer Store
//
// Per (provider, model) bounded message history. Buffers are created lazily,
// capped at HISTORY_CAP entries with oldest-first eviction, and live only for
// the lifetime of the process.
//
// The lock is never held across an await, so each read-modify-write on a
// buffer key is a single atomic step from the handlers' point of view.

use crate::domain::chat::ChatMessage;
use crate::domain::llm::ProviderId;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Hard cap on entries per buffer; bounds memory and upstream token cost.
pub const HISTORY_CAP: usize = 20;

/// Read-only snapshot of one buffer, taken at export time.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub key: String,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub messages: Vec<ChatMessage>,
}

impl ExportBundle {
    /// `<firstMessageTimestamp>_<provider>-<model>.json`, with colons
    /// replaced so the name is valid on every filesystem.
    pub fn filename(&self) -> String {
        let stamp = self
            .first_timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .replace(':', "-");
        format!("{}_{}.json", stamp, self.key)
    }
}

#[derive(Default)]
pub struct ConversationStore {
    buffers: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer key identifying one independent conversation history.
    pub fn key(provider: ProviderId, model: &str) -> String {
        format!("{provider}-{model}")
    }

    /// Current contents of one buffer, oldest first.
    pub fn snapshot(&self, key: &str) -> Vec<ChatMessage> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    /// Record a completed exchange: the user turn and its assistant reply
    /// are appended together, then the buffer is trimmed to HISTORY_CAP.
    ///
    /// A failed provider call records nothing, so the buffer never holds an
    /// unpaired user turn.
    pub fn record_exchange(&self, key: &str, user: ChatMessage, assistant: ChatMessage) {
        let mut buffers = self.lock();
        let buffer = buffers.entry(key.to_string()).or_default();
        buffer.push(user);
        buffer.push(assistant);
        if buffer.len() > HISTORY_CAP {
            let excess = buffer.len() - HISTORY_CAP;
            buffer.drain(..excess);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }

    /// Wipe every buffer; returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut buffers = self.lock();
        let count = buffers.len();
        buffers.clear();
        count
    }

    /// Snapshot every non-empty buffer for export.
    pub fn bundles(&self) -> Vec<ExportBundle> {
        let buffers = self.lock();
        let mut bundles: Vec<ExportBundle> = buffers
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(key, messages)| ExportBundle {
                key: key.clone(),
                first_timestamp: messages.first().and_then(|m| m.timestamp),
                messages: messages.clone(),
            })
            .collect();
        bundles.sort_by(|a, b| a.key.cmp(&b.key));
        bundles
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<ChatMessage>>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
