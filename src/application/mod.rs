// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod gateway;
pub mod history;

pub use gateway::ChatGateway;
pub use history::ConversationStore;
