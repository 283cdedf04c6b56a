// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod chat;
pub mod llm;
pub mod prompt;
pub mod repository;
