// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Repository Traits
//
// Storage interfaces owned by the domain; implementations live in
// infrastructure/.

use crate::domain::prompt::PromptTemplate;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a prompt named '{0}' already exists")]
    DuplicateName(String),

    #[error("database error: {0}")]
    Database(String),
}

/// CRUD over persisted prompt templates.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<PromptTemplate>, RepositoryError>;

    /// Insert a new template. Names are unique; collisions surface as
    /// `DuplicateName` and leave the table untouched.
    async fn create(&self, name: &str, content: &str) -> Result<PromptTemplate, RepositoryError>;

    /// Returns the number of rows updated (0 when the id is unknown).
    async fn update(&self, id: i64, name: &str, content: &str) -> Result<u64, RepositoryError>;

    /// Returns the number of rows deleted (0 when the id is unknown).
    async fn delete(&self, id: i64) -> Result<u64, RepositoryError>;
}
