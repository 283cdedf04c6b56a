// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// SQLite Prompt Repository
//
// `PromptRepository` implementation backed by the `prompts` table via sqlx.
// Unique-name violations translate to the domain's `DuplicateName` error.

use crate::domain::prompt::PromptTemplate;
use crate::domain::repository::{PromptRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

pub struct SqlitePromptRepository {
    pool: SqlitePool,
}

impl SqlitePromptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(name: &str, e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::DuplicateName(name.to_string())
        }
        _ => RepositoryError::Database(e.to_string()),
    }
}

#[async_trait]
impl PromptRepository for SqlitePromptRepository {
    async fn list(&self) -> Result<Vec<PromptTemplate>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, content FROM prompts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| PromptTemplate {
                id: row.get("id"),
                name: row.get("name"),
                content: row.get("content"),
            })
            .collect())
    }

    async fn create(&self, name: &str, content: &str) -> Result<PromptTemplate, RepositoryError> {
        let result = sqlx::query("INSERT INTO prompts (name, content) VALUES (?1, ?2)")
            .bind(name)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(name, e))?;

        Ok(PromptTemplate {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            content: content.to_string(),
        })
    }

    async fn update(&self, id: i64, name: &str, content: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE prompts SET name = ?1, content = ?2 WHERE id = ?3")
            .bind(name)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(name, e))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
