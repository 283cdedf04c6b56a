// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Log Export Writer
//
// Serializes buffer snapshots to timestamped JSON files under the export
// directory. Bundles are write-once; nothing here mutates history.

use crate::application::history::ExportBundle;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

pub struct ExportWriter {
    dir: PathBuf,
}

impl ExportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write one file per bundle and return the filenames written.
    pub async fn write_all(&self, bundles: &[ExportBundle]) -> Result<Vec<String>> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create export directory {}", self.dir.display()))?;

        let mut written = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let filename = bundle.filename();
            let json = serde_json::to_string_pretty(&bundle.messages)
                .context("failed to serialize chat log")?;
            let path = self.dir.join(&filename);
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(file = %path.display(), turns = bundle.messages.len(), "exported chat log");
            written.push(filename);
        }

        Ok(written)
    }
}
