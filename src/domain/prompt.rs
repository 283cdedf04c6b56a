// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prompt Template Domain Types
//
// Named system-prompt templates with ${name} placeholders. The store keeps
// raw template text; substitution happens at the call site.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reusable system-prompt template persisted in the prompts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: i64,
    pub name: String,
    pub content: String,
}

/// Replace every `${key}` occurrence with the supplied value.
///
/// Unknown placeholders are left verbatim; unknown variables are ignored.
pub fn render_template(content: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = content.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("${{{key}}}"), value);
    }
    rendered
}
