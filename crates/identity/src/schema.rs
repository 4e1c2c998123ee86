// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field schema describing an identity payload for display and editing

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Rendering of secret values on every display surface.
pub const SECRET_MASK: &str = "********";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    TextBlock,
    Boolean,
    Uri,
    StringList,
    Date,
}

evl_core::simple_display! {
    FieldType {
        String => "string",
        TextBlock => "text_block",
        Boolean => "boolean",
        Uri => "uri",
        StringList => "string_list",
        Date => "date",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Bool(bool),
    List(Vec<String>),
    Date(Option<DateTime<Utc>>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Date(date) => date.is_none(),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => items.join(", "),
            Self::Date(Some(date)) => date.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::Date(None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub value: FieldValue,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub optional: bool,
    /// Displayed as-is (monospace, no reflow).
    pub verbatim: bool,
    pub secret: bool,
    /// Managed by the system, never edited by users.
    pub internal: bool,
}

impl FieldEntry {
    pub fn new(key: &'static str, label: &'static str, field_type: FieldType, value: FieldValue) -> Self {
        Self { key, label, value, field_type, optional: false, verbatim: false, secret: false, internal: false }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Value as shown to users: secrets are masked unless empty.
    pub fn display_value(&self) -> String {
        if self.secret && !self.value.is_empty() {
            SECRET_MASK.to_string()
        } else {
            self.value.render()
        }
    }
}

/// Ordered field entries of one payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    entries: Vec<FieldEntry>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FieldEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&FieldEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.key).collect()
    }

    /// Copy with every non-empty secret value replaced by the mask.
    pub fn redacted(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if entry.secret && !entry.value.is_empty() {
                    entry.value = FieldValue::Text(SECRET_MASK.to_string());
                }
                entry
            })
            .collect();
        Self { entries }
    }
}

impl FromIterator<FieldEntry> for Schema {
    fn from_iter<I: IntoIterator<Item = FieldEntry>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
