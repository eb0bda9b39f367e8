use crate::domain::{SansError, SansResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub value: LogValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Run metadata attached to a workspace, keyed by log name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleLogs {
    entries: BTreeMap<String, LogEntry>,
}

impl SampleLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&LogValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|entry| entry.unit.as_deref())
    }

    /// Numeric value of a log; text logs holding a number are accepted.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            LogValue::Number(value) => Some(*value),
            LogValue::Text(text) => text.trim().parse::<f64>().ok(),
            LogValue::Flag(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            LogValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            LogValue::Flag(value) => Some(*value),
            LogValue::Number(value) => Some(*value != 0.0),
            LogValue::Text(text) => match text.trim() {
                "True" | "true" | "1" => Some(true),
                "False" | "false" | "0" => Some(false),
                _ => None,
            },
        }
    }

    pub fn require_number(&self, name: &str, workspace: &str) -> SansResult<f64> {
        self.number(name).ok_or_else(|| {
            SansError::validation(
                "VALIDATION.MISSING_LOG",
                format!(
                    "workspace '{}' has no numeric sample log '{}'",
                    workspace, name
                ),
            )
        })
    }

    pub fn add_number(&mut self, name: impl Into<String>, value: f64, unit: Option<&str>) {
        self.insert(name, LogValue::Number(value), unit);
    }

    pub fn add_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, LogValue::Text(value.into()), None);
    }

    pub fn add_flag(&mut self, name: impl Into<String>, value: bool) {
        self.insert(name, LogValue::Flag(value), None);
    }

    pub fn remove(&mut self, name: &str) -> Option<LogEntry> {
        self.entries.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn insert(&mut self, name: impl Into<String>, value: LogValue, unit: Option<&str>) {
        self.entries.insert(
            name.into(),
            LogEntry {
                value,
                unit: unit.map(str::to_string),
            },
        );
    }
}
