//! Event triggers
//!
//! The `on:` section of a workflow: which named events select the workflow's
//! jobs, with optional payload filters. Accepts the three YAML shapes
//! (`on: push`, `on: [push, pull_request]`, and the map form with filters).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared triggers for a workflow, keyed by event name
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trigger {
    pub events: HashMap<String, EventFilter>,
}

/// Filters evaluated against the event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Branch names the event ref must match
    #[serde(default)]
    pub branches: Vec<String>,

    /// Activity types (e.g. pull_request `opened`, `synchronize`)
    #[serde(default)]
    pub types: Vec<String>,
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum TriggerHelper {
            One(String),
            Many(Vec<String>),
            Map(HashMap<String, Option<EventFilter>>),
        }

        let events = match TriggerHelper::deserialize(deserializer)? {
            TriggerHelper::One(name) => [(name, EventFilter::default())].into_iter().collect(),
            TriggerHelper::Many(names) => names
                .into_iter()
                .map(|name| (name, EventFilter::default()))
                .collect(),
            TriggerHelper::Map(map) => map
                .into_iter()
                .map(|(name, filter)| (name, filter.unwrap_or_default()))
                .collect(),
        };

        Ok(Trigger { events })
    }
}

impl Trigger {
    /// Whether the named event (with its optional payload) selects this workflow
    pub fn matches(&self, event_name: &str, payload: Option<&serde_json::Value>) -> bool {
        match self.events.get(event_name) {
            Some(filter) => filter.matches(payload),
            None => false,
        }
    }

    /// Declared event names
    pub fn event_names(&self) -> Vec<&str> {
        self.events.keys().map(|s| s.as_str()).collect()
    }
}

impl EventFilter {
    fn matches(&self, payload: Option<&serde_json::Value>) -> bool {
        if !self.types.is_empty() {
            let action = payload
                .and_then(|p| p.get("action"))
                .and_then(|a| a.as_str());
            match action {
                Some(action) if self.types.iter().any(|t| t == action) => {}
                _ => return false,
            }
        }

        if !self.branches.is_empty() {
            match payload.and_then(event_branch) {
                Some(branch) if self.branches.iter().any(|b| b == &branch) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Branch named by a payload: `ref` for push events, the base ref for
/// pull_request events.
fn event_branch(payload: &serde_json::Value) -> Option<String> {
    if let Some(git_ref) = payload.get("ref").and_then(|r| r.as_str()) {
        return Some(
            git_ref
                .strip_prefix("refs/heads/")
                .unwrap_or(git_ref)
                .to_string(),
        );
    }

    payload
        .pointer("/pull_request/base/ref")
        .and_then(|r| r.as_str())
        .map(String::from)
}
