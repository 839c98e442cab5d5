//! Feature Conditions
//!
//! Predicates over the host server's feature flags (era toggles, alternate
//! systems). They gate an offer before any randomness is consumed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Read-only view of the host server's feature flags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    flags: HashMap<String, bool>,
}

impl ConfigSnapshot {
    pub fn new(flags: HashMap<String, bool>) -> Self {
        Self { flags }
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    /// Builder-style flag setter
    pub fn with(mut self, key: &str, value: bool) -> Self {
        self.flags.insert(key.to_string(), value);
        self
    }
}

/// A condition referenced a key the snapshot does not carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCondition {
    Flag(String),
    Not(Box<FeatureCondition>),
    All(Vec<FeatureCondition>),
    Any(Vec<FeatureCondition>),
}

impl FeatureCondition {
    pub fn flag(key: &str) -> Self {
        FeatureCondition::Flag(key.to_string())
    }

    /// Strict evaluation: every referenced key must be present
    pub fn evaluate(&self, snapshot: &ConfigSnapshot) -> Result<bool, MissingKey> {
        match self {
            FeatureCondition::Flag(key) => {
                snapshot.get(key).ok_or_else(|| MissingKey(key.clone()))
            }
            FeatureCondition::Not(inner) => inner.evaluate(snapshot).map(|v| !v),
            FeatureCondition::All(terms) => terms
                .iter()
                .map(|t| t.evaluate(snapshot))
                .collect::<Result<Vec<_>, _>>()
                .map(|values| values.into_iter().all(|v| v)),
            FeatureCondition::Any(terms) => terms
                .iter()
                .map(|t| t.evaluate(snapshot))
                .collect::<Result<Vec<_>, _>>()
                .map(|values| values.into_iter().any(|v| v)),
        }
    }

    /// Whether the gated offer is enabled. A missing key disables it.
    pub fn enabled(&self, snapshot: &ConfigSnapshot) -> bool {
        match self.evaluate(snapshot) {
            Ok(value) => value,
            Err(MissingKey(key)) => {
                warn!("Feature flag '{}' is not configured, treating condition as false", key);
                false
            }
        }
    }
}
