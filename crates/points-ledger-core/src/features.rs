//! Feature cost table.
//!
//! Static configuration mapping a feature key to the points it costs. Loaded once at startup
//! and never mutated afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Cost entry for one gated feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCost {
    /// Display name.
    pub name: String,
    /// Points debited per use.
    pub cost: i64,
    /// Description, also used as the deduction reason.
    pub description: String,
}

impl FeatureCost {
    fn new(name: &str, cost: i64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            cost,
            description: description.to_string(),
        }
    }
}

/// The feature cost table, keyed by feature key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureCatalog {
    entries: BTreeMap<String, FeatureCost>,
}

impl Default for FeatureCatalog {
    fn default() -> Self {
        let entries = [
            (
                "homework",
                FeatureCost::new("Homework Helper", 10, "Step-by-step homework help"),
            ),
            (
                "teacher_mode",
                FeatureCost::new("Teacher Mode", 25, "Guided lesson with the AI teacher"),
            ),
            (
                "quiz_generator",
                FeatureCost::new("Quiz Generator", 15, "Generate a practice quiz"),
            ),
            (
                "flashcards",
                FeatureCost::new("Flashcards", 5, "Create a flashcard deck"),
            ),
            (
                "essay_review",
                FeatureCost::new("Essay Review", 20, "Detailed feedback on an essay"),
            ),
            (
                "voice_tutor",
                FeatureCost::new("Voice Tutor", 30, "Spoken tutoring session"),
            ),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(key, cost)| (key.to_string(), cost))
                .collect(),
        }
    }
}

impl FeatureCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a key is blank or a cost is not positive.
    pub fn new(entries: BTreeMap<String, FeatureCost>) -> Result<Self> {
        for (key, feature) in &entries {
            if key.trim().is_empty() {
                return Err(LedgerError::Configuration("blank feature key".into()));
            }
            if feature.cost <= 0 {
                return Err(LedgerError::Configuration(format!(
                    "feature `{key}` must cost at least 1 point, got {}",
                    feature.cost
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a JSON object of `{ featureKey: { name, cost, description } }`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` on malformed JSON or invalid entries.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, FeatureCost> = serde_json::from_str(json)
            .map_err(|e| LedgerError::Configuration(format!("feature catalog: {e}")))?;
        Self::new(entries)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Configuration(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Look up a feature.
    #[must_use]
    pub fn get(&self, feature_key: &str) -> Option<&FeatureCost> {
        self.entries.get(feature_key)
    }

    /// Look up a feature, failing for unknown keys.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFeature` if the key is not configured.
    pub fn require(&self, feature_key: &str) -> Result<&FeatureCost> {
        self.get(feature_key)
            .ok_or_else(|| LedgerError::UnknownFeature {
                feature_key: feature_key.to_string(),
            })
    }

    /// Iterate over all features in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureCost)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of configured features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
