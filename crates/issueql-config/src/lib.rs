//! Typed optimizer configuration.
//!
//! The optimizer is driven by a small TOML document. Every key is optional;
//! omitted keys fall back to the defaults below, unknown keys are rejected.
//!
//! ```toml
//! project_fields = ["project"]
//! rewrite_functions = ["releasedVersions", "unreleasedVersions"]
//! traversal = "exhaustive"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Field name that partitions searchable records by project.
pub const PROJECT_FIELD: &str = "project";

/// Function returning released versions, optionally scoped to projects.
pub const RELEASED_VERSIONS_FUNCTION: &str = "releasedVersions";

/// Function returning unreleased versions, optionally scoped to projects.
pub const UNRELEASED_VERSIONS_FUNCTION: &str = "unreleasedVersions";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to parse optimizer config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("optimizer config requires at least one project field")]
    NoProjectField,

    #[error("optimizer config contains a blank {key} entry")]
    BlankEntry { key: &'static str },

    #[error("rewrite function '{name}' is listed more than once")]
    DuplicateFunction { name: String },
}

///
/// TraversalPolicy
///
/// How compound clauses are walked while collecting project identifiers.
///
/// Both policies report the same determined flag for every tree. They differ
/// only in how many project identifiers end up in the collected set.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalPolicy {
    /// Visit every child of every And/Or so the collected set is complete.
    #[default]
    Exhaustive,

    /// Stop an And at its first determined child and an Or at its first
    /// undetermined child.
    ShortCircuit,
}

///
/// OptimizerConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Field names recognized as the project field (case-insensitive).
    pub project_fields: Vec<String>,

    /// Target functions, one rewrite pass each, applied in this order.
    pub rewrite_functions: Vec<String>,

    pub traversal: TraversalPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            project_fields: vec![PROJECT_FIELD.to_string()],
            rewrite_functions: vec![
                RELEASED_VERSIONS_FUNCTION.to_string(),
                UNRELEASED_VERSIONS_FUNCTION.to_string(),
            ],
            traversal: TraversalPolicy::default(),
        }
    }
}

impl OptimizerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Check the semantic rules serde cannot express.
    ///
    /// Rewrite function names must be pairwise distinct ignoring ASCII case, so
    /// that no two passes can target the same call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_fields.is_empty() {
            return Err(ConfigError::NoProjectField);
        }
        if self.project_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::BlankEntry {
                key: "project_fields",
            });
        }

        let mut seen = BTreeSet::new();
        for name in &self.rewrite_functions {
            if name.trim().is_empty() {
                return Err(ConfigError::BlankEntry {
                    key: "rewrite_functions",
                });
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateFunction { name: name.clone() });
            }
        }

        Ok(())
    }

    /// Returns `true` if `field` names the project field.
    #[must_use]
    pub fn is_project_field(&self, field: &str) -> bool {
        self.project_fields
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(field))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = OptimizerConfig::from_toml_str("").unwrap();

        assert_eq!(config, OptimizerConfig::default());
        assert_eq!(
            config.rewrite_functions,
            vec!["releasedVersions", "unreleasedVersions"]
        );
        assert_eq!(config.traversal, TraversalPolicy::Exhaustive);
    }

    #[test]
    fn parses_every_key() {
        let config = OptimizerConfig::from_toml_str(
            r#"
            project_fields = ["project", "pid"]
            rewrite_functions = ["unreleasedVersions"]
            traversal = "short_circuit"
            "#,
        )
        .unwrap();

        assert_eq!(config.project_fields, vec!["project", "pid"]);
        assert_eq!(config.rewrite_functions, vec!["unreleasedVersions"]);
        assert_eq!(config.traversal, TraversalPolicy::ShortCircuit);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = OptimizerConfig::from_toml_str("max_passes = 3").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_traversal_is_rejected() {
        let err = OptimizerConfig::from_toml_str(r#"traversal = "sometimes""#).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_functions_differing_in_case_are_rejected() {
        let err = OptimizerConfig::from_toml_str(
            r#"rewrite_functions = ["releasedVersions", "RELEASEDVERSIONS"]"#,
        )
        .unwrap_err();

        match err {
            ConfigError::DuplicateFunction { name } => assert_eq!(name, "RELEASEDVERSIONS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_check_folds_ascii_case_only() {
        let config = OptimizerConfig::from_toml_str(
            r#"rewrite_functions = ["versionsÄ", "versionsä"]"#,
        )
        .unwrap();

        assert_eq!(config.rewrite_functions.len(), 2);
    }

    #[test]
    fn blank_entries_are_rejected() {
        let err = OptimizerConfig::from_toml_str(r#"rewrite_functions = ["  "]"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlankEntry {
                key: "rewrite_functions"
            }
        ));

        let err = OptimizerConfig::from_toml_str(r#"project_fields = [""]"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlankEntry {
                key: "project_fields"
            }
        ));
    }

    #[test]
    fn project_fields_are_required() {
        let err = OptimizerConfig::from_toml_str("project_fields = []").unwrap_err();

        assert!(matches!(err, ConfigError::NoProjectField));
    }

    #[test]
    fn project_field_match_ignores_case() {
        let config = OptimizerConfig::default();

        assert!(config.is_project_field("project"));
        assert!(config.is_project_field("PROJECT"));
        assert!(!config.is_project_field("projectType"));
    }
}
