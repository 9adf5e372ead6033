use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::aggregate::FailurePolicy;
use crate::error::ScoreError;
use crate::names::Vocabulary;
use crate::values::{ValuePolicy, DEFAULT_TOLERANCE};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    pub name: String,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Worker threads for scoring; rayon's default when unset.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Additions to (or a replacement for) the built-in stopwords and synonyms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub replace_defaults: bool,
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Instances + Output
// ---------------------------------------------------------------------------

/// One benchmark instance: a predicted result file and its acceptable gold
/// result files, in preference order.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSpec {
    pub id: String,
    pub predicted: String,
    pub gold: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EvalConfig {
    pub fn from_toml(input: &str) -> Result<Self, ScoreError> {
        let config: EvalConfig =
            toml::from_str(input).map_err(|e| ScoreError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.name.trim().is_empty() {
            return Err(ScoreError::ConfigValidation("name must not be empty".into()));
        }

        self.value_policy()?;
        self.vocabulary()?;

        if self.threads == Some(0) {
            return Err(ScoreError::ConfigValidation("threads must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            if instance.id.trim().is_empty() {
                return Err(ScoreError::ConfigValidation("instance id must not be empty".into()));
            }
            if !seen.insert(instance.id.as_str()) {
                return Err(ScoreError::ConfigValidation(format!(
                    "duplicate instance id '{}'",
                    instance.id
                )));
            }
            if instance.gold.is_empty() {
                return Err(ScoreError::ConfigValidation(format!(
                    "instance '{}': at least one gold file is required",
                    instance.id
                )));
            }
        }

        Ok(())
    }

    pub fn value_policy(&self) -> Result<ValuePolicy, ScoreError> {
        ValuePolicy::new(self.tolerance, self.case_sensitive)
    }

    /// Build the run's vocabulary. Called once per run; the result is shared
    /// read-only by every instance.
    pub fn vocabulary(&self) -> Result<Vocabulary, ScoreError> {
        let base = if self.vocabulary.replace_defaults {
            Vocabulary::empty()
        } else {
            Vocabulary::default()
        };
        base.extend(&self.vocabulary.stopwords, &self.vocabulary.synonyms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::canonicalize_name;

    const VALID: &str = r#"
name = "dev split"
tolerance = 0.001
case_sensitive = true
on_failure = "exclude"
threads = 4

[vocabulary]
stopwords = ["value"]
[vocabulary.synonyms]
rev = "revenue"

[output]
json = "report.json"

[[instances]]
id = "q001"
predicted = "pred/q001.csv"
gold = ["gold/q001.csv", "gold/q001_alt.csv"]

[[instances]]
id = "q002"
predicted = "pred/q002.csv"
gold = ["gold/q002.csv"]
"#;

    #[test]
    fn parse_valid() {
        let config = EvalConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "dev split");
        assert_eq!(config.tolerance, 0.001);
        assert!(config.case_sensitive);
        assert_eq!(config.on_failure, FailurePolicy::Exclude);
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.output.json.as_deref(), Some("report.json"));
        assert_eq!(config.instances.len(), 2);
        assert_eq!(config.instances[0].gold.len(), 2);

        let vocab = config.vocabulary().unwrap();
        assert_eq!(canonicalize_name("Rev_Value", &vocab), "revenue");
        // Built-ins still present.
        assert_eq!(canonicalize_name("avg_qty", &vocab), "average quantity");
        assert_eq!(config.value_policy().unwrap().decimals(), 3);
    }

    #[test]
    fn defaults() {
        let config = EvalConfig::from_toml("name = \"x\"").unwrap();
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(!config.case_sensitive);
        assert_eq!(config.on_failure, FailurePolicy::Count);
        assert!(config.threads.is_none());
        assert!(config.instances.is_empty());
        assert!(config.output.json.is_none());
    }

    #[test]
    fn replace_defaults_drops_builtins() {
        let config = EvalConfig::from_toml(
            r#"
name = "x"
[vocabulary]
replace_defaults = true
stopwords = ["of"]
"#,
        )
        .unwrap();
        let vocab = config.vocabulary().unwrap();
        assert_eq!(canonicalize_name("avg_of_qty", &vocab), "avg qty");
    }

    #[test]
    fn reject_duplicate_ids() {
        let err = EvalConfig::from_toml(
            r#"
name = "x"
[[instances]]
id = "a"
predicted = "p.csv"
gold = ["g.csv"]
[[instances]]
id = "a"
predicted = "p2.csv"
gold = ["g2.csv"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate instance id 'a'"));
    }

    #[test]
    fn reject_empty_gold_list() {
        let err = EvalConfig::from_toml(
            r#"
name = "x"
[[instances]]
id = "a"
predicted = "p.csv"
gold = []
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least one gold file"));
    }

    #[test]
    fn reject_bad_tolerance() {
        let err = EvalConfig::from_toml("name = \"x\"\ntolerance = 0.0").unwrap_err();
        assert_eq!(err, ScoreError::InvalidTolerance(0.0));
    }

    #[test]
    fn reject_zero_threads() {
        let err = EvalConfig::from_toml("name = \"x\"\nthreads = 0").unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn reject_unstable_synonym() {
        let err = EvalConfig::from_toml(
            r#"
name = "x"
[vocabulary.synonyms]
mean = "avg"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidSynonym { .. }));
    }

    #[test]
    fn reject_malformed_toml() {
        let err = EvalConfig::from_toml("name = ").unwrap_err();
        assert!(matches!(err, ScoreError::ConfigParse(_)));
    }
}
