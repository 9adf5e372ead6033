use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate instance id, empty gold list, etc.).
    ConfigValidation(String),
    /// Tolerance must be finite and in (0, 1].
    InvalidTolerance(f64),
    /// A synonym target that would not survive canonicalization unchanged.
    InvalidSynonym { key: String, value: String, canonical: String },
    /// A row whose cell count differs from the table's column count.
    RowArity { table: String, row: usize, expected: usize, found: usize },
    /// Multi-gold reconciliation called with no candidates.
    NoGoldCandidates,
    /// CSV read error.
    Csv { table: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidTolerance(t) => {
                write!(f, "tolerance must be finite and in (0, 1], got {t}")
            }
            Self::InvalidSynonym { key, value, canonical } => write!(
                f,
                "synonym '{key}' -> '{value}' is not canonical (would become '{canonical}')"
            ),
            Self::RowArity { table, row, expected, found } => write!(
                f,
                "table '{table}', row {row}: expected {expected} cell(s), found {found}"
            ),
            Self::NoGoldCandidates => write!(f, "no gold tables supplied for instance"),
            Self::Csv { table, message } => write!(f, "table '{table}': {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Where in the per-instance pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Validate,
    Score,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Validate => write!(f, "validate"),
            Self::Score => write!(f, "score"),
        }
    }
}

/// A failed instance, with enough context to log it and move on.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFailure {
    pub instance_id: String,
    pub stage: Stage,
    pub error: ScoreError,
}

impl InstanceFailure {
    pub fn new(instance_id: impl Into<String>, stage: Stage, error: ScoreError) -> Self {
        Self {
            instance_id: instance_id.into(),
            stage,
            error,
        }
    }
}

impl fmt::Display for InstanceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance '{}' ({} stage): {}", self.instance_id, self.stage, self.error)
    }
}

impl std::error::Error for InstanceFailure {}

impl Serialize for InstanceFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("InstanceFailure", 3)?;
        s.serialize_field("instance_id", &self.instance_id)?;
        s.serialize_field("stage", &self.stage)?;
        s.serialize_field("message", &self.error.to_string())?;
        s.end()
    }
}
