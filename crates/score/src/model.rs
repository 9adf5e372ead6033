use std::fmt;

use serde::Serialize;

use crate::error::ScoreError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One scalar cell of a result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// A materialized query result. Rows are positionally aligned with `columns`;
/// the constructor rejects any row of the wrong length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    label: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(
        label: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, ScoreError> {
        let label = label.into();
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(ScoreError::RowArity {
                table: label,
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { label, columns, rows })
    }

    /// A table with no columns and no rows.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Precision / recall / F1 over one axis (columns or rows).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Score {
    /// Derive P/R/F1 from counts. Empty denominators give 1.0 for precision
    /// and recall; F1 is 0.0 when P + R = 0.
    pub fn from_counts(true_positive: usize, false_positive: usize, false_negative: usize) -> Self {
        let precision = ratio(true_positive, true_positive + false_positive);
        let recall = ratio(true_positive, true_positive + false_negative);
        Self {
            true_positive,
            false_positive,
            false_negative,
            precision,
            recall,
            f1: f1(precision, recall),
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.precision == 1.0 && self.recall == 1.0
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        1.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * (precision * recall) / (precision + recall)
    }
}

// ---------------------------------------------------------------------------
// Row alignment
// ---------------------------------------------------------------------------

/// Which rows were paired by the greedy matcher, by original row index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowAlignment {
    /// `(gold_row, predicted_row)` pairs, in gold row order.
    pub matched: Vec<(usize, usize)>,
    pub unmatched_gold: Vec<usize>,
    pub unmatched_predicted: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of scoring one predicted table against one gold table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPair {
    pub columns: Score,
    pub rows: Score,
    /// Normalized names shared by both tables, in gold column order.
    pub common_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<RowAlignment>,
}

impl ScoredPair {
    /// Column and row precision and recall all exactly 1.0.
    pub fn is_perfect(&self) -> bool {
        self.columns.is_perfect() && self.rows.is_perfect()
    }

    pub fn combined_f1(&self) -> f64 {
        self.columns.f1 + self.rows.f1
    }
}

/// One instance's best outcome across its gold candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceResult {
    pub instance_id: String,
    /// Index into the instance's gold list of the winning candidate.
    pub gold_index: usize,
    /// How many candidates were scored before the scan stopped.
    pub candidates_scored: usize,
    pub columns: Score,
    pub rows: Score,
    pub common_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<RowAlignment>,
}

impl InstanceResult {
    /// Pass/fail: both F1 values exactly 1.0.
    pub fn is_correct(&self) -> bool {
        self.columns.f1 == 1.0 && self.rows.f1 == 1.0
    }
}
