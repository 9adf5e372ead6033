use std::collections::HashSet;

use crate::model::Score;
use crate::names::{canonicalize_name, NormalizedName, Vocabulary};

/// Column-set comparison plus the normalized names the row comparator
/// projects on.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatch {
    pub score: Score,
    /// Normalized name of each predicted column, positionally.
    pub predicted: Vec<NormalizedName>,
    /// Normalized name of each gold column, positionally.
    pub gold: Vec<NormalizedName>,
    /// Names present on both sides, in gold column order, deduplicated.
    pub common: Vec<NormalizedName>,
}

impl ColumnMatch {
    /// Index of the first predicted column normalizing to `name`.
    pub fn predicted_index(&self, name: &str) -> Option<usize> {
        self.predicted.iter().position(|n| n == name)
    }

    /// Index of the first gold column normalizing to `name`.
    pub fn gold_index(&self, name: &str) -> Option<usize> {
        self.gold.iter().position(|n| n == name)
    }
}

/// Compare two column-name sequences as sets of normalized names.
/// Duplicates after normalization collapse to one.
pub fn compare_columns<P, G>(predicted: &[P], gold: &[G], vocabulary: &Vocabulary) -> ColumnMatch
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    let predicted: Vec<NormalizedName> = predicted
        .iter()
        .map(|c| canonicalize_name(c.as_ref(), vocabulary))
        .collect();
    let gold: Vec<NormalizedName> = gold
        .iter()
        .map(|c| canonicalize_name(c.as_ref(), vocabulary))
        .collect();

    let predicted_set: HashSet<&str> = predicted.iter().map(String::as_str).collect();
    let gold_set: HashSet<&str> = gold.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let common: Vec<NormalizedName> = gold
        .iter()
        .filter(|n| predicted_set.contains(n.as_str()) && seen.insert(n.as_str()))
        .cloned()
        .collect();

    let tp = common.len();
    let score = Score::from_counts(tp, predicted_set.len() - tp, gold_set.len() - tp);

    ColumnMatch {
        score,
        predicted,
        gold,
        common,
    }
}
