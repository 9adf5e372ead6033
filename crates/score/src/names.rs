//! Column-name canonicalization.
//!
//! A raw column name becomes a [`NormalizedName`]: lowercased, underscores
//! treated as spaces, stopwords dropped, synonyms substituted. Two columns
//! are the same column iff their normalized names are equal.

use std::collections::{HashMap, HashSet};

use crate::error::ScoreError;

pub type NormalizedName = String;

const BUILTIN_STOPWORDS: &[&str] = &["a", "an", "the", "of", "in", "for", "by", "per"];

const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("addr", "address"),
    ("amt", "amount"),
    ("avg", "average"),
    ("cnt", "count"),
    ("cust", "customer"),
    ("dept", "department"),
    ("desc", "description"),
    ("emp", "employee"),
    ("identifier", "id"),
    ("max", "maximum"),
    ("min", "minimum"),
    ("num", "number"),
    ("pct", "percent"),
    ("percentage", "percent"),
    ("prod", "product"),
    ("qty", "quantity"),
    ("tot", "total"),
    ("yr", "year"),
];

/// Stopword set and synonym table. Built once, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    stopwords: HashSet<String>,
    synonyms: HashMap<String, String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            stopwords: BUILTIN_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            synonyms: BUILTIN_SYNONYMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Vocabulary {
    /// A vocabulary with no stopwords and no synonyms: names are only
    /// case- and whitespace-folded.
    pub fn empty() -> Self {
        Self {
            stopwords: HashSet::new(),
            synonyms: HashMap::new(),
        }
    }

    /// Build a vocabulary from explicit tables.
    pub fn new<S, K, V>(
        stopwords: impl IntoIterator<Item = S>,
        synonyms: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ScoreError>
    where
        S: AsRef<str>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::empty().extend(stopwords, synonyms)
    }

    /// Add entries on top of this vocabulary. Later synonyms override earlier
    /// ones with the same key.
    pub fn extend<S, K, V>(
        mut self,
        stopwords: impl IntoIterator<Item = S>,
        synonyms: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ScoreError>
    where
        S: AsRef<str>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for word in stopwords {
            let word = single_token("stopword", word.as_ref())?;
            self.stopwords.insert(word);
        }
        for (key, value) in synonyms {
            let key = single_token("synonym key", key.as_ref())?;
            self.synonyms.insert(key, value.as_ref().to_string());
        }
        self.validate()?;
        Ok(self)
    }

    /// Every synonym target must already be canonical, otherwise
    /// canonicalization would not be idempotent.
    pub fn validate(&self) -> Result<(), ScoreError> {
        let mut keys: Vec<&String> = self.synonyms.keys().collect();
        keys.sort();
        for key in keys {
            let value = &self.synonyms[key];
            let canonical = canonicalize_name(value, self);
            if value.is_empty() || canonical != *value {
                return Err(ScoreError::InvalidSynonym {
                    key: key.clone(),
                    value: value.clone(),
                    canonical,
                });
            }
        }
        Ok(())
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn synonym(&self, token: &str) -> Option<&str> {
        self.synonyms.get(token).map(String::as_str)
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }

    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }
}

fn single_token(what: &str, raw: &str) -> Result<String, ScoreError> {
    let token = raw.trim().to_lowercase();
    if token.is_empty() || token.contains('_') || token.split_whitespace().count() != 1 {
        return Err(ScoreError::ConfigValidation(format!(
            "{what} '{raw}' must be a single token without underscores"
        )));
    }
    Ok(token)
}

/// Canonicalize a raw column name. Total: any input, including the empty
/// string, yields a defined result.
pub fn canonicalize_name(raw: &str, vocabulary: &Vocabulary) -> NormalizedName {
    let lowered = raw.trim().to_lowercase().replace('_', " ");
    lowered
        .split_whitespace()
        .filter(|token| !vocabulary.is_stopword(token))
        .map(|token| vocabulary.synonym(token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> String {
        canonicalize_name(raw, &Vocabulary::default())
    }

    #[test]
    fn case_whitespace_and_underscores() {
        assert_eq!(canon("Customer_ID"), "customer id");
        assert_eq!(canon("  customer   id "), "customer id");
        assert_eq!(canon("Customer_ID"), canon("customer id"));
    }

    #[test]
    fn synonyms_substituted() {
        assert_eq!(canon("avg_Qty"), "average quantity");
        assert_eq!(canon("average_quantity"), "average quantity");
        assert_eq!(canon("Total_Amt"), canon("total amount"));
    }

    #[test]
    fn stopwords_dropped_before_synonyms() {
        assert_eq!(canon("number_of_orders"), "number orders");
        assert_eq!(canon("num orders"), "number orders");
        // A stopword key would be dropped, never substituted.
        let vocab = Vocabulary::new(["of"], [("of", "offset")]).unwrap();
        assert_eq!(canonicalize_name("start_of", &vocab), "start");
    }

    #[test]
    fn empty_and_all_stopwords() {
        assert_eq!(canon(""), "");
        assert_eq!(canon("   "), "");
        assert_eq!(canon("the_of"), "");
    }

    #[test]
    fn builtin_vocabulary_is_valid() {
        Vocabulary::default().validate().unwrap();
    }

    #[test]
    fn extend_counts_entries() {
        let base = Vocabulary::default();
        assert_eq!(base.stopword_count(), BUILTIN_STOPWORDS.len());
        assert_eq!(base.synonym_count(), BUILTIN_SYNONYMS.len());

        let vocab = base.extend(["value"], [("rev", "revenue")]).unwrap();
        assert_eq!(vocab.stopword_count(), BUILTIN_STOPWORDS.len() + 1);
        assert_eq!(vocab.synonym_count(), BUILTIN_SYNONYMS.len() + 1);
    }

    #[test]
    fn rejects_non_canonical_synonym() {
        // "avg" is itself a key, so mapping to it would not be stable.
        let err = Vocabulary::default()
            .extend(Vec::<&str>::new(), [("mean", "avg")])
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidSynonym { .. }));

        let err = Vocabulary::empty()
            .extend(Vec::<&str>::new(), [("x", "Upper_Case")])
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidSynonym { .. }));
    }

    #[test]
    fn rejects_multi_token_stopword() {
        let err = Vocabulary::empty()
            .extend(["as well"], Vec::<(&str, &str)>::new())
            .unwrap_err();
        assert!(err.to_string().contains("single token"));
    }

    #[test]
    fn extend_overrides_synonym() {
        let vocab = Vocabulary::default()
            .extend(Vec::<&str>::new(), [("amt", "sum")])
            .unwrap();
        assert_eq!(canonicalize_name("total_amt", &vocab), "total sum");
    }

    #[test]
    fn idempotent_on_samples() {
        for raw in ["Avg_Qty", "The Number of Customers", "pct_of_total", "x__y", "ÜBER_cnt"] {
            let once = canon(raw);
            assert_eq!(canon(&once), once, "not idempotent for {raw:?}");
        }
    }
}
