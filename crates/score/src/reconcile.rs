use ordered_float::OrderedFloat;
use tracing::debug;

use crate::error::ScoreError;
use crate::model::{ScoredPair, Table};
use crate::names::Vocabulary;
use crate::scorer::score_table;
use crate::values::ValuePolicy;

/// Best outcome across an instance's gold candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub gold_index: usize,
    pub candidates_scored: usize,
    pub best: ScoredPair,
}

/// Score `predicted` against each gold table in order and keep the best.
pub fn reconcile(
    predicted: &Table,
    golds: &[Table],
    vocabulary: &Vocabulary,
    policy: &ValuePolicy,
) -> Result<Reconciliation, ScoreError> {
    select_best(golds.iter().map(|gold| score_table(predicted, gold, vocabulary, policy)))
}

/// Pick the best of a lazily scored candidate sequence.
///
/// Ranked by column F1 + row F1, first occurrence winning ties. The scan
/// stops at the first perfect candidate, so later candidates are never
/// scored.
pub fn select_best<I>(candidates: I) -> Result<Reconciliation, ScoreError>
where
    I: IntoIterator<Item = ScoredPair>,
{
    let mut best: Option<(usize, ScoredPair)> = None;
    let mut scored = 0;

    for (index, candidate) in candidates.into_iter().enumerate() {
        scored += 1;
        let perfect = candidate.is_perfect();
        let better = match &best {
            None => true,
            Some((_, b)) => OrderedFloat(candidate.combined_f1()) > OrderedFloat(b.combined_f1()),
        };
        if better {
            best = Some((index, candidate));
        }
        if perfect {
            debug!(gold_index = index, "perfect gold match; skipping remaining candidates");
            break;
        }
    }

    let (gold_index, best) = best.ok_or(ScoreError::NoGoldCandidates)?;
    Ok(Reconciliation {
        gold_index,
        candidates_scored: scored,
        best,
    })
}
