//! Row-set comparison.
//!
//! Both tables are projected onto their shared normalized columns, every cell
//! is canonicalized, and rows are paired greedily: each gold row, in gold
//! order, consumes the first still-unmatched predicted row with an identical
//! canonical tuple. Predicted rows are consumed in their original order so
//! the pairing is reproducible.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::columns::ColumnMatch;
use crate::model::{RowAlignment, Score, Table};
use crate::values::{canonicalize_cell, ValuePolicy};

type RowTuple = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RowComparison {
    pub score: Score,
    pub alignment: RowAlignment,
}

/// Score the rows of `predicted` against `gold` on the columns `columns`
/// found to be shared. `columns` must come from `compare_columns` over these
/// same two tables; `score_table` is the public entry point.
pub(crate) fn compare_rows(
    predicted: &Table,
    gold: &Table,
    columns: &ColumnMatch,
    policy: &ValuePolicy,
) -> RowComparison {
    let projection: Vec<(usize, usize)> = columns
        .common
        .iter()
        .filter_map(|name| Some((columns.predicted_index(name)?, columns.gold_index(name)?)))
        .collect();

    if projection.is_empty() {
        debug!(
            predicted = predicted.label(),
            gold = gold.label(),
            "no shared columns; every row unmatched"
        );
        return RowComparison {
            score: Score::from_counts(0, predicted.row_count(), gold.row_count()),
            alignment: RowAlignment {
                matched: Vec::new(),
                unmatched_gold: (0..gold.row_count()).collect(),
                unmatched_predicted: (0..predicted.row_count()).collect(),
            },
        };
    }

    let predicted_idx: Vec<usize> = projection.iter().map(|(p, _)| *p).collect();
    let gold_idx: Vec<usize> = projection.iter().map(|(_, g)| *g).collect();

    let predicted_rows = project(predicted, &predicted_idx, policy);
    let gold_rows = project(gold, &gold_idx, policy);

    let alignment = greedy_match(&predicted_rows, &gold_rows);
    let tp = alignment.matched.len();
    RowComparison {
        score: Score::from_counts(tp, predicted_rows.len() - tp, gold_rows.len() - tp),
        alignment,
    }
}

/// Canonical tuples for `table` restricted to `indices`, in row order.
fn project(table: &Table, indices: &[usize], policy: &ValuePolicy) -> Vec<RowTuple> {
    table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| canonicalize_cell(&row[i], policy)).collect())
        .collect()
}

/// One-to-one greedy pairing. Equal predicted tuples queue up in original
/// row order; each gold row takes the front of its queue.
fn greedy_match(predicted: &[RowTuple], gold: &[RowTuple]) -> RowAlignment {
    let mut pool: HashMap<&RowTuple, VecDeque<usize>> = HashMap::new();
    for (i, tuple) in predicted.iter().enumerate() {
        pool.entry(tuple).or_default().push_back(i);
    }

    let mut alignment = RowAlignment::default();
    for (g, tuple) in gold.iter().enumerate() {
        match pool.get_mut(tuple).and_then(VecDeque::pop_front) {
            Some(p) => alignment.matched.push((g, p)),
            None => alignment.unmatched_gold.push(g),
        }
    }

    let mut leftover: Vec<usize> = pool.into_values().flatten().collect();
    leftover.sort_unstable();
    alignment.unmatched_predicted = leftover;
    alignment
}
