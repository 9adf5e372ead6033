use crate::columns::compare_columns;
use crate::model::{ScoredPair, Table};
use crate::names::Vocabulary;
use crate::rows::compare_rows;
use crate::values::ValuePolicy;

/// Score one predicted table against one gold table: columns first, then
/// rows on the columns both share.
pub fn score_table(
    predicted: &Table,
    gold: &Table,
    vocabulary: &Vocabulary,
    policy: &ValuePolicy,
) -> ScoredPair {
    let columns = compare_columns(predicted.columns(), gold.columns(), vocabulary);
    let rows = compare_rows(predicted, gold, &columns, policy);

    ScoredPair {
        columns: columns.score,
        rows: rows.score,
        common_columns: columns.common,
        alignment: Some(rows.alignment),
    }
}
