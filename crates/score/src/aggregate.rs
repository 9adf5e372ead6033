use serde::{Deserialize, Serialize};

use crate::error::InstanceFailure;
use crate::model::{InstanceResult, Score};

/// How a failed instance enters the run totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Counted as an instance scoring zero everywhere.
    #[default]
    Count,
    /// Left out of averages entirely (still reported as failed).
    Exclude,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl Counts {
    fn add(&mut self, score: &Score) {
        self.true_positive += score.true_positive;
        self.false_positive += score.false_positive;
        self.false_negative += score.false_negative;
    }

    fn merge(&mut self, other: &Counts) {
        self.true_positive += other.true_positive;
        self.false_positive += other.false_positive;
        self.false_negative += other.false_negative;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MetricSums {
    precision: f64,
    recall: f64,
    f1: f64,
}

impl MetricSums {
    fn add(&mut self, score: &Score) {
        self.precision += score.precision;
        self.recall += score.recall;
        self.f1 += score.f1;
    }

    fn merge(&mut self, other: &MetricSums) {
        self.precision += other.precision;
        self.recall += other.recall;
        self.f1 += other.f1;
    }

    fn mean(&self, n: usize) -> Metrics {
        if n == 0 {
            return Metrics::default();
        }
        let n = n as f64;
        Metrics {
            precision: self.precision / n,
            recall: self.recall / n,
            f1: self.f1 / n,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Finished metrics for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisMetrics {
    pub counts: Counts,
    pub micro: Metrics,
    #[serde(rename = "macro")]
    pub macro_avg: Metrics,
}

/// Run-level metrics, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub instances: usize,
    pub scored: usize,
    pub failed: usize,
    pub correct: usize,
    /// Correct instances over the instances that count toward averages.
    pub accuracy: f64,
    pub on_failure: FailurePolicy,
    pub columns: AxisMetrics,
    pub rows: AxisMetrics,
}

/// Folds per-instance results into micro and macro averages.
///
/// Single owner: parallel callers fold into one aggregator per worker and
/// combine them with [`MetricsAggregator::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsAggregator {
    policy: FailurePolicy,
    scored: usize,
    failed: usize,
    correct: usize,
    columns: Counts,
    rows: Counts,
    column_sums: MetricSums,
    row_sums: MetricSums,
}

impl MetricsAggregator {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: &InstanceResult) {
        self.scored += 1;
        if result.is_correct() {
            self.correct += 1;
        }
        self.columns.add(&result.columns);
        self.rows.add(&result.rows);
        self.column_sums.add(&result.columns);
        self.row_sums.add(&result.rows);
    }

    /// A failed instance adds nothing to the counts; under
    /// [`FailurePolicy::Count`] it still enlarges the macro denominator.
    pub fn record_failure(&mut self, _failure: &InstanceFailure) {
        self.failed += 1;
    }

    pub fn merge(mut self, other: MetricsAggregator) -> Self {
        self.scored += other.scored;
        self.failed += other.failed;
        self.correct += other.correct;
        self.columns.merge(&other.columns);
        self.rows.merge(&other.rows);
        self.column_sums.merge(&other.column_sums);
        self.row_sums.merge(&other.row_sums);
        self
    }

    pub fn scored(&self) -> usize {
        self.scored
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    fn denominator(&self) -> usize {
        match self.policy {
            FailurePolicy::Count => self.scored + self.failed,
            FailurePolicy::Exclude => self.scored,
        }
    }

    pub fn finish(&self) -> AggregateMetrics {
        let n = self.denominator();
        AggregateMetrics {
            instances: self.scored + self.failed,
            scored: self.scored,
            failed: self.failed,
            correct: self.correct,
            accuracy: if n == 0 { 0.0 } else { self.correct as f64 / n as f64 },
            on_failure: self.policy,
            columns: axis(&self.columns, &self.column_sums, n),
            rows: axis(&self.rows, &self.row_sums, n),
        }
    }
}

fn axis(counts: &Counts, sums: &MetricSums, n: usize) -> AxisMetrics {
    let micro = Score::from_counts(counts.true_positive, counts.false_positive, counts.false_negative);
    AxisMetrics {
        counts: *counts,
        micro: Metrics {
            precision: micro.precision,
            recall: micro.recall,
            f1: micro.f1,
        },
        macro_avg: sums.mean(n),
    }
}
