use rayon::prelude::*;
use tracing::{debug, debug_span, info, warn};

use crate::aggregate::{AggregateMetrics, FailurePolicy, MetricsAggregator};
use crate::error::{InstanceFailure, ScoreError, Stage};
use crate::model::{InstanceResult, Table};
use crate::names::Vocabulary;
use crate::reconcile::reconcile;
use crate::values::ValuePolicy;

/// Instances folded per aggregator before merging. Fixed so the merge order,
/// and therefore every floating-point sum, is identical run to run.
const FOLD_CHUNK: usize = 64;

/// One benchmark instance with its tables already materialized.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: String,
    pub predicted: Table,
    pub golds: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceOutcome {
    Scored(InstanceResult),
    Failed(InstanceFailure),
}

impl InstanceOutcome {
    pub fn instance_id(&self) -> &str {
        match self {
            Self::Scored(r) => &r.instance_id,
            Self::Failed(f) => &f.instance_id,
        }
    }
}

/// Read-only state shared by every instance of a run.
#[derive(Debug, Clone)]
pub struct Evaluator {
    vocabulary: Vocabulary,
    policy: ValuePolicy,
    on_failure: FailurePolicy,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Vocabulary::default(), ValuePolicy::default(), FailurePolicy::default())
    }
}

impl Evaluator {
    pub fn new(vocabulary: Vocabulary, policy: ValuePolicy, on_failure: FailurePolicy) -> Self {
        Self {
            vocabulary,
            policy,
            on_failure,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn policy(&self) -> &ValuePolicy {
        &self.policy
    }

    /// Score one instance against its gold candidates.
    pub fn score_instance(&self, instance: &Instance) -> Result<InstanceResult, InstanceFailure> {
        let _span = debug_span!("instance", id = %instance.id).entered();

        let outcome = reconcile(&instance.predicted, &instance.golds, &self.vocabulary, &self.policy)
            .map_err(|e| {
                let stage = match e {
                    ScoreError::NoGoldCandidates => Stage::Validate,
                    _ => Stage::Score,
                };
                InstanceFailure::new(&instance.id, stage, e)
            })?;

        debug!(
            gold_index = outcome.gold_index,
            candidates_scored = outcome.candidates_scored,
            column_f1 = outcome.best.columns.f1,
            row_f1 = outcome.best.rows.f1,
            "scored"
        );

        Ok(InstanceResult {
            instance_id: instance.id.clone(),
            gold_index: outcome.gold_index,
            candidates_scored: outcome.candidates_scored,
            columns: outcome.best.columns,
            rows: outcome.best.rows,
            common_columns: outcome.best.common_columns,
            alignment: outcome.best.alignment,
        })
    }

    /// Score every instance in parallel. Inputs that already failed upstream
    /// (e.g. an unreadable result file) pass straight through as failures.
    /// Outcomes keep input order.
    pub fn run(&self, inputs: Vec<Result<Instance, InstanceFailure>>) -> BenchmarkRun {
        info!(instances = inputs.len(), "scoring benchmark");

        let outcomes: Vec<InstanceOutcome> = inputs
            .into_par_iter()
            .map(|input| match input.and_then(|instance| self.score_instance(&instance)) {
                Ok(result) => InstanceOutcome::Scored(result),
                Err(failure) => {
                    warn!(
                        instance = %failure.instance_id,
                        stage = %failure.stage,
                        error = %failure.error,
                        "instance failed"
                    );
                    InstanceOutcome::Failed(failure)
                }
            })
            .collect();

        let metrics = self.aggregate(&outcomes);
        info!(
            scored = metrics.scored,
            failed = metrics.failed,
            correct = metrics.correct,
            "benchmark complete"
        );

        BenchmarkRun { outcomes, metrics }
    }

    /// Fold outcomes into run metrics: one aggregator per fixed-size chunk,
    /// folded in parallel, merged in chunk order.
    pub fn aggregate(&self, outcomes: &[InstanceOutcome]) -> AggregateMetrics {
        let partials: Vec<MetricsAggregator> = outcomes
            .par_chunks(FOLD_CHUNK)
            .map(|chunk| {
                let mut agg = MetricsAggregator::new(self.on_failure);
                for outcome in chunk {
                    match outcome {
                        InstanceOutcome::Scored(r) => agg.record(r),
                        InstanceOutcome::Failed(f) => agg.record_failure(f),
                    }
                }
                agg
            })
            .collect();

        partials
            .into_iter()
            .fold(MetricsAggregator::new(self.on_failure), MetricsAggregator::merge)
            .finish()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub outcomes: Vec<InstanceOutcome>,
    pub metrics: AggregateMetrics,
}

impl BenchmarkRun {
    pub fn results(&self) -> impl Iterator<Item = &InstanceResult> {
        self.outcomes.iter().filter_map(|o| match o {
            InstanceOutcome::Scored(r) => Some(r),
            InstanceOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstanceFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            InstanceOutcome::Failed(f) => Some(f),
            InstanceOutcome::Scored(_) => None,
        })
    }
}
