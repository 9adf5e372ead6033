//! JSON run report and the one-line human summaries printed to stderr.
//!
//! Shape: `meta`, `summary` (run metrics), `instances` (one entry per scored
//! instance, in manifest order) and `failures`. Keys are stable; scripts
//! consume them.

use serde::Serialize;
use tabeval_score::{
    AggregateMetrics, BenchmarkRun, InstanceFailure, InstanceResult, Score, ValuePolicy,
};

#[derive(Debug, Serialize)]
pub struct ReportMeta {
    pub config_name: String,
    pub engine_version: &'static str,
    pub run_at: String,
    pub tolerance: f64,
    pub case_sensitive: bool,
}

impl ReportMeta {
    pub fn new(config_name: impl Into<String>, policy: &ValuePolicy) -> Self {
        Self {
            config_name: config_name.into(),
            engine_version: env!("CARGO_PKG_VERSION"),
            run_at: chrono::Utc::now().to_rfc3339(),
            tolerance: policy.tolerance(),
            case_sensitive: policy.case_sensitive(),
        }
    }
}

/// A scored instance plus its verdict.
#[derive(Debug, Serialize)]
pub struct InstanceReport<'a> {
    #[serde(flatten)]
    pub result: &'a InstanceResult,
    pub correct: bool,
}

impl<'a> From<&'a InstanceResult> for InstanceReport<'a> {
    fn from(result: &'a InstanceResult) -> Self {
        Self {
            result,
            correct: result.is_correct(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub meta: ReportMeta,
    pub summary: &'a AggregateMetrics,
    pub instances: Vec<InstanceReport<'a>>,
    pub failures: Vec<&'a InstanceFailure>,
}

impl<'a> Report<'a> {
    pub fn new(meta: ReportMeta, run: &'a BenchmarkRun) -> Self {
        Self {
            meta,
            summary: &run.metrics,
            instances: run.results().map(InstanceReport::from).collect(),
            failures: run.failures().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn axis(label: &str, s: &Score) -> String {
    format!(
        "{label}: P={:.3} R={:.3} F1={:.3} (tp {}, fp {}, fn {})",
        s.precision, s.recall, s.f1, s.true_positive, s.false_positive, s.false_negative
    )
}

/// Human lines for a single comparison.
pub fn instance_summary(result: &InstanceResult, candidates: usize) -> Vec<String> {
    vec![
        axis("columns", &result.columns),
        axis("rows   ", &result.rows),
        format!(
            "best gold: #{} of {} ({} scored), {}",
            result.gold_index,
            candidates,
            result.candidates_scored,
            if result.is_correct() { "correct" } else { "incorrect" }
        ),
    ]
}

/// Human lines for a whole run.
pub fn run_summary(m: &AggregateMetrics) -> Vec<String> {
    let line = |label: &str, a: &tabeval_score::aggregate::AxisMetrics| {
        format!(
            "{label}: micro F1={:.3} (P={:.3} R={:.3}), macro F1={:.3} (P={:.3} R={:.3})",
            a.micro.f1, a.micro.precision, a.micro.recall, a.macro_avg.f1, a.macro_avg.precision, a.macro_avg.recall,
        )
    };
    vec![
        format!(
            "{} instances: {} scored, {} failed, {} correct (accuracy {:.3})",
            m.instances, m.scored, m.failed, m.correct, m.accuracy
        ),
        line("columns", &m.columns),
        line("rows   ", &m.rows),
    ]
}
