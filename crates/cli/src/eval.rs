//! Subcommand handlers: `run`, `compare`, `validate`, `normalize`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tabeval_cli::load::{load_instances, load_table};
use tabeval_cli::report::{instance_summary, run_summary, InstanceReport, Report, ReportMeta};
use tabeval_score::{
    canonicalize_name, BenchmarkRun, EvalConfig, Evaluator, FailurePolicy, Instance, ValuePolicy,
    Vocabulary,
};
use tracing::info;

use crate::exit_codes::{
    EXIT_COMPARE_INCORRECT, EXIT_INSTANCE_FAILURES, EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_USAGE,
};
use crate::CliError;

fn eval_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

/// Read and validate a config file. Returns the config and the directory
/// its relative paths resolve against.
fn read_config(config_path: &Path) -> Result<(EvalConfig, PathBuf), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        eval_err(EXIT_RUNTIME, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let config = EvalConfig::from_toml(&config_str)
        .map_err(|e| eval_err(EXIT_INVALID_CONFIG, e.to_string()))?;
    let base_dir = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base_dir))
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    threads: Option<usize>,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;

    let vocabulary = config
        .vocabulary()
        .map_err(|e| eval_err(EXIT_INVALID_CONFIG, e.to_string()))?;
    let policy = config
        .value_policy()
        .map_err(|e| eval_err(EXIT_INVALID_CONFIG, e.to_string()))?;
    let evaluator = Evaluator::new(vocabulary, policy, config.on_failure);
    info!(
        config = %config.name,
        instances = config.instances.len(),
        stopwords = evaluator.vocabulary().stopword_count(),
        synonyms = evaluator.vocabulary().synonym_count(),
        tolerance = evaluator.policy().tolerance(),
        "starting run"
    );

    let run = match threads.or(config.threads) {
        Some(0) => {
            return Err(eval_err(EXIT_USAGE, "--threads must be at least 1"));
        }
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| eval_err(EXIT_RUNTIME, format!("cannot start thread pool: {e}")))?;
            info!(threads = n, "using dedicated thread pool");
            pool.install(|| score_all(&evaluator, &config, &base_dir))
        }
        None => score_all(&evaluator, &config, &base_dir),
    };

    let report = Report::new(ReportMeta::new(&config.name, evaluator.policy()), &run);
    let json_str = report
        .to_json()
        .map_err(|e| eval_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    // --output wins over the config's [output] json path
    let output_path = output_file.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if let Some(ref path) = output_path {
        std::fs::write(path, &json_str)
            .map_err(|e| eval_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    eprintln!("{}:", config.name);
    for line in run_summary(&run.metrics) {
        eprintln!("  {line}");
    }

    let failed = run.metrics.failed;
    if failed > 0 {
        let hint = match config.on_failure {
            FailurePolicy::Count => "failed instances are scored as zero; see `failures` in the report",
            FailurePolicy::Exclude => "failed instances are excluded from averages; see `failures` in the report",
        };
        return Err(eval_err(EXIT_INSTANCE_FAILURES, format!("{failed} instance(s) failed"))
            .with_hint(hint));
    }

    Ok(())
}

fn score_all(evaluator: &Evaluator, config: &EvalConfig, base_dir: &Path) -> BenchmarkRun {
    let inputs = load_instances(&config.instances, base_dir);
    evaluator.run(inputs)
}

// ============================================================================
// compare
// ============================================================================

pub fn cmd_compare(
    predicted: PathBuf,
    golds: Vec<PathBuf>,
    tolerance: f64,
    case_sensitive: bool,
    json_output: bool,
) -> Result<(), CliError> {
    let policy = ValuePolicy::new(tolerance, case_sensitive)
        .map_err(|e| eval_err(EXIT_USAGE, e.to_string()))?;
    let evaluator = Evaluator::new(Vocabulary::default(), policy, FailurePolicy::default());

    let instance = Instance {
        id: predicted.display().to_string(),
        predicted: load_table(&predicted).map_err(|e| eval_err(EXIT_RUNTIME, e.to_string()))?,
        golds: golds
            .iter()
            .map(|g| load_table(g))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| eval_err(EXIT_RUNTIME, e.to_string()))?,
    };

    let result = evaluator
        .score_instance(&instance)
        .map_err(|f| eval_err(EXIT_RUNTIME, f.to_string()))?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&InstanceReport::from(&result))
            .map_err(|e| eval_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    for line in instance_summary(&result, golds.len()) {
        eprintln!("{line}");
    }

    if !result.is_correct() {
        // Verdict already printed; exit code alone signals the mismatch.
        return Err(eval_err(EXIT_COMPARE_INCORRECT, ""));
    }

    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;

    let missing: Vec<String> = config
        .instances
        .iter()
        .flat_map(|inst| std::iter::once(&inst.predicted).chain(inst.gold.iter()))
        .map(|file| base_dir.join(file))
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();

    if !missing.is_empty() {
        return Err(eval_err(
            EXIT_INVALID_CONFIG,
            format!("{} referenced file(s) not found: {}", missing.len(), missing.join(", ")),
        )
        .with_hint("paths are resolved relative to the config file"));
    }

    eprintln!("ok: {} ({} instances)", config.name, config.instances.len());
    Ok(())
}

// ============================================================================
// normalize
// ============================================================================

pub fn cmd_normalize(
    names: Vec<String>,
    config_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let vocabulary = match config_path {
        Some(path) => {
            let (config, _) = read_config(&path)?;
            config
                .vocabulary()
                .map_err(|e| eval_err(EXIT_INVALID_CONFIG, e.to_string()))?
        }
        None => Vocabulary::default(),
    };

    let pairs: Vec<(String, String)> = names
        .into_iter()
        .map(|raw| {
            let normalized = canonicalize_name(&raw, &vocabulary);
            (raw, normalized)
        })
        .collect();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if json_output {
        let items: Vec<serde_json::Value> = pairs
            .iter()
            .map(|(raw, normalized)| serde_json::json!({ "raw": raw, "normalized": normalized }))
            .collect();
        let json_str = serde_json::to_string_pretty(&items)
            .map_err(|e| eval_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
        writeln!(handle, "{json_str}").map_err(|e| eval_err(EXIT_RUNTIME, e.to_string()))?;
    } else {
        for (raw, normalized) in &pairs {
            writeln!(handle, "{raw}\t{normalized}")
                .map_err(|e| eval_err(EXIT_RUNTIME, e.to_string()))?;
        }
    }

    Ok(())
}
