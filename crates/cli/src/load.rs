// Result-file loading: CSV/TSV on disk -> scoring tables.
// Header row required; cell types are inferred per field, then
// numeric columns are unified.

use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tabeval_score::config::InstanceSpec;
use tabeval_score::{Cell, Instance, InstanceFailure, ScoreError, Stage, Table};
use tracing::debug;

/// Field values read as missing, compared case-insensitively.
/// `\N` is the MySQL/PostgreSQL dump spelling.
const NULL_MARKERS: &[&str] = &["null", "nan", "none", "\\n"];

/// Load a result file, sniffing the delimiter.
pub fn load_table(path: &Path) -> Result<Table, ScoreError> {
    let label = path.display().to_string();
    let content = read_file_as_utf8(path).map_err(|e| ScoreError::Io(format!("{label}: {e}")))?;
    let delimiter = sniff_delimiter(&content);
    parse_table(&label, &content, delimiter)
}

/// Parse delimited text with a header row into a table labelled `label`.
pub fn parse_table(label: &str, content: &str, delimiter: u8) -> Result<Table, ScoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let csv_err = |e: csv::Error| ScoreError::Csv {
        table: label.to_string(),
        message: e.to_string(),
    };

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(infer_cell).collect());
    }
    promote_mixed_numeric(&mut rows);

    // Ragged records are caught here, with the row index, rather than by
    // the csv reader.
    Table::new(label, columns, rows)
}

/// A column holding any `Float` is a float column: its `Int` cells become
/// `Float` so `2` and `2.0` canonicalize alike.
fn promote_mixed_numeric(rows: &mut [Vec<Cell>]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for col in 0..width {
        let has_float = rows
            .iter()
            .any(|row| matches!(row.get(col), Some(Cell::Float(_))));
        if !has_float {
            continue;
        }
        for row in rows.iter_mut() {
            if let Some(cell) = row.get_mut(col) {
                if let Cell::Int(i) = *cell {
                    *cell = Cell::Float(i as f64);
                }
            }
        }
    }
}

/// Type a raw field: null marker, bool, integer, finite float, else text.
pub fn infer_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() || NULL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        return Cell::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Cell::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Cell::Bool(false);
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() => Cell::Float(x),
        _ => Cell::Text(field.to_string()),
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins. Single-column files
/// fall back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Load one instance's predicted and gold tables, paths relative to `base_dir`.
pub fn load_instance(spec: &InstanceSpec, base_dir: &Path) -> Result<Instance, InstanceFailure> {
    let fail = |e: ScoreError| {
        let stage = match e {
            ScoreError::RowArity { .. } => Stage::Validate,
            _ => Stage::Load,
        };
        InstanceFailure::new(&spec.id, stage, e)
    };

    let predicted = load_table(&resolve(base_dir, &spec.predicted)).map_err(fail)?;
    let golds = spec
        .gold
        .iter()
        .map(|g| load_table(&resolve(base_dir, g)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(fail)?;

    debug!(
        instance = %spec.id,
        predicted_rows = predicted.row_count(),
        golds = golds.len(),
        "loaded"
    );

    Ok(Instance {
        id: spec.id.clone(),
        predicted,
        golds,
    })
}

/// Load every instance in parallel, keeping manifest order. Failures are
/// returned in place so the run can carry on without them.
pub fn load_instances(
    specs: &[InstanceSpec],
    base_dir: &Path,
) -> Vec<Result<Instance, InstanceFailure>> {
    specs
        .par_iter()
        .map(|spec| load_instance(spec, base_dir))
        .collect()
}

fn resolve(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
