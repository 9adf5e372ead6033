use crate::error::ScoreError;
use crate::model::Cell;

/// Canonical form of a missing value.
pub const NULL_SENTINEL: &str = "NaN";

pub const DEFAULT_TOLERANCE: f64 = 0.01;

const MAX_DECIMALS: u32 = 15;

/// How cells are folded before equality comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePolicy {
    tolerance: f64,
    case_sensitive: bool,
    decimals: u32,
}

impl Default for ValuePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            case_sensitive: false,
            decimals: decimals_for(DEFAULT_TOLERANCE),
        }
    }
}

impl ValuePolicy {
    pub fn new(tolerance: f64, case_sensitive: bool) -> Result<Self, ScoreError> {
        if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > 1.0 {
            return Err(ScoreError::InvalidTolerance(tolerance));
        }
        Ok(Self {
            tolerance,
            case_sensitive,
            decimals: decimals_for(tolerance),
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Decimal digits floats are rounded to: `-log10(tolerance)`.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}

fn decimals_for(tolerance: f64) -> u32 {
    (-tolerance.log10()).round().clamp(0.0, MAX_DECIMALS as f64) as u32
}

/// Canonicalize one cell for equality comparison. Total: never fails.
pub fn canonicalize_cell(cell: &Cell, policy: &ValuePolicy) -> String {
    match cell {
        Cell::Null => NULL_SENTINEL.to_string(),
        Cell::Float(x) if x.is_nan() => NULL_SENTINEL.to_string(),
        Cell::Float(x) => round_float(*x, policy.decimals),
        Cell::Int(i) => i.to_string(),
        other => {
            let s = other.to_string();
            if policy.case_sensitive {
                s
            } else {
                s.to_lowercase()
            }
        }
    }
}

fn round_float(x: f64, decimals: u32) -> String {
    let s = format!("{:.*}", decimals as usize, x);
    // -0.00 and 0.00 are the same value
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}
