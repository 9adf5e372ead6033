//! CLI Exit Code Registry
//!
//! Single source of truth for `tabeval` exit codes. Scripts and CI jobs
//! branch on these, so treat them as a stable contract.
//!
//! | Code | Trigger                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | `compare`: prediction is not correct (like `diff(1)`)     |
//! | 2    | Usage error (bad arguments)                               |
//! | 3    | Config could not be read as TOML or failed validation     |
//! | 4    | Runtime error: IO, unreadable table, report write failure |
//! | 5    | `run`: at least one instance failed to load or score      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// The compared prediction does not match its best gold candidate.
pub const EXIT_COMPARE_INCORRECT: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config parse or validation error.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// IO or other runtime failure outside a single instance.
pub const EXIT_RUNTIME: u8 = 4;

/// One or more instances failed. The report is still written.
pub const EXIT_INSTANCE_FAILURES: u8 = 5;
