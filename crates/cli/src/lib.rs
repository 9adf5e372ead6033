//! Library half of the `tabeval` CLI: result-file loading and report
//! rendering, shared by the binary and its tests.

pub mod load;
pub mod report;
