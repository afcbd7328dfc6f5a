//! # Anomaly Checker
//!
//! Rule-based checks over trial-balance ledger lines:
//!
//! - every line's amount sign must match the expectation of its financial-statement grouping,
//! - every grouping label must be one the rule table knows,
//! - the grand total of all lines must net to (almost) zero.
//!
//! ```rust,no_run
//! use anomaly_checker::{check_anomalies, GroupingRules, DEFAULT_ZERO_SUM_THRESHOLD};
//! use models::LedgerRow;
//!
//! let rows = vec![LedgerRow::new(1, "11100110", "Inventory", "Current Assets", "1,200.50")];
//! let report = check_anomalies(&rows, &GroupingRules::default(), DEFAULT_ZERO_SUM_THRESHOLD)?;
//! for line in anomaly_checker::render_lines(&report) {
//!     println!("{line}");
//! }
//! # Ok::<(), anomaly_checker::CheckError>(())
//! ```

pub mod amount;
pub mod checker;
pub mod error;
pub mod report;
pub mod rules;

pub use amount::{normalize_amount, normalize_rows};
pub use checker::{check_anomalies, check_lines, DEFAULT_ZERO_SUM_THRESHOLD};
pub use error::{CheckError, Result};
pub use report::{format_anomaly, reason_message, render, render_lines, ReportFormat};
pub use rules::{Evaluation, GroupingRules, IGNORED_GROUPING};
