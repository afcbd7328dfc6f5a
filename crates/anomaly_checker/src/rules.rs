use models::{GroupingRuleEntry, SignRule};
use rust_decimal::Decimal;

use crate::error::{CheckError, Result};

/// Label used in source workbooks for takeover balances that are never checked.
/// The spelling is the literal value found in the data.
pub const IGNORED_GROUPING: &str = "Takover, Ignore";

/// Outcome of checking a single line against the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    NoAnomaly,
    UnknownGrouping,
    SignViolation(SignRule),
}

/// Lookup table from grouping label to the sign its amounts must have.
///
/// Labels are matched exactly (case-sensitive) against the trimmed label of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingRules {
    entries: Vec<GroupingRuleEntry>,
}

impl Default for GroupingRules {
    fn default() -> Self {
        let entries = vec![
            GroupingRuleEntry::new("Current Assets", SignRule::NonNegative),
            GroupingRuleEntry::new("Non-Current Assets", SignRule::NonNegative),
            GroupingRuleEntry::new("Current Liabilities", SignRule::NonPositive),
            GroupingRuleEntry::new("Non-Current Liabilities", SignRule::NonPositive),
            GroupingRuleEntry::new("Expenses", SignRule::NonNegative),
            GroupingRuleEntry::new("Tax Expense", SignRule::NonNegative),
            GroupingRuleEntry::new("Income", SignRule::NonPositive),
            GroupingRuleEntry::new("Equity", SignRule::NonPositive),
            GroupingRuleEntry::new(IGNORED_GROUPING, SignRule::Ignore),
        ];
        Self { entries }
    }
}

impl GroupingRules {
    /// Builds a table from configured entries. Labels are trimmed and must be
    /// non-blank and unique.
    pub fn from_entries(entries: Vec<GroupingRuleEntry>) -> Result<Self> {
        let mut table: Vec<GroupingRuleEntry> = Vec::with_capacity(entries.len());

        for entry in entries {
            let label = entry.label.trim();
            if label.is_empty() {
                return Err(CheckError::InvalidRules("blank grouping label".to_string()));
            }
            if table.iter().any(|e| e.label == label) {
                return Err(CheckError::InvalidRules(format!(
                    "duplicate grouping label '{}'",
                    label
                )));
            }
            table.push(GroupingRuleEntry::new(label, entry.expected_sign));
        }

        Ok(Self { entries: table })
    }

    /// Uses the configured entries when given, the built-in table otherwise.
    pub fn from_optional(entries: Option<Vec<GroupingRuleEntry>>) -> Result<Self> {
        match entries {
            Some(entries) => Self::from_entries(entries),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, label: &str) -> Option<SignRule> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.expected_sign)
    }

    pub fn entries(&self) -> &[GroupingRuleEntry] {
        &self.entries
    }

    /// Labels whose amounts are actually checked (everything but `Ignore`).
    pub fn checked_labels(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.expected_sign != SignRule::Ignore)
            .map(|e| e.label.as_str())
    }

    /// Unknown labels short-circuit; a sign rule is only consulted for known ones.
    pub fn evaluate(&self, label: &str, amount: Decimal) -> Evaluation {
        match self.get(label) {
            None => Evaluation::UnknownGrouping,
            Some(rule) if rule.permits(amount) => Evaluation::NoAnomaly,
            Some(rule) => Evaluation::SignViolation(rule),
        }
    }
}
