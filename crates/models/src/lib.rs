use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Settings models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Largest absolute grand total still accepted as "nets to zero".
	pub zero_sum_threshold: Decimal,
	/// Replaces the built-in grouping table when present.
	pub grouping_rules: Option<Vec<GroupingRuleEntry>>,
	pub workbook: WorkbookSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			zero_sum_threshold: Decimal::new(5, 0),
			grouping_rules: None,
			workbook: WorkbookSettings::default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookSettings {
	/// Sheet to read; the first sheet when unset.
	pub sheet: Option<String>,
	/// 0-based index of the header row; detected from the column names when unset.
	pub header_row: Option<usize>,
	pub columns: ColumnNames,
}

impl Default for WorkbookSettings {
	fn default() -> Self {
		Self {
			sheet: None,
			header_row: Some(2),
			columns: ColumnNames::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
	pub gl_code: String,
	pub gl_name: String,
	pub amount: String,
	pub grouping: String,
}

impl Default for ColumnNames {
	fn default() -> Self {
		Self {
			gl_code: "GL".to_string(),
			gl_name: "GL Name".to_string(),
			amount: "Amount".to_string(),
			grouping: "FS Grouping Main Head".to_string(),
		}
	}
}

// Grouping rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignRule {
	NonNegative,
	NonPositive,
	/// Recognised label whose amounts are never flagged.
	Ignore,
}

impl SignRule {
	/// Zero is acceptable under every rule.
	pub fn permits(self, amount: Decimal) -> bool {
		match self {
			SignRule::NonNegative => amount >= Decimal::ZERO,
			SignRule::NonPositive => amount <= Decimal::ZERO,
			SignRule::Ignore => true,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingRuleEntry {
	pub label: String,
	pub expected_sign: SignRule,
}

impl GroupingRuleEntry {
	pub fn new(label: impl Into<String>, expected_sign: SignRule) -> Self {
		Self {
			label: label.into(),
			expected_sign,
		}
	}
}

// Raw input rows, as handed over by a loader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
	/// 1-based position in the source sheet (or input slice).
	pub row_number: usize,
	pub gl_code: Option<String>,
	pub gl_name: Option<String>,
	pub grouping_label: Option<String>,
	pub amount_raw: Option<String>,
}

impl LedgerRow {
	pub fn new(
		row_number: usize,
		gl_code: impl Into<String>,
		gl_name: impl Into<String>,
		grouping_label: impl Into<String>,
		amount_raw: impl Into<String>,
	) -> Self {
		Self {
			row_number,
			gl_code: Some(gl_code.into()),
			gl_name: Some(gl_name.into()),
			grouping_label: Some(grouping_label.into()),
			amount_raw: Some(amount_raw.into()),
		}
	}
}

// Normalized, typed rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
	pub row_number: usize,
	pub gl_code: String,
	pub gl_name: String,
	/// Already trimmed.
	pub grouping_label: String,
	pub amount: Decimal,
}

// Output models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyReason {
	UnknownGrouping,
	SignViolation { expected: SignRule },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingAnomaly {
	pub row_number: usize,
	pub gl_code: String,
	pub gl_name: String,
	pub grouping_label: String,
	pub amount: Decimal,
	pub reason: AnomalyReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalImbalanceAnomaly {
	pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
	Grouping(GroupingAnomaly),
	TotalImbalance(TotalImbalanceAnomaly),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
	/// Input row order, with the imbalance (if any) last.
	pub anomalies: Vec<Anomaly>,
	/// Sum of every row's amount, anomalous rows included.
	pub total: Decimal,
	pub rows_checked: usize,
}

impl AnomalyReport {
	pub fn grouping_anomalies(&self) -> impl Iterator<Item = &GroupingAnomaly> {
		self.anomalies.iter().filter_map(|a| match a {
			Anomaly::Grouping(g) => Some(g),
			Anomaly::TotalImbalance(_) => None,
		})
	}

	pub fn grouping_anomaly_count(&self) -> usize {
		self.grouping_anomalies().count()
	}

	pub fn imbalance(&self) -> Option<&TotalImbalanceAnomaly> {
		self.anomalies.iter().find_map(|a| match a {
			Anomaly::TotalImbalance(t) => Some(t),
			Anomaly::Grouping(_) => None,
		})
	}

	pub fn is_clean(&self) -> bool {
		self.anomalies.is_empty()
	}
}
