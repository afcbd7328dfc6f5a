use models::{
    Anomaly, AnomalyReason, AnomalyReport, GroupingAnomaly, LedgerLine, LedgerRow,
    TotalImbalanceAnomaly,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::amount::normalize_rows;
use crate::error::{CheckError, Result};
use crate::rules::{Evaluation, GroupingRules};

/// Largest absolute grand total accepted when nothing else is configured.
pub const DEFAULT_ZERO_SUM_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Normalizes raw rows and checks them in one go.
///
/// A malformed row aborts the whole run; no partial report is returned.
pub fn check_anomalies(
    rows: &[LedgerRow],
    rules: &GroupingRules,
    threshold: Decimal,
) -> Result<AnomalyReport> {
    let lines = normalize_rows(rows)?;
    check_lines(&lines, rules, threshold)
}

/// Single pass over `lines` in order, followed by the zero-sum check.
///
/// Every line counts towards the total, including the ones flagged.
pub fn check_lines(
    lines: &[LedgerLine],
    rules: &GroupingRules,
    threshold: Decimal,
) -> Result<AnomalyReport> {
    if threshold < Decimal::ZERO {
        return Err(CheckError::InvalidThreshold(threshold));
    }

    let mut anomalies = Vec::new();
    let mut total = Decimal::ZERO;

    for line in lines {
        total = total
            .checked_add(line.amount)
            .ok_or(CheckError::TotalOverflow {
                row: line.row_number,
            })?;

        let reason = match rules.evaluate(&line.grouping_label, line.amount) {
            Evaluation::NoAnomaly => continue,
            Evaluation::UnknownGrouping => AnomalyReason::UnknownGrouping,
            Evaluation::SignViolation(expected) => AnomalyReason::SignViolation { expected },
        };

        debug!(
            row = line.row_number,
            gl = %line.gl_code,
            grouping = %line.grouping_label,
            amount = %line.amount,
            ?reason,
            "grouping anomaly"
        );

        anomalies.push(Anomaly::Grouping(GroupingAnomaly {
            row_number: line.row_number,
            gl_code: line.gl_code.clone(),
            gl_name: line.gl_name.clone(),
            grouping_label: line.grouping_label.clone(),
            amount: line.amount,
            reason,
        }));
    }

    if total.abs() > threshold {
        debug!(%total, %threshold, "trial balance does not net to zero");
        anomalies.push(Anomaly::TotalImbalance(TotalImbalanceAnomaly {
            total_amount: total,
        }));
    }

    info!(
        rows = lines.len(),
        anomalies = anomalies.len(),
        %total,
        "anomaly check finished"
    );

    Ok(AnomalyReport {
        anomalies,
        total,
        rows_checked: lines.len(),
    })
}
