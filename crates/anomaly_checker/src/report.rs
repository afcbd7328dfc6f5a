use std::str::FromStr;

use models::{Anomaly, AnomalyReason, AnomalyReport, SignRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}' (use text or json)", other)),
        }
    }
}

pub fn reason_message(reason: &AnomalyReason) -> String {
    match reason {
        AnomalyReason::UnknownGrouping => "Unknown Grouping".to_string(),
        AnomalyReason::SignViolation { expected } => {
            let sign = match expected {
                SignRule::NonNegative => "non-negative",
                SignRule::NonPositive => "non-positive",
                SignRule::Ignore => "any",
            };
            format!("Sign Violation: expected {} amount", sign)
        }
    }
}

/// One human-readable line per anomaly.
pub fn format_anomaly(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::Grouping(g) => format!(
            "GL: {}, GL Name: {}, Grouping: {}, Amount: {}, Message: {}",
            g.gl_code,
            g.gl_name,
            g.grouping_label,
            g.amount,
            reason_message(&g.reason)
        ),
        Anomaly::TotalImbalance(t) => format!("Sum: {}", t.total_amount),
    }
}

pub fn render_lines(report: &AnomalyReport) -> Vec<String> {
    report.anomalies.iter().map(format_anomaly).collect()
}

pub fn render(report: &AnomalyReport, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report),
        ReportFormat::Text => {
            let mut out = render_lines(report);
            out.push(format!(
                "Checked {} rows: {} grouping anomalies, total {}{}",
                report.rows_checked,
                report.grouping_anomaly_count(),
                report.total,
                if report.imbalance().is_some() { " (imbalanced)" } else { "" }
            ));
            Ok(out.join("\n"))
        }
    }
}
