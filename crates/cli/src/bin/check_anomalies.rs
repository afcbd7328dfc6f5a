use anomaly_checker::{ReportFormat, check_anomalies, render};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trial_balance_parser::TrialBalanceReader;

/// Checks a trial-balance workbook for grouping/sign anomalies and a non-zero grand total.
#[derive(Debug, Parser)]
#[command(name = "check_anomalies", author, version, about, long_about = None)]
struct Args {
    /// Trial-balance workbook (.xlsx, .xls or .ods)
    #[arg(default_value = "trialbal.xlsx")]
    workbook: PathBuf,

    /// Path to settings.json (must exist if given). Without it, ./settings.json is used when present, else built-in defaults
    #[arg(short = 's', long = "settings")]
    settings_path: Option<PathBuf>,

    /// Largest absolute grand total accepted as balanced (overrides settings)
    #[arg(short = 't', long = "threshold")]
    threshold: Option<Decimal>,

    /// Sheet to read (overrides settings; default is the first sheet)
    #[arg(long = "sheet")]
    sheet: Option<String>,

    /// 0-based header row (overrides settings)
    #[arg(long = "header-row")]
    header_row: Option<usize>,

    /// Detect the header row from the column names instead of using a fixed row
    #[arg(long = "detect-header", conflicts_with = "header_row")]
    detect_header: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Exit with status 2 when any anomaly is found
    #[arg(long = "fail-on-anomaly")]
    fail_on_anomaly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    logger::init_stderr("anomaly_checker=info,trial_balance_parser=info");
    let args = Args::parse();

    let mut settings = settings_loader::load_settings_with_fallback(args.settings_path.as_ref())?
        .unwrap_or_default();
    if let Some(threshold) = args.threshold {
        settings.zero_sum_threshold = threshold;
    }
    if let Some(sheet) = args.sheet {
        settings.workbook.sheet = Some(sheet);
    }
    if args.detect_header {
        settings.workbook.header_row = None;
    } else if let Some(row) = args.header_row {
        settings.workbook.header_row = Some(row);
    }

    let rules = settings_loader::grouping_rules(&settings)?;
    let rows = TrialBalanceReader::from_settings(&settings.workbook).read_file(&args.workbook)?;

    let report = check_anomalies(&rows, &rules, settings.zero_sum_threshold)
        .with_context(|| format!("Checking {}", args.workbook.display()))?;

    println!("{}", render(&report, args.format.into())?);

    if args.fail_on_anomaly && !report.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}
