//! # Settings Loader
//!
//! Centralized settings loading for the trial-balance tools. Settings live in a
//! JSON file (`settings.json` by default) holding the zero-sum threshold, an
//! optional replacement for the built-in grouping rule table, and where to find
//! the ledger columns inside the workbook.
//!
//! ## Features
//!
//! - Load settings from specified file paths
//! - Load settings from default location (`settings.json`)
//! - Handle optional settings gracefully (every field has a default)
//! - Validation of threshold and grouping rules before anything runs
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use settings_loader;
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/my_settings.json")?;
//!
//! // Fall back to ./settings.json, then to built-in defaults
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::load_settings_with_fallback(path.as_ref())?.unwrap_or_default();
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anomaly_checker::GroupingRules;
use anyhow::{Context, Result, anyhow};
use models::Settings;
use rust_decimal::Decimal;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Loads and validates settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    validate_settings(&settings)
        .with_context(|| format!("Validating settings in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from a default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Loads the provided path when there is one, otherwise `settings.json` in the
/// current directory. An explicit path that cannot be read is an error.
/// Returns None only when no path was given and no default file exists.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<Option<Settings>> {
    if let Some(settings_path) = path {
        return load_settings(settings_path).map(Some);
    }

    if default_settings_exist() {
        return load_default_settings().map(Some);
    }

    Ok(None)
}

/// Checks the values a run depends on
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.zero_sum_threshold < Decimal::ZERO {
        return Err(anyhow!(
            "zero_sum_threshold must be non-negative, got {}",
            settings.zero_sum_threshold
        ));
    }
    GroupingRules::from_optional(settings.grouping_rules.clone())?;
    Ok(())
}

/// Grouping rule table the settings describe (built-in table when none is configured)
pub fn grouping_rules(settings: &Settings) -> Result<GroupingRules> {
    Ok(GroupingRules::from_optional(settings.grouping_rules.clone())?)
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Checks if the default settings file (settings.json) exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::SignRule;
    use std::io::Write;

    fn write_settings(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_threshold_and_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            &dir,
            r#"{
                "zero_sum_threshold": "0.5",
                "grouping_rules": [
                    { "label": "Provisions", "expected_sign": "non_positive" }
                ],
                "workbook": { "sheet": "TB", "header_row": null }
            }"#,
        );

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.zero_sum_threshold, Decimal::new(5, 1));
        assert_eq!(settings.workbook.sheet.as_deref(), Some("TB"));
        assert_eq!(settings.workbook.header_row, None);
        assert_eq!(settings.workbook.columns.amount, "Amount");

        let rules = grouping_rules(&settings).unwrap();
        assert_eq!(rules.get("Provisions"), Some(SignRule::NonPositive));
    }

    #[test]
    fn rejects_negative_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(&dir, r#"{ "zero_sum_threshold": -1 }"#);
        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("non-negative"));
    }

    #[test]
    fn rejects_duplicate_rule_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(
            &dir,
            r#"{ "grouping_rules": [
                { "label": "Equity", "expected_sign": "non_positive" },
                { "label": "Equity", "expected_sign": "non_negative" }
            ] }"#,
        );
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn missing_optional_path_is_none() {
        assert!(load_optional_settings(None).unwrap().is_none());
    }

    #[test]
    fn reports_unreadable_file_with_path() {
        let err = load_settings("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn explicit_missing_path_does_not_fall_back() {
        let path = PathBuf::from("/nonexistent/typo_settings.json");
        let err = load_settings_with_fallback(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("typo_settings.json"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(&dir, r#"{ "zero_sum_threshold": 12 }"#);
        let settings = load_settings_with_fallback(Some(&path)).unwrap().unwrap();
        assert_eq!(settings.zero_sum_threshold, Decimal::new(12, 0));
    }
}
