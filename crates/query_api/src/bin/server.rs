use ai_client::{OllamaClientConfig, QueryContext};
use anyhow::Context;
use query_api::{run_server, AppState, OllamaGenerator, PythonExecutor};
use std::sync::Arc;
use std::time::Duration;
use std::{env, path::PathBuf};

/// Header row handed to pandas when the settings leave it to auto-detection.
const FALLBACK_HEADER_ROW: usize = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init("query_api=debug,query_server=debug,anomaly_checker=info,tower_http=debug");

    // Environment variables with sane defaults
    let workbook_raw =
        env::var("TRIAL_BALANCE_PATH").unwrap_or_else(|_| "Trial_Balance.xlsx".to_string());
    let settings_raw = env::var("SETTINGS_PATH").ok();
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse()
        .unwrap_or(5000);
    let python_bin = env::var("PYTHON_BIN").unwrap_or_else(|_| "python3".to_string());
    let timeout_secs: u64 = env::var("QUERY_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    // Relative paths resolve against the workspace root first, then the current directory.
    let crate_root = env::current_dir().context("Cannot determine current directory")?;
    let workspace_root = find_workspace_root().unwrap_or_else(|| crate_root.clone());
    let bases = [&workspace_root, &crate_root];

    let workbook_path = resolve_with_fallback(&workbook_raw, &bases);
    let settings_path = settings_raw.map(|raw| resolve_with_fallback(&raw, &bases));

    let settings = settings_loader::load_settings_with_fallback(settings_path.as_ref())?
        .unwrap_or_default();
    let rules = settings_loader::grouping_rules(&settings)?;

    tracing::info!("Trial Balance Query API");
    tracing::info!("Workbook path (resolved): {}", workbook_path.display());
    match &settings_path {
        Some(p) => tracing::info!("Settings path (resolved): {}", p.display()),
        None => tracing::info!("Settings: ./settings.json if present, built-in defaults otherwise"),
    }
    tracing::info!(
        "Zero-sum threshold: {}, {} grouping rules",
        settings.zero_sum_threshold,
        rules.entries().len()
    );

    // Pre-flight checks
    if !workbook_path.is_file() {
        tracing::error!(
            "Trial balance not found at: {}. Set TRIAL_BALANCE_PATH to the workbook.",
            workbook_path.display()
        );
        std::process::exit(1);
    }

    let header_row = settings.workbook.header_row.unwrap_or_else(|| {
        tracing::warn!(
            "No header_row configured; generated queries will read the header from row {}",
            FALLBACK_HEADER_ROW + 1
        );
        FALLBACK_HEADER_ROW
    });

    let ollama = OllamaClientConfig::from_env();
    tracing::info!("Using Ollama model '{}' at {}", ollama.model, ollama.base_url);

    let context = QueryContext {
        workbook_name: workbook_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| workbook_raw.clone()),
        header_row,
        ..QueryContext::default()
    };
    let generator = OllamaGenerator::new(ollama, context).await?;

    let executor = PythonExecutor::new(python_bin, workbook_path.clone())
        .with_header_row(header_row)
        .with_timeout(Duration::from_secs(timeout_secs));

    let state = AppState {
        generator: Arc::new(generator),
        executor: Arc::new(executor),
        workbook_path,
        settings: Arc::new(settings),
        rules: Arc::new(rules),
    };

    run_server(state, &host, port).await?;

    Ok(())
}

/// Find the Cargo workspace root by traversing up until a Cargo.toml that contains a [workspace] section.
fn find_workspace_root() -> Option<PathBuf> {
    let mut dir = env::current_dir().ok()?;
    for _ in 0..10 {
        let candidate = dir.join("Cargo.toml");
        if let Ok(content) = std::fs::read_to_string(&candidate) {
            if content.contains("[workspace]") {
                return Some(dir);
            }
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Resolve a raw path string against a list of base directories, returning the first existing match, or the path under the first base.
fn resolve_with_fallback(raw: &str, bases: &[&PathBuf]) -> PathBuf {
    let input = PathBuf::from(raw);
    if input.is_absolute() {
        return input;
    }
    for base in bases {
        let candidate = base.join(&input);
        if candidate.exists() {
            return candidate;
        }
    }
    match bases.first() {
        Some(base) => base.join(input),
        None => input,
    }
}
