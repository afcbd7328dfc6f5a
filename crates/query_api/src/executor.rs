use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Columns pandas loads from the trial-balance sheet.
const USECOLS: &str = "A:G";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs generated query code against the trial balance.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: &str) -> Result<ExecutionOutput>;
}

/// Runs code with a Python interpreter in a subprocess, with pandas already
/// holding the workbook in `data`.
#[derive(Debug, Clone)]
pub struct PythonExecutor {
    pub python_bin: String,
    pub workbook_path: PathBuf,
    pub header_row: usize,
    pub timeout: Duration,
}

impl PythonExecutor {
    pub fn new(python_bin: impl Into<String>, workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            python_bin: python_bin.into(),
            workbook_path: workbook_path.into(),
            header_row: 2,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn script_for(&self, code: &str) -> String {
        build_script(code, &self.workbook_path, self.header_row)
    }
}

#[async_trait]
impl CodeExecutor for PythonExecutor {
    async fn execute(&self, code: &str) -> Result<ExecutionOutput> {
        let script = self.script_for(code);

        // Removed from disk when `file` drops, after the child has exited.
        let mut file = tempfile::Builder::new()
            .prefix("tb_query_")
            .suffix(".py")
            .tempfile()
            .context("Creating temporary query script")?;
        file.write_all(script.as_bytes())
            .and_then(|_| file.flush())
            .context("Writing temporary query script")?;

        debug!(script = %file.path().display(), python = %self.python_bin, "running query script");

        let child = Command::new(&self.python_bin)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start '{}'", self.python_bin))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.context("Waiting for query script")?,
            Err(_) => {
                return Err(anyhow!(
                    "Query script timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            }
        };

        debug!(status = %output.status, "query script finished");

        Ok(ExecutionOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Wraps generated code in a script that loads the workbook and prints any
/// exception instead of a traceback.
pub fn build_script(code: &str, workbook_path: &Path, header_row: usize) -> String {
    let workbook = python_string(&workbook_path.to_string_lossy());
    let body = indent(code, "    ");

    format!(
        r#"import pandas as pd
import warnings
warnings.simplefilter(action='ignore', category=FutureWarning)
pd.options.display.float_format = '{{:,.2f}}'.format

try:
    data = pd.read_excel({workbook}, header={header_row}, usecols="{usecols}")

{body}

except FileNotFoundError:
    print("Error: Could not find shared data file " + {workbook} + ".")
except Exception as e:
    print(f"An error occurred: {{e}}")
"#,
        workbook = workbook,
        header_row = header_row,
        usecols = USECOLS,
        body = body,
    )
}

/// Prefixes every non-blank line.
fn indent(code: &str, prefix: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A JSON string literal is also a valid Python string literal.
fn python_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_non_blank_lines() {
        assert_eq!(
            indent("x = 1\n\nif x:\n    print(x)", "    "),
            "    x = 1\n\n    if x:\n        print(x)"
        );
    }

    #[test]
    fn script_loads_workbook_and_embeds_code() {
        let script = build_script("print(data['Amount'].sum())", Path::new("Trial_Balance.xlsx"), 2);

        assert!(script.contains(
            r#"data = pd.read_excel("Trial_Balance.xlsx", header=2, usecols="A:G")"#
        ));
        assert!(script.contains("\n    print(data['Amount'].sum())\n"));
        assert!(script.contains("pd.options.display.float_format = '{:,.2f}'.format"));
        assert!(script.contains(r#"print(f"An error occurred: {e}")"#));
    }

    #[test]
    fn workbook_path_is_escaped() {
        let script = build_script("print(1)", Path::new(r#"C:\data\"tb".xlsx"#), 0);
        assert!(script.contains(r#"pd.read_excel("C:\\data\\\"tb\".xlsx", header=0"#));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_of_the_interpreter() {
        // `cat` echoes the script back, which exercises the whole subprocess path.
        let executor = PythonExecutor::new("cat", "tb.xlsx");
        let output = executor.execute("print(42)").await.unwrap();

        assert_eq!(output.stdout, executor.script_for("print(42)"));
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_error() {
        let executor = PythonExecutor::new("definitely-not-a-python-binary", "tb.xlsx");
        let err = executor.execute("print(1)").await.unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
