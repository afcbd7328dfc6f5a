use anyhow::{Context, Result};
use clap::Parser;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Sends a natural-language question to the trial-balance query server.
#[derive(Debug, Parser)]
#[command(name = "ask", author, version, about, long_about = None)]
struct Args {
    /// Query endpoint
    #[arg(long = "url", default_value = "http://127.0.0.1:5000/query")]
    url: String,

    /// Also print the code the model generated
    #[arg(long = "show-code")]
    show_code: bool,

    /// The question, e.g. "amount of 10th gl"
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    output: String,
    error: Option<String>,
    generated_code: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let question = args.question.join(" ");

    println!("Sending query to server: '{}'", question);

    let client = Client::builder()
        .timeout(Duration::from_secs(180))
        .build()
        .context("Failed to build HTTP client")?;

    let response = match client.post(&args.url).json(&json!({ "query": question })).send() {
        Ok(r) => r,
        Err(e) if e.is_connect() => {
            eprintln!("\n--- CONNECTION ERROR ---");
            eprintln!("Error: Could not connect to the API server at {}.", args.url);
            eprintln!("Are you sure 'query_server' is running in another terminal?");
            std::process::exit(1);
        }
        Err(e) => return Err(e).with_context(|| format!("POST {} failed", args.url)),
    };

    let status = response.status();
    let body = response.text().context("Failed to read response body")?;

    if !status.is_success() {
        println!("--- Server Error (HTTP {}) ---", status.as_u16());
        println!("{}", body);
        std::process::exit(1);
    }

    let parsed: QueryResponse =
        serde_json::from_str(&body).context("Server returned an unexpected response")?;

    if args.show_code {
        println!("--- Generated code ---\n{}\n----------------------", parsed.generated_code);
    }
    println!("{}", parsed.output.trim());
    if let Some(err) = parsed.error.filter(|e| !e.trim().is_empty()) {
        eprintln!("--- stderr ---\n{}", err.trim());
    }

    Ok(())
}
