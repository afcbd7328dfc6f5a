use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

pub mod prompt;

pub use prompt::{build_query_system_prompt, strip_code_fences, QueryContext};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Where the local Ollama server lives and how long to wait for it.
///
/// Only a loopback `http://` endpoint is accepted; ledger data never leaves the machine.
#[derive(Debug, Clone)]
pub struct OllamaClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaClientConfig {
    /// Defaults overridden by `OLLAMA_BASE_URL`, `OLLAMA_MODEL` and `OLLAMA_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.model = model;
        }
        if let Some(secs) = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Blocking client for Ollama's `/api/chat`, tuned for deterministic code output.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    chat_url: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaClientConfig) -> Result<Self> {
        let chat_url = validate_local_base_url(&config.base_url)?
            .join("api/chat")
            .context("Failed to build Ollama /api/chat URL")?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            chat_url,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system turn, one user turn, non-streaming, temperature 0.
    pub fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: [
                ChatTurn {
                    role: "system",
                    content: system_prompt,
                },
                ChatTurn {
                    role: "user",
                    content: user_prompt,
                },
            ],
            options: ChatOptions { temperature: 0.0 },
        };

        let url = &self.chat_url;
        debug!(model = %self.model, %url, "sending chat request");

        let reply: ChatReply = self
            .http
            .post(url.clone())
            .json(&request)
            .send()
            .with_context(|| format!("POST {url} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {url} returned non-success status"))?
            .json()
            .with_context(|| format!("Failed to parse JSON response from {url}"))?;

        reply
            .message
            .map(|m| m.content.trim().to_string())
            .ok_or_else(|| anyhow!("Ollama response had no message content"))
    }

    /// Asks the model for pandas code answering `question` over the trial balance.
    ///
    /// Returns only the code, with any markdown fences removed. An empty string
    /// means the model produced nothing usable.
    pub fn generate_query_code(&self, question: &str, context: &QueryContext) -> Result<String> {
        let system_prompt = build_query_system_prompt(context);
        let user_prompt = format!("User Request:\n{}", question.trim());
        let answer = self.chat(&system_prompt, &user_prompt)?;
        Ok(strip_code_fences(&answer))
    }
}

/// Parses `base_url` and checks it is plain http on a loopback host.
fn validate_local_base_url(base_url: &str) -> Result<Url> {
    let url =
        Url::parse(base_url).with_context(|| format!("Invalid OLLAMA_BASE_URL: {base_url}"))?;

    if url.scheme() != "http" {
        return Err(anyhow!(
            "Unsupported scheme '{}' for OLLAMA_BASE_URL (use {DEFAULT_BASE_URL})",
            url.scheme()
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("OLLAMA_BASE_URL is missing a host"))?;
    let loopback = host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback());

    if !loopback {
        return Err(anyhow!(
            "Refusing non-local OLLAMA_BASE_URL host '{host}'; only a local Ollama is supported"
        ));
    }
    Ok(url)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatTurn<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatReply {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}
