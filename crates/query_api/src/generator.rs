use ai_client::{OllamaClient, OllamaClientConfig, QueryContext};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Turns a natural-language question into query code.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> Result<String>;
}

/// Generator backed by a local Ollama model.
///
/// One blocking client is shared by every request. It is built on a blocking
/// thread, each request runs on one, and the last handle is released off the
/// async runtime.
#[derive(Debug)]
pub struct OllamaGenerator {
    client: Option<OllamaClient>,
    context: QueryContext,
}

impl OllamaGenerator {
    /// Builds the shared client, validating the configuration.
    pub async fn new(config: OllamaClientConfig, context: QueryContext) -> Result<Self> {
        let client = tokio::task::spawn_blocking(move || OllamaClient::new(config))
            .await
            .context("Ollama client setup task failed")??;
        Ok(Self {
            client: Some(client),
            context,
        })
    }
}

#[async_trait]
impl QueryGenerator for OllamaGenerator {
    async fn generate(&self, question: &str) -> Result<String> {
        let client = self
            .client
            .clone()
            .context("Ollama client already released")?;
        let context = self.context.clone();
        let question = question.to_string();

        tokio::task::spawn_blocking(move || client.generate_query_code(&question, &context))
            .await
            .context("Query generation task failed")?
    }
}

impl Drop for OllamaGenerator {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            std::thread::spawn(move || drop(client));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn config(base_url: String) -> OllamaClientConfig {
        OllamaClientConfig {
            base_url,
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn shared_client_answers_and_drops_inside_runtime() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).json_body(json!({
                    "message": { "role": "assistant", "content": "```python\nprint(len(data))\n```" }
                }));
            })
            .await;

        let generator = OllamaGenerator::new(config(server.base_url()), QueryContext::default())
            .await
            .unwrap();
        let code = generator.generate("how many rows?").await.unwrap();

        mock.assert_async().await;
        assert_eq!(code, "print(len(data))");
        drop(generator);
    }

    #[tokio::test]
    async fn remote_endpoint_is_rejected_at_startup() {
        let err = OllamaGenerator::new(
            config("http://example.com:11434".to_string()),
            QueryContext::default(),
        )
        .await
        .unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
