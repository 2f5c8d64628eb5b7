//! snekbox-compatible HTTP client

use crate::config::{endpoint, SandboxConfig};
use crate::error::GatewayResult;
use crate::types::{EvalRequest, ExecutionResult};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Talks to a sandbox exposing `POST /eval`
pub struct HttpSandboxClient {
    client: Client,
    eval_url: Url,
}

impl HttpSandboxClient {
    pub fn new(config: &SandboxConfig) -> GatewayResult<Self> {
        Self::with_client(Client::new(), &config.url)
    }

    pub fn with_client(client: Client, base: &Url) -> GatewayResult<Self> {
        Ok(Self {
            client,
            eval_url: endpoint(base, "eval")?,
        })
    }

    pub fn eval_url(&self) -> &Url {
        &self.eval_url
    }
}

#[async_trait]
impl super::SandboxClient for HttpSandboxClient {
    async fn eval(&self, code: &str) -> GatewayResult<ExecutionResult> {
        tracing::debug!(url = %self.eval_url, code_len = code.len(), "Posting code to sandbox");

        let response = self
            .client
            .post(self.eval_url.clone())
            .json(&EvalRequest { input: code })
            .send()
            .await?
            .error_for_status()?;

        let result: ExecutionResult = response.json().await?;
        tracing::debug!(
            returncode = ?result.returncode,
            stdout_len = result.stdout.len(),
            "Sandbox responded"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}
