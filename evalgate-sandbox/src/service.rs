//! Evaluation gateway - main entry point

use crate::client::{HttpSandboxClient, SandboxClient};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::execution::{ExecutionId, PipelineStage, PipelineTrace};
use crate::interpret::ResultInterpreter;
use crate::limits::OutputLimits;
use crate::normalize::normalize;
use crate::paste::{HttpPasteStore, PasteFallback, PasteStore};
use crate::sanitize::OutputSanitizer;
use crate::types::{EvalOutcome, NormalizedCode, SubmissionRequest};
use std::sync::Arc;
use std::time::Duration;

/// Runs submissions through normalize → sandbox → interpret → sanitize.
///
/// Holds no per-submission state: every call to [`EvalGateway::submit`] is an
/// independent pipeline run and can be awaited concurrently with others.
#[derive(Clone)]
pub struct EvalGateway {
    sandbox: Arc<dyn SandboxClient>,
    interpreter: ResultInterpreter,
    sanitizer: OutputSanitizer,
    deadline: Option<Duration>,
}

impl EvalGateway {
    /// Create a gateway from a sandbox client and a paste store
    pub fn new(
        sandbox: impl SandboxClient + 'static,
        paste: impl PasteStore + 'static,
        limits: OutputLimits,
    ) -> Self {
        let paste = PasteFallback::new(Arc::new(paste), limits.max_upload_chars);
        Self {
            sandbox: Arc::new(sandbox),
            interpreter: ResultInterpreter::default(),
            sanitizer: OutputSanitizer::new(limits, paste),
            deadline: None,
        }
    }

    /// Create a gateway talking HTTP to the configured sandbox and paste store
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let sandbox = HttpSandboxClient::new(&config.sandbox)?;
        let paste = HttpPasteStore::new(&config.paste)?;
        let mut gateway = Self::new(sandbox, paste, config.output.clone());
        gateway.deadline = config.sandbox.timeout;
        Ok(gateway)
    }

    /// Bound every sandbox call by `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use a custom interpreter (e.g. a different signal table)
    pub fn with_interpreter(mut self, interpreter: ResultInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Get the sandbox client name
    pub fn sandbox_name(&self) -> &str {
        self.sandbox.name()
    }

    /// Run one submission with the gateway's default deadline
    pub async fn submit(&self, request: SubmissionRequest) -> GatewayResult<EvalOutcome> {
        self.submit_with_deadline(request, self.deadline).await
    }

    /// Run one submission, bounding the sandbox call by `deadline`.
    ///
    /// Dropping the returned future abandons the sandbox request.
    pub async fn submit_with_deadline(
        &self,
        request: SubmissionRequest,
        deadline: Option<Duration>,
    ) -> GatewayResult<EvalOutcome> {
        let mut trace = PipelineTrace::new(ExecutionId::new());
        let id = trace.id();

        trace.advance(PipelineStage::Normalizing);
        let code = match normalize(&request.raw_text) {
            Ok(code) => code,
            Err(e) => {
                trace.advance(PipelineStage::Rejected);
                tracing::info!(execution_id = %id, "Submission contains no code");
                return Err(e);
            }
        };
        trace.advance(PipelineStage::Normalized);

        tracing::info!(
            execution_id = %id,
            sandbox = self.sandbox.name(),
            kind = %code.kind,
            code_len = code.code.len(),
            "Evaluating code"
        );

        trace.advance(PipelineStage::Submitting);
        let result = match self.call_sandbox(&code, deadline).await {
            Ok(result) => result,
            Err(e) => {
                trace.advance(PipelineStage::Failed);
                tracing::error!(execution_id = %id, error = %e, "Sandbox call failed");
                return Err(e);
            }
        };

        let status = self.interpreter.interpret(&result);
        trace.advance(PipelineStage::Interpreted);
        tracing::info!(
            execution_id = %id,
            returncode = ?result.returncode,
            headline = %status.headline,
            "Sandbox finished"
        );

        trace.advance(PipelineStage::Sanitizing);
        let text = status.detail.as_deref().unwrap_or(&result.stdout);
        let rendered = self.sanitizer.render(text).await;
        trace.advance(if rendered.escape_attempt {
            PipelineStage::EscapeBlocked
        } else {
            PipelineStage::Rendered
        });

        Ok(EvalOutcome {
            id,
            code,
            result,
            status,
            rendered,
            stages: trace.into_stages(),
        })
    }

    async fn call_sandbox(
        &self,
        code: &NormalizedCode,
        deadline: Option<Duration>,
    ) -> GatewayResult<crate::types::ExecutionResult> {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, self.sandbox.eval(&code.code))
                .await
                .map_err(|_| {
                    GatewayError::SandboxUnreachable(format!("no response within {:?}", limit))
                })?,
            None => self.sandbox.eval(&code.code).await,
        }
    }
}
