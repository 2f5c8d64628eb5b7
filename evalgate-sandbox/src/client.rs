//! Sandbox client trait and implementations

mod http;

use crate::error::GatewayResult;
use crate::types::ExecutionResult;
use async_trait::async_trait;

pub use self::http::HttpSandboxClient;

/// Connection to an isolated execution service.
///
/// One call is one evaluation: implementations must not retry, because running
/// the program twice may repeat its side effects.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    /// Submit code and wait for the sandbox's raw telemetry
    async fn eval(&self, code: &str) -> GatewayResult<ExecutionResult>;

    /// Get client name
    fn name(&self) -> &str;
}
