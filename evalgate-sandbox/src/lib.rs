//! Evaluation gateway - turns untrusted chat text into sandboxed execution output
//!
//! The pipeline extracts code from free-form text, submits it to a remote sandbox
//! service, interprets the sandbox telemetry and produces a bounded, mention-safe
//! rendering, uploading the full text to a paste store when it does not fit.

mod client;
mod config;
mod error;
mod execution;
mod interpret;
mod limits;
mod normalize;
mod paste;
mod sanitize;
mod service;
mod types;

pub use client::{HttpSandboxClient, SandboxClient};
pub use config::{GatewayConfig, PasteConfig, SandboxConfig};
pub use error::{GatewayError, GatewayResult, PasteError};
pub use execution::{ExecutionId, PipelineStage, PipelineTrace};
pub use interpret::{ResultInterpreter, SignalTable};
pub use limits::OutputLimits;
pub use normalize::normalize;
pub use paste::{HttpPasteStore, PasteFallback, PasteStore};
pub use sanitize::{
    sanitize, OutputSanitizer, SanitizedOutput, Truncation, ESCAPE_WARNING, NO_OUTPUT,
};
pub use service::EvalGateway;
pub use types::{
    CodeKind, EvalOutcome, EvalRequest, ExecutionResult, InterpretedStatus, NormalizedCode,
    Outcome, PasteLink, RenderedOutput, StatusKind, SubmissionRequest,
};
