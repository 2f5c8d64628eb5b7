//! Core types for the evaluation pipeline

use crate::execution::{ExecutionId, PipelineStage};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Raw text handed over by the dispatch layer, one per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub raw_text: String,
}

impl SubmissionRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// Where the code was found in the submitted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeKind {
    /// One triple-backtick block, optionally tagged with a language
    SingleBlock { language: Option<String> },
    /// Two or more triple-backtick blocks joined together
    MultiBlock { blocks: usize },
    /// Code enclosed in one or two backticks
    Inline { delimiter: usize },
    /// No usable delimiters; the whole text is the code
    Unformatted,
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeKind::SingleBlock {
                language: Some(language),
            } => write!(f, "'{}' highlighted code block", language),
            CodeKind::SingleBlock { language: None } => write!(f, "plain code block"),
            CodeKind::MultiBlock { blocks } => write!(f, "several code blocks ({})", blocks),
            CodeKind::Inline { delimiter } => {
                write!(f, "{}-enclosed inline code", "`".repeat(*delimiter))
            }
            CodeKind::Unformatted => write!(f, "unformatted or badly formatted code"),
        }
    }
}

/// Code extracted from a submission, ready to be sent to the sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedCode {
    pub code: String,
    pub kind: CodeKind,
}

/// Body of `POST /eval`
#[derive(Debug, Clone, Serialize)]
pub struct EvalRequest<'a> {
    pub input: &'a str,
}

/// Raw telemetry reported by the sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured output of the program
    pub stdout: String,

    /// Process return code; `None` when the sandbox could not run the program at all
    #[serde(default)]
    pub returncode: Option<i32>,
}

impl ExecutionResult {
    pub fn new(stdout: impl Into<String>, returncode: Option<i32>) -> Self {
        Self {
            stdout: stdout.into(),
            returncode,
        }
    }

    /// Coarse outcome used to pick a status icon
    pub fn outcome(&self) -> Outcome {
        if self.stdout.trim().is_empty() {
            Outcome::NoOutput
        } else if self.returncode == Some(0) {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Coarse execution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NoOutput,
    Success,
    Failure,
}

impl Outcome {
    pub fn icon(self) -> &'static str {
        match self {
            Outcome::NoOutput => "⚪",
            Outcome::Success => "✅",
            Outcome::Failure => "❌",
        }
    }
}

/// Classification of a sandbox result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusKind {
    /// The program ran to completion, possibly terminated by a signal
    Completed {
        returncode: i32,
        signal: Option<&'static str>,
    },
    /// Killed by the sandbox for exceeding its time or memory budget
    TimedOut,
    /// The sandbox itself failed (return code absent or 255)
    Fault,
}

/// Human-facing summary of a sandbox result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterpretedStatus {
    pub kind: StatusKind,
    pub headline: String,
    pub detail: Option<String>,
}

/// Link to the full output in the paste store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteLink {
    Url(Url),
    /// The text exceeded the upload ceiling and was never sent
    TooLarge,
}

impl PasteLink {
    pub const TOO_LARGE: &'static str = "output too large to upload";

    pub fn url(&self) -> Option<&Url> {
        match self {
            PasteLink::Url(url) => Some(url),
            PasteLink::TooLarge => None,
        }
    }
}

impl fmt::Display for PasteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasteLink::Url(url) => write!(f, "{}", url),
            PasteLink::TooLarge => f.write_str(Self::TOO_LARGE),
        }
    }
}

/// Final, display-safe payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub display_text: String,
    pub paste_link: Option<PasteLink>,
    pub truncated: bool,
    pub escape_attempt: bool,
}

/// Everything a completed pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct EvalOutcome {
    pub id: ExecutionId,
    pub code: NormalizedCode,
    pub result: ExecutionResult,
    pub status: InterpretedStatus,
    pub rendered: RenderedOutput,
    /// Stages the submission went through, in order
    pub stages: Vec<PipelineStage>,
}
