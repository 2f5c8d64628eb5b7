//! Per-submission identity and stage tracking

use serde::{Deserialize, Serialize};

/// Unique submission identifier, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub uuid::Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Normalizing,
    Normalized,
    Rejected,
    Submitting,
    Interpreted,
    Failed,
    Sanitizing,
    Rendered,
    EscapeBlocked,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipelineStage::Rejected
                | PipelineStage::Failed
                | PipelineStage::Rendered
                | PipelineStage::EscapeBlocked
        )
    }

    /// Whether `next` is a legal successor of this stage
    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Received, Normalizing)
                | (Normalizing, Normalized)
                | (Normalizing, Rejected)
                | (Normalized, Submitting)
                | (Submitting, Interpreted)
                | (Submitting, Failed)
                | (Interpreted, Sanitizing)
                | (Sanitizing, Rendered)
                | (Sanitizing, EscapeBlocked)
        )
    }
}

/// Ordered record of the stages one submission went through
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    id: ExecutionId,
    stages: Vec<PipelineStage>,
}

impl PipelineTrace {
    pub fn new(id: ExecutionId) -> Self {
        Self {
            id,
            stages: vec![PipelineStage::Received],
        }
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn current(&self) -> PipelineStage {
        // never empty: starts at Received
        self.stages
            .last()
            .copied()
            .unwrap_or(PipelineStage::Received)
    }

    /// Move to the next stage. Each edge is taken at most once.
    pub fn advance(&mut self, next: PipelineStage) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "illegal pipeline transition {:?} -> {:?}",
            current,
            next
        );
        tracing::debug!(execution_id = %self.id, from = ?current, to = ?next, "Pipeline stage");
        self.stages.push(next);
    }

    pub fn is_complete(&self) -> bool {
        self.current().is_terminal()
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<PipelineStage> {
        self.stages
    }
}
