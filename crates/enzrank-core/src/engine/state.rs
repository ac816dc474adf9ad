use serde::Serialize;
use std::fmt;

/// Stages of a run, in the only order they may be reached.
///
/// `Failed` may be entered from any non-terminal stage; `Validated` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Initialized,
    StructureReady,
    Scored,
    Ranked,
    Validated,
    Failed,
}

impl PipelineStage {
    pub fn successor(self) -> Option<Self> {
        match self {
            PipelineStage::Initialized => Some(PipelineStage::StructureReady),
            PipelineStage::StructureReady => Some(PipelineStage::Scored),
            PipelineStage::Scored => Some(PipelineStage::Ranked),
            PipelineStage::Ranked => Some(PipelineStage::Validated),
            PipelineStage::Validated | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Validated | PipelineStage::Failed)
    }

    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        if next == PipelineStage::Failed {
            return !self.is_terminal();
        }
        self.successor() == Some(next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Initialized => "INITIALIZED",
            PipelineStage::StructureReady => "STRUCTURE_READY",
            PipelineStage::Scored => "SCORED",
            PipelineStage::Ranked => "RANKED",
            PipelineStage::Validated => "VALIDATED",
            PipelineStage::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
