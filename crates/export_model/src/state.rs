//! Per-target export state machine

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    #[default]
    Idle,
    Capturing,
    Paginating,
    Assembling,
    Done,
    Failed,
}

impl ExportState {
    /// Whether a new export may start from this state
    pub fn accepts_new_export(&self) -> bool {
        matches!(
            self,
            ExportState::Idle | ExportState::Done | ExportState::Failed
        )
    }

    pub fn is_in_flight(&self) -> bool {
        !self.accepts_new_export()
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: ExportState) -> bool {
        use ExportState::*;
        match (self, next) {
            (Idle | Done | Failed, Capturing) => true,
            (Capturing, Paginating) => true,
            (Paginating, Assembling) => true,
            (Assembling, Done) => true,
            (Capturing | Paginating | Assembling, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportState::Idle => "idle",
            ExportState::Capturing => "capturing",
            ExportState::Paginating => "paginating",
            ExportState::Assembling => "assembling",
            ExportState::Done => "done",
            ExportState::Failed => "failed",
        };
        f.write_str(s)
    }
}
