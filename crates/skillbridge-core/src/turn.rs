use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a dialog stands after handling one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogTurnStatus {
    /// The dialog is still active and expects more turns.
    Waiting,
    /// The dialog finished; control returns to the parent.
    Complete,
}

/// Outcome of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogTurnResult {
    pub status: DialogTurnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl DialogTurnResult {
    pub fn waiting() -> Self {
        Self {
            status: DialogTurnStatus::Waiting,
            result: None,
        }
    }

    pub fn complete(result: Option<Value>) -> Self {
        Self {
            status: DialogTurnStatus::Complete,
            result,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == DialogTurnStatus::Waiting
    }

    pub fn is_complete(&self) -> bool {
        self.status == DialogTurnStatus::Complete
    }
}
