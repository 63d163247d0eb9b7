//! Outliner error taxonomy
//!
//! Every failure a command can produce is classified into one of these
//! variants and handed back to the caller as data (see [`crate::ErrorPayload`]).

use serde_json::json;

use crate::formula::FormulaError;
use crate::host::HostError;
use crate::node::{NodeId, StoreError};

/// Result type for outliner commands
pub type OutlinerResult<T> = Result<T, OutlinerError>;

/// Errors returned by the outliner command workers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutlinerError {
    #[error("No active model")]
    NoModel,
    #[error("Outliner is obsolete, generate it again")]
    ObsoleteTree,
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Entity of node {0} no longer exists")]
    EntityGone(NodeId),
    #[error("Formula failed on instance '{instance_name}' ({definition_name}): {source}")]
    Formula {
        node: NodeId,
        instance_name: String,
        definition_name: String,
        #[source]
        source: FormulaError,
    },
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl From<StoreError> for OutlinerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NodeNotFound(id) => Self::NodeNotFound(id),
            other => Self::InvalidCommand(other.to_string()),
        }
    }
}

impl OutlinerError {
    /// Stable error code understood by the panel
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoModel => "tab.outliner.error.no_model",
            Self::ObsoleteTree => "tab.outliner.error.obsolete",
            Self::NodeNotFound(_) => "tab.outliner.error.node_not_found",
            Self::EntityGone(_) => "tab.outliner.error.entity_not_found",
            Self::Formula { .. } => "tab.outliner.error.formula",
            Self::Host(_) => "tab.outliner.error.host",
            Self::InvalidCommand(_) => "tab.outliner.error.invalid_command",
        }
    }

    /// Structured parameters attached to the error code
    pub fn params(&self) -> Option<serde_json::Value> {
        match self {
            Self::NoModel | Self::ObsoleteTree => None,
            Self::NodeNotFound(id) | Self::EntityGone(id) => Some(json!({ "id": id })),
            Self::Formula {
                node,
                instance_name,
                definition_name,
                source,
            } => Some(json!({
                "id": node,
                "instance_name": instance_name,
                "definition_name": definition_name,
                "message": source.to_string(),
            })),
            Self::Host(e) => Some(json!({ "message": e.to_string() })),
            Self::InvalidCommand(message) => Some(json!({ "message": message })),
        }
    }
}
