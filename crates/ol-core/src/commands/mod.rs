//! Outliner commands
//!
//! The panel talks to the outliner through a closed set of commands. Each
//! command has a typed payload and one worker function; workers classify
//! every failure as an [`OutlinerError`] and never panic past their boundary.

mod deep_rename;
mod explode;
mod generate;
mod set_active;
mod set_expanded;
mod toggle_visible;
mod update;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OutlinerConfig;
use crate::error::{OutlinerError, OutlinerResult};
use crate::formula::FormulaEvaluator;
use crate::host::{EntityId, SceneHost};
use crate::node::{Node, NodeId};
use crate::outliner::{Outliner, TransportTree};

pub use deep_rename::deep_rename;
pub use explode::explode;
pub use generate::generate;
pub use set_active::set_active;
pub use set_expanded::set_expanded;
pub use toggle_visible::toggle_visible;
pub use update::update;

// ============== Payloads ==============

/// Partial patch of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

impl UpdatePayload {
    /// Empty patch of `id`
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            visible: None,
            expanded: None,
            selected: None,
        }
    }

    /// Whether the patch touches the host entity
    pub fn writes_host(&self) -> bool {
        self.name.is_some() || self.visible.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetExpandedPayload {
    pub id: NodeId,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepRenamePayload {
    pub id: NodeId,
    pub formula: String,
}

// ============== Commands ==============

/// Commands accepted by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum Command {
    Generate,
    Update(UpdatePayload),
    SetActive(NodeRef),
    SetExpanded(SetExpandedPayload),
    ToggleVisible(NodeRef),
    Explode(NodeRef),
    DeepRename(DeepRenamePayload),
}

impl Command {
    /// Parse a command from its transport name and optional JSON payload
    ///
    /// Names may carry the `outliner_` prefix used by the panel
    /// (`outliner_generate`, `outliner_update`, ...).
    pub fn from_named(name: &str, payload: Option<Value>) -> OutlinerResult<Self> {
        let name = name.strip_prefix("outliner_").unwrap_or(name);

        let mut envelope = serde_json::Map::new();
        envelope.insert("command".into(), Value::String(name.to_string()));
        if let Some(payload) = payload.filter(|p| !is_blank(p)) {
            envelope.insert("payload".into(), payload);
        }

        serde_json::from_value(Value::Object(envelope))
            .map_err(|e| OutlinerError::InvalidCommand(format!("{}: {}", name, e)))
    }

    /// Transport name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Update(_) => "update",
            Self::SetActive(_) => "set_active",
            Self::SetExpanded(_) => "set_expanded",
            Self::ToggleVisible(_) => "toggle_visible",
            Self::Explode(_) => "explode",
            Self::DeepRename(_) => "deep_rename",
        }
    }
}

/// Null and `{}` payloads count as absent
fn is_blank(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// ============== Responses ==============

/// Error entry of a failed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl From<&OutlinerError> for ErrorPayload {
    fn from(error: &OutlinerError) -> Self {
        Self {
            code: error.code().to_string(),
            params: error.params(),
        }
    }
}

/// Result handed back to the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    /// Generated tree (generate only)
    Tree(Box<TransportTree>),
    Success { success: bool },
    Errors { errors: Vec<ErrorPayload> },
}

impl CommandResponse {
    pub fn success() -> Self {
        Self::Success { success: true }
    }

    pub fn error(error: &OutlinerError) -> Self {
        Self::Errors {
            errors: vec![error.into()],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Errors { .. })
    }

    /// Error codes carried by the response
    pub fn error_codes(&self) -> Vec<&str> {
        match self {
            Self::Errors { errors } => errors.iter().map(|e| e.code.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

// ============== Worker context ==============

/// Everything a mutating worker may touch
pub struct CommandContext<'a> {
    /// Current outliner (None if never generated)
    pub outliner: Option<&'a mut Outliner>,
    pub host: &'a mut dyn SceneHost,
    pub config: &'a OutlinerConfig,
    pub evaluator: &'a dyn FormulaEvaluator,
}

/// The outliner, unless it is missing or obsolete
pub(crate) fn live_outliner(outliner: Option<&mut Outliner>) -> OutlinerResult<&mut Outliner> {
    match outliner {
        Some(outliner) if !outliner.is_obsolete() => Ok(outliner),
        _ => Err(OutlinerError::ObsoleteTree),
    }
}

pub(crate) fn require_model(host: &dyn SceneHost) -> OutlinerResult<()> {
    host.model_info().map(|_| ()).ok_or(OutlinerError::NoModel)
}

pub(crate) fn find_node(outliner: &Outliner, id: NodeId) -> OutlinerResult<&Node> {
    outliner
        .get_node(id, None)
        .ok_or(OutlinerError::NodeNotFound(id))
}

/// Live entity designated by a node
pub(crate) fn resolve_entity(host: &dyn SceneHost, node: &Node) -> OutlinerResult<EntityId> {
    host.resolve_path(&node.path)
        .ok_or(OutlinerError::EntityGone(node.id))
}
