//! Global constants for ol-core

use uuid::Uuid;

/// Namespace for node ids derived from host paths (UUID v5)
pub const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f75_746c_696e_4e6f_6465_4964_5f76_3531);

/// Separator between persistent ids in a serialized host path
pub const PATH_SEPARATOR: char = '.';

/// Name of the layer every entity falls back to
pub const DEFAULT_LAYER: &str = "Layer0";

/// Default operation names for undoable host mutations
pub const OPERATION_UPDATE: &str = "Outliner Update";
pub const OPERATION_TOGGLE_VISIBLE: &str = "Outliner Toggle Visible";
pub const OPERATION_EXPLODE: &str = "Outliner Explode";
pub const OPERATION_DEEP_RENAME: &str = "Outliner Deep Rename";

/// Diagnostic codes collected during generation
pub const TIP_EMPTY_MODEL: &str = "tab.outliner.tip.empty_model";
pub const WARNING_DUPLICATE_ID: &str = "tab.outliner.warning.duplicate_id";
pub const WARNING_MISSING_ENTITY: &str = "tab.outliner.warning.missing_entity";
pub const ERROR_RECURSIVE_DEFINITION: &str = "tab.outliner.error.recursive_definition";
