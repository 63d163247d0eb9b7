//! Scene Outliner Core
//!
//! This crate keeps a navigable node tree in sync with a host scene graph:
//! - SceneHost: query/mutation surface of the host application (plus an in-memory host)
//! - SceneAdapter: builds a node tree from the live scene
//! - Outliner: generated snapshot with lookup, invalidation and transport form
//! - Commands: generate, update, set-active, set-expanded, toggle-visible, explode, deep-rename
//! - Controller: dispatches commands and host events against the current outliner

pub mod adapter;
pub mod bus;
pub mod commands;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod formula;
pub mod host;
pub mod node;
pub mod outliner;

pub use adapter::SceneAdapter;
pub use bus::{HostEvent, InvalidationBus, ListenerId};
pub use commands::{
    Command, CommandContext, CommandResponse, DeepRenamePayload, ErrorPayload, NodeRef,
    SetExpandedPayload, UpdatePayload,
};
pub use config::{ConfigError, OperationNames, OutlinerConfig};
pub use constants::*;
pub use controller::{Controller, InvalidationHook};
pub use error::{OutlinerError, OutlinerResult};
pub use formula::{
    EdgeContext, ExpressionEvaluator, FormulaError, FormulaEvaluator, InstanceFormulaContext,
    MaterialContext, VeneerContext,
};
pub use host::{
    BandAttributes, DefinitionId, DefinitionInfo, DefinitionRecord, EdgeBands, EntityId,
    EntityInfo, EntityKind, EntityRecord, HostError, HostResult, LayerInfo, MaterialAttributes,
    MemoryScene, ModelInfo, Operation, PartAttributes, SceneHost, SceneModel, Veneers,
};
pub use node::{Node, NodeFlags, NodeId, NodeStore, NodeType, StoreError};
pub use outliner::{AvailableLayer, Diagnostics, Outliner, TransportNode, TransportTree};
