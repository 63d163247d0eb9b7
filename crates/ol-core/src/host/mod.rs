//! Host scene abstraction
//!
//! The outliner never owns the scene graph. It reads it through
//! [`SceneHost`] and mutates it inside an undoable [`Operation`].

mod memory;
mod operation;
mod traits;

pub use memory::{DefinitionRecord, EntityRecord, MemoryScene, SceneModel};
pub use operation::Operation;
pub use traits::*;
