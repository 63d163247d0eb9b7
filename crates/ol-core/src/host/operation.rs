//! Undoable operation guard

use std::ops::{Deref, DerefMut};

use super::traits::{HostResult, SceneHost};

/// An open host operation
///
/// Mutations go through the guard (it derefs to the host). Dropping the guard
/// without calling [`Operation::commit`] rolls the host back.
pub struct Operation<'a> {
    host: &'a mut (dyn SceneHost + 'a),
    name: String,
    committed: bool,
}

impl<'a> Operation<'a> {
    /// Open a named operation on the host
    pub fn start(host: &'a mut (dyn SceneHost + 'a), name: impl Into<String>) -> HostResult<Self> {
        let name = name.into();
        host.start_operation(&name)?;
        tracing::debug!("Started operation '{}'", name);
        Ok(Self {
            host,
            name,
            committed: false,
        })
    }

    /// Name of the operation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Commit every mutation made through this guard
    pub fn commit(mut self) -> HostResult<()> {
        self.host.commit_operation()?;
        self.committed = true;
        tracing::debug!("Committed operation '{}'", self.name);
        Ok(())
    }
}

impl<'a> Deref for Operation<'a> {
    type Target = dyn SceneHost + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.host
    }
}

impl<'a> DerefMut for Operation<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.host
    }
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match self.host.abort_operation() {
            Ok(()) => tracing::info!("Rolled back operation '{}'", self.name),
            Err(e) => tracing::error!("Failed to roll back operation '{}': {}", self.name, e),
        }
    }
}
