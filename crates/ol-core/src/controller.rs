//! Command controller
//!
//! Owns the host, the configuration and the current outliner, and routes
//! panel commands and host events to the workers in [`crate::commands`].

use std::sync::Arc;

use serde_json::Value;

use crate::bus::HostEvent;
use crate::commands::{
    Command, CommandContext, CommandResponse, deep_rename, explode, generate, set_active,
    set_expanded, toggle_visible, update,
};
use crate::config::OutlinerConfig;
use crate::error::OutlinerResult;
use crate::formula::{ExpressionEvaluator, FormulaEvaluator};
use crate::host::SceneHost;
use crate::outliner::Outliner;

/// Callback run when the current outliner becomes obsolete
pub type InvalidationHook = Arc<dyn Fn(&Outliner) + Send + Sync>;

/// Single entry point of the outliner
pub struct Controller<H: SceneHost> {
    host: H,
    config: OutlinerConfig,
    evaluator: Box<dyn FormulaEvaluator>,
    outliner: Option<Outliner>,
    hooks: Vec<InvalidationHook>,
}

impl<H: SceneHost> Controller<H> {
    /// Create a controller using the built-in formula engine
    pub fn new(host: H, config: OutlinerConfig) -> Self {
        Self::with_evaluator(host, config, Box::new(ExpressionEvaluator))
    }

    pub fn with_evaluator(
        host: H,
        config: OutlinerConfig,
        evaluator: Box<dyn FormulaEvaluator>,
    ) -> Self {
        Self {
            host,
            config,
            evaluator,
            outliner: None,
            hooks: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for host-side changes made outside commands
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &OutlinerConfig {
        &self.config
    }

    /// Current outliner, obsolete or not
    pub fn outliner(&self) -> Option<&Outliner> {
        self.outliner.as_ref()
    }

    /// Register a hook on the current outliner and every later one
    pub fn on_invalidate(&mut self, hook: impl Fn(&Outliner) + Send + Sync + 'static) {
        let hook: InvalidationHook = Arc::new(hook);
        if let Some(outliner) = self.outliner.as_mut().filter(|o| !o.is_obsolete()) {
            subscribe_hook(outliner, &hook);
        }
        self.hooks.push(hook);
    }

    // ============== Commands ==============

    /// Run a command, turning failures into an error response
    pub fn execute(&mut self, command: Command) -> CommandResponse {
        let name = command.name();
        match self.dispatch(command) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Command '{}' failed: {}", name, e);
                CommandResponse::error(&e)
            }
        }
    }

    /// Run a command given by transport name and JSON payload
    pub fn execute_named(&mut self, name: &str, payload: Option<Value>) -> CommandResponse {
        match Command::from_named(name, payload) {
            Ok(command) => self.execute(command),
            Err(e) => {
                tracing::warn!("Rejected command '{}': {}", name, e);
                CommandResponse::error(&e)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> OutlinerResult<CommandResponse> {
        tracing::debug!("Dispatching command '{}'", command.name());
        match command {
            Command::Generate => {
                let outliner = generate(&mut self.outliner, &self.host, &self.config)?;
                for hook in &self.hooks {
                    subscribe_hook(outliner, hook);
                }
                return Ok(CommandResponse::Tree(Box::new(outliner.to_transport())));
            }
            Command::Update(payload) => update(self.context(), &payload)?,
            Command::SetActive(payload) => set_active(self.outliner.as_mut(), &payload)?,
            Command::SetExpanded(payload) => set_expanded(self.outliner.as_mut(), &payload)?,
            Command::ToggleVisible(payload) => toggle_visible(self.context(), &payload)?,
            Command::Explode(payload) => explode(self.context(), &payload)?,
            Command::DeepRename(payload) => deep_rename(self.context(), &payload)?,
        }
        Ok(CommandResponse::success())
    }

    fn context(&mut self) -> CommandContext<'_> {
        CommandContext {
            outliner: self.outliner.as_mut(),
            host: &mut self.host,
            config: &self.config,
            evaluator: self.evaluator.as_ref(),
        }
    }

    // ============== Host events ==============

    /// React to a host scene event
    ///
    /// Every event obsoletes the current outliner. Returns true if this call
    /// made the transition.
    pub fn on_host_event(&mut self, event: HostEvent) -> bool {
        let invalidated = self.invalidate();
        if invalidated {
            tracing::info!("Outliner invalidated by host event {:?}", event);
        }
        invalidated
    }

    /// Mark the current outliner obsolete; true on the first call only
    pub fn invalidate(&mut self) -> bool {
        self.outliner
            .as_mut()
            .is_some_and(|outliner| outliner.invalidate())
    }
}

fn subscribe_hook(outliner: &mut Outliner, hook: &InvalidationHook) {
    let hook = Arc::clone(hook);
    outliner.subscribe(move |o| hook(o));
}
