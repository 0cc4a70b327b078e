use super::context::DispatchContext;
use super::response::Body;
use crate::cascade::Halt;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// What a handler returns: a body, nothing (auto-render is consulted), or a
/// condition for the error cascade.
pub type HandlerResult = Result<Option<Body>, Halt>;

/// A route handler, invoked with the bound values in declared-name order.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut DispatchContext, args: &[Option<String>]) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut DispatchContext, args: &[Option<String>]) -> HandlerResult {
        self(ctx, args)
    }
}

pub type SharedHandler = Arc<dyn Handler>;

/// Resolver for handler names that were not registered up front.
pub type Autoload = Arc<dyn Fn(&str) -> Option<SharedHandler> + Send + Sync>;

/// Name-keyed symbol table of handlers.
///
/// Routes name their handler; the name is only resolved when a request
/// reaches it. Names unknown to the table go through the autoload
/// resolver, and what it finds is cached.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, SharedHandler>>,
    autoload: Option<Autoload>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.names())
            .field("autoload", &self.autoload.is_some())
            .finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register<F>(&self, name: &str, handler: F)
    where
        F: Fn(&mut DispatchContext, &[Option<String>]) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_shared(name, Arc::new(handler));
    }

    /// Register an already shared handler under `name`.
    pub fn register_shared(&self, name: &str, handler: SharedHandler) {
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), handler);
        if previous.is_some() {
            info!(handler_name = %name, "Handler replaced");
        } else {
            debug!(handler_name = %name, "Handler registered");
        }
    }

    pub fn set_autoload(&mut self, autoload: Autoload) {
        self.autoload = Some(autoload);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Look `name` up, falling back to the autoload resolver.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<SharedHandler> {
        if let Some(handler) = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Some(Arc::clone(handler));
        }

        let handler = self.autoload.as_ref().and_then(|autoload| autoload(name))?;
        debug!(handler_name = %name, "Handler autoloaded");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_insert_with(|| Arc::clone(&handler));
        Some(handler)
    }
}
