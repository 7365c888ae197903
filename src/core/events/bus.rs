

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use super::base::{LifecycleEventArgs, SoftDeleteEventKind};
use crate::core::error::{Result, SoftDeleteError};


pub type EventHandler = Arc<dyn Fn(&LifecycleEventArgs<'_>) -> anyhow::Result<()> + Send + Sync>;


/// Synchronous fan-out used around each soft delete.
pub trait NotificationBus {
    fn dispatch(&self, args: &LifecycleEventArgs<'_>) -> Result<()>;
}

impl<B: NotificationBus + ?Sized> NotificationBus for Arc<B> {
    fn dispatch(&self, args: &LifecycleEventArgs<'_>) -> Result<()> {
        (**self).dispatch(args)
    }
}

impl<B: NotificationBus + ?Sized> NotificationBus for &B {
    fn dispatch(&self, args: &LifecycleEventArgs<'_>) -> Result<()> {
        (**self).dispatch(args)
    }
}


pub struct EventBus {
    handlers: RwLock<HashMap<SoftDeleteEventKind, Vec<EventHandler>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, kind: SoftDeleteEventKind, handler: EventHandler) {
        let mut handlers = self.handlers.write();
        handlers.entry(kind).or_default().push(handler);
        debug!("Registered handler for event type: {}", kind);
    }

    pub fn subscribe<F>(&self, kind: SoftDeleteEventKind, handler: F)
    where
        F: Fn(&LifecycleEventArgs<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(handler));
    }

    pub fn handler_count(&self, kind: SoftDeleteEventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl NotificationBus for EventBus {
    /// Calls handlers in registration order and stops at the first failure.
    fn dispatch(&self, args: &LifecycleEventArgs<'_>) -> Result<()> {
        // Snapshot so a handler may register further handlers without deadlocking.
        let handlers: Vec<EventHandler> = match self.handlers.read().get(&args.kind) {
            Some(handlers) => handlers.clone(),
            None => {
                debug!("No handlers for event type: {}", args.kind);
                return Ok(());
            }
        };

        for handler in handlers {
            if let Err(e) = handler(args) {
                error!(
                    "Handler for {} failed on {} {}: {}",
                    args.kind,
                    args.type_name(),
                    args.object_id,
                    e
                );
                return Err(SoftDeleteError::listener(args.kind, e));
            }
        }
        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
