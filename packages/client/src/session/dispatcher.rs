//! Fan-out of inbound chat messages to registered handlers.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    domain::{ChatMessage, ValueObjectError},
    infrastructure::dto::websocket as dto,
};

/// Why an inbound body was not delivered
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed message body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    Invalid(#[from] ValueObjectError),
}

type Handler = Box<dyn Fn(&ChatMessage) + Send + Sync>;

struct Registration {
    id: u64,
    active: AtomicBool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    // registration order
    handlers: Mutex<Vec<Arc<Registration>>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        let mut handlers = self.handlers.lock();
        if let Some(index) = handlers.iter().position(|r| r.id == id) {
            let registration = handlers.remove(index);
            registration.active.store(false, Ordering::Release);
        }
    }
}

/// Delivers every inbound [`ChatMessage`] to every registered handler
///
/// Cloning yields another handle to the same handler set.
#[derive(Clone, Default)]
pub struct MessageDispatcher {
    registry: Arc<Registry>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages arriving from now on
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let registration = Arc::new(Registration {
            id,
            active: AtomicBool::new(true),
            handler: Box::new(handler),
        });
        self.registry.handlers.lock().push(registration);
        tracing::debug!("Registered message handler {}", id);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every active handler with `message`, in registration order.
    ///
    /// Handlers run without the registry lock held. A panicking handler is
    /// logged and skipped.
    pub fn dispatch(&self, message: &ChatMessage) {
        let snapshot: Vec<Arc<Registration>> = self.registry.handlers.lock().clone();

        for registration in snapshot {
            // unsubscribed by an earlier handler of this dispatch
            if !registration.active.load(Ordering::Acquire) {
                continue;
            }
            let result = panic::catch_unwind(AssertUnwindSafe(|| (registration.handler)(message)));
            if result.is_err() {
                tracing::error!(
                    "Message handler {} panicked; delivering to the remaining handlers",
                    registration.id
                );
            }
        }
    }

    /// Parse a JSON message body and dispatch it
    pub fn dispatch_raw(&self, body: &str) -> Result<(), DispatchError> {
        let dto: dto::ChatMessage = serde_json::from_str(body)?;
        let message = ChatMessage::try_from(dto)?;
        self.dispatch(&message);
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.registry.handlers.lock().len()
    }
}

impl fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("handler_count", &self.handler_count())
            .finish()
    }
}

/// Capability to remove one registered handler
///
/// Dropping it leaves the handler registered.
#[must_use = "dropping a Subscription keeps the handler registered; call unsubscribe() to remove it"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Remove exactly this handler
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::debug!("Removed message handler {}", self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
