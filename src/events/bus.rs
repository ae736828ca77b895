//! In-process publish/subscribe hub
//!
//! Handlers for an event kind run in descending priority order, ties in
//! registration order. A failing or panicking handler is logged and never
//! stops the others. Handlers are invoked outside the registry lock, so they
//! may publish or subscribe themselves.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, warn};

use super::{Event, EventKind};

type SyncHandler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;
type AsyncHandler = Arc<dyn Fn(Event) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Clone)]
enum Handler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

#[derive(Clone)]
struct Registration {
    id: u64,
    priority: i32,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<Registration>>,
}

/// Options for a subscription
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscribeOptions {
    /// Remove the handler after its first invocation
    pub once: bool,
    /// Higher runs first
    pub priority: i32,
}

#[cfg(test)]
impl SubscribeOptions {
    pub fn once() -> Self {
        Self {
            once: true,
            ..Self::default()
        }
    }

    pub fn priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }
}

/// Handle returned by `subscribe`; removes exactly that handler.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Deregister the handler. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = lock(&registry);
        let Some(list) = registry.handlers.get_mut(&self.kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != self.id);
        before != list.len()
    }
}

/// Cloneable event bus handle; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous handler.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F, options: SubscribeOptions) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Handler::Sync(Arc::new(handler)), options)
    }

    /// Register a handler whose work completes asynchronously.
    pub fn subscribe_async<F, Fut>(
        &self,
        kind: EventKind,
        handler: F,
        options: SubscribeOptions,
    ) -> Subscription
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler: AsyncHandler = Arc::new(move |event| handler(event).boxed());
        self.register(kind, Handler::Async(handler), options)
    }

    fn register(&self, kind: EventKind, handler: Handler, options: SubscribeOptions) -> Subscription {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;

        let list = registry.handlers.entry(kind).or_default();
        // After every handler with the same or higher priority
        let position = list
            .iter()
            .position(|r| r.priority < options.priority)
            .unwrap_or(list.len());
        list.insert(
            position,
            Registration {
                id,
                priority: options.priority,
                once: options.once,
                handler,
            },
        );

        Subscription {
            id,
            kind,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of handlers currently registered for `kind`
    #[cfg(test)]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        lock(&self.registry)
            .handlers
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Remove every handler
    #[cfg(test)]
    pub fn clear(&self) {
        lock(&self.registry).handlers.clear();
    }

    /// Snapshot the handlers for one dispatch, removing `once` handlers
    /// before any of them runs.
    fn dispatch_list(&self, kind: EventKind) -> Vec<Registration> {
        let mut registry = lock(&self.registry);
        let Some(list) = registry.handlers.get_mut(&kind) else {
            return Vec::new();
        };
        let snapshot = list.clone();
        list.retain(|r| !r.once);
        snapshot
    }

    /// Invoke every handler for the event synchronously.
    ///
    /// Async handlers are spawned on the current tokio runtime rather than
    /// awaited.
    pub fn publish(&self, event: &Event) {
        let kind = event.kind();
        let handlers = self.dispatch_list(kind);
        debug!("Publishing '{}' to {} handler(s)", kind, handlers.len());

        for registration in handlers {
            match registration.handler {
                Handler::Sync(handler) => invoke_sync(kind, &handler, event),
                Handler::Async(handler) => match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(settle(kind, handler(event.clone())));
                    }
                    Err(_) => warn!("No async runtime to run '{}' handler, skipping", kind),
                },
            }
        }
    }

    /// Invoke every handler and wait until all of their work has settled.
    ///
    /// Every handler is started before any is awaited; errors are logged,
    /// never returned.
    pub async fn publish_async(&self, event: Event) {
        let kind = event.kind();
        let handlers = self.dispatch_list(kind);
        debug!("Publishing '{}' to {} handler(s)", kind, handlers.len());

        let mut pending = Vec::new();
        for registration in handlers {
            match registration.handler {
                Handler::Sync(handler) => invoke_sync(kind, &handler, &event),
                Handler::Async(handler) => pending.push(settle(kind, handler(event.clone()))),
            }
        }
        futures::future::join_all(pending).await;
    }
}

fn invoke_sync(kind: EventKind, handler: &SyncHandler, event: &Event) {
    match std::panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("Handler for '{}' failed: {:#}", kind, err),
        Err(_) => warn!("Handler for '{}' panicked", kind),
    }
}

async fn settle(kind: EventKind, work: BoxFuture<'static, anyhow::Result<()>>) {
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("Async handler for '{}' failed: {:#}", kind, err),
        Err(_) => warn!("Async handler for '{}' panicked", kind),
    }
}
