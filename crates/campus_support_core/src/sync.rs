//! crates/campus_support_core/src/sync.rs
//!
//! The process-wide change-feed dispatcher. One feed subscription per table is
//! pumped into the dispatcher, which fans each event out to every view that has
//! registered a callback for that table.

use crate::ports::ChangeEvent;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, info};

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    by_table: HashMap<String, Vec<(u64, Callback)>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A panicking callback never runs under the lock, so the data is still consistent.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Publish/subscribe registry keyed by table name.
#[derive(Clone, Default)]
pub struct ChangeDispatcher {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for every event on `table`.
    ///
    /// The callback stays registered until the returned `Subscription` is dropped.
    /// Callbacks run synchronously inside `publish`, so they should only enqueue work.
    pub fn register<F>(&self, table: &str, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .by_table
            .entry(table.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        debug!(table, subscription_id = id, "Registered change listener");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            table: table.to_string(),
            id,
        }
    }

    /// Delivers `event` to every callback registered for its table.
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let callbacks: Vec<Callback> = {
            let registry = lock(&self.registry);
            registry
                .by_table
                .get(&event.table)
                .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in &callbacks {
            callback(event);
        }
        debug!(
            table = %event.table,
            kind = %event.kind,
            listeners = callbacks.len(),
            "Dispatched change event"
        );
        callbacks.len()
    }

    pub fn subscriber_count(&self, table: &str) -> usize {
        lock(&self.registry)
            .by_table
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Pumps a change stream into `publish` until the stream ends.
    /// Returns how many events were dispatched.
    pub async fn run<S>(&self, stream: S) -> usize
    where
        S: Stream<Item = ChangeEvent>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut dispatched = 0;
        while let Some(event) = stream.next().await {
            self.publish(&event);
            dispatched += 1;
        }
        info!(dispatched, "Change feed ended");
        dispatched
    }
}

/// Handle for one registered callback. Dropping it unregisters the callback.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    table: String,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        if let Some(entries) = registry.by_table.get_mut(&self.table) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                registry.by_table.remove(&self.table);
            }
        }
        debug!(table = %self.table, subscription_id = self.id, "Removed change listener");
    }
}
