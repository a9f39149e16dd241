//! Session change channel.
//!
//! [`SessionEvents`] is the emitter a session provider embeds. Each
//! subscriber gets its own unbounded queue, so events are never dropped and
//! always arrive in emission order.

use crate::Session;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::trace;

type Subscribers = Vec<(u64, mpsc::UnboundedSender<Option<Session>>)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Subscribers,
}

/// Fan-out emitter for session changes.
#[derive(Default)]
pub struct SessionEvents {
    registry: Arc<Mutex<Registry>>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> SessionSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.push((id, sender));

        trace!(subscription_id = id, "session subscriber registered");

        SessionSubscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `session` to every live subscriber. Returns how many got it.
    pub fn emit(&self, session: Option<Session>) -> usize {
        let mut registry = self.registry.lock();
        registry
            .subscribers
            .retain(|(_, sender)| sender.send(session.clone()).is_ok());
        registry.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

/// One registration on a [`SessionEvents`] emitter.
pub struct SessionSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<Option<Session>>,
    registry: Weak<Mutex<Registry>>,
}

impl SessionSubscription {
    /// Next change, or `None` once unsubscribed or the emitter is gone.
    pub async fn recv(&mut self) -> Option<Option<Session>> {
        self.receiver.recv().await
    }

    /// Deregister. Events already queued are discarded.
    pub fn unsubscribe(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
        self.registry = Weak::new();
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
