//! # Live Channel
//!
//! Fan-out of [`LiveEvent`]s to every dashboard attached at publish time.
//!
//! ## Delivery
//!
//! - Each subscriber owns a bounded queue, publishing only ever uses `try_send`
//! - A full queue drops the event for that subscriber alone
//! - A closed queue detaches that subscriber
//! - Nothing is retained, late subscribers never see earlier events
//!
//! ## Bounds
//!
//! - At most `max_subscribers` attached at once, enumerable through [`Hub::subscriber_ids`]
//! - Dropping a [`Subscription`] detaches it
use std::{
    collections::BTreeMap,
    sync::{
        Arc, PoisonError, RwLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::{debug, info, warn};

use crate::{error::AppError, models::LiveEvent};

pub type SubscriberId = u64;

pub struct Hub {
    subscribers: RwLock<BTreeMap<SubscriberId, Sender<Arc<LiveEvent>>>>,
    next_id: AtomicU64,
    capacity: usize,
    max_subscribers: usize,
}

pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<Arc<LiveEvent>>,
    hub: Weak<Hub>,
}

impl Hub {
    pub fn new(capacity: usize, max_subscribers: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
            max_subscribers,
        })
    }

    pub fn subscribe(self: &Arc<Self>) -> Result<Subscription, AppError> {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);

        if subscribers.len() >= self.max_subscribers {
            warn!(limit = self.max_subscribers, "Rejecting subscriber, channel full");
            return Err(AppError::ChannelFull);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);
        subscribers.insert(id, sender);

        info!(subscriber = id, attached = subscribers.len(), "Subscriber attached");

        Ok(Subscription {
            id,
            receiver,
            hub: Arc::downgrade(self),
        })
    }

    /// Offers `event` to every current subscriber. Returns how many queued it.
    pub fn publish(&self, event: LiveEvent) -> usize {
        let kind = event.kind();
        let event = Arc::new(event);
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);

            for (&id, sender) in subscribers.iter() {
                match sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(subscriber = id, event = kind, "Dropped event, subscriber queue full");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(id),
                }
            }
        }

        for id in closed {
            debug!(subscriber = id, "Subscriber gone during publish");
            self.detach(id);
        }

        debug!(event = kind, delivered, "Published");

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn detach(&self, id: SubscriberId) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);

        if subscribers.remove(&id).is_some() {
            info!(subscriber = id, attached = subscribers.len(), "Subscriber detached");
        }
    }
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Arc<LiveEvent>> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<LiveEvent>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.detach(self.id);
        }
    }
}
