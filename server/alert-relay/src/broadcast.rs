//! Subscriber registry and best-effort fan-out.
//!
//! Every connected UI client holds a [`Subscription`]: one entry in a
//! `DashMap` plus the receiving half of an unbounded channel. A broadcast
//! clones the sender handles it finds and pushes one shared payload to each.
//! Nothing is retained: a subscriber only sees events sent while registered.

use dashmap::DashMap;
use futures_util::Stream;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::types::PushEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "sub-{}", self.0)
  }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
  /// Subscribers the event was handed to.
  pub delivered: usize,
  /// Subscribers whose connection was already gone; they were pruned.
  pub dropped: usize,
}

#[derive(Debug)]
struct Inner {
  subscribers: DashMap<SubscriberId, mpsc::UnboundedSender<PushEvent>>,
  next_id: AtomicU64,
  closed: AtomicBool,
}

/// Registry of connected subscribers. Clones share the same registry.
#[derive(Debug, Clone)]
pub struct Broadcaster {
  inner: Arc<Inner>,
}

impl Default for Broadcaster {
  fn default() -> Self {
    Self::new()
  }
}

impl Broadcaster {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        subscribers: DashMap::new(),
        next_id: AtomicU64::new(1),
        closed: AtomicBool::new(false),
      }),
    }
  }

  /// Add a subscriber. It receives every broadcast issued from now on; there
  /// is no backlog replay. After [`shutdown`](Self::shutdown) the returned
  /// subscription is already ended.
  pub fn register(&self) -> Subscription {
    let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = mpsc::unbounded_channel();

    if self.is_closed() {
      drop(tx);
    } else {
      self.inner.subscribers.insert(id, tx);
      // shutdown() may have cleared the map between the check and the insert.
      if self.is_closed() {
        self.inner.subscribers.remove(&id);
      }
    }

    tracing::debug!(subscriber = %id, total = self.subscriber_count(), "subscriber registered");
    Subscription {
      id,
      rx,
      registry: self.clone(),
    }
  }

  /// Remove a subscriber. Unknown or already-removed ids are ignored.
  pub fn unregister(&self, id: SubscriberId) {
    if self.inner.subscribers.remove(&id).is_some() {
      tracing::debug!(subscriber = %id, total = self.subscriber_count(), "subscriber unregistered");
    }
  }

  /// Push `payload` tagged with `event` to every registered subscriber.
  ///
  /// Delivery to each subscriber is independent: a closed connection is
  /// counted, pruned and skipped, never surfaced to the caller.
  pub fn broadcast(&self, event: &'static str, payload: Value) -> Delivery {
    let event = PushEvent::new(event, Arc::new(payload));

    // Snapshot the senders so no map shard lock is held while sending.
    let targets: Vec<(SubscriberId, mpsc::UnboundedSender<PushEvent>)> = self
      .inner
      .subscribers
      .iter()
      .map(|entry| (*entry.key(), entry.value().clone()))
      .collect();

    let mut delivery = Delivery::default();
    for (id, tx) in targets {
      match tx.send(event.clone()) {
        Ok(()) => delivery.delivered += 1,
        Err(_) => {
          delivery.dropped += 1;
          tracing::debug!(subscriber = %id, event = event.event, "subscriber gone, dropping");
          self.unregister(id);
        }
      }
    }
    delivery
  }

  pub fn subscriber_count(&self) -> usize {
    self.inner.subscribers.len()
  }

  pub fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::SeqCst)
  }

  /// Close the registry: every open subscription ends after draining what it
  /// already received, and nothing new is accepted.
  pub fn shutdown(&self) {
    if self.inner.closed.swap(true, Ordering::SeqCst) {
      return;
    }
    let count = self.subscriber_count();
    self.inner.subscribers.clear();
    tracing::info!(subscribers = count, "broadcaster shut down");
  }
}

/// A live registration. Dropping it unregisters the subscriber.
#[derive(Debug)]
pub struct Subscription {
  id: SubscriberId,
  rx: mpsc::UnboundedReceiver<PushEvent>,
  registry: Broadcaster,
}

impl Subscription {
  pub fn id(&self) -> SubscriberId {
    self.id
  }

  /// Next event, or `None` once the broadcaster is shut down.
  pub async fn recv(&mut self) -> Option<PushEvent> {
    self.rx.recv().await
  }

  /// Non-blocking variant of [`recv`](Self::recv).
  pub fn try_recv(&mut self) -> Option<PushEvent> {
    self.rx.try_recv().ok()
  }
}

impl Stream for Subscription {
  type Item = PushEvent;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PushEvent>> {
    self.get_mut().rx.poll_recv(cx)
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.registry.unregister(self.id);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  /// Register an entry whose receiving side is already gone, as if the
  /// client's connection broke without the stream being dropped yet.
  fn register_broken(b: &Broadcaster) -> SubscriberId {
    let id = SubscriberId(b.inner.next_id.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    b.inner.subscribers.insert(id, tx);
    id
  }

  #[test]
  fn broadcast_reaches_every_subscriber() {
    let b = Broadcaster::new();
    let mut subs: Vec<Subscription> = (0..3).map(|_| b.register()).collect();

    let delivery = b.broadcast("new_alert", json!({"rule": "x"}));
    assert_eq!(delivery, Delivery { delivered: 3, dropped: 0 });

    for sub in subs.iter_mut() {
      let event = sub.try_recv().expect("event delivered");
      assert_eq!(event.event, "new_alert");
      assert_eq!(*event.payload, json!({"rule": "x"}));
      assert!(sub.try_recv().is_none(), "exactly one delivery");
    }
  }

  #[test]
  fn no_backlog_for_late_subscribers() {
    let b = Broadcaster::new();
    b.broadcast("new_alert", json!({"rule": "early"}));
    let mut late = b.register();
    assert!(late.try_recv().is_none());
  }

  #[test]
  fn dropped_subscription_is_unregistered() {
    let b = Broadcaster::new();
    let keep = b.register();
    let gone = b.register();
    assert_eq!(b.subscriber_count(), 2);

    drop(gone);
    assert_eq!(b.subscriber_count(), 1);

    let delivery = b.broadcast("new_alert", json!({}));
    assert_eq!(delivery.delivered, 1);
    drop(keep);
    assert_eq!(b.subscriber_count(), 0);
  }

  #[test]
  fn broken_subscriber_does_not_affect_others() {
    let b = Broadcaster::new();
    let mut a = b.register();
    let broken = register_broken(&b);
    let mut c = b.register();

    let delivery = b.broadcast("new_alert", json!({"rule": "x"}));
    assert_eq!(delivery, Delivery { delivered: 2, dropped: 1 });
    assert!(a.try_recv().is_some());
    assert!(c.try_recv().is_some());

    // Pruned after the failed send.
    assert_eq!(b.subscriber_count(), 2);
    b.unregister(broken);
  }

  #[test]
  fn unregister_is_idempotent() {
    let b = Broadcaster::new();
    let sub = b.register();
    let id = sub.id();
    b.unregister(id);
    b.unregister(id);
    drop(sub);
    assert_eq!(b.subscriber_count(), 0);
  }

  #[tokio::test]
  async fn shutdown_ends_open_subscriptions() {
    let b = Broadcaster::new();
    let mut sub = b.register();
    b.broadcast("new_alert", json!({"rule": "last"}));
    b.shutdown();

    // Already-queued events still drain, then the stream ends.
    assert!(sub.recv().await.is_some());
    assert!(sub.recv().await.is_none());

    let mut after = b.register();
    assert!(after.recv().await.is_none());
    assert_eq!(b.broadcast("new_alert", json!({})).delivered, 0);
  }

  #[tokio::test]
  async fn concurrent_register_and_broadcast() {
    let b = Broadcaster::new();
    let mut handles = Vec::new();
    for i in 0..16 {
      let b = b.clone();
      handles.push(tokio::spawn(async move {
        let sub = b.register();
        b.broadcast("new_alert", json!({ "n": i }));
        drop(sub);
      }));
    }
    for h in handles {
      h.await.unwrap();
    }
    assert_eq!(b.subscriber_count(), 0);
  }
}
