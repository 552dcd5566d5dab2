//! Fire-and-forget notifications about content transitions
//!
//! The state machine emits a [`ContentEvent`] after every change it makes.
//! Delivery is best effort: a notifier that fails or has nobody listening
//! never affects the transition that produced the event.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::content::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Drafted,
    Reviewed,
    Revised,
    Approved,
    Posted,
    Noted,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentEvent {
    pub kind: EventKind,
    /// Item identity (file name)
    pub item: String,
    pub path: PathBuf,
    pub status: Status,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

/// Port the state machine reports to
pub trait Notifier: Send + Sync {
    fn notify(&self, event: ContentEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: ContentEvent) {}
}

/// Queues events on a channel for someone else to deliver
///
/// A lightweight handle that can be cloned freely; the paired
/// [`EventReceiver`] is drained by whoever owns delivery.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    tx: flume::Sender<ContentEvent>,
}

impl EventDispatcher {
    /// Create a new dispatcher and receiver pair
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, EventReceiver { rx })
    }
}

impl Notifier for EventDispatcher {
    fn notify(&self, event: ContentEvent) {
        tracing::debug!(item = %event.item, kind = ?event.kind, "queueing content event");
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver dropped; notification discarded");
        }
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    rx: flume::Receiver<ContentEvent>,
}

impl EventReceiver {
    /// Everything queued so far, without blocking
    pub fn drain(&self) -> Vec<ContentEvent> {
        self.rx.try_iter().collect()
    }
}
