//! Notification channel consumer.
//!
//! Notifications are fire-and-forget messages published on a named channel
//! (for example `CLEAR_ERROR_MONITOR`). Each carries an operation tag, a
//! data payload and optional field-values.

use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::consumer::FieldValue;

/// A single channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub op: String,
    pub data: String,
    pub values: Vec<FieldValue>,
}

impl Notification {
    pub fn new(op: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            data: data.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<FieldValue>) -> Self {
        self.values = values;
        self
    }
}

/// Publisher side of a [`NotificationConsumer`].
#[derive(Debug, Clone)]
pub struct NotificationSender {
    channel: String,
    tx: mpsc::UnboundedSender<Notification>,
    waker: Option<Arc<Notify>>,
}

impl NotificationSender {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Signals `waker` after every published notification.
    pub fn with_waker(mut self, waker: Arc<Notify>) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Returns false once the consumer has been dropped.
    pub fn send(&self, notification: Notification) -> bool {
        if self.tx.send(notification).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker.notify_one();
        }
        true
    }
}

/// Receives notifications published on one channel, in order.
pub struct NotificationConsumer {
    channel: String,
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationConsumer {
    /// Subscribes to `channel`.
    pub fn channel(channel: impl Into<String>) -> (Self, NotificationSender) {
        let channel = channel.into();
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                channel: channel.clone(),
                rx,
            },
            NotificationSender {
                channel,
                tx,
                waker: None,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.channel
    }

    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Takes the next notification, if any.
    pub fn pop(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Takes every queued notification.
    pub fn pops(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Some(n) = self.pop() {
            out.push(n);
        }
        out
    }
}
