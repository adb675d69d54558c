//! Table change consumer.
//!
//! Producers (a database subscriber, a test harness) push batches of
//! [`KeyOpFieldsValues`] through a [`ConsumerSender`]; the owning Orch pulls
//! them into the [`Consumer`] where same-key operations are merged before
//! being drained.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

/// Operation type of a table change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Set operation (add or update)
    Set,
    /// Delete operation
    Del,
}

impl Operation {
    pub fn is_set(&self) -> bool {
        matches!(self, Operation::Set)
    }

    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "SET",
            Operation::Del => "DEL",
        }
    }
}

/// A field-value pair from a hash entry.
pub type FieldValue = (String, String);

/// Key, operation, and field-values tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpFieldsValues {
    /// The key (e.g., "ERROR_MONITOR:Ethernet0")
    pub key: String,
    pub op: Operation,
    /// Field-value pairs (empty for Del operations)
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    pub fn new(key: impl Into<String>, op: Operation, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op,
            fvs,
        }
    }

    /// Creates a Set entry.
    pub fn set(key: impl Into<String>, fvs: Vec<FieldValue>) -> Self {
        Self::new(key, Operation::Set, fvs)
    }

    /// Creates a Del entry.
    pub fn del(key: impl Into<String>) -> Self {
        Self::new(key, Operation::Del, vec![])
    }

    /// Returns the value for a field, if present.
    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }
}

/// Configuration for a Consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Table name (e.g., "ERROR_MONITOR")
    pub table_name: String,
    /// Maximum entries pulled from the channel per `pull()`
    pub batch_size: usize,
}

impl ConsumerConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            batch_size: 128,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Producer side of a [`Consumer`].
#[derive(Debug, Clone)]
pub struct ConsumerSender {
    tx: mpsc::UnboundedSender<Vec<KeyOpFieldsValues>>,
    waker: Option<Arc<Notify>>,
}

impl ConsumerSender {
    /// Signals `waker` after every queued batch.
    pub fn with_waker(mut self, waker: Arc<Notify>) -> Self {
        self.waker = Some(waker);
        self
    }

    /// Queues a batch. Returns false once the consumer has been dropped.
    pub fn send(&self, entries: Vec<KeyOpFieldsValues>) -> bool {
        if self.tx.send(entries).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker.notify_one();
        }
        true
    }
}

/// Merging queue of table changes.
///
/// When multiple operations arrive for the same key:
/// - SET after SET: field-values are merged, newer values win
/// - DEL: discards pending operations for the key
/// - SET after DEL: both are kept, in order
pub struct Consumer {
    config: ConsumerConfig,
    to_sync: BTreeMap<String, VecDeque<KeyOpFieldsValues>>,
    pending_count: usize,
    rx: Option<mpsc::UnboundedReceiver<Vec<KeyOpFieldsValues>>>,
}

impl Consumer {
    /// Creates a consumer fed only through [`Consumer::add_to_sync`].
    pub fn new(config: ConsumerConfig) -> Self {
        Self {
            config,
            to_sync: BTreeMap::new(),
            pending_count: 0,
            rx: None,
        }
    }

    /// Creates a consumer together with the sender feeding it.
    pub fn channel(config: ConsumerConfig) -> (Self, ConsumerSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut consumer = Self::new(config);
        consumer.rx = Some(rx);
        (consumer, ConsumerSender { tx, waker: None })
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Returns true if entries are queued here or still in the channel.
    pub fn has_pending(&self) -> bool {
        self.pending_count > 0 || self.rx.as_ref().is_some_and(|rx| !rx.is_empty())
    }

    /// Number of merged entries waiting to be drained.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Adds entries to the sync queue with deduplication.
    pub fn add_to_sync(&mut self, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            self.add_single_entry(entry);
        }
    }

    fn add_single_entry(&mut self, entry: KeyOpFieldsValues) {
        let queue = self.to_sync.entry(entry.key.clone()).or_default();

        if entry.op.is_del() {
            self.pending_count -= queue.len();
            queue.clear();
            queue.push_back(entry);
            self.pending_count += 1;
            return;
        }

        match queue.back_mut() {
            Some(last) if last.op.is_set() => {
                for (field, value) in entry.fvs {
                    match last.fvs.iter_mut().find(|(f, _)| *f == field) {
                        Some(existing) => existing.1 = value,
                        None => last.fvs.push((field, value)),
                    }
                }
            }
            _ => {
                queue.push_back(entry);
                self.pending_count += 1;
            }
        }
    }

    /// Moves up to `batch_size` channel batches into the sync queue.
    ///
    /// Returns the number of entries received.
    pub fn pull(&mut self) -> usize {
        let mut batches = Vec::new();
        if let Some(rx) = self.rx.as_mut() {
            while batches.len() < self.config.batch_size {
                match rx.try_recv() {
                    Ok(batch) => batches.push(batch),
                    Err(_) => break,
                }
            }
        }

        let mut received = 0;
        for batch in batches {
            received += batch.len();
            self.add_to_sync(batch);
        }
        received
    }

    /// Drains all pending entries, ordered by key then arrival.
    pub fn drain(&mut self) -> Vec<KeyOpFieldsValues> {
        let mut result = Vec::with_capacity(self.pending_count);
        for (_key, queue) in std::mem::take(&mut self.to_sync) {
            result.extend(queue);
        }
        self.pending_count = 0;
        result
    }

    /// Dumps pending entries for debugging.
    pub fn dump(&self) -> Vec<String> {
        self.to_sync
            .iter()
            .flat_map(|(key, queue)| {
                queue
                    .iter()
                    .map(move |e| format!("{}: {} {:?}", key, e.op.as_str(), e.fvs))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fv(field: &str, value: &str) -> FieldValue {
        (field.to_string(), value.to_string())
    }

    #[test]
    fn test_key_op_fields_values() {
        let entry = KeyOpFieldsValues::set(
            "ERROR_MONITOR:Ethernet0",
            vec![fv("tx_error_threshold", "10")],
        );

        assert!(entry.op.is_set());
        assert_eq!(entry.get_field("tx_error_threshold"), Some("10"));
        assert_eq!(entry.get_field("poll_interval"), None);
    }

    #[test]
    fn test_consumer_set_merge() {
        let mut consumer = Consumer::new(ConsumerConfig::new("ERROR_MONITOR"));

        consumer.add_to_sync(vec![KeyOpFieldsValues::set(
            "ERROR_MONITOR:Ethernet0",
            vec![fv("tx_error_threshold", "10")],
        )]);
        consumer.add_to_sync(vec![KeyOpFieldsValues::set(
            "ERROR_MONITOR:Ethernet0",
            vec![fv("tx_error_threshold", "20"), fv("tx_error_status", "enable")],
        )]);

        assert_eq!(consumer.pending_count(), 1);

        let entries = consumer.drain();
        assert_eq!(
            entries,
            vec![KeyOpFieldsValues::set(
                "ERROR_MONITOR:Ethernet0",
                vec![fv("tx_error_threshold", "20"), fv("tx_error_status", "enable")],
            )]
        );
        assert!(!consumer.has_pending());
    }

    #[test]
    fn test_consumer_del_ordering() {
        let mut consumer = Consumer::new(ConsumerConfig::new("ERROR_MONITOR"));

        consumer.add_to_sync(vec![
            KeyOpFieldsValues::set("ERROR_MONITOR:Ethernet0", vec![fv("tx_error_status", "enable")]),
            KeyOpFieldsValues::del("ERROR_MONITOR:Ethernet0"),
        ]);
        assert_eq!(consumer.pending_count(), 1);

        consumer.add_to_sync(vec![KeyOpFieldsValues::set(
            "ERROR_MONITOR:Ethernet0",
            vec![fv("tx_error_status", "disable")],
        )]);
        assert_eq!(consumer.pending_count(), 2);

        let entries = consumer.drain();
        assert!(entries[0].op.is_del());
        assert_eq!(entries[1].get_field("tx_error_status"), Some("disable"));
    }

    #[test]
    fn test_consumer_channel() {
        let (mut consumer, sender) = Consumer::channel(ConsumerConfig::new("ERROR_MONITOR"));
        assert!(!consumer.has_pending());

        assert!(sender.send(vec![
            KeyOpFieldsValues::set("ERROR_MONITOR:Ethernet0", vec![fv("tx_error_threshold", "1")]),
            KeyOpFieldsValues::set("ERROR_MONITOR:Ethernet4", vec![fv("tx_error_threshold", "2")]),
        ]));
        assert!(consumer.has_pending());
        assert_eq!(consumer.pending_count(), 0);

        assert_eq!(consumer.pull(), 2);
        assert_eq!(consumer.pending_count(), 2);
        assert_eq!(consumer.dump().len(), 2);
        assert_eq!(consumer.drain().len(), 2);
        assert!(!consumer.has_pending());
    }

    #[tokio::test]
    async fn test_sender_signals_waker() {
        let waker = Arc::new(Notify::new());
        let (mut consumer, sender) = Consumer::channel(ConsumerConfig::new("ERROR_MONITOR"));
        let sender = sender.with_waker(waker.clone());

        assert!(sender.send(vec![KeyOpFieldsValues::del("ERROR_MONITOR:Ethernet0")]));
        tokio::time::timeout(std::time::Duration::from_secs(1), waker.notified())
            .await
            .expect("send did not signal the waker");
        assert_eq!(consumer.pull(), 1);
    }

    #[test]
    fn test_sender_after_drop() {
        let (consumer, sender) = Consumer::channel(ConsumerConfig::new("ERROR_MONITOR"));
        drop(consumer);
        assert!(!sender.send(vec![]));
    }
}
