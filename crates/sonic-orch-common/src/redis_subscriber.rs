//! Live Redis readers feeding consumers.
//!
//! [`watch_table`] follows one table through keyspace notifications
//! (`__keyspace@<db>__:<TABLE><sep><key>`). Every touched row is re-read and
//! forwarded as a SET, or as a DEL once the hash is gone. The server must
//! have `notify-keyspace-events` enabled for hash and generic events.
//!
//! [`watch_channel`] forwards messages published on a plain pub/sub channel.
//! A message is a JSON array `[op, data, field1, value1, ...]`.

use std::collections::HashMap;

use futures::StreamExt;
use log::{debug, info, warn};
use redis::AsyncCommands;

use crate::consumer::{ConsumerSender, KeyOpFieldsValues};
use crate::notification::{Notification, NotificationSender};
use crate::redis_backend::RedisConfig;
use crate::table::{TableError, TableResult};

/// What a keyspace event means for the row it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyspaceChange {
    /// Fields were written or removed; the row must be re-read.
    Touched(String),
    /// The whole row is gone.
    Removed(String),
}

/// Maps one keyspace message to a row change.
///
/// `channel` is the full keyspace channel, `event` the command name Redis
/// publishes. Keys outside `<table><separator>` and events that do not alter
/// a hash yield `None`.
pub fn parse_keyspace_event(
    channel: &str,
    event: &str,
    table: &str,
    separator: &str,
) -> Option<KeyspaceChange> {
    let (_, redis_key) = channel.split_once("__:")?;
    let row = redis_key.strip_prefix(table)?.strip_prefix(separator)?;
    if row.is_empty() {
        return None;
    }

    let redis_key = redis_key.to_string();
    match event {
        "hset" | "hmset" | "hsetnx" | "hdel" | "hincrby" | "rename_to" | "restore" => {
            Some(KeyspaceChange::Touched(redis_key))
        }
        "del" | "expired" | "evicted" | "rename_from" => Some(KeyspaceChange::Removed(redis_key)),
        _ => None,
    }
}

/// Decodes a `[op, data, field, value, ...]` channel message.
///
/// A trailing field without a value is dropped.
pub fn parse_notification(payload: &str) -> Option<Notification> {
    let items: Vec<String> = serde_json::from_str(payload).ok()?;
    let mut items = items.into_iter();
    let op = items.next()?;
    let data = items.next()?;

    let rest: Vec<String> = items.collect();
    let values = rest
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    Some(Notification::new(op, data).with_values(values))
}

fn connection_error(name: &str, config: &RedisConfig, e: redis::RedisError) -> TableError {
    TableError::Connection {
        table: name.to_string(),
        message: format!("{}: {}", config.uri(), e),
    }
}

fn command_error(name: &str, command: &str, e: redis::RedisError) -> TableError {
    TableError::Command {
        table: name.to_string(),
        message: format!("{} failed: {}", command, e),
    }
}

async fn read_row(
    conn: &mut redis::aio::MultiplexedConnection,
    table: &str,
    redis_key: String,
) -> TableResult<KeyOpFieldsValues> {
    let fvs: HashMap<String, String> = conn
        .hgetall(&redis_key)
        .await
        .map_err(|e| command_error(table, "HGETALL", e))?;
    if fvs.is_empty() {
        return Ok(KeyOpFieldsValues::del(redis_key));
    }
    let mut fvs: Vec<(String, String)> = fvs.into_iter().collect();
    fvs.sort();
    Ok(KeyOpFieldsValues::set(redis_key, fvs))
}

/// Streams changes of `table` into `sender` until the consumer goes away.
///
/// Existing rows are sent first as one batch. The subscription is made
/// before that read, so no change falls between the two.
pub async fn watch_table(
    config: RedisConfig,
    table: String,
    separator: String,
    sender: ConsumerSender,
) -> TableResult<()> {
    let client = redis::Client::open(config.uri().as_str())
        .map_err(|e| connection_error(&table, &config, e))?;
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| connection_error(&table, &config, e))?;
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| connection_error(&table, &config, e))?;

    let pattern = format!("__keyspace@{}__:{}{}*", config.db, table, separator);
    pubsub
        .psubscribe(&pattern)
        .await
        .map_err(|e| command_error(&table, "PSUBSCRIBE", e))?;
    info!("Watching {} through {}", table, pattern);

    let keys: Vec<String> = conn
        .keys(format!("{}{}*", table, separator))
        .await
        .map_err(|e| command_error(&table, "KEYS", e))?;
    let mut initial = Vec::with_capacity(keys.len());
    for key in keys {
        initial.push(read_row(&mut conn, &table, key).await?);
    }
    debug!("Read {} existing rows from {}", initial.len(), table);
    if !initial.is_empty() && !sender.send(initial) {
        return Ok(());
    }

    let mut messages = std::pin::pin!(pubsub.on_message());
    while let Some(msg) = messages.next().await {
        let event: String = match msg.get_payload() {
            Ok(event) => event,
            Err(e) => {
                warn!("Bad keyspace payload on {}: {}", msg.get_channel_name(), e);
                continue;
            }
        };
        let entry = match parse_keyspace_event(msg.get_channel_name(), &event, &table, &separator)
        {
            Some(KeyspaceChange::Touched(key)) => read_row(&mut conn, &table, key).await?,
            Some(KeyspaceChange::Removed(key)) => KeyOpFieldsValues::del(key),
            None => continue,
        };
        debug!("{} {} on {}", entry.op.as_str(), entry.key, table);
        if !sender.send(vec![entry]) {
            break;
        }
    }

    info!("Stopped watching {}", table);
    Ok(())
}

/// Forwards messages published on `channel` into `sender` until the
/// consumer goes away.
pub async fn watch_channel(
    config: RedisConfig,
    channel: String,
    sender: NotificationSender,
) -> TableResult<()> {
    let client = redis::Client::open(config.uri().as_str())
        .map_err(|e| connection_error(&channel, &config, e))?;
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| connection_error(&channel, &config, e))?;
    pubsub
        .subscribe(&channel)
        .await
        .map_err(|e| command_error(&channel, "SUBSCRIBE", e))?;
    info!("Subscribed to channel {}", channel);

    let mut messages = std::pin::pin!(pubsub.on_message());
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Bad payload on {}: {}", channel, e);
                continue;
            }
        };
        match parse_notification(&payload) {
            Some(notification) => {
                if !sender.send(notification) {
                    break;
                }
            }
            None => warn!("Malformed notification on {}: {}", channel, payload),
        }
    }

    info!("Unsubscribed from channel {}", channel);
    Ok(())
}
