//! Redis table backend.
//!
//! SONiC keeps each table row as a Redis hash named `<TABLE><sep><key>`,
//! with `|` as the separator in CONFIG_DB and STATE_DB. [`RedisTable`]
//! implements [`DbTable`] over one such table with a blocking connection;
//! a flush is sent as a single MULTI/EXEC pipeline. Live reads go through
//! [`crate::watch_table`] and [`crate::watch_channel`].

use log::{debug, info};
use redis::Commands;

use crate::table::{DbTable, TableError, TableOp, TableResult};

/// Redis database selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedisDb {
    /// APPL_DB (database 0) - application state
    ApplDb = 0,
    /// CONFIG_DB (database 4) - switch configuration
    ConfigDb = 4,
    /// STATE_DB (database 6) - hardware state and statistics
    StateDb = 6,
}

/// Configuration for a Redis connection.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Database index
    pub db: u8,
}

impl RedisConfig {
    pub fn new(host: impl Into<String>, port: u16, db: RedisDb) -> Self {
        Self {
            host: host.into(),
            port,
            db: db as u8,
        }
    }

    /// Overrides the database index.
    pub fn with_db_index(mut self, db: u8) -> Self {
        self.db = db;
        self
    }

    pub(crate) fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// One SONiC table stored in Redis.
pub struct RedisTable {
    name: String,
    separator: String,
    connection: redis::Connection,
}

impl RedisTable {
    /// Opens a connection for `table_name` with the `|` separator.
    pub fn connect(config: &RedisConfig, table_name: impl Into<String>) -> TableResult<Self> {
        let name = table_name.into();
        let uri = config.uri();
        let connection = redis::Client::open(uri.as_str())
            .and_then(|client| client.get_connection())
            .map_err(|e| TableError::Connection {
                table: name.clone(),
                message: format!("{}: {}", uri, e),
            })?;

        info!("Connected to Redis {} for table {}", uri, name);

        Ok(Self {
            name,
            separator: "|".to_string(),
            connection,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{}{}", self.name, self.separator, key)
    }

    fn command_error(&self, command: &str, e: redis::RedisError) -> TableError {
        TableError::Command {
            table: self.name.clone(),
            message: format!("{} failed: {}", command, e),
        }
    }
}

impl DbTable for RedisTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn get_keys(&mut self) -> TableResult<Vec<String>> {
        let pattern = format!("{}{}*", self.name, self.separator);
        let keys: Vec<String> = self
            .connection
            .keys(&pattern)
            .map_err(|e| self.command_error("KEYS", e))?;

        let prefix_len = self.name.len() + self.separator.len();
        Ok(keys
            .into_iter()
            .filter_map(|k| k.get(prefix_len..).map(str::to_string))
            .collect())
    }

    fn hget(&mut self, key: &str, field: &str) -> TableResult<Option<String>> {
        let redis_key = self.redis_key(key);
        self.connection
            .hget(&redis_key, field)
            .map_err(|e| self.command_error("HGET", e))
    }

    fn apply(&mut self, ops: &[TableOp]) -> TableResult<()> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                TableOp::Set { key, fvs } => {
                    pipe.hset_multiple(self.redis_key(key), fvs.as_slice()).ignore();
                }
                TableOp::Del { key } => {
                    pipe.del(self.redis_key(key)).ignore();
                }
            }
        }

        pipe.query::<()>(&mut self.connection)
            .map_err(|e| self.command_error("EXEC", e))?;

        debug!("Committed {} ops to {}", ops.len(), self.name);
        Ok(())
    }
}
