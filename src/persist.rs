// used for persistence
use rusqlite::{Connection, Error, params};
use rusqlite::types::{Value as SqlValue, ValueRef};
// so the suite name pattern is compiled once
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::datatype::{Storable, StoredValue};
use crate::error::{Result, StowageError};
use crate::schema::StoreConfig;

// The default namespace is the reserved empty suite. Named suites must be
// nonempty and match SUITE_NAME, so the two kinds cannot collide.
const DEFAULT_SUITE: &str = "";

lazy_static! {
    static ref SUITE_NAME: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

/// The key-value backend interface consumed by the synthesized accessors.
///
/// Both operations are total: a `set` that cannot take effect is a no-op
/// and a `get` that cannot produce a value returns `None`. Callers supply
/// their own fallback on read.
pub trait KeyValueStore: Send + Sync {
    fn set(&self, config: &StoreConfig, key: &str, value: StoredValue);
    fn get(&self, config: &StoreConfig, key: &str) -> Option<StoredValue>;
}

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// ------------- Persistence -------------
/// Owns the SQLite connection and the key-value schema: one row per
/// (suite, key) with the value and a reference into the data type
/// dimension. Writes are last-write-wins upserts.
pub struct Persistor {
    db: Connection,
    seen_data_types: Vec<u8>,
}

impl Persistor {
    pub fn new(mode: &PersistenceMode) -> Result<Self> {
        let db = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        db.execute_batch(
            "
            create table if not exists Suite (
                Suite_Identity integer not null,
                Suite text not null,
                Reserved integer not null,
                constraint referenceable_Suite_Identity primary key (
                    Suite_Identity
                ),
                constraint unique_Suite unique (
                    Suite
                )
            );
            create table if not exists DataType (
                DataType_Identity integer not null,
                DataType text not null,
                constraint referenceable_DataType_Identity primary key (
                    DataType_Identity
                ),
                constraint unique_DataType unique (
                    DataType
                )
            );
            create table if not exists Entry (
                Suite_Identity integer not null,
                Key text not null,
                AppearingValue any null,
                ValueType_Identity integer not null,
                constraint Entry_in_Suite foreign key (
                    Suite_Identity
                ) references Suite(Suite_Identity),
                constraint ValueType_is_DataType foreign key (
                    ValueType_Identity
                ) references DataType(DataType_Identity),
                constraint unique_Entry primary key (
                    Suite_Identity,
                    Key
                )
            );
            ",
        )?;
        // Reserve the default namespace so it always exists.
        db.execute(
            "insert or ignore into Suite (Suite_Identity, Suite, Reserved) values (0, ?, 1)",
            params![DEFAULT_SUITE],
        )?;
        Ok(Self {
            db,
            seen_data_types: Vec::new(),
        })
    }

    /// Looks a suite up by name, creating it when `create` is set.
    fn suite_identity(&mut self, suite: &str, create: bool) -> Result<Option<i64>> {
        let mut lookup = self
            .db
            .prepare_cached("select Suite_Identity from Suite where Suite = ?")?;
        match lookup.query_row(params![suite], |row| row.get(0)) {
            Ok(identity) => Ok(Some(identity)),
            Err(Error::QueryReturnedNoRows) if create => {
                self.db.execute(
                    "insert into Suite (Suite, Reserved) values (?, 0)",
                    params![suite],
                )?;
                Ok(Some(self.db.last_insert_rowid()))
            }
            Err(Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn ensure_data_type(&mut self, value: &StoredValue) -> Result<()> {
        if !self.seen_data_types.contains(&value.uid()) {
            self.db.execute(
                "insert or ignore into DataType (DataType_Identity, DataType) values (?, ?)",
                params![value.uid(), value.data_type()],
            )?;
            self.seen_data_types.push(value.uid());
        }
        Ok(())
    }

    pub fn upsert_entry(&mut self, suite: &str, key: &str, value: &StoredValue) -> Result<()> {
        self.ensure_data_type(value)?;
        let identity = self
            .suite_identity(suite, true)?
            .ok_or_else(|| StowageError::Persistence(format!("suite '{suite}' unavailable")))?;
        let mut upsert = self.db.prepare_cached(
            "
            insert into Entry (
                Suite_Identity,
                Key,
                AppearingValue,
                ValueType_Identity
            ) values (?, ?, ?, ?)
            on conflict (Suite_Identity, Key) do update set
                AppearingValue = excluded.AppearingValue,
                ValueType_Identity = excluded.ValueType_Identity
            ",
        )?;
        upsert.execute(params![identity, key, appearing_value(value)?, value.uid()])?;
        Ok(())
    }

    pub fn get_entry(&mut self, suite: &str, key: &str) -> Result<Option<StoredValue>> {
        let Some(identity) = self.suite_identity(suite, false)? else {
            return Ok(None);
        };
        let mut select = self.db.prepare_cached(
            "
            select e.AppearingValue,
                    d.DataType as ValueType
                from Entry e
                join DataType d
                on d.DataType_Identity = e.ValueType_Identity
                where e.Suite_Identity = ?
                and e.Key = ?
            ",
        )?;
        let entry = select.query_row(params![identity, key], |row| {
            let value_type: String = row.get(1)?;
            Ok(convert(&value_type, &row.get_ref(0)?))
        });
        match entry {
            Ok(value) => Ok(value),
            Err(Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Maps a stored value onto a SQLite column value. Scalars keep their
/// native affinity; collections travel as their self-describing JSON form.
fn appearing_value(value: &StoredValue) -> Result<SqlValue> {
    Ok(match value {
        StoredValue::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        StoredValue::Integer(i) => SqlValue::Integer(*i),
        StoredValue::Float(f) => SqlValue::Real(*f),
        StoredValue::Text(s) => SqlValue::Text(s.clone()),
        StoredValue::Blob(b) => SqlValue::Blob(b.clone()),
        StoredValue::Date(d) => SqlValue::Text(d.to_string()),
        StoredValue::Timestamp(t) => SqlValue::Text(t.to_string()),
        StoredValue::List(_) | StoredValue::Map(_) => SqlValue::Text(
            serde_json::to_string(value)
                .map_err(|e| StowageError::Persistence(e.to_string()))?,
        ),
        StoredValue::Encoded(b) => SqlValue::Blob(b.clone()),
    })
}

/// Rebuilds a stored value from its column value and data type name. Any
/// mismatch comes back as `None` and is absorbed by the caller.
fn convert(data_type: &str, value: &ValueRef) -> Option<StoredValue> {
    match data_type {
        "Boolean" => value.as_i64().ok().map(|i| StoredValue::Boolean(i != 0)),
        "Integer" => value.as_i64().ok().map(StoredValue::Integer),
        "Float" => value.as_f64().ok().map(StoredValue::Float),
        "Text" => value.as_str().ok().map(|s| StoredValue::Text(s.to_owned())),
        "Blob" => value.as_blob().ok().map(|b| StoredValue::Blob(b.to_vec())),
        "Date" => value
            .as_str()
            .ok()
            .and_then(|s| s.parse().ok())
            .map(StoredValue::Date),
        "Timestamp" => value
            .as_str()
            .ok()
            .and_then(|s| s.parse().ok())
            .map(StoredValue::Timestamp),
        "List" | "Map" => value.as_str().ok().and_then(|s| serde_json::from_str(s).ok()),
        "Encoded" => value.as_blob().ok().map(|b| StoredValue::Encoded(b.to_vec())),
        _ => None,
    }
}

// ------------- Store -------------
/// Front end over the persistor: namespace selection, suite validation and
/// the fail-open policy. Persistence is advisory; nothing in here ever
/// raises to a property accessor.
pub struct Store {
    persistor: Mutex<Persistor>,
}

impl Store {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        Ok(Self {
            persistor: Mutex::new(Persistor::new(&mode)?),
        })
    }

    /// Typed read with default-value fallback: a missing entry, an
    /// unopenable suite or a value of the wrong shape all yield `fallback`.
    pub fn get_or<T: Storable>(&self, config: &StoreConfig, key: &str, fallback: T) -> T {
        self.get(config, key)
            .and_then(|value| T::from_stored(&value))
            .unwrap_or(fallback)
    }

    /// Resolves a store config to a suite name, or `None` when the named
    /// namespace cannot be opened.
    fn suite_of(config: &StoreConfig) -> Option<&str> {
        match config {
            StoreConfig::Default => Some(DEFAULT_SUITE),
            StoreConfig::NamedSuite(name) if SUITE_NAME.is_match(name) => Some(name.as_str()),
            StoreConfig::NamedSuite(name) => {
                warn!(suite = %name, "suite name rejected");
                None
            }
        }
    }
}

impl KeyValueStore for Store {
    fn set(&self, config: &StoreConfig, key: &str, value: StoredValue) {
        let Some(suite) = Store::suite_of(config) else {
            return;
        };
        let mut persistor = match self.persistor.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(%key, "store lock poisoned, write dropped");
                return;
            }
        };
        if let Err(e) = persistor.upsert_entry(suite, key, &value) {
            warn!(error = %e, %key, store = %config, "write dropped");
        } else {
            debug!(%key, store = %config, "stored");
        }
    }

    fn get(&self, config: &StoreConfig, key: &str) -> Option<StoredValue> {
        let suite = Store::suite_of(config)?;
        let mut persistor = match self.persistor.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(%key, "store lock poisoned, read skipped");
                return None;
            }
        };
        match persistor.get_entry(suite, key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, %key, store = %config, "read failed");
                None
            }
        }
    }
}
