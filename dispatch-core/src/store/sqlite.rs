//! SQLite-backed coordinate store.
//!
//! Rows live in a single `coordinates` table whose primary key is the
//! normalised address. Inserts use `INSERT OR IGNORE`, so two connections
//! racing to cache the same new address leave exactly one row behind and the
//! first writer's coordinate wins.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use thiserror::Error;

use crate::{Address, AddressError, Coordinate, CoordinateError};

use super::{CacheEntry, CoordinateStore};

/// SQLite limits bound parameters per statement to 999 by default. Batch
/// reads chunk their `IN` lists to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_COORDINATES_TABLE: &str = "CREATE TABLE IF NOT EXISTS coordinates (
    address TEXT PRIMARY KEY NOT NULL CHECK (length(trim(address)) > 0),
    lat REAL NOT NULL CHECK (lat BETWEEN -90 AND 90),
    lon REAL NOT NULL CHECK (lon BETWEEN -180 AND 180),
    resolved_at INTEGER NOT NULL
) WITHOUT ROWID";

/// Error raised when reading or writing cached coordinates.
#[derive(Debug, Error)]
pub enum SqliteCoordinateStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the `coordinates` table failed.
    #[error("failed to initialise coordinates schema: {source}")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored address key was blank.
    #[error("stored address {address:?} is invalid: {source}")]
    InvalidAddress {
        /// Raw key read from the database.
        address: String,
        /// Normalisation failure.
        #[source]
        source: AddressError,
    },
    /// A stored coordinate was out of range.
    #[error("stored coordinate for {address:?} is invalid: {source}")]
    InvalidCoordinate {
        /// Address whose row failed validation.
        address: String,
        /// Validation failure.
        #[source]
        source: CoordinateError,
    },
    /// A resolution timestamp could not be represented as Unix seconds.
    #[error("resolution timestamp for {address:?} is out of range")]
    TimestampOutOfRange {
        /// Address whose timestamp failed the conversion.
        address: String,
    },
    /// A previous holder of the connection panicked.
    #[error("SQLite connection lock was poisoned")]
    ConnectionPoisoned,
    /// Generic SQLite error when reading or writing rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Coordinate store persisted in SQLite.
///
/// One instance wraps one connection. Open several instances on the same
/// file to get independent connections; the table's uniqueness constraint
/// keeps concurrent inserts consistent across all of them.
pub struct SqliteCoordinateStore {
    connection: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl fmt::Debug for SqliteCoordinateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCoordinateStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl SqliteCoordinateStore {
    /// Open (or create) the store at `path`, creating the schema if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteCoordinateStoreError> {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteCoordinateStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Self::initialise(connection, Some(path.to_path_buf()))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, SqliteCoordinateStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| {
            SqliteCoordinateStoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            }
        })?;
        Self::initialise(connection, None)
    }

    fn initialise(
        connection: Connection,
        location: Option<PathBuf>,
    ) -> Result<Self, SqliteCoordinateStoreError> {
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| SqliteCoordinateStoreError::Schema { source })?;
        connection
            .execute(CREATE_COORDINATES_TABLE, [])
            .map_err(|source| SqliteCoordinateStoreError::Schema { source })?;
        Ok(Self {
            connection: Mutex::new(connection),
            location,
        })
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, SqliteCoordinateStoreError>,
    ) -> Result<T, SqliteCoordinateStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCoordinateStoreError::ConnectionPoisoned)?;
        operation(&guard)
    }
}

impl CoordinateStore for SqliteCoordinateStore {
    type Error = SqliteCoordinateStoreError;

    fn get(&self, address: &Address) -> Result<Option<CacheEntry>, Self::Error> {
        self.with_connection(|connection| {
            let raw = connection
                .query_row(
                    "SELECT address, lat, lon, resolved_at FROM coordinates WHERE address = ?1",
                    [address.key()],
                    read_raw_row,
                )
                .optional()?;
            raw.map(RawRow::into_entry).transpose()
        })
    }

    fn get_many(&self, addresses: &[Address]) -> Result<Vec<CacheEntry>, Self::Error> {
        let mut keys: Vec<&str> = addresses.iter().map(Address::key).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.with_connection(|connection| {
            let mut entries = Vec::with_capacity(keys.len());
            for chunk in keys.chunks(SQLITE_MAX_VARIABLE_NUMBER) {
                load_chunk(connection, chunk, &mut entries)?;
            }
            Ok(entries)
        })
    }

    fn insert_if_absent(&self, entry: &CacheEntry) -> Result<bool, Self::Error> {
        let resolved_at = unix_seconds(entry)?;
        self.with_connection(|connection| {
            let inserted = connection.execute(
                "INSERT OR IGNORE INTO coordinates (address, lat, lon, resolved_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (
                    entry.address.key(),
                    entry.coordinate.latitude(),
                    entry.coordinate.longitude(),
                    resolved_at,
                ),
            )?;
            Ok(inserted == 1)
        })
    }
}

fn load_chunk(
    connection: &Connection,
    keys: &[&str],
    entries: &mut Vec<CacheEntry>,
) -> Result<(), SqliteCoordinateStoreError> {
    let placeholders = vec!["?"; keys.len()].join(", ");
    let query = format!(
        "SELECT address, lat, lon, resolved_at FROM coordinates WHERE address IN ({placeholders})"
    );
    let mut statement = connection.prepare(&query)?;
    let mut rows = statement.query(params_from_iter(keys.iter()))?;
    while let Some(row) = rows.next()? {
        entries.push(read_raw_row(row)?.into_entry()?);
    }
    Ok(())
}

struct RawRow {
    address: String,
    lat: f64,
    lon: f64,
    resolved_at: i64,
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        address: row.get(0)?,
        lat: row.get(1)?,
        lon: row.get(2)?,
        resolved_at: row.get(3)?,
    })
}

impl RawRow {
    fn into_entry(self) -> Result<CacheEntry, SqliteCoordinateStoreError> {
        let coordinate = Coordinate::new(self.lat, self.lon).map_err(|source| {
            SqliteCoordinateStoreError::InvalidCoordinate {
                address: self.address.clone(),
                source,
            }
        })?;
        let resolved_at = u64::try_from(self.resolved_at)
            .ok()
            .and_then(|secs| UNIX_EPOCH.checked_add(Duration::from_secs(secs)))
            .ok_or_else(|| SqliteCoordinateStoreError::TimestampOutOfRange {
                address: self.address.clone(),
            })?;
        let address = Address::from_key(&self.address).map_err(|source| {
            SqliteCoordinateStoreError::InvalidAddress {
                address: self.address,
                source,
            }
        })?;
        Ok(CacheEntry {
            address,
            coordinate,
            resolved_at,
        })
    }
}

fn unix_seconds(entry: &CacheEntry) -> Result<i64, SqliteCoordinateStoreError> {
    entry
        .resolved_at
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_secs()).ok())
        .ok_or_else(|| SqliteCoordinateStoreError::TimestampOutOfRange {
            address: entry.address.key().to_owned(),
        })
}

/// Seconds-resolution view of a timestamp, as the store persists it.
#[cfg(test)]
fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(secs)
}
