//! SQLite-backed listing store.
//!
//! Writes go through one connection behind a mutex; SQLite admits a single
//! writer anyway. Reads check out a read-only connection from an r2d2 pool,
//! so searches never queue behind each other or behind a write. File
//! databases run in WAL mode so pooled readers see committed data while a
//! write is in progress.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{ManageConnection, Pool, PooledConnection};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, ToSql};
use tracing::debug;

use crate::config::DatabaseConfig;

use super::distance::{distance_from_parts, SQL_FUNCTION_NAME};
use super::domain::{Coordinate, ListingType, Property, PropertyDraft, PropertyId};
use super::format::RawPropertyRow;
use super::query::{ComposedQuery, SqlParam};
use super::registration::{NewStudent, StudentId};
use super::repository::{PropertyRepository, RepositoryError, StudentRepository};

const READER_POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static NEXT_MEMORY_DATABASE: AtomicUsize = AtomicUsize::new(0);

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    price INTEGER NOT NULL CHECK (price > 0),
    bedrooms INTEGER NOT NULL CHECK (bedrooms >= 0),
    bathrooms REAL NOT NULL CHECK (bathrooms >= 0),
    sqft INTEGER NOT NULL CHECK (sqft >= 0),
    address TEXT NOT NULL,
    description TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('rent', 'sale')),
    near_university TEXT,
    latitude REAL,
    longitude REAL,
    created_at TEXT NOT NULL,
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE TABLE IF NOT EXISTS property_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
    image_url TEXT NOT NULL,
    display_order INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_property_images_property
    ON property_images (property_id, display_order);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    student_id TEXT NOT NULL,
    university TEXT NOT NULL,
    major TEXT,
    graduation_year INTEGER,
    phone_number TEXT,
    preferred_contact TEXT NOT NULL,
    registered_at TEXT NOT NULL
);
";

impl From<rusqlite::Error> for RepositoryError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::Decode(value.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for RepositoryError {
    fn from(value: r2d2::Error) -> Self {
        Self::Unavailable(value.to_string())
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Integer(value) => ToSqlOutput::from(*value),
            SqlParam::Real(value) => ToSqlOutput::from(*value),
            SqlParam::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| RepositoryError::Decode(format!("created_at '{raw}': {err}")))
}

/// Column layout of the composed listing projection.
struct StoredRow {
    id: i64,
    price: i64,
    bedrooms: i64,
    bathrooms: f64,
    sqft: i64,
    address: String,
    description: String,
    listing_type: String,
    near_university: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: String,
    images: Option<String>,
    distance: Option<f64>,
}

impl StoredRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            price: row.get(1)?,
            bedrooms: row.get(2)?,
            bathrooms: row.get(3)?,
            sqft: row.get(4)?,
            address: row.get(5)?,
            description: row.get(6)?,
            listing_type: row.get(7)?,
            near_university: row.get(8)?,
            latitude: row.get(9)?,
            longitude: row.get(10)?,
            created_at: row.get(11)?,
            images: row.get(12)?,
            distance: row.get(13)?,
        })
    }

    fn into_raw(self) -> Result<RawPropertyRow, RepositoryError> {
        let listing_type = ListingType::parse(&self.listing_type).ok_or_else(|| {
            RepositoryError::Decode(format!(
                "property {} has unknown type '{}'",
                self.id, self.listing_type
            ))
        })?;

        let location = match (self.latitude, self.longitude) {
            (None, None) => None,
            (Some(_), Some(_)) => Coordinate::from_parts(self.latitude, self.longitude),
            _ => {
                return Err(RepositoryError::Decode(format!(
                    "property {} has half a coordinate",
                    self.id
                )))
            }
        };

        Ok(RawPropertyRow {
            property: Property {
                id: PropertyId(self.id),
                price: self.price,
                bedrooms: self.bedrooms,
                bathrooms: self.bathrooms,
                sqft: self.sqft,
                address: self.address,
                description: self.description,
                listing_type,
                near_university: self.near_university,
                location,
                created_at: decode_timestamp(&self.created_at)?,
            },
            images: self.images,
            distance: self.distance,
        })
    }
}

fn register_distance_function(connection: &Connection) -> rusqlite::Result<()> {
    connection.create_scalar_function(
        SQL_FUNCTION_NAME,
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(distance_from_parts(
                ctx.get::<Option<f64>>(0)?,
                ctx.get::<Option<f64>>(1)?,
                ctx.get::<Option<f64>>(2)?,
                ctx.get::<Option<f64>>(3)?,
            ))
        },
    )
}

/// Opens read-only connections to the store's database for the reader pool.
#[derive(Debug)]
struct ReaderManager {
    target: PathBuf,
}

impl ManageConnection for ReaderManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        let connection = Connection::open(&self.target)?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.pragma_update(None, "query_only", true)?;
        register_distance_function(&connection)?;
        Ok(connection)
    }

    fn is_valid(&self, connection: &mut Connection) -> Result<(), rusqlite::Error> {
        connection.query_row("SELECT 1", [], |_| Ok(()))
    }

    fn has_broken(&self, _connection: &mut Connection) -> bool {
        false
    }
}

fn insert_property(
    connection: &Connection,
    draft: &PropertyDraft,
    created_at: DateTime<Utc>,
) -> Result<PropertyId, RepositoryError> {
    connection.execute(
        "INSERT INTO properties (price, bedrooms, bathrooms, sqft, address, description, \
         type, near_university, latitude, longitude, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            draft.price,
            draft.bedrooms,
            draft.bathrooms,
            draft.sqft,
            draft.address,
            draft.description,
            draft.listing_type.as_str(),
            draft.near_university,
            draft.location.map(|point| point.latitude),
            draft.location.map(|point| point.longitude),
            encode_timestamp(created_at),
        ],
    )?;
    let id = connection.last_insert_rowid();

    let mut insert_image = connection.prepare(
        "INSERT INTO property_images (property_id, image_url, display_order) \
         VALUES (?1, ?2, ?3)",
    )?;
    for (order, image) in draft.images.iter().enumerate() {
        let order =
            i64::try_from(order).map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        insert_image.execute(params![id, image, order])?;
    }

    Ok(PropertyId(id))
}

fn count_listings(connection: &Connection) -> Result<usize, RepositoryError> {
    let count: i64 =
        connection.query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
    usize::try_from(count).map_err(|err| RepositoryError::Decode(err.to_string()))
}

/// Listing and registration storage: one writer connection plus a pool of readers.
pub struct SqliteListingStore {
    writer: Mutex<Connection>,
    readers: Pool<ReaderManager>,
}

impl SqliteListingStore {
    /// Open the database and create the schema.
    ///
    /// `:memory:` becomes a uniquely named shared-cache database so pooled
    /// readers see the writer's data; the writer connection keeps it alive.
    pub fn open(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let target = match config {
            DatabaseConfig::InMemory => PathBuf::from(format!(
                "file:campus-listings-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                NEXT_MEMORY_DATABASE.fetch_add(1, Ordering::Relaxed)
            )),
            DatabaseConfig::File(path) => path.clone(),
        };

        let writer = Connection::open(&target)?;
        writer.busy_timeout(BUSY_TIMEOUT)?;
        if matches!(config, DatabaseConfig::File(_)) {
            let mode: String =
                writer.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!(journal_mode = %mode, "listing database opened");
        }
        writer.execute_batch(SCHEMA)?;

        let readers = Pool::builder()
            .max_size(READER_POOL_SIZE)
            .connection_timeout(BUSY_TIMEOUT)
            .build(ReaderManager { target })?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
        })
    }

    pub fn in_memory() -> Result<Self, RepositoryError> {
        Self::open(&DatabaseConfig::InMemory)
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.writer
            .lock()
            .map_err(|_| RepositoryError::Unavailable("writer lock poisoned".to_string()))
    }

    fn reader(&self) -> Result<PooledConnection<ReaderManager>, RepositoryError> {
        Ok(self.readers.get()?)
    }

    /// Insert a batch of listings in one transaction, optionally wiping the
    /// catalog first. Nothing changes unless every insert succeeds.
    pub fn load_listings(
        &self,
        listings: &[(PropertyDraft, DateTime<Utc>)],
        replace: bool,
    ) -> Result<usize, RepositoryError> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        if replace {
            tx.execute_batch("DELETE FROM property_images; DELETE FROM properties;")?;
        }
        for (draft, created_at) in listings {
            insert_property(&tx, draft, *created_at)?;
        }
        let total = count_listings(&tx)?;
        tx.commit()?;
        Ok(total)
    }

    pub fn listing_count(&self) -> Result<usize, RepositoryError> {
        count_listings(&*self.reader()?)
    }
}

impl PropertyRepository for SqliteListingStore {
    fn search(&self, query: &ComposedQuery) -> Result<Vec<RawPropertyRow>, RepositoryError> {
        let connection = self.reader()?;
        let mut statement = connection.prepare(&query.sql)?;
        let stored = statement
            .query_map(params_from_iter(query.params.iter()), StoredRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = stored.len(), "listing query executed");
        stored.into_iter().map(StoredRow::into_raw).collect()
    }

    fn insert(
        &self,
        draft: &PropertyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<PropertyId, RepositoryError> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        let id = insert_property(&tx, draft, created_at)?;
        tx.commit()?;
        Ok(id)
    }

    fn universities(&self) -> Result<Vec<String>, RepositoryError> {
        let connection = self.reader()?;
        let mut statement = connection.prepare(
            "SELECT DISTINCT near_university FROM properties \
             WHERE near_university IS NOT NULL ORDER BY near_university ASC",
        )?;
        let names = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl StudentRepository for SqliteListingStore {
    fn register(
        &self,
        student: &NewStudent,
        registered_at: DateTime<Utc>,
    ) -> Result<StudentId, RepositoryError> {
        let connection = self.writer()?;
        let inserted = connection.execute(
            "INSERT INTO students (first_name, last_name, email, student_id, university, major, \
             graduation_year, phone_number, preferred_contact, registered_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                student.first_name,
                student.last_name,
                student.email,
                student.student_id,
                student.university,
                student.major,
                student.graduation_year,
                student.phone_number,
                student.preferred_contact.as_str(),
                encode_timestamp(registered_at),
            ],
        );

        match inserted {
            Ok(_) => Ok(StudentId(connection.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepositoryError::Conflict(format!(
                    "student email {}",
                    student.email
                )))
            }
            Err(other) => Err(other.into()),
        }
    }
}
