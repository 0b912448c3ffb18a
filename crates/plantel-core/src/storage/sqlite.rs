//! `SQLite` backend over sqlx.
//!
//! Timestamps are stored as RFC 3339 text. A unit of work runs in one
//! transaction whose guarded `UPDATE`/`DELETE` must touch exactly one row.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqlitePoolOptions, SqliteRow},
    Row, Sqlite, SqlitePool,
};

use crate::domain::{
    Assignment, BatchId, FlockIndex, Individual, IndividualGateway, IndividualId,
    IndividualRecord, Personalization, RepositoryError, RepositoryResult, RingAttributes,
    RingBatch, RingChange, RingCode, RingFilter, RingGateway, RingId, RingItem, RingSize,
    RingStatus, RingStatusKind, UnitOfWork, WorkUnit,
};

/// Database schema - executed once by [`SqliteBackend::init`]
pub(crate) const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS individuals (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    father_link_id TEXT,
    mother_link_id TEXT,
    ring_code TEXT
);

CREATE TABLE IF NOT EXISTS individual_ancestors (
    individual_id TEXT NOT NULL REFERENCES individuals(id) ON DELETE CASCADE,
    path TEXT NOT NULL CHECK(length(path) BETWEEN 1 AND 6),
    name TEXT NOT NULL,
    PRIMARY KEY (individual_id, path)
);

CREATE TABLE IF NOT EXISTS ring_batches (
    id TEXT PRIMARY KEY NOT NULL,
    supplier TEXT NOT NULL,
    species TEXT,
    quantity INTEGER,
    size_tenths INTEGER,
    year INTEGER,
    state TEXT NOT NULL,
    color TEXT NOT NULL,
    start_number TEXT,
    end_number TEXT,
    engraving_type TEXT NOT NULL,
    personalization TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ring_items (
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL,
    batch_id TEXT REFERENCES ring_batches(id),
    species TEXT,
    year INTEGER,
    state TEXT,
    color TEXT,
    size_tenths INTEGER,
    personalization TEXT,
    status TEXT NOT NULL CHECK(status IN ('estoque', 'usada', 'perdida')),
    bird_id TEXT,
    bird_name TEXT,
    assigned_at TEXT,
    lost_reason TEXT,
    lost_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ring_items_code ON ring_items(code);
CREATE INDEX IF NOT EXISTS idx_ring_items_status ON ring_items(status);
";

const RING_COLUMNS: &str = "id, code, batch_id, species, year, state, color, size_tenths, \
     personalization, status, bird_id, bird_name, assigned_at, lost_reason, lost_at, created_at";

const BATCH_COLUMNS: &str = "id, supplier, species, quantity, size_tenths, year, state, color, \
     start_number, end_number, engraving_type, personalization, created_at";

/// sqlx-backed implementation of every gateway.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `db_url` and create the schema.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the connection or schema creation fails.
    pub async fn connect(db_url: &str) -> RepositoryResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .map_err(|e| RepositoryError::storage_error(format!("Failed to connect to database: {e}")))?;
        let backend = Self::new(pool);
        backend.init().await?;
        Ok(backend)
    }

    /// Create tables and indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the schema cannot be created.
    pub async fn init(&self) -> RepositoryResult<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(db_error("Failed to initialize schema"))
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ERROR MAPPING
// ═══════════════════════════════════════════════════════════════════════════

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::conflict(format!("{context}: {db}"))
        }
        _ => RepositoryError::storage_error(format!("{context}: {e}")),
    }
}

fn corrupt(column: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::storage_error(format!("Invalid value in column {column}: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════
// ROW ENCODING
// ═══════════════════════════════════════════════════════════════════════════

fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn decode_time(column: &str, value: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| corrupt(column, e))
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> RepositoryResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::storage_error(format!("Failed to read {column}: {e}")))
}

fn opt_year(year: Option<i64>) -> RepositoryResult<Option<u16>> {
    year.map(|y| u16::try_from(y).map_err(|e| corrupt("year", e)))
        .transpose()
}

fn opt_size(tenths: Option<i64>) -> RepositoryResult<Option<RingSize>> {
    tenths
        .map(|t| {
            u16::try_from(t)
                .map(RingSize::from_tenths)
                .map_err(|e| corrupt("size_tenths", e))
        })
        .transpose()
}

fn opt_personalization(value: Option<String>) -> RepositoryResult<Option<Personalization>> {
    value
        .map(|p| Personalization::parse(p).map_err(|e| corrupt("personalization", e)))
        .transpose()
}

/// Owned column values of one `ring_items` row.
struct RingColumns {
    id: String,
    code: String,
    batch_id: Option<String>,
    species: Option<String>,
    year: Option<i64>,
    state: Option<String>,
    color: Option<String>,
    size_tenths: Option<i64>,
    personalization: Option<String>,
    status: String,
    bird_id: Option<String>,
    bird_name: Option<String>,
    assigned_at: Option<String>,
    lost_reason: Option<String>,
    lost_at: Option<String>,
    created_at: String,
}

impl RingColumns {
    fn from_ring(ring: &RingItem) -> Self {
        let (assignment, lost_reason, lost_at) = match &ring.status {
            RingStatus::Estoque => (None, None, None),
            RingStatus::Usada(a) => (Some(a), None, None),
            RingStatus::Perdida {
                reason,
                lost_at,
                last_assignment,
            } => (
                last_assignment.as_ref(),
                Some(reason.clone()),
                Some(encode_time(lost_at)),
            ),
        };
        let attrs = &ring.attributes;

        Self {
            id: ring.id.to_string(),
            code: ring.code.to_string(),
            batch_id: ring.batch_id.as_ref().map(ToString::to_string),
            species: attrs.species.clone(),
            year: attrs.year.map(i64::from),
            state: attrs.state.clone(),
            color: attrs.color.clone(),
            size_tenths: attrs.size_mm.map(|s| i64::from(s.tenths())),
            personalization: attrs.personalization.as_ref().map(|p| p.compact().to_string()),
            status: ring.kind().to_string(),
            bird_id: assignment.map(|a| a.bird_id.to_string()),
            bird_name: assignment.map(|a| a.bird_name.clone()),
            assigned_at: assignment.map(|a| encode_time(&a.assigned_at)),
            lost_reason,
            lost_at,
            created_at: encode_time(&ring.created_at),
        }
    }
}

fn ring_from_row(row: &SqliteRow) -> RepositoryResult<RingItem> {
    let status_str: String = get(row, "status")?;
    let status_kind: RingStatusKind = status_str.parse().map_err(|e| corrupt("status", e))?;

    let assignment = match get::<Option<String>>(row, "bird_id")? {
        Some(bird_id) => {
            let assigned_at: Option<String> = get(row, "assigned_at")?;
            Some(Assignment {
                bird_id: IndividualId::parse(bird_id).map_err(|e| corrupt("bird_id", e))?,
                bird_name: get::<Option<String>>(row, "bird_name")?.unwrap_or_default(),
                assigned_at: decode_time(
                    "assigned_at",
                    assigned_at.as_deref().unwrap_or_default(),
                )?,
            })
        }
        None => None,
    };

    let status = match status_kind {
        RingStatusKind::Estoque => RingStatus::Estoque,
        RingStatusKind::Usada => RingStatus::Usada(
            assignment.ok_or_else(|| corrupt("bird_id", "usada ring without assignment"))?,
        ),
        RingStatusKind::Perdida => {
            let lost_at: Option<String> = get(row, "lost_at")?;
            RingStatus::Perdida {
                reason: get::<Option<String>>(row, "lost_reason")?.unwrap_or_default(),
                lost_at: decode_time("lost_at", lost_at.as_deref().unwrap_or_default())?,
                last_assignment: assignment,
            }
        }
    };

    let created_at: String = get(row, "created_at")?;

    Ok(RingItem {
        id: RingId::parse(get::<String>(row, "id")?).map_err(|e| corrupt("id", e))?,
        code: RingCode::parse(get::<String>(row, "code")?).map_err(|e| corrupt("code", e))?,
        batch_id: get::<Option<String>>(row, "batch_id")?
            .map(|b| BatchId::parse(b).map_err(|e| corrupt("batch_id", e)))
            .transpose()?,
        attributes: RingAttributes {
            species: get(row, "species")?,
            year: opt_year(get(row, "year")?)?,
            state: get(row, "state")?,
            color: get(row, "color")?,
            size_mm: opt_size(get(row, "size_tenths")?)?,
            personalization: opt_personalization(get(row, "personalization")?)?,
        },
        status,
        created_at: decode_time("created_at", &created_at)?,
    })
}

fn batch_from_row(row: &SqliteRow) -> RepositoryResult<RingBatch> {
    let created_at: String = get(row, "created_at")?;
    Ok(RingBatch {
        id: BatchId::parse(get::<String>(row, "id")?).map_err(|e| corrupt("id", e))?,
        supplier: get(row, "supplier")?,
        species: get(row, "species")?,
        quantity: get::<Option<i64>>(row, "quantity")?
            .map(|q| u32::try_from(q).map_err(|e| corrupt("quantity", e)))
            .transpose()?,
        size_mm: opt_size(get(row, "size_tenths")?)?,
        year: opt_year(get(row, "year")?)?,
        state: get(row, "state")?,
        color: get(row, "color")?,
        start_number: get(row, "start_number")?,
        end_number: get(row, "end_number")?,
        engraving_type: get(row, "engraving_type")?,
        personalization: opt_personalization(get(row, "personalization")?)?,
        created_at: decode_time("created_at", &created_at)?,
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// RING STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════

async fn insert_ring<'e, E>(executor: E, ring: &RingItem) -> RepositoryResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let c = RingColumns::from_ring(ring);
    sqlx::query(&format!(
        "INSERT INTO ring_items ({RING_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(c.id)
    .bind(c.code)
    .bind(c.batch_id)
    .bind(c.species)
    .bind(c.year)
    .bind(c.state)
    .bind(c.color)
    .bind(c.size_tenths)
    .bind(c.personalization)
    .bind(c.status)
    .bind(c.bird_id)
    .bind(c.bird_name)
    .bind(c.assigned_at)
    .bind(c.lost_reason)
    .bind(c.lost_at)
    .bind(c.created_at)
    .execute(executor)
    .await
    .map(|_| ())
    .map_err(db_error("Failed to insert ring"))
}

/// Replace a ring whose stored status is `expected`. Returns rows affected.
async fn update_ring<'e, E>(
    executor: E,
    ring: &RingItem,
    expected: RingStatusKind,
) -> RepositoryResult<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let c = RingColumns::from_ring(ring);
    sqlx::query(
        "UPDATE ring_items SET code = ?, batch_id = ?, species = ?, year = ?, state = ?, \
         color = ?, size_tenths = ?, personalization = ?, status = ?, bird_id = ?, \
         bird_name = ?, assigned_at = ?, lost_reason = ?, lost_at = ?, created_at = ? \
         WHERE id = ? AND status = ?",
    )
    .bind(c.code)
    .bind(c.batch_id)
    .bind(c.species)
    .bind(c.year)
    .bind(c.state)
    .bind(c.color)
    .bind(c.size_tenths)
    .bind(c.personalization)
    .bind(c.status)
    .bind(c.bird_id)
    .bind(c.bird_name)
    .bind(c.assigned_at)
    .bind(c.lost_reason)
    .bind(c.lost_at)
    .bind(c.created_at)
    .bind(c.id)
    .bind(expected.to_string())
    .execute(executor)
    .await
    .map(|result| result.rows_affected())
    .map_err(db_error("Failed to update ring"))
}

/// Why a guarded ring write touched no row.
async fn guard_failure<'e, E>(executor: E, id: &RingId, expected: RingStatusKind) -> RepositoryError
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    match sqlx::query("SELECT status FROM ring_items WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(executor)
        .await
    {
        Ok(Some(row)) => {
            let status: String = row.try_get("status").unwrap_or_default();
            RepositoryError::concurrent_modification(format!(
                "ring '{id}' is {status}, expected {expected}"
            ))
        }
        Ok(None) => RepositoryError::not_found("ring", id),
        Err(e) => db_error("Failed to read ring status")(e),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GATEWAYS
// ═══════════════════════════════════════════════════════════════════════════

#[async_trait]
impl FlockIndex for SqliteBackend {
    async fn get_by_id(&self, id: &IndividualId) -> RepositoryResult<Individual> {
        let row = sqlx::query(
            "SELECT id, name, father_link_id, mother_link_id, ring_code \
             FROM individuals WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load individual"))?
        .ok_or_else(|| RepositoryError::not_found("individual", id))?;

        let ancestors = sqlx::query(
            "SELECT path, name FROM individual_ancestors WHERE individual_id = ? ORDER BY path",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load ancestors"))?;

        let manual_ancestors = ancestors
            .iter()
            .map(|r| Ok((get::<String>(r, "path")?, get::<String>(r, "name")?)))
            .collect::<RepositoryResult<BTreeMap<_, _>>>()?;

        let record = IndividualRecord {
            id: get(&row, "id")?,
            name: get(&row, "name")?,
            father_link_id: get(&row, "father_link_id")?,
            mother_link_id: get(&row, "mother_link_id")?,
            manual_ancestors,
            ring_code: get(&row, "ring_code")?,
        };

        Individual::from_record(record).map_err(|e| corrupt("individuals", e))
    }
}

const UPSERT_INDIVIDUAL: &str = "INSERT INTO individuals (id, name, father_link_id, mother_link_id, ring_code) \
     VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, \
     father_link_id = excluded.father_link_id, \
     mother_link_id = excluded.mother_link_id, ring_code = excluded.ring_code";

/// Leaves a stored `ring_code` alone; only the binding unit of work moves it.
const UPSERT_LINEAGE: &str = "INSERT INTO individuals (id, name, father_link_id, mother_link_id, ring_code) \
     VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET name = excluded.name, \
     father_link_id = excluded.father_link_id, \
     mother_link_id = excluded.mother_link_id";

impl SqliteBackend {
    /// Upsert one individual with its ancestors and return the stored ring code.
    async fn write_individual(
        &self,
        record: &IndividualRecord,
        upsert: &str,
    ) -> RepositoryResult<Option<String>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(upsert)
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.father_link_id)
            .bind(&record.mother_link_id)
            .bind(&record.ring_code)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to save individual"))?;

        sqlx::query("DELETE FROM individual_ancestors WHERE individual_id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to clear ancestors"))?;

        for (path, name) in &record.manual_ancestors {
            sqlx::query("INSERT INTO individual_ancestors (individual_id, path, name) VALUES (?, ?, ?)")
                .bind(&record.id)
                .bind(path)
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to save ancestor"))?;
        }

        let row = sqlx::query("SELECT ring_code FROM individuals WHERE id = ?")
            .bind(&record.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to read ring code"))?;
        let ring_code: Option<String> = get(&row, "ring_code")?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit individual"))?;

        Ok(ring_code)
    }
}

#[async_trait]
impl IndividualGateway for SqliteBackend {
    async fn save(&self, individual: &Individual) -> RepositoryResult<()> {
        self.write_individual(&individual.to_record(), UPSERT_INDIVIDUAL)
            .await
            .map(|_| ())
    }

    async fn save_lineage(&self, individual: &Individual) -> RepositoryResult<Individual> {
        let stored = self
            .write_individual(&individual.to_record(), UPSERT_LINEAGE)
            .await?;
        let ring_code = stored
            .map(|code| RingCode::parse(code).map_err(|e| corrupt("ring_code", e)))
            .transpose()?;

        Ok(individual.clone().with_ring_code(ring_code))
    }
}

#[async_trait]
impl RingGateway for SqliteBackend {
    async fn create_batch(&self, batch: &RingBatch, items: &[RingItem]) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(&format!(
            "INSERT INTO ring_batches ({BATCH_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(batch.id.as_str())
        .bind(&batch.supplier)
        .bind(&batch.species)
        .bind(batch.quantity.map(i64::from))
        .bind(batch.size_mm.map(|s| i64::from(s.tenths())))
        .bind(batch.year.map(i64::from))
        .bind(&batch.state)
        .bind(&batch.color)
        .bind(&batch.start_number)
        .bind(&batch.end_number)
        .bind(&batch.engraving_type)
        .bind(batch.personalization.as_ref().map(|p| p.compact().to_string()))
        .bind(encode_time(&batch.created_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert batch"))?;

        for ring in items {
            insert_ring(&mut *tx, ring).await?;
        }

        tx.commit().await.map_err(db_error("Failed to commit batch"))
    }

    async fn create(&self, ring: &RingItem) -> RepositoryResult<()> {
        insert_ring(&self.pool, ring).await
    }

    async fn update(&self, ring: &RingItem, expected: RingStatusKind) -> RepositoryResult<()> {
        match update_ring(&self.pool, ring, expected).await? {
            1 => Ok(()),
            _ => Err(guard_failure(&self.pool, &ring.id, expected).await),
        }
    }

    async fn delete(&self, id: &RingId) -> RepositoryResult<()> {
        let affected = sqlx::query("DELETE FROM ring_items WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected())
            .map_err(db_error("Failed to delete ring"))?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ring", id));
        }
        Ok(())
    }

    async fn get(&self, id: &RingId) -> RepositoryResult<RingItem> {
        sqlx::query(&format!("SELECT {RING_COLUMNS} FROM ring_items WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load ring"))?
            .ok_or_else(|| RepositoryError::not_found("ring", id))
            .and_then(|row| ring_from_row(&row))
    }

    async fn find_by_code(&self, code: &RingCode) -> RepositoryResult<Vec<RingItem>> {
        sqlx::query(&format!(
            "SELECT {RING_COLUMNS} FROM ring_items WHERE code = ? ORDER BY code, id"
        ))
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find rings"))?
        .iter()
        .map(ring_from_row)
        .collect()
    }

    async fn list_by_filter(&self, filter: &RingFilter) -> RepositoryResult<Vec<RingItem>> {
        let clauses: Vec<&str> = [
            filter.status.map(|_| "status = ?"),
            filter.year.map(|_| "year = ?"),
            filter
                .species
                .as_ref()
                .map(|_| "trim(species) = ? COLLATE NOCASE"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("SELECT {RING_COLUMNS} FROM ring_items{where_sql} ORDER BY code, id");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }
        if let Some(year) = filter.year {
            query = query.bind(i64::from(year));
        }
        if let Some(species) = &filter.species {
            query = query.bind(species.trim().to_string());
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list rings"))?
            .iter()
            .map(ring_from_row)
            .collect()
    }

    async fn get_batch(&self, id: &BatchId) -> RepositoryResult<RingBatch> {
        sqlx::query(&format!("SELECT {BATCH_COLUMNS} FROM ring_batches WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load batch"))?
            .ok_or_else(|| RepositoryError::not_found("batch", id))
            .and_then(|row| batch_from_row(&row))
    }

    async fn list_batches(&self) -> RepositoryResult<Vec<RingBatch>> {
        sqlx::query(&format!(
            "SELECT {BATCH_COLUMNS} FROM ring_batches ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list batches"))?
        .iter()
        .map(batch_from_row)
        .collect()
    }
}

#[async_trait]
impl UnitOfWork for SqliteBackend {
    async fn commit(&self, unit: WorkUnit) -> RepositoryResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let expected = unit.ring.expected();
        let affected = match &unit.ring {
            RingChange::Update { ring, expected } => update_ring(&mut *tx, ring, *expected).await?,
            RingChange::Delete { id, expected } => {
                sqlx::query("DELETE FROM ring_items WHERE id = ? AND status = ?")
                    .bind(id.as_str())
                    .bind(expected.to_string())
                    .execute(&mut *tx)
                    .await
                    .map(|result| result.rows_affected())
                    .map_err(db_error("Failed to delete ring"))?
            }
        };
        if affected != 1 {
            return Err(guard_failure(&mut *tx, unit.ring.ring_id(), expected).await);
        }

        if let Some(update) = &unit.ring_code {
            let affected = sqlx::query("UPDATE individuals SET ring_code = ? WHERE id = ?")
                .bind(update.code.as_ref().map(RingCode::as_str))
                .bind(update.individual.as_str())
                .execute(&mut *tx)
                .await
                .map(|result| result.rows_affected())
                .map_err(db_error("Failed to update ring code"))?;
            if affected == 0 {
                return Err(RepositoryError::not_found("individual", &update.individual));
            }
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit unit of work"))
    }
}
