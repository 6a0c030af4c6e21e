//! SQLite catalog repository implementation.
//!
//! Implements `CatalogRepository` from `catalog-core` using sqlx with split
//! read/write pools. A revision unit of work is a transaction on the single
//! writer connection; the workflow aggregate is advanced with a
//! compare-and-set on `last_revision_number`.

use catalog_core::repository::catalog::{AggregateWrite, CatalogRepository, RevisionUnitOfWork};
use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::RepositoryError;
use catalog_types::page::{Page, PageRequest};
use catalog_types::workflow::{
    GenericInformation, Variable, Workflow, WorkflowId, WorkflowRevision,
};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::pool::DatabasePool;

const REVISION_COLUMNS: &str = "r.id AS id, r.workflow_id AS workflow_id, r.bucket_id AS bucket_id, \
     r.revision_number AS revision_number, r.name AS name, r.project_name AS project_name, \
     r.created_at AS created_at, r.xml_payload AS xml_payload";

/// SQLite-backed implementation of `CatalogRepository`.
#[derive(Clone)]
pub struct SqliteCatalogRepository {
    pool: DatabasePool,
}

impl SqliteCatalogRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// SQLITE_BUSY; extended codes such as BUSY_SNAPSHOT (517) share the low byte.
const SQLITE_BUSY: i32 = 5;

/// True when another connection held the lock for longer than `busy_timeout`.
fn is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| code & 0xff == SQLITE_BUSY),
        _ => false,
    }
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    if is_busy(&e) {
        return RepositoryError::Conflict(format!("database is busy: {e}"));
    }
    RepositoryError::Query(e.to_string())
}

/// Map a write failure, turning UNIQUE violations into `Conflict`.
fn write_err(e: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.message().contains("UNIQUE") {
            return RepositoryError::Conflict(conflict());
        }
    }
    query_err(e)
}

/// SQLite integers are signed; saturate paging values instead of wrapping.
fn sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    s.parse::<Uuid>()
        .map_err(|e| RepositoryError::Query(format!("invalid UUID: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn get<'r, T>(row: &'r sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(query_err)
}

fn row_to_bucket(row: &sqlx::sqlite::SqliteRow) -> Result<Bucket, RepositoryError> {
    let id: String = get(row, "id")?;
    let created_at: String = get(row, "created_at")?;
    Ok(Bucket {
        id: BucketId::from_uuid(parse_uuid(&id)?),
        name: get(row, "name")?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn row_to_workflow(row: &sqlx::sqlite::SqliteRow) -> Result<Workflow, RepositoryError> {
    let id: String = get(row, "id")?;
    let bucket_id: String = get(row, "bucket_id")?;
    let created_at: String = get(row, "created_at")?;
    let updated_at: String = get(row, "updated_at")?;
    Ok(Workflow {
        id: WorkflowId::from_uuid(parse_uuid(&id)?),
        bucket_id: BucketId::from_uuid(parse_uuid(&bucket_id)?),
        last_revision_number: get(row, "last_revision_number")?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Revision columns only; metadata records are loaded separately.
fn row_to_revision(row: &sqlx::sqlite::SqliteRow) -> Result<WorkflowRevision, RepositoryError> {
    let id: String = get(row, "id")?;
    let workflow_id: String = get(row, "workflow_id")?;
    let bucket_id: String = get(row, "bucket_id")?;
    let created_at: String = get(row, "created_at")?;
    Ok(WorkflowRevision {
        id: parse_uuid(&id)?,
        workflow_id: WorkflowId::from_uuid(parse_uuid(&workflow_id)?),
        bucket_id: BucketId::from_uuid(parse_uuid(&bucket_id)?),
        revision_number: get(row, "revision_number")?,
        name: get(row, "name")?,
        project_name: get(row, "project_name")?,
        created_at: parse_datetime(&created_at)?,
        generic_information: Vec::new(),
        variables: Vec::new(),
        xml_payload: get(row, "xml_payload")?,
    })
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<(Uuid, String, String), RepositoryError> {
    let id: String = get(row, "id")?;
    Ok((parse_uuid(&id)?, get(row, "key")?, get(row, "value")?))
}

async fn load_entries(
    pool: &SqlitePool,
    revision: &mut WorkflowRevision,
) -> Result<(), RepositoryError> {
    let revision_id = revision.id.to_string();

    let rows = sqlx::query(
        "SELECT g.id AS id, g.key AS key, g.value AS value
         FROM revision_generic_information l
         JOIN generic_information g ON g.id = l.generic_information_id
         WHERE l.revision_id = ?
         ORDER BY l.position ASC",
    )
    .bind(&revision_id)
    .fetch_all(pool)
    .await
    .map_err(query_err)?;
    revision.generic_information = rows
        .iter()
        .map(|row| row_to_entry(row).map(|(id, key, value)| GenericInformation { id, key, value }))
        .collect::<Result<_, _>>()?;

    let rows = sqlx::query(
        "SELECT v.id AS id, v.key AS key, v.value AS value
         FROM revision_variables l
         JOIN variables v ON v.id = l.variable_id
         WHERE l.revision_id = ?
         ORDER BY l.position ASC",
    )
    .bind(&revision_id)
    .fetch_all(pool)
    .await
    .map_err(query_err)?;
    revision.variables = rows
        .iter()
        .map(|row| row_to_entry(row).map(|(id, key, value)| Variable { id, key, value }))
        .collect::<Result<_, _>>()?;

    Ok(())
}

async fn hydrate(
    pool: &SqlitePool,
    rows: &[sqlx::sqlite::SqliteRow],
) -> Result<Vec<WorkflowRevision>, RepositoryError> {
    let mut revisions = Vec::with_capacity(rows.len());
    for row in rows {
        let mut revision = row_to_revision(row)?;
        load_entries(pool, &mut revision).await?;
        revisions.push(revision);
    }
    Ok(revisions)
}

// ---------------------------------------------------------------------------
// CatalogRepository impl
// ---------------------------------------------------------------------------

impl CatalogRepository for SqliteCatalogRepository {
    type UnitOfWork = SqliteUnitOfWork;

    async fn begin(&self) -> Result<SqliteUnitOfWork, RepositoryError> {
        // Take the write lock up front so the head read inside the unit of
        // work cannot be invalidated by another process before the write.
        let tx = self
            .pool
            .writer
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(query_err)?;
        Ok(SqliteUnitOfWork { tx })
    }

    async fn create_bucket(&self, bucket: &Bucket) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO buckets (id, name, created_at) VALUES (?, ?, ?)")
            .bind(bucket.id.to_string())
            .bind(&bucket.name)
            .bind(format_datetime(&bucket.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| write_err(e, || format!("bucket '{}' already exists", bucket.name)))?;
        Ok(())
    }

    async fn find_bucket(&self, id: &BucketId) -> Result<Option<Bucket>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM buckets WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_bucket).transpose()
    }

    async fn list_buckets(&self) -> Result<Vec<Bucket>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM buckets ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter().map(row_to_bucket).collect()
    }

    async fn find_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_workflow).transpose()
    }

    async fn list_revisions(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        page: PageRequest,
    ) -> Result<Page<WorkflowRevision>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflow_revisions WHERE bucket_id = ? AND workflow_id = ?",
        )
        .bind(bucket_id.to_string())
        .bind(workflow_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM workflow_revisions r
             WHERE r.bucket_id = ? AND r.workflow_id = ?
             ORDER BY r.revision_number ASC
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(bucket_id.to_string())
            .bind(workflow_id.to_string())
            .bind(sql_int(page.limit))
            .bind(sql_int(page.offset))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let items = hydrate(&self.pool.reader, &rows).await?;
        Ok(Page::new(items, page, total as u64))
    }

    async fn list_most_recent_revisions(
        &self,
        bucket_id: &BucketId,
        page: PageRequest,
    ) -> Result<Page<WorkflowRevision>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workflows WHERE bucket_id = ?")
            .bind(bucket_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM workflows w
             JOIN workflow_revisions r
               ON r.workflow_id = w.id AND r.revision_number = w.last_revision_number
             WHERE w.bucket_id = ?
             ORDER BY w.created_at ASC, w.id ASC
             LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(bucket_id.to_string())
            .bind(sql_int(page.limit))
            .bind(sql_int(page.offset))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let items = hydrate(&self.pool.reader, &rows).await?;
        Ok(Page::new(items, page, total as u64))
    }

    async fn find_most_recent_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
    ) -> Result<Option<WorkflowRevision>, RepositoryError> {
        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM workflow_revisions r
             WHERE r.bucket_id = ? AND r.workflow_id = ?
             ORDER BY r.revision_number DESC
             LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(bucket_id.to_string())
            .bind(workflow_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        Ok(hydrate(&self.pool.reader, row.as_slice()).await?.pop())
    }

    async fn find_revision(
        &self,
        bucket_id: &BucketId,
        workflow_id: &WorkflowId,
        revision_number: i64,
    ) -> Result<Option<WorkflowRevision>, RepositoryError> {
        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM workflow_revisions r
             WHERE r.bucket_id = ? AND r.workflow_id = ? AND r.revision_number = ?"
        );
        let row = sqlx::query(&sql)
            .bind(bucket_id.to_string())
            .bind(workflow_id.to_string())
            .bind(revision_number)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        Ok(hydrate(&self.pool.reader, row.as_slice()).await?.pop())
    }
}

// ---------------------------------------------------------------------------
// Unit of work
// ---------------------------------------------------------------------------

/// A write transaction on the writer connection. Rolled back on drop unless
/// committed.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl RevisionUnitOfWork for SqliteUnitOfWork {
    async fn find_workflow(&mut self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_err)?;

        row.as_ref().map(row_to_workflow).transpose()
    }

    async fn save_generic_information(
        &mut self,
        entries: &[GenericInformation],
    ) -> Result<(), RepositoryError> {
        for entry in entries {
            sqlx::query("INSERT INTO generic_information (id, key, value) VALUES (?, ?, ?)")
                .bind(entry.id.to_string())
                .bind(&entry.key)
                .bind(&entry.value)
                .execute(&mut *self.tx)
                .await
                .map_err(query_err)?;
        }
        Ok(())
    }

    async fn save_variables(&mut self, entries: &[Variable]) -> Result<(), RepositoryError> {
        for entry in entries {
            sqlx::query("INSERT INTO variables (id, key, value) VALUES (?, ?, ?)")
                .bind(entry.id.to_string())
                .bind(&entry.key)
                .bind(&entry.value)
                .execute(&mut *self.tx)
                .await
                .map_err(query_err)?;
        }
        Ok(())
    }

    async fn save_revision(&mut self, revision: &WorkflowRevision) -> Result<(), RepositoryError> {
        let revision_id = revision.id.to_string();

        sqlx::query(
            "INSERT INTO workflow_revisions
             (id, workflow_id, bucket_id, revision_number, name, project_name, created_at, xml_payload)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&revision_id)
        .bind(revision.workflow_id.to_string())
        .bind(revision.bucket_id.to_string())
        .bind(revision.revision_number)
        .bind(&revision.name)
        .bind(&revision.project_name)
        .bind(format_datetime(&revision.created_at))
        .bind(revision.xml_payload.as_slice())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            write_err(e, || {
                format!(
                    "revision {} already exists for workflow {}",
                    revision.revision_number, revision.workflow_id
                )
            })
        })?;

        for (position, entry) in revision.generic_information.iter().enumerate() {
            sqlx::query(
                "INSERT INTO revision_generic_information (revision_id, generic_information_id, position)
                 VALUES (?, ?, ?)",
            )
            .bind(&revision_id)
            .bind(entry.id.to_string())
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;
        }

        for (position, entry) in revision.variables.iter().enumerate() {
            sqlx::query(
                "INSERT INTO revision_variables (revision_id, variable_id, position)
                 VALUES (?, ?, ?)",
            )
            .bind(&revision_id)
            .bind(entry.id.to_string())
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(query_err)?;
        }

        Ok(())
    }

    async fn save_workflow(
        &mut self,
        workflow: &Workflow,
        write: AggregateWrite,
    ) -> Result<(), RepositoryError> {
        match write {
            AggregateWrite::Create => {
                sqlx::query(
                    "INSERT INTO workflows (id, bucket_id, last_revision_number, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(workflow.id.to_string())
                .bind(workflow.bucket_id.to_string())
                .bind(workflow.last_revision_number)
                .bind(format_datetime(&workflow.created_at))
                .bind(format_datetime(&workflow.updated_at))
                .execute(&mut *self.tx)
                .await
                .map_err(|e| write_err(e, || format!("workflow {} already exists", workflow.id)))?;
            }
            AggregateWrite::Append {
                expected_last_revision,
            } => {
                let result = sqlx::query(
                    "UPDATE workflows SET last_revision_number = ?, updated_at = ?
                     WHERE id = ? AND last_revision_number = ?",
                )
                .bind(workflow.last_revision_number)
                .bind(format_datetime(&workflow.updated_at))
                .bind(workflow.id.to_string())
                .bind(expected_last_revision)
                .execute(&mut *self.tx)
                .await
                .map_err(query_err)?;

                if result.rows_affected() != 1 {
                    return Err(RepositoryError::Conflict(format!(
                        "workflow {} moved past revision {expected_last_revision}",
                        workflow.id
                    )));
                }
            }
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(query_err)
    }
}
