//! Embedded SQLite record store: one row per callback request.

use async_trait::async_trait;
use sqlx::FromRow;

use callbackdesk_core::callback::{
    sort_newest_first, CallbackPatch, CallbackRequest, CallbackStatus,
};
use callbackdesk_core::error::CoreError;
use callbackdesk_core::records::{not_found, Records};
use callbackdesk_core::types::Timestamp;

use crate::DbPool;

/// Column list for callbacks queries.
const COLUMNS: &str = "id, name, phone, email, product_type, comment, file, file_name, \
    status, note, date, updated_at";

/// A row from the `callbacks` table.
#[derive(Debug, FromRow)]
struct CallbackRow {
    id: String,
    name: String,
    phone: String,
    email: String,
    product_type: String,
    comment: String,
    file: Option<String>,
    file_name: Option<String>,
    status: String,
    note: Option<String>,
    date: Timestamp,
    updated_at: Option<Timestamp>,
}

impl TryFrom<CallbackRow> for CallbackRequest {
    type Error = CoreError;

    fn try_from(row: CallbackRow) -> Result<Self, Self::Error> {
        Ok(CallbackRequest {
            status: row.status.parse::<CallbackStatus>()?,
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            product_type: row.product_type,
            comment: row.comment,
            file: row.file,
            file_name: row.file_name,
            note: row.note,
            date: row.date,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Callback database error");
    CoreError::Persistence(err.to_string())
}

/// Record store backed by the `callbacks` table.
pub struct SqliteRecords {
    pool: DbPool,
}

impl SqliteRecords {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Records for SqliteRecords {
    async fn append(&self, record: CallbackRequest) -> Result<CallbackRequest, CoreError> {
        let query = format!(
            "INSERT INTO callbacks ({COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&query)
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.phone)
            .bind(&record.email)
            .bind(&record.product_type)
            .bind(&record.comment)
            .bind(&record.file)
            .bind(&record.file_name)
            .bind(record.status.as_str())
            .bind(&record.note)
            .bind(record.date)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                let duplicate = matches!(
                    &err,
                    sqlx::Error::Database(db_err) if db_err.is_unique_violation()
                );
                if duplicate {
                    CoreError::Validation(format!(
                        "A callback request with id {} already exists",
                        record.id
                    ))
                } else {
                    db_error(err)
                }
            })?;
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<CallbackRequest>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM callbacks");
        let rows = sqlx::query_as::<_, CallbackRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut records = rows
            .into_iter()
            .map(CallbackRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // Stored timestamps are text with variable precision, so order here
        // rather than in SQL.
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn find(&self, id: &str) -> Result<Option<CallbackRequest>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM callbacks WHERE id = ?");
        sqlx::query_as::<_, CallbackRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(CallbackRequest::try_from)
            .transpose()
    }

    async fn update(&self, id: &str, patch: &CallbackPatch) -> Result<CallbackRequest, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let select = format!("SELECT {COLUMNS} FROM callbacks WHERE id = ?");
        let row = sqlx::query_as::<_, CallbackRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found(id))?;

        let mut record = CallbackRequest::try_from(row)?;
        record.apply_patch(patch);

        sqlx::query("UPDATE callbacks SET status = ?, note = ?, updated_at = ? WHERE id = ?")
            .bind(record.status.as_str())
            .bind(&record.note)
            .bind(record.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<CallbackRequest, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let select = format!("SELECT {COLUMNS} FROM callbacks WHERE id = ?");
        let row = sqlx::query_as::<_, CallbackRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM callbacks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        CallbackRequest::try_from(row)
    }

    async fn reload(&self) -> Result<usize, CoreError> {
        // Nothing is cached; the database is always authoritative.
        self.count().await
    }

    async fn count(&self) -> Result<usize, CoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM callbacks")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count as usize)
    }
}
