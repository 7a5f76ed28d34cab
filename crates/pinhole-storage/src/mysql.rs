use async_trait::async_trait;
use jiff::Timestamp;
use pinhole_core::repository::Result;
use pinhole_core::{
    Mapping, MappingPatch, ReadRepository, RenameOutcome, Repository, ShortCode, StorageError,
};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::trace;

const SELECT_BY_CODE: &str = r#"
    SELECT id, short_code, original_url, created_at, updated_at, access_count
    FROM short_urls
    WHERE short_code = ?
    LIMIT 1
"#;

const SELECT_BY_CODE_FOR_UPDATE: &str = r#"
    SELECT id, short_code, original_url, created_at, updated_at, access_count
    FROM short_urls
    WHERE short_code = ?
    FOR UPDATE
"#;

const SELECT_ALL: &str = r#"
    SELECT id, short_code, original_url, created_at, updated_at, access_count
    FROM short_urls
    ORDER BY id
"#;

/// MySQL implementation of the repository contract.
///
/// Atomicity comes from the database: the unique index on `short_code`
/// arbitrates inserts and renames, counters use an in-place
/// `access_count = access_count + 1`, and read-modify-write operations run
/// in a transaction holding the row lock. Deletes are hard deletes, so a
/// deleted code may be handed out again.
///
/// Timestamps are stored as microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Operation(format!("migration failed: {e}")))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn row_id(row: &MySqlRow) -> Result<u64> {
    row.try_get("id").map_err(map_sqlx_error)
}

fn mapping_from_row(row: &MySqlRow) -> Result<Mapping> {
    // ascii_bin collation makes the driver report the column as binary
    let code: Vec<u8> = row.try_get("short_code").map_err(map_sqlx_error)?;
    let code = String::from_utf8(code)
        .map_err(|e| StorageError::InvalidData(format!("short code is not utf-8: {e}")))?;

    Ok(Mapping {
        code: ShortCode::new_unchecked(code),
        target_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at").map_err(map_sqlx_error)?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at").map_err(map_sqlx_error)?)?,
        access_count: row.try_get("access_count").map_err(map_sqlx_error)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<Mapping>> {
        let row = sqlx::query(SELECT_BY_CODE)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(mapping_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Mapping>> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(mapping_from_row).collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert_if_absent(&self, mapping: &Mapping) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, created_at, updated_at, access_count)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(mapping.code.as_str())
        .bind(&mapping.target_url)
        .bind(mapping.created_at.as_microsecond())
        .bind(mapping.updated_at.as_microsecond())
        .bind(mapping.access_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => {
                trace!(code = %mapping.code, "short code already taken");
                Ok(false)
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn atomic_increment(&self, code: &ShortCode) -> Result<Option<Mapping>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(SELECT_BY_CODE_FOR_UPDATE)
            .bind(code.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        };

        let id = row_id(&row)?;
        let mut mapping = mapping_from_row(&row)?;

        sqlx::query("UPDATE short_urls SET access_count = access_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        // the row lock keeps the counter from moving between read and update
        mapping.access_count = mapping.access_count.saturating_add(1);
        Ok(Some(mapping))
    }

    async fn update(&self, code: &ShortCode, patch: MappingPatch) -> Result<Option<Mapping>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(SELECT_BY_CODE_FOR_UPDATE)
            .bind(code.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        };

        let id = row_id(&row)?;
        let mut mapping = mapping_from_row(&row)?;
        patch.apply(&mut mapping);

        sqlx::query("UPDATE short_urls SET original_url = ?, updated_at = ? WHERE id = ?")
            .bind(&mapping.target_url)
            .bind(mapping.updated_at.as_microsecond())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(mapping))
    }

    async fn rename_if_absent(
        &self,
        from: &ShortCode,
        to: &ShortCode,
        now: Timestamp,
    ) -> Result<RenameOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(SELECT_BY_CODE_FOR_UPDATE)
            .bind(from.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(RenameOutcome::SourceMissing);
        };

        let id = row_id(&row)?;
        let mut mapping = mapping_from_row(&row)?;

        let result = sqlx::query("UPDATE short_urls SET short_code = ?, updated_at = ? WHERE id = ?")
            .bind(to.as_str())
            .bind(now.as_microsecond())
            .bind(id)
            .execute(&mut *tx)
            .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                trace!(from = %from, to = %to, "rename target already taken");
                tx.rollback().await.map_err(map_sqlx_error)?;
                return Ok(RenameOutcome::TargetTaken);
            }
            Err(err) => return Err(map_sqlx_error(err)),
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        mapping.code = to.clone();
        mapping.updated_at = now;
        Ok(RenameOutcome::Renamed(mapping))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query("DELETE FROM short_urls WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_microseconds() {
        let ts = Timestamp::from_microsecond(1_700_000_000_123_456).unwrap();
        assert_eq!(parse_timestamp("created_at", ts.as_microsecond()).unwrap(), ts);
    }

    #[test]
    fn out_of_range_timestamp_is_invalid_data() {
        let err = parse_timestamp("created_at", i64::MAX).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[test]
    fn pool_errors_map_to_retryable_kinds() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StorageError::Timeout(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolClosed),
            StorageError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            StorageError::InvalidData(_)
        ));
    }
}
