/**
 * PostgreSQL Document Store
 *
 * This module persists documents and their change logs to PostgreSQL.
 * The schema lives in `migrations/` and is applied at startup by
 * `server::config::load_database`.
 *
 * Offsets are stored as BIGINT; values that do not fit are clamped.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::collab::store::{DocumentStore, StoreError};
use crate::shared::{Change, ChangeKind, Document, EditStats};

/// Document store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ChangeRow {
    id: Uuid,
    document_id: Uuid,
    user_id: Uuid,
    user_name: String,
    change_type: String,
    content: String,
    position: i64,
    length: i64,
    timestamp: DateTime<Utc>,
}

impl From<ChangeRow> for Change {
    fn from(row: ChangeRow) -> Self {
        Change {
            id: row.id,
            document_id: row.document_id,
            user_id: row.user_id,
            user_name: row.user_name,
            change_type: ChangeKind::parse(&row.change_type),
            content: row.content,
            position: usize::try_from(row.position).unwrap_or(0),
            length: usize::try_from(row.length).unwrap_or(0),
            timestamp: row.timestamp,
        }
    }
}

fn to_db_offset(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_change<'e, E>(executor: E, change: &Change) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO changes (id, document_id, user_id, user_name, change_type, content, position, length, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#
    )
    .bind(change.id)
    .bind(change.document_id)
    .bind(change.user_id)
    .bind(&change.user_name)
    .bind(change.change_type.as_str())
    .bind(&change.content)
    .bind(to_db_offset(change.position))
    .bind(to_db_offset(change.length))
    .bind(change.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

async fn update_content<'e, E>(executor: E, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let result = sqlx::query("UPDATE documents SET content = $1, updated_at = $2 WHERE id = $3")
        .bind(content)
        .bind(at)
        .bind(id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, COALESCE(content, '') AS content, created_at, updated_at
            FROM documents
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Document {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    async fn create_document(&self, document: &Document) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#
        )
        .bind(document.id)
        .bind(&document.content)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_content(&self, id: Uuid, content: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        update_content(&self.pool, id, content, at).await
    }

    async fn append_change(&self, change: &Change) -> Result<(), StoreError> {
        insert_change(&self.pool, change).await?;
        Ok(())
    }

    async fn commit_change(&self, id: Uuid, content: &str, change: &Change) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        // Dropping `tx` on an early return rolls back
        update_content(&mut *tx, id, content, change.timestamp).await?;
        insert_change(&mut *tx, change).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_recent_changes(&self, id: Uuid, limit: usize) -> Result<Vec<Change>, StoreError> {
        let rows = sqlx::query_as::<_, ChangeRow>(
            r#"
            SELECT id, document_id, user_id, user_name, change_type, content, position, length, timestamp
            FROM changes
            WHERE document_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#
        )
        .bind(id)
        .bind(to_db_offset(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Change::from).collect())
    }

    async fn stats(&self) -> Result<EditStats, StoreError> {
        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total_edits: i64,
            unique_users: i64,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total_edits, COUNT(DISTINCT user_id) AS unique_users FROM changes"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(EditStats {
            total_edits: row.total_edits,
            unique_users: row.unique_users,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
