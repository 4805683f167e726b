use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};

use common::PaymentId;

use crate::{NewPaymentRecord, PaymentRow, PaymentStore, RecordField, Result, StoreError};

/// PostgreSQL-backed payment store implementation.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    /// Creates a new PostgreSQL payment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_payment(row: PgRow) -> Result<PaymentRow> {
        Ok(PaymentRow {
            id: PaymentId::new(row.try_get::<i64, _>("id")? as u64),
            title: row.try_get("title")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            modified_at: row.try_get("modified_at")?,
            parent: row
                .try_get::<Option<i64>, _>("parent_id")?
                .map(|p| PaymentId::new(p as u64)),
        })
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payments (title, status, created_at, modified_at, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&record.title)
        .bind(&record.status)
        .bind(record.created_at)
        .bind(Utc::now())
        .bind(record.parent.map(|p| p.as_u64() as i64))
        .fetch_one(&self.pool)
        .await?;

        Ok(PaymentId::new(id as u64))
    }

    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRow>> {
        let row = sqlx::query(
            "SELECT id, title, status, created_at, modified_at, parent_id
             FROM payments WHERE id = $1",
        )
        .bind(id.as_u64() as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn update_field(&self, id: PaymentId, field: RecordField) -> Result<()> {
        let result = match field {
            RecordField::Status(status) => {
                sqlx::query("UPDATE payments SET status = $2, modified_at = $3 WHERE id = $1")
                    .bind(id.as_u64() as i64)
                    .bind(status)
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?
            }
            RecordField::CreatedAt(created_at) => {
                sqlx::query("UPDATE payments SET created_at = $2, modified_at = $3 WHERE id = $1")
                    .bind(id.as_u64() as i64)
                    .bind(created_at)
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?
            }
            RecordField::Parent(parent) => {
                sqlx::query("UPDATE payments SET parent_id = $2, modified_at = $3 WHERE id = $1")
                    .bind(id.as_u64() as i64)
                    .bind(parent.map(|p| p.as_u64() as i64))
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::PaymentNotFound(id));
        }
        Ok(())
    }

    async fn read_meta(&self, id: PaymentId, key: &str) -> Result<Option<Value>> {
        let value: Option<Value> = sqlx::query_scalar(
            "SELECT meta_value FROM payment_meta WHERE payment_id = $1 AND meta_key = $2",
        )
        .bind(id.as_u64() as i64)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn write_meta(&self, id: PaymentId, key: &str, value: Value) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM payments WHERE id = $1")
            .bind(id.as_u64() as i64)
            .fetch_optional(&self.pool)
            .await?;

        if exists.is_none() {
            return Err(StoreError::PaymentNotFound(id));
        }

        sqlx::query(
            r#"
            INSERT INTO payment_meta (payment_id, meta_key, meta_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (payment_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value
            "#,
        )
        .bind(id.as_u64() as i64)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
