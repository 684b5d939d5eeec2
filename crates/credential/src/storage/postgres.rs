//! PostgreSQL-based passkey storage
//!
//! This module is only available with the `postgres` feature.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{encode_secret, verify_secret};
use crate::core::{Passkey, PasskeyId, Reward, StoreError, StoreResult};
use crate::traits::{NewPasskey, PasskeyLookup, PasskeyStore, PasskeyUpdate};
use crate::utils::{SecretCodec, validate_sql_identifier};

const COLUMNS: &str = "id, namespace, encoded_secret, reward, expires_at, created_at, updated_at";

/// Configuration for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Table name, a plain SQL identifier
    pub table_name: String,
    /// Schema name, a plain SQL identifier
    pub schema: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            table_name: "passkeys".to_string(),
            schema: "public".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL implementation of [`PasskeyStore`]
#[derive(Debug, Clone)]
pub struct PostgresPasskeyStore {
    pool: PgPool,
    codec: SecretCodec,
    table: String,
    index: String,
}

impl PostgresPasskeyStore {
    /// Connect to PostgreSQL and create the table if it does not exist
    pub async fn connect(
        url: &str,
        codec: SecretCodec,
        config: PostgresConfig,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| StoreError::backend("connect", e))?;

        Self::from_pool(pool, codec, config).await
    }

    /// Create a store from an existing pool and ensure the schema
    ///
    /// # Errors
    ///
    /// [`StoreError::Backend`] if `schema` or `table_name` is not a plain
    /// SQL identifier, or if the table cannot be created.
    pub async fn from_pool(
        pool: PgPool,
        codec: SecretCodec,
        config: PostgresConfig,
    ) -> StoreResult<Self> {
        let (table, index) = table_identifiers(&config)?;
        let store = Self {
            pool,
            codec,
            table,
            index,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID NOT NULL,
                namespace TEXT NOT NULL,
                encoded_secret TEXT NOT NULL,
                reward JSONB,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ,
                PRIMARY KEY (id, namespace)
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::backend("ensure_schema", e))?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (expires_at) WHERE expires_at IS NOT NULL",
            self.index, self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::backend("ensure_schema", e))?;

        info!(table = %self.table, "passkey schema ready");
        Ok(())
    }

    async fn delete_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lookup: &PasskeyLookup,
    ) -> StoreResult<Passkey> {
        let query = format!(
            "DELETE FROM {} WHERE id = $1 AND namespace = $2 RETURNING {COLUMNS}",
            self.table
        );

        let row = sqlx::query(&query)
            .bind(lookup.key.id.as_uuid())
            .bind(&lookup.key.namespace)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::backend("delete", e))?
            .ok_or_else(|| StoreError::NotFound {
                key: lookup.key.clone(),
            })?;

        let passkey = row_to_passkey(&row)?;
        verify_secret(self.codec, &passkey, lookup.secret.as_ref()).await?;
        Ok(passkey)
    }
}

/// Quoted `"schema"."table"` and expiry index names
fn table_identifiers(config: &PostgresConfig) -> StoreResult<(String, String)> {
    for (field, value) in [("schema", &config.schema), ("table_name", &config.table_name)] {
        validate_sql_identifier(field, value)
            .map_err(|e| StoreError::backend("configure", e))?;
    }

    Ok((
        format!("\"{}\".\"{}\"", config.schema, config.table_name),
        format!("\"idx_{}_{}_expires_at\"", config.schema, config.table_name),
    ))
}

#[async_trait]
impl PasskeyStore for PostgresPasskeyStore {
    async fn create(&self, passkey: &NewPasskey) -> StoreResult<Passkey> {
        let encoded_secret = encode_secret(self.codec, &passkey.secret).await?;

        let query = format!(
            "INSERT INTO {} ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, NULL) RETURNING {COLUMNS}",
            self.table
        );

        let row = sqlx::query(&query)
            .bind(passkey.id.as_uuid())
            .bind(&passkey.namespace)
            .bind(&encoded_secret)
            .bind(passkey.reward.as_ref().map(Json))
            .bind(passkey.expires_at)
            .bind(passkey.now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::backend("create", e))?;

        row_to_passkey(&row)
    }

    async fn read(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1 AND namespace = $2 \
             AND (expires_at IS NULL OR expires_at > $3)",
            self.table
        );

        let row = sqlx::query(&query)
            .bind(lookup.key.id.as_uuid())
            .bind(&lookup.key.namespace)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend("read", e))?
            .ok_or_else(|| StoreError::NotFound {
                key: lookup.key.clone(),
            })?;

        let passkey = row_to_passkey(&row)?;
        verify_secret(self.codec, &passkey, lookup.secret.as_ref()).await?;
        Ok(passkey)
    }

    async fn update(&self, update: &PasskeyUpdate) -> StoreResult<Passkey> {
        let encoded_secret = encode_secret(self.codec, &update.secret).await?;

        let query = format!(
            "UPDATE {} SET encoded_secret = $3, reward = $4, expires_at = $5, updated_at = $6 \
             WHERE id = $1 AND namespace = $2 RETURNING {COLUMNS}",
            self.table
        );

        let row = sqlx::query(&query)
            .bind(update.key.id.as_uuid())
            .bind(&update.key.namespace)
            .bind(&encoded_secret)
            .bind(update.reward.as_ref().map(Json))
            .bind(update.expires_at)
            .bind(update.now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::backend("update", e))?
            .ok_or_else(|| StoreError::NotFound {
                key: update.key.clone(),
            })?;

        row_to_passkey(&row)
    }

    async fn delete(&self, lookup: &PasskeyLookup) -> StoreResult<Passkey> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::backend("delete.begin", e))?;

        match self.delete_in(&mut tx, lookup).await {
            Ok(passkey) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::backend("delete.commit", e))?;
                Ok(passkey)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(
                        passkey_id = %lookup.key.id,
                        namespace = %lookup.key.namespace,
                        error = %rollback,
                        "delete rollback failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let query = format!(
            "DELETE FROM {} WHERE expires_at IS NOT NULL AND expires_at <= $1",
            self.table
        );

        let result = sqlx::query(&query)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::backend("purge_expired", e))?;

        debug!(purged = result.rows_affected(), "purged expired passkeys");
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(drop)
            .map_err(|e| StoreError::backend("ping", e))
    }
}

fn row_to_passkey(row: &PgRow) -> StoreResult<Passkey> {
    let decode = |e: sqlx::Error| StoreError::backend("decode_row", e);

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let reward: Option<Json<Reward>> = row.try_get("reward").map_err(decode)?;

    Ok(Passkey {
        id: PasskeyId::from(id),
        namespace: row.try_get("namespace").map_err(decode)?,
        encoded_secret: row.try_get("encoded_secret").map_err(decode)?,
        reward: reward.map(|Json(r)| r),
        expires_at: row.try_get("expires_at").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}
