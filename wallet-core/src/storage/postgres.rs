//! PostgreSQL store
//!
//! Balance updates run inside a `sqlx` transaction with the wallet row locked by
//! `SELECT ... FOR UPDATE`. An uncommitted `sqlx::Transaction` rolls back when
//! dropped, which covers both error paths and cancelled requests.

use super::{StoreTransaction, WalletStore};
use crate::error::{Result, WalletError};
use crate::types::{Mutation, MutationAction, MutationStatus, Wallet, WalletStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

const OWNER_UNIQUE: &str = "wallets_owned_by_unique";
const TOKEN_UNIQUE: &str = "wallets_token_unique";
const REFERENCE_UNIQUE: &str = "mutations_owner_reference_unique";

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS wallets (
        id UUID PRIMARY KEY,
        owned_by TEXT NOT NULL,
        token TEXT NOT NULL,
        status SMALLINT NOT NULL,
        updated_at TIMESTAMPTZ,
        balance NUMERIC NOT NULL CHECK (balance >= 0),
        CONSTRAINT wallets_owned_by_unique UNIQUE (owned_by),
        CONSTRAINT wallets_token_unique UNIQUE (token)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mutations (
        id UUID PRIMARY KEY,
        reference_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        created_by TEXT NOT NULL,
        action SMALLINT NOT NULL,
        status SMALLINT NOT NULL,
        amount NUMERIC NOT NULL CHECK (amount > 0),
        CONSTRAINT mutations_owner_reference_unique UNIQUE (created_by, reference_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS mutations_created_by_created_at_idx
        ON mutations (created_by, created_at DESC)
    "#,
];

#[derive(Debug, FromRow)]
struct WalletRow {
    id: Uuid,
    owned_by: String,
    token: String,
    status: i16,
    updated_at: Option<DateTime<Utc>>,
    balance: Decimal,
}

impl TryFrom<WalletRow> for Wallet {
    type Error = WalletError;

    fn try_from(row: WalletRow) -> Result<Self> {
        Ok(Wallet {
            id: row.id,
            owner: row.owned_by,
            token: row.token,
            status: WalletStatus::try_from(row.status)?,
            balance: row.balance,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MutationRow {
    id: Uuid,
    reference_id: String,
    created_at: DateTime<Utc>,
    created_by: String,
    action: i16,
    status: i16,
    amount: Decimal,
}

impl TryFrom<MutationRow> for Mutation {
    type Error = WalletError;

    fn try_from(row: MutationRow) -> Result<Self> {
        Ok(Mutation {
            id: row.id,
            reference_id: row.reference_id,
            created_at: row.created_at,
            owner: row.created_by,
            action: MutationAction::try_from(row.action)?,
            status: MutationStatus::try_from(row.status)?,
            amount: row.amount,
        })
    }
}

/// Name of the unique constraint a database error violated, if any
fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            db_err.constraint().map(str::to_string)
        }
        _ => None,
    }
}

/// Store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Wallet schema ready");
        Ok(())
    }
}

#[async_trait]
impl WalletStore for PostgresStore {
    async fn create_wallet(&self, wallet: &Wallet) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO wallets (id, owned_by, token, status, updated_at, balance)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(wallet.id)
        .bind(&wallet.owner)
        .bind(&wallet.token)
        .bind(wallet.status.as_code())
        .bind(wallet.updated_at)
        .bind(wallet.balance)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(match violated_constraint(&err).as_deref() {
                Some(OWNER_UNIQUE) => WalletError::WalletAlreadyExists(wallet.owner.clone()),
                Some(TOKEN_UNIQUE) => WalletError::TokenGeneration("token collision".to_string()),
                _ => WalletError::Store(err),
            }),
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT id, owned_by, token, status, updated_at, balance
            FROM wallets
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Wallet::try_from).transpose()
    }

    async fn list_mutations(&self, owner: &str) -> Result<Vec<Mutation>> {
        let rows = sqlx::query_as::<_, MutationRow>(
            r#"
            SELECT id, reference_id, created_at, created_by, action, status, amount
            FROM mutations
            WHERE created_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Mutation::try_from).collect()
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn lock_wallet(&mut self, token: &str) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT id, owned_by, token, status, updated_at, balance
            FROM wallets
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Wallet::try_from).transpose()
    }

    async fn reference_exists(&mut self, owner: &str, reference_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM mutations WHERE created_by = $1 AND reference_id = $2
            )
            "#,
        )
        .bind(owner)
        .bind(reference_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn insert_mutation(&mut self, mutation: &Mutation) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO mutations (id, reference_id, created_at, created_by, action, status, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(mutation.id)
        .bind(&mutation.reference_id)
        .bind(mutation.created_at)
        .bind(&mutation.owner)
        .bind(mutation.action.as_code())
        .bind(mutation.status.as_code())
        .bind(mutation.amount)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if violated_constraint(&err).as_deref() == Some(REFERENCE_UNIQUE) => {
                Err(WalletError::DuplicateReference(mutation.reference_id.clone()))
            }
            Err(err) => Err(WalletError::Store(err)),
        }
    }

    async fn set_balance(
        &mut self,
        token: &str,
        balance: Decimal,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = $1, updated_at = $2
            WHERE token = $3
            "#,
        )
        .bind(balance)
        .bind(at)
        .bind(token)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WalletError::WalletNotFound);
        }
        Ok(())
    }

    async fn set_status(
        &mut self,
        token: &str,
        status: WalletStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET status = $1, updated_at = $2
            WHERE token = $3
            "#,
        )
        .bind(status.as_code())
        .bind(at)
        .bind(token)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WalletError::WalletNotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PostgresTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
