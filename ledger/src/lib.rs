//! Credit Ledger (spec §4.1, component C1).
//!
//! `reserve` and `grant` are the only two ways a balance changes. Both are
//! single-statement guarded updates — `UPDATE ... WHERE balance >= :amount
//! RETURNING balance` — so the database, not a previously-read balance, is
//! the source of truth for whether a spend succeeds. Mirrors the guarded
//! `UPDATE ... WHERE status = ? RETURNING` pattern a teacher's state layer
//! uses for job-item claims, adapted from SQLite `rows_affected()` checks to
//! Postgres `RETURNING`.

use serenity_core::CreditTransaction;
use serenity_core::CreditTransactionType;
use serenity_core::TransactionId;
use serenity_core::UserId;
use sqlx::PgPool;
use sqlx::Row;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient credits: {required} required")]
    InsufficientCredits { required: u32 },
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Ledger {
    pool: PgPool,
}

impl Ledger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically decrement `user_id`'s balance by `amount` and append a
    /// `generation_spend` transaction. Fails with
    /// [`LedgerError::InsufficientCredits`] if the guarded decrement affects
    /// zero rows — never on a stale read, since there is no read before the
    /// guard (spec §4.1).
    pub async fn reserve(
        &self,
        user_id: UserId,
        amount: u32,
        description: &str,
    ) -> Result<i64, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let balance = self
            .reserve_in_tx(&mut tx, user_id, amount, description)
            .await?;
        tx.commit().await?;
        Ok(balance)
    }

    /// Same guarded decrement as [`Ledger::reserve`], but runs inside a
    /// transaction the caller owns — used by the submission path so the
    /// reserve and the request insert commit or roll back together (spec
    /// §4.4 step 3).
    pub async fn reserve_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
        amount: u32,
        description: &str,
    ) -> Result<i64, LedgerError> {
        self.mutate(
            tx,
            user_id,
            -i64::from(amount),
            CreditTransactionType::GenerationSpend,
            description,
            Some(amount),
        )
        .await
    }

    /// Atomically increment `user_id`'s balance by `amount` and append a
    /// ledger entry of the given `kind` (spec §4.1 `grant`).
    pub async fn grant(
        &self,
        user_id: UserId,
        amount: u32,
        kind: CreditTransactionType,
        description: &str,
    ) -> Result<i64, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let balance = self
            .mutate(&mut tx, user_id, i64::from(amount), kind, description, None)
            .await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn mutate(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
        signed_amount: i64,
        kind: CreditTransactionType,
        description: &str,
        required_if_insufficient: Option<u32>,
    ) -> Result<i64, LedgerError> {
        let row = sqlx::query(
            r#"
UPDATE users
SET credits_balance = credits_balance + $1
WHERE id = $2 AND credits_balance + $1 >= 0
RETURNING credits_balance
            "#,
        )
        .bind(signed_amount)
        .bind(user_id.0)
        .fetch_optional(&mut **tx)
        .await?;

        let new_balance: i64 = match row {
            Some(row) => row.try_get("credits_balance")?,
            None => {
                if self.user_exists(tx, user_id).await? {
                    let required = required_if_insufficient.unwrap_or(0);
                    return Err(LedgerError::InsufficientCredits { required });
                }
                return Err(LedgerError::UserNotFound(user_id));
            }
        };

        sqlx::query(
            r#"
INSERT INTO credit_transactions (id, user_id, amount, kind, description, created_at)
VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
        .bind(TransactionId::new().0)
        .bind(user_id.0)
        .bind(signed_amount)
        .bind(kind.as_str())
        .bind(description)
        .execute(&mut **tx)
        .await?;

        Ok(new_balance)
    }

    async fn user_exists(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(user_id.0)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    pub async fn balance(&self, user_id: UserId) -> Result<i64, LedgerError> {
        let row = sqlx::query("SELECT credits_balance FROM users WHERE id = $1")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        Ok(row.try_get("credits_balance")?)
    }

    pub async fn transactions_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CreditTransaction>, LedgerError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
SELECT id, user_id, amount, kind, description, created_at
FROM credit_transactions
WHERE user_id = $1
ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(TransactionRow::try_into_domain)
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::Database)
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: uuid::Uuid,
    user_id: uuid::Uuid,
    amount: i64,
    kind: String,
    description: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn try_into_domain(self) -> Result<CreditTransaction, sqlx::Error> {
        let kind = self
            .kind
            .parse::<CreditTransactionType>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(CreditTransaction {
            id: self.id.into(),
            user_id: self.user_id.into(),
            amount: self.amount,
            kind,
            description: self.description,
            created_at: self.created_at,
        })
    }
}
