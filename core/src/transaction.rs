use crate::CreditTransactionType;
use crate::TransactionId;
use crate::UserId;
use chrono::DateTime;
use chrono::Utc;

/// Append-only ledger entry (spec §3, Invariant L1/L2).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CreditTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    /// Positive = grant, negative = spend.
    pub amount: i64,
    pub kind: CreditTransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
