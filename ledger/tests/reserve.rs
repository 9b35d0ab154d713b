use serenity_core::CreditTransactionType;
use serenity_core::UserId;
use serenity_ledger::Ledger;
use serenity_ledger::LedgerError;
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, user_id: UserId, balance: i64) {
    sqlx::query("INSERT INTO users (id, credits_balance, role) VALUES ($1, $2, 'user')")
        .bind(user_id.0)
        .bind(balance)
        .execute(pool)
        .await
        .expect("seed user");
}

#[sqlx::test(migrations = "./migrations")]
async fn reserve_succeeds_when_balance_sufficient(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 100).await;
    let ledger = Ledger::new(pool.clone());

    let balance = ledger
        .reserve(user_id, 5, "generation spend")
        .await
        .expect("reserve should succeed");

    assert_eq!(balance, 95);
    let txs = ledger.transactions_for(user_id).await.expect("list txs");
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, -5);
    assert_eq!(txs[0].kind, CreditTransactionType::GenerationSpend);
}

#[sqlx::test(migrations = "./migrations")]
async fn reserve_fails_closed_when_balance_insufficient(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 0).await;
    let ledger = Ledger::new(pool.clone());

    let err = ledger
        .reserve(user_id, 5, "generation spend")
        .await
        .expect_err("reserve should fail");

    assert!(matches!(
        err,
        LedgerError::InsufficientCredits { required: 5 }
    ));
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 0);
    assert!(ledger.transactions_for(user_id).await.expect("txs").is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_reserves_never_drive_balance_negative(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 10).await;
    let ledger = Ledger::new(pool.clone());

    let mut handles = Vec::new();
    for _ in 0..5 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move { ledger.reserve(user_id, 5, "spend").await }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("join").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(ledger.balance(user_id).await.expect("balance"), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn grant_increments_balance_and_records_transaction(pool: PgPool) {
    let user_id = UserId::new();
    seed_user(&pool, user_id, 0).await;
    let ledger = Ledger::new(pool.clone());

    let balance = ledger
        .grant(user_id, 20, CreditTransactionType::Purchase, "top up")
        .await
        .expect("grant should succeed");

    assert_eq!(balance, 20);
}
