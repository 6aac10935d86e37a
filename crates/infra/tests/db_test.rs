//! 接続プール・トランザクションの統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p clinic-infra --test db_test
//! ```

use clinic_infra::db::{self, PgTransactionManager, TransactionManager};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_pingは疎通できるプールで成功する(pool: PgPool) {
    assert!(db::ping(&pool).await.is_ok());

    let stats = db::pool_stats(&pool);
    assert_eq!(stats.size, stats.idle + stats.in_use);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_シードされた参照テーブルを読める(pool: PgPool) {
    let specializations: Vec<(i32, String)> =
        sqlx::query_as("SELECT specialization_id, name FROM specializations ORDER BY specialization_id")
            .fetch_all(&pool)
            .await
            .unwrap();
    let statuses: Vec<(i32, String)> =
        sqlx::query_as("SELECT status_id, status_name FROM appointment_status ORDER BY status_id")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(specializations.len(), 6);
    assert_eq!(statuses[2], (3, "Cancelled".to_string()));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_コミットしなかったトランザクションはロールバックされる(pool: PgPool) {
    let sut = PgTransactionManager::new(pool.clone());

    {
        let mut tx = sut.begin().await.unwrap();
        sqlx::query(
            "INSERT INTO patients (first_name, last_name, phone, date_of_birth, gender) \
             VALUES ('Ana', 'Diaz', '555-0100', '1990-01-01', 'Female')",
        )
        .execute(tx.conn().unwrap())
        .await
        .unwrap();
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM patients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_コミットしたトランザクションは反映される(pool: PgPool) {
    let sut = PgTransactionManager::new(pool.clone());

    let mut tx = sut.begin().await.unwrap();
    sqlx::query(
        "INSERT INTO patients (first_name, last_name, phone, date_of_birth, gender) \
         VALUES ('Ana', 'Diaz', '555-0100', '1990-01-01', 'Female')",
    )
    .execute(tx.conn().unwrap())
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM patients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_設定から作成したプールを閉じられる() {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = db::create_pool(&db::DatabaseSettings::from_url(&url).unwrap())
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    db::close_pool(pool.clone()).await;

    assert!(pool.is_closed());
}
