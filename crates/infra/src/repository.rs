//! # リポジトリ実装
//!
//! 患者・医師・予約の永続化を担当するリポジトリのトレイトと PostgreSQL 実装。
//!
//! ## 設計方針
//!
//! - **トレイト + 実装**: ユースケース層は `Arc<dyn XxxRepository>` にのみ依存し、
//!   テストではインメモリのモックに差し替える
//! - **位置パラメータ**: 値はすべて `$n` でバインドし、SQL 文字列に埋め込まない
//! - **物理削除なし**: どのリポジトリも `DELETE` を発行しない
//! - **失敗ログ**: クエリ失敗時は SQL 文と識別子を `error` レベルで記録する

pub mod appointment_repository;
pub mod doctor_repository;
pub mod patient_repository;

pub use appointment_repository::{AppointmentRepository, PostgresAppointmentRepository};
pub use doctor_repository::{DoctorRepository, PostgresDoctorRepository};
pub use patient_repository::{PatientRepository, PostgresPatientRepository};

/// クエリ失敗を記録するクロージャを返す
///
/// `params` には識別子のみを渡す。患者情報などの値そのものは記録しない。
///
/// ```ignore
/// sqlx::query(SQL)
///     .bind(id.as_i64())
///     .execute(&self.pool)
///     .await
///     .inspect_err(log_query_failure(SQL, format!("id={id}")))?;
/// ```
pub(crate) fn log_query_failure(
    statement: &'static str,
    params: impl std::fmt::Display,
) -> impl FnOnce(&sqlx::Error) {
    move |error| {
        tracing::error!(
            statement = statement.trim(),
            params = %params,
            error = %error,
            "クエリの実行に失敗しました"
        );
    }
}
