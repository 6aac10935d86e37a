//! # インフラ層エラー定義
//!
//! データベースとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **分類は一度だけ**: `From<sqlx::Error>` の時点で一意制約違反・外部キー違反・
//!   接続不可を判別し、API 層は [`InfraErrorKind`] を見るだけでよい
//! - **エンジン非依存**: SQLSTATE（`23505` / `23503`）の判定は sqlx の
//!   `is_unique_violation` / `is_foreign_key_violation` に委ねる
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別
//!
//! `Display` の文言は API の失敗レスポンスにそのまま載るため英語で出す。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::DuplicateKey { .. } => { /* 409 */ }
///     _ => { /* 500 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// 一意制約違反（メールアドレス・免許番号の重複など）
    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    DuplicateKey {
        /// 違反した制約名
        constraint: String,
    },

    /// 外部キー制約違反（存在しない患者・医師・専門分野の参照など）
    #[error("{message}")]
    ForeignKey {
        /// 違反した制約名
        constraint: String,
        /// データベースが返したメッセージ
        message:    String,
    },

    /// データベースに到達できない
    ///
    /// 接続プールのタイムアウト・クローズ済み、I/O エラー、TLS エラー。
    #[error("{0}")]
    Unavailable(#[source] sqlx::Error),

    /// その他のデータベースエラー
    #[error("{0}")]
    Database(#[source] sqlx::Error),

    /// 予期しないエラー
    ///
    /// DB の値がドメインの不変条件を満たさない場合など。
    #[error("{0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 一意制約違反か
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self.kind, InfraErrorKind::DuplicateKey { .. })
    }

    /// データベースに到達できないことによる失敗か
    pub fn is_unavailable(&self) -> bool {
        matches!(self.kind, InfraErrorKind::Unavailable(_))
    }

    fn with_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// 一意制約違反エラーを生成する
    pub fn duplicate_key(constraint: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::DuplicateKey {
            constraint: constraint.into(),
        })
    }

    /// 外部キー制約違反エラーを生成する
    pub fn foreign_key(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::ForeignKey {
            constraint: constraint.into(),
            message:    message.into(),
        })
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::with_kind(InfraErrorKind::Unexpected(msg.into()))
    }
}

/// 制約違反を判別する
///
/// 一意制約・外部キー制約以外の DB エラーは `None`。
fn constraint_violation(source: &sqlx::Error) -> Option<InfraErrorKind> {
    let db = source.as_database_error()?;
    let constraint = db.constraint().unwrap_or("unknown").to_string();

    if db.is_unique_violation() {
        Some(InfraErrorKind::DuplicateKey { constraint })
    } else if db.is_foreign_key_violation() {
        Some(InfraErrorKind::ForeignKey {
            constraint,
            message: db.message().to_string(),
        })
    } else {
        None
    }
}

fn is_unreachable(source: &sqlx::Error) -> bool {
    matches!(
        source,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)
    )
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        let kind = match constraint_violation(&source) {
            Some(kind) => kind,
            None if is_unreachable(&source) => InfraErrorKind::Unavailable(source),
            None => InfraErrorKind::Database(source),
        };
        Self::with_kind(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sqlx::error::{DatabaseError, ErrorKind};
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    /// 任意の種別を返す DB エラーのスタブ
    #[derive(Debug)]
    struct StubDatabaseError {
        kind:       ErrorKind,
        message:    &'static str,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for StubDatabaseError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for StubDatabaseError {}

    impl DatabaseError for StubDatabaseError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(
        kind: ErrorKind,
        message: &'static str,
        constraint: Option<&'static str>,
    ) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDatabaseError {
            kind,
            message,
            constraint,
        }))
    }

    // ===== 分類のテスト =====

    #[test]
    fn test_一意制約違反はduplicate_keyに分類される() {
        let source = db_error(
            ErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"patients_email_key\"",
            Some("patients_email_key"),
        );

        let err = InfraError::from(source);

        assert!(err.is_duplicate_key());
        assert!(matches!(
            err.kind(),
            InfraErrorKind::DuplicateKey { constraint } if constraint == "patients_email_key"
        ));
    }

    #[test]
    fn test_外部キー違反はdbのメッセージを保持する() {
        let message = "insert or update on table \"appointments\" violates foreign key constraint \"appointments_patient_id_fkey\"";
        let source = db_error(
            ErrorKind::ForeignKeyViolation,
            message,
            Some("appointments_patient_id_fkey"),
        );

        let err = InfraError::from(source);

        assert!(matches!(err.kind(), InfraErrorKind::ForeignKey { .. }));
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_その他の制約違反はdatabaseに分類される() {
        let source = db_error(
            ErrorKind::CheckViolation,
            "new row violates check constraint \"patients_gender_check\"",
            Some("patients_gender_check"),
        );

        let err = InfraError::from(source);

        assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
        assert!(!err.is_duplicate_key());
    }

    #[rstest]
    #[case::pool_timed_out(sqlx::Error::PoolTimedOut)]
    #[case::pool_closed(sqlx::Error::PoolClosed)]
    #[case::io(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)))]
    fn test_接続不可のエラーはunavailableに分類される(#[case] source: sqlx::Error) {
        let err = InfraError::from(source);

        assert!(err.is_unavailable());
    }

    #[test]
    fn test_row_not_foundはdatabaseに分類される() {
        let err = InfraError::from(sqlx::Error::RowNotFound);

        assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
    }

    // ===== SpanTrace のテスト =====

    #[test]
    fn test_from_sqlx_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_repo", patient_id = 42);
            let _enter = span.enter();

            let err: InfraError = sqlx::Error::RowNotFound.into();

            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_repo"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_duplicate_keyでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_insert");
            let _enter = span.enter();

            let err = InfraError::duplicate_key("doctors_license_number_key");

            let trace_str = format!("{}", err.span_trace());
            assert!(trace_str.contains("test_insert"));
        });
    }

    // ===== Display / source のテスト =====

    #[test]
    fn test_displayがinfra_error_kindのメッセージを出力する() {
        let err = InfraError::duplicate_key("doctors_email_key");

        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"doctors_email_key\""
        );
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let err: InfraError = sqlx::Error::RowNotFound.into();
        assert!(err.source().is_some());

        let err = InfraError::unexpected("broken row");
        assert!(err.source().is_none());
    }
}
