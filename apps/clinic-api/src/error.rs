//! # API エラー定義
//!
//! ユースケース・ハンドラで発生するエラーと、HTTP レスポンスへの変換を定義する。
//! ステータスコードとメッセージを決めるのはこのモジュールだけ。
//!
//! | エラー | ステータス | メッセージ |
//! |--------|-----------|-----------|
//! | `Validation` | 400 | 検証エラーの内容 |
//! | `NotFound` | 404 | `"<Entity> not found"` |
//! | `UpdateFailed` | 500 | `"Failed to update <entity>"` |
//! | `Storage`（一意制約違反） | 409 | `"A record with this data already exists"` |
//! | `Storage`（その他） | 500 | データベースエラーの内容 |
//!
//! 5xx はすべて `error` レベルでログに残す。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clinic_domain::DomainError;
use clinic_infra::InfraError;
use clinic_shared::ApiResponse;
use thiserror::Error;

/// 一意制約違反時のメッセージ
pub const DUPLICATE_RECORD_MESSAGE: &str = "A record with this data already exists";

/// Clinic API で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証失敗（不正な JSON・パスパラメータを含む）
    #[error("{0}")]
    Validation(String),

    /// エンティティが見つからない
    #[error("{0}")]
    NotFound(String),

    /// 存在確認後の更新が 0 行だった
    #[error("Failed to update {0}")]
    UpdateFailed(&'static str),

    /// データベースエラー
    #[error(transparent)]
    Storage(#[from] InfraError),
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(message) => Self::Validation(message),
            DomainError::NotFound { entity_type, ref id } => {
                tracing::debug!(entity_type, id = %id, "エンティティが見つかりません");
                Self::NotFound(error.to_string())
            }
        }
    }
}

impl ApiError {
    /// ステータスコードとクライアントに返すメッセージ
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::UpdateFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::Storage(e) if e.is_duplicate_key() => {
                (StatusCode::CONFLICT, DUPLICATE_RECORD_MESSAGE.to_string())
            }
            Self::Storage(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            match &self {
                Self::Storage(e) => tracing::error!(
                    error = %e,
                    unavailable = e.is_unavailable(),
                    span_trace = %e.span_trace(),
                    "データベースエラー"
                ),
                other => tracing::error!(error = %other, "リクエストの処理に失敗しました"),
            }
        }

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(ApiError::Validation("phone is required".to_string()), StatusCode::BAD_REQUEST, "phone is required")]
    #[case(ApiError::NotFound("Patient not found".to_string()), StatusCode::NOT_FOUND, "Patient not found")]
    #[case(ApiError::UpdateFailed("doctor"), StatusCode::INTERNAL_SERVER_ERROR, "Failed to update doctor")]
    #[case(
        ApiError::Storage(InfraError::duplicate_key("patients_email_key")),
        StatusCode::CONFLICT,
        "A record with this data already exists"
    )]
    #[case(
        ApiError::Storage(InfraError::foreign_key("appointments_patient_id_fkey", "violates foreign key constraint")),
        StatusCode::INTERNAL_SERVER_ERROR,
        "violates foreign key constraint"
    )]
    #[tokio::test]
    async fn test_エラー種別ごとのステータスとメッセージ(
        #[case] error: ApiError,
        #[case] expected_status: StatusCode,
        #[case] expected_message: &str,
    ) {
        let (status, body) = render(error).await;

        assert_eq!(status, expected_status);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], expected_message);
        assert!(body.get("data").is_none());
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_ドメインエラーの変換() {
        let validation = ApiError::from(DomainError::Validation("Invalid email format".to_string()));
        let not_found = ApiError::from(DomainError::NotFound {
            entity_type: "Appointment",
            id:          "7".to_string(),
        });

        assert!(matches!(validation, ApiError::Validation(m) if m == "Invalid email format"));
        assert!(matches!(not_found, ApiError::NotFound(m) if m == "Appointment not found"));
    }
}
