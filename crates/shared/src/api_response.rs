//! # API レスポンスエンベロープ
//!
//! 全エンドポイント共通のレスポンス形式
//! `{ "success": bool, "message": string, "timestamp": string, "data"?: T }`
//! を提供する。
//!
//! 成功・失敗のどちらも同じ形で返す。失敗時は `success: false` となり、
//! `data` フィールドは出力されない。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 全エンドポイントの統一レスポンス型
///
/// この型は以下の場所で使用される:
/// - 各ハンドラ（成功レスポンス）
/// - 集中エラーハンドリング（失敗レスポンス）
///
/// ## 使用例
///
/// ```
/// use clinic_shared::ApiResponse;
///
/// let response = ApiResponse::ok("Patient retrieved successfully", 42);
/// assert!(response.success);
/// assert_eq!(response.data, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success:   bool,
    pub message:   String,
    /// ISO-8601（UTC、ミリ秒精度）
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data:      Option<T>,
}

impl<T> ApiResponse<T> {
    /// データ付きの成功レスポンスを作成する
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::build(true, message.into(), Some(data), Utc::now())
    }

    fn build(success: bool, message: String, data: Option<T>, at: DateTime<Utc>) -> Self {
        Self {
            success,
            message,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// データなしの成功レスポンスを作成する（削除系）
    pub fn done(message: impl Into<String>) -> Self {
        Self::build(true, message.into(), None, Utc::now())
    }

    /// 失敗レスポンスを作成する
    pub fn failure(message: impl Into<String>) -> Self {
        Self::build(false, message.into(), None, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_okはデータ付きの成功エンベロープになる() {
        let response = ApiResponse::ok("Patients retrieved successfully", vec!["a", "b"]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Patients retrieved successfully");
        assert_eq!(json["data"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_failureはdataフィールドを出力しない() {
        let response = ApiResponse::failure("Patient not found");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Patient not found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_doneは成功だがdataを持たない() {
        let response = ApiResponse::done("Patient deleted successfully");

        assert!(response.success);
        assert!(response.data.is_none());
    }

    #[test]
    fn test_timestampはミリ秒精度のutc_iso8601になる() {
        let at = DateTime::from_timestamp(1_700_000_000, 123_000_000).unwrap();
        let response = ApiResponse::build(true, "x".to_string(), Some(1), at);

        assert_eq!(response.timestamp, "2023-11-14T22:13:20.123Z");
    }

    #[test]
    fn test_deserializeでdataなしのエンベロープを読める() {
        let json = r#"{"success":false,"message":"boom","timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let response: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();

        assert!(!response.success);
        assert!(response.data.is_none());
    }
}
