//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | エンティティが存在しない（論理削除済みを含む） |
//!
//! メッセージはそのまま API レスポンスの `message` に載るため英語で定義する。
//!
//! ## 使用例
//!
//! ```rust
//! use clinic_domain::DomainError;
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Patient",
//!     id:          "42".to_string(),
//! };
//! assert_eq!(error.to_string(), "Patient not found");
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// # 例
    ///
    /// - 必須フィールドが未入力（`"phone is required"`）
    /// - 不正なフォーマット（`"Invalid email format"`）
    /// - 未来日の生年月日、過去日時の予約
    #[error("{0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// 表示メッセージには ID を含めない。ID はログ出力用に保持する。
    #[error("{entity_type} not found")]
    NotFound {
        /// エンティティの種類（"Patient", "Doctor", "Appointment"）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },
}

impl DomainError {
    /// 必須フィールド未入力のバリデーションエラーを作成する
    pub fn required(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_requiredはフィールド名入りのメッセージになる() {
        assert_eq!(
            DomainError::required("first_name").to_string(),
            "first_name is required"
        );
    }

    #[test]
    fn test_not_foundの表示にidは含まれない() {
        let error = DomainError::NotFound {
            entity_type: "Doctor",
            id:          "999999".to_string(),
        };

        assert_eq!(error.to_string(), "Doctor not found");
    }
}
