//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトと、
//! リクエスト値を検証済みの値へ変換する補助関数を定義する。
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Email`] | `String` | メールアドレス（`local@domain.tld` 形式） |
//! | [`Gender`] | enum | 患者の性別（Male / Female / Other） |
//!
//! ## 空文字の扱い
//!
//! 空白のみの文字列は「未入力」として扱う。必須項目なら
//! `"<field> is required"`、任意項目なら `None` に正規化される。
//!
//! ## 長さの上限
//!
//! 文字数の上限はマイグレーションの `VARCHAR(n)` と揃える。超過は
//! データベースに届く前に検証エラーとして扱う。

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::DomainError;

/// 氏名（`VARCHAR(100)`）
pub const NAME_MAX_CHARS: usize = 100;

/// 電話番号（`VARCHAR(30)`）
pub const PHONE_MAX_CHARS: usize = 30;

/// メールアドレス（`VARCHAR(255)`）
pub const EMAIL_MAX_CHARS: usize = 255;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("メールアドレスの正規表現は静的に正しい")
});

// =========================================================================
// Email（メールアドレス）
// =========================================================================

/// メールアドレス（値オブジェクト）
///
/// 空白と `@` を含まないローカル部・ドメイン部・TLD の形だけを検証する。
/// 実在確認や RFC 5322 準拠の厳密な検証は行わない。
///
/// # 使用例
///
/// ```rust
/// use clinic_domain::value_objects::Email;
///
/// assert!(Email::new("ana@example.com").is_ok());
/// assert!(Email::new("ana@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = bounded_text("email", value.into().trim().to_string(), EMAIL_MAX_CHARS)?;
        if !EMAIL_PATTERN.is_match(&value) {
            return Err(DomainError::Validation("Invalid email format".to_string()));
        }
        Ok(Self(value))
    }

    /// データベースから取得した値を検証せずに復元する
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =========================================================================
// Gender（性別）
// =========================================================================

/// 患者の性別
///
/// 文字列表現は大文字小文字を区別する（`"male"` は不正）。
/// DB の CHECK 制約と同じ値集合を持つ。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumString,
    strum::Display,
)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// リクエスト値をパースする
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value.parse().map_err(|_| {
            DomainError::Validation(
                "Invalid gender. Accepted values: Male, Female, Other".to_string(),
            )
        })
    }

    /// DB 格納用の文字列表現
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// =========================================================================
// フィールド変換ヘルパー
// =========================================================================

/// 必須の文字列フィールドを取り出す（trim 済み）
pub fn required_text(field: &str, value: Option<String>) -> Result<String, DomainError> {
    optional_text(value).ok_or_else(|| DomainError::required(field))
}

/// 任意の文字列フィールドを正規化する（空白のみは `None`）
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 文字数が `max` 以下であることを確かめる
///
/// `VARCHAR(n)` と同じくバイト数ではなく文字数で数える。
pub fn bounded_text(field: &str, value: String, max: usize) -> Result<String, DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

/// `YYYY-MM-DD` 形式の日付をパースする
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        DomainError::Validation(format!("Invalid {field}: expected YYYY-MM-DD"))
    })
}

/// `HH:MM` または `HH:MM:SS` 形式の時刻をパースする
pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| {
            DomainError::Validation(format!("Invalid {field}: expected HH:MM or HH:MM:SS"))
        })
}

/// 必須の正整数 ID フィールドを取り出す
pub fn required_id<T>(field: &str, value: Option<T>) -> Result<T, DomainError>
where
    T: Copy + PartialOrd + Default,
{
    match value {
        None => Err(DomainError::required(field)),
        Some(v) if v <= T::default() => Err(DomainError::Validation(format!(
            "{field} must be a positive integer"
        ))),
        Some(v) => Ok(v),
    }
}
