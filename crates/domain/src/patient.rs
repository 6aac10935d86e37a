//! # 患者（Patient）
//!
//! クリニックに来院する患者を表現する。
//!
//! ## 型の役割
//!
//! | 型 | 役割 |
//! |---|------|
//! | [`PatientInput`] | リクエストから受け取った未検証の値 |
//! | [`PatientProfile`] | 検証済みの患者情報（INSERT / UPDATE の入力） |
//! | [`Patient`] | 永続化済みの患者（ID・論理削除フラグ・タイムスタンプ付き） |
//!
//! 削除は `is_active` を false にする論理削除のみ。

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    DomainError,
    value_objects::{
        Email,
        Gender,
        NAME_MAX_CHARS,
        PHONE_MAX_CHARS,
        bounded_text,
        optional_text,
        parse_date,
        required_text,
    },
};

/// 緊急連絡先氏名（`VARCHAR(200)`）
pub const EMERGENCY_CONTACT_NAME_MAX_CHARS: usize = 200;

define_serial_id! {
    /// 患者 ID（`patients.patient_id`）
    pub struct PatientId(i64) => as_i64;
}

/// 患者作成・更新リクエストの未検証値
///
/// すべて任意項目として受け取り、必須チェックは
/// [`PatientProfile::validate`] で行う。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatientInput {
    pub first_name:              Option<String>,
    pub last_name:               Option<String>,
    pub email:                   Option<String>,
    pub phone:                   Option<String>,
    pub date_of_birth:           Option<String>,
    pub gender:                  Option<String>,
    pub address:                 Option<String>,
    pub emergency_contact_name:  Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history:         Option<String>,
    pub allergies:               Option<String>,
}

/// 検証済みの患者情報
///
/// # 不変条件
///
/// - 氏名・電話番号は空でない
/// - 文字列項目は対応する列の文字数上限以内
/// - `date_of_birth` は検証時点の日付以前
/// - `email` は存在する場合 `local@domain.tld` 形式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientProfile {
    first_name: String,
    last_name: String,
    email: Option<Email>,
    phone: String,
    date_of_birth: NaiveDate,
    gender: Gender,
    address: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    medical_history: Option<String>,
    allergies: Option<String>,
}

impl PatientProfile {
    /// リクエスト値を検証する
    ///
    /// 必須項目は `first_name`, `last_name`, `phone`, `date_of_birth`, `gender`
    /// の順にチェックし、最初に見つかった未入力項目をエラーにする。
    ///
    /// # 引数
    ///
    /// - `today`: 生年月日の未来日判定に使う基準日（呼び出し元から注入）
    pub fn validate(input: PatientInput, today: NaiveDate) -> Result<Self, DomainError> {
        let first_name = required_text("first_name", input.first_name)?;
        let last_name = required_text("last_name", input.last_name)?;
        let phone = required_text("phone", input.phone)?;
        let date_of_birth = required_text("date_of_birth", input.date_of_birth)?;
        let gender = required_text("gender", input.gender)?;

        let first_name = bounded_text("first_name", first_name, NAME_MAX_CHARS)?;
        let last_name = bounded_text("last_name", last_name, NAME_MAX_CHARS)?;
        let phone = bounded_text("phone", phone, PHONE_MAX_CHARS)?;
        let email = optional_text(input.email).map(Email::new).transpose()?;
        let emergency_contact_name = optional_text(input.emergency_contact_name)
            .map(|v| {
                bounded_text("emergency_contact_name", v, EMERGENCY_CONTACT_NAME_MAX_CHARS)
            })
            .transpose()?;
        let emergency_contact_phone = optional_text(input.emergency_contact_phone)
            .map(|v| bounded_text("emergency_contact_phone", v, PHONE_MAX_CHARS))
            .transpose()?;

        let date_of_birth = parse_date("date_of_birth", &date_of_birth)?;
        if date_of_birth > today {
            return Err(DomainError::Validation(
                "Date of birth cannot be in the future".to_string(),
            ));
        }

        let gender = Gender::parse(&gender)?;

        Ok(Self {
            first_name,
            last_name,
            email,
            phone,
            date_of_birth,
            gender,
            address: optional_text(input.address),
            emergency_contact_name,
            emergency_contact_phone,
            medical_history: optional_text(input.medical_history),
            allergies: optional_text(input.allergies),
        })
    }

    /// 既存のデータから復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        first_name: String,
        last_name: String,
        email: Option<Email>,
        phone: String,
        date_of_birth: NaiveDate,
        gender: Gender,
        address: Option<String>,
        emergency_contact_name: Option<String>,
        emergency_contact_phone: Option<String>,
        medical_history: Option<String>,
        allergies: Option<String>,
    ) -> Self {
        Self {
            first_name,
            last_name,
            email,
            phone,
            date_of_birth,
            gender,
            address,
            emergency_contact_name,
            emergency_contact_phone,
            medical_history,
            allergies,
        }
    }

    // Getter メソッド

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn emergency_contact_name(&self) -> Option<&str> {
        self.emergency_contact_name.as_deref()
    }

    pub fn emergency_contact_phone(&self) -> Option<&str> {
        self.emergency_contact_phone.as_deref()
    }

    pub fn medical_history(&self) -> Option<&str> {
        self.medical_history.as_deref()
    }

    pub fn allergies(&self) -> Option<&str> {
        self.allergies.as_deref()
    }
}

/// 患者エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    id: PatientId,
    profile: PatientProfile,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Patient {
    /// 既存のデータから患者を復元する（データベースから取得時）
    pub fn from_db(
        id: PatientId,
        profile: PatientProfile,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 論理削除後の状態を返す
    pub fn deactivated(self, now: DateTime<Utc>) -> Self {
        Self {
            is_active: false,
            updated_at: now,
            ..self
        }
    }

    /// プロフィール更新後の状態を返す
    pub fn with_profile(self, profile: PatientProfile, now: DateTime<Utc>) -> Self {
        Self {
            profile,
            updated_at: now,
            ..self
        }
    }
}
