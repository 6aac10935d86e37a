//! # 医師（Doctor）
//!
//! 診療を担当する医師を表現する。医師は 1 つの専門分野（Specialization）に属する。
//!
//! 専門分野は参照専用のマスタで、このシステムから作成・更新はしない。
//! 免許番号の一意性はデータベースの UNIQUE 制約でのみ担保する。

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    DomainError,
    value_objects::{
        Email,
        NAME_MAX_CHARS,
        PHONE_MAX_CHARS,
        bounded_text,
        required_id,
        required_text,
    },
};

/// 免許番号（`VARCHAR(50)`）
pub const LICENSE_NUMBER_MAX_CHARS: usize = 50;

define_serial_id! {
    /// 医師 ID（`doctors.doctor_id`）
    pub struct DoctorId(i64) => as_i64;
}

define_serial_id! {
    /// 専門分野 ID（`specializations.specialization_id`）
    pub struct SpecializationId(i32) => as_i32;
}

/// 医師作成・更新リクエストの未検証値
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DoctorInput {
    pub first_name:        Option<String>,
    pub last_name:         Option<String>,
    pub email:             Option<String>,
    pub phone:             Option<String>,
    pub license_number:    Option<String>,
    pub specialization_id: Option<i32>,
    pub years_experience:  Option<i32>,
}

/// 検証済みの医師情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorProfile {
    first_name: String,
    last_name: String,
    email: Email,
    phone: String,
    license_number: String,
    specialization_id: SpecializationId,
    years_experience: i32,
}

impl DoctorProfile {
    /// リクエスト値を検証する
    ///
    /// `years_experience` は未指定なら 0 とする。
    pub fn validate(input: DoctorInput) -> Result<Self, DomainError> {
        let first_name = required_text("first_name", input.first_name)?;
        let last_name = required_text("last_name", input.last_name)?;
        let email = required_text("email", input.email)?;
        let phone = required_text("phone", input.phone)?;
        let license_number = required_text("license_number", input.license_number)?;
        let specialization_id = required_id("specialization_id", input.specialization_id)?;

        let first_name = bounded_text("first_name", first_name, NAME_MAX_CHARS)?;
        let last_name = bounded_text("last_name", last_name, NAME_MAX_CHARS)?;
        let phone = bounded_text("phone", phone, PHONE_MAX_CHARS)?;
        let license_number =
            bounded_text("license_number", license_number, LICENSE_NUMBER_MAX_CHARS)?;
        let email = Email::new(email)?;

        let years_experience = input.years_experience.unwrap_or(0);
        if years_experience < 0 {
            return Err(DomainError::Validation(
                "years_experience must not be negative".to_string(),
            ));
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            phone,
            license_number,
            specialization_id: SpecializationId::new(specialization_id),
            years_experience,
        })
    }

    /// 既存のデータから復元する（データベースから取得時）
    pub fn from_db(
        first_name: String,
        last_name: String,
        email: Email,
        phone: String,
        license_number: String,
        specialization_id: SpecializationId,
        years_experience: i32,
    ) -> Self {
        Self {
            first_name,
            last_name,
            email,
            phone,
            license_number,
            specialization_id,
            years_experience,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn license_number(&self) -> &str {
        &self.license_number
    }

    pub fn specialization_id(&self) -> SpecializationId {
        self.specialization_id
    }

    pub fn years_experience(&self) -> i32 {
        self.years_experience
    }
}

/// 医師エンティティ
///
/// 一覧・詳細表示のため、専門分野名を結合済みで保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctor {
    id: DoctorId,
    profile: DoctorProfile,
    specialization_name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Doctor {
    /// 既存のデータから医師を復元する（データベースから取得時）
    pub fn from_db(
        id: DoctorId,
        profile: DoctorProfile,
        specialization_name: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile,
            specialization_name,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> DoctorId {
        self.id
    }

    pub fn profile(&self) -> &DoctorProfile {
        &self.profile
    }

    pub fn specialization_name(&self) -> &str {
        &self.specialization_name
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
    ///
    /// 専門分野が変わる場合は結合済みの専門分野名も差し替える。
    pub fn with_profile(
        self,
        profile: DoctorProfile,
        specialization_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            profile,
            specialization_name,
            updated_at: now,
            ..self
        }
    }
}
