//! # PatientRepository
//!
//! 患者情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **論理削除**: `deactivate` は `is_active = FALSE` にするだけで行は残す
//! - **アクティブのみ**: `find_all` / `find_by_id` は論理削除済みの患者を返さない
//! - **条件付き更新**: `update` / `deactivate` はアクティブな行だけを対象にし、
//!   影響行数で成否を返す

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use clinic_domain::{
    patient::{Patient, PatientId, PatientProfile},
    value_objects::{Email, Gender},
};
use sqlx::PgPool;

use super::log_query_failure;
use crate::error::InfraError;

/// 患者リポジトリトレイト
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// アクティブな患者をすべて取得する
    async fn find_all(&self) -> Result<Vec<Patient>, InfraError>;

    /// ID でアクティブな患者を検索する
    ///
    /// # 戻り値
    ///
    /// - `Ok(Some(patient))`: 患者が見つかった場合
    /// - `Ok(None)`: 存在しない、または論理削除済みの場合
    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, InfraError>;

    /// 患者を登録し、採番された ID を含む登録結果を返す
    async fn insert(&self, profile: &PatientProfile) -> Result<Patient, InfraError>;

    /// 患者情報を全項目更新する
    ///
    /// 対象行がない（存在しない・論理削除済み）場合は `Ok(false)`。
    async fn update(&self, id: PatientId, profile: &PatientProfile) -> Result<bool, InfraError>;

    /// 患者を論理削除する
    ///
    /// 対象行がない（存在しない・論理削除済み）場合は `Ok(false)`。
    async fn deactivate(&self, id: PatientId) -> Result<bool, InfraError>;
}

/// `patients` テーブルの 1 行
#[derive(Debug, sqlx::FromRow)]
struct PatientRow {
    patient_id: i64,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: String,
    date_of_birth: NaiveDate,
    gender: String,
    address: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    medical_history: Option<String>,
    allergies: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = InfraError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        // CHECK 制約があるため通常は到達しない
        let gender = Gender::parse(&row.gender).map_err(|e| {
            InfraError::unexpected(format!("patients.gender of {}: {e}", row.patient_id))
        })?;

        let profile = PatientProfile::from_db(
            row.first_name,
            row.last_name,
            row.email.map(Email::from_db),
            row.phone,
            row.date_of_birth,
            gender,
            row.address,
            row.emergency_contact_name,
            row.emergency_contact_phone,
            row.medical_history,
            row.allergies,
        );

        Ok(Patient::from_db(
            PatientId::new(row.patient_id),
            profile,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_ACTIVE: &str = r#"
    SELECT patient_id, first_name, last_name, email, phone, date_of_birth, gender,
           address, emergency_contact_name, emergency_contact_phone,
           medical_history, allergies, is_active, created_at, updated_at
    FROM patients
    WHERE is_active = TRUE
    ORDER BY patient_id
"#;

const SELECT_ACTIVE_BY_ID: &str = r#"
    SELECT patient_id, first_name, last_name, email, phone, date_of_birth, gender,
           address, emergency_contact_name, emergency_contact_phone,
           medical_history, allergies, is_active, created_at, updated_at
    FROM patients
    WHERE patient_id = $1 AND is_active = TRUE
"#;

const INSERT: &str = r#"
    INSERT INTO patients
        (first_name, last_name, email, phone, date_of_birth, gender, address,
         emergency_contact_name, emergency_contact_phone, medical_history, allergies)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    RETURNING patient_id, first_name, last_name, email, phone, date_of_birth, gender,
              address, emergency_contact_name, emergency_contact_phone,
              medical_history, allergies, is_active, created_at, updated_at
"#;

const UPDATE: &str = r#"
    UPDATE patients
    SET first_name = $1,
        last_name = $2,
        email = $3,
        phone = $4,
        date_of_birth = $5,
        gender = $6,
        address = $7,
        emergency_contact_name = $8,
        emergency_contact_phone = $9,
        medical_history = $10,
        allergies = $11,
        updated_at = NOW()
    WHERE patient_id = $12 AND is_active = TRUE
"#;

const DEACTIVATE: &str = r#"
    UPDATE patients
    SET is_active = FALSE, updated_at = NOW()
    WHERE patient_id = $1 AND is_active = TRUE
"#;

/// PostgreSQL 実装の PatientRepository
#[derive(Debug, Clone)]
pub struct PostgresPatientRepository {
    pool: PgPool,
}

impl PostgresPatientRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 患者情報の 11 項目を INSERT / UPDATE 共通の順序でバインドする
fn bind_profile<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    profile: &'q PatientProfile,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.email().map(Email::as_str))
        .bind(profile.phone())
        .bind(profile.date_of_birth())
        .bind(profile.gender().as_str())
        .bind(profile.address())
        .bind(profile.emergency_contact_name())
        .bind(profile.emergency_contact_phone())
        .bind(profile.medical_history())
        .bind(profile.allergies())
}

#[async_trait]
impl PatientRepository for PostgresPatientRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Patient>, InfraError> {
        let rows = sqlx::query_as::<_, PatientRow>(SELECT_ACTIVE)
            .fetch_all(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_ACTIVE, "[]"))?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, InfraError> {
        let row = sqlx::query_as::<_, PatientRow>(SELECT_ACTIVE_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_ACTIVE_BY_ID, format!("[{id}]")))?;

        row.map(Patient::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, profile: &PatientProfile) -> Result<Patient, InfraError> {
        let row = bind_profile(sqlx::query(INSERT), profile)
            .try_map(|row| <PatientRow as sqlx::FromRow<_>>::from_row(&row))
            .fetch_one(&self.pool)
            .await
            .inspect_err(log_query_failure(INSERT, "[profile]"))?;

        let patient = Patient::try_from(row)?;
        tracing::debug!(patient_id = %patient.id(), "患者を登録しました");
        Ok(patient)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update(&self, id: PatientId, profile: &PatientProfile) -> Result<bool, InfraError> {
        let result = bind_profile(sqlx::query(UPDATE), profile)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(UPDATE, format!("[profile, {id}]")))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn deactivate(&self, id: PatientId) -> Result<bool, InfraError> {
        let result = sqlx::query(DEACTIVATE)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(DEACTIVATE, format!("[{id}]")))?;

        Ok(result.rows_affected() > 0)
    }
}
