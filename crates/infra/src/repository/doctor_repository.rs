//! # DoctorRepository
//!
//! 医師情報の永続化を担当するリポジトリ。
//!
//! 取得系はすべて `specializations` と結合し、専門分野名を含めて返す。
//! 登録時も `INSERT ... RETURNING` を CTE にして同じ結合結果を 1 往復で得る。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_domain::{
    doctor::{Doctor, DoctorId, DoctorProfile, SpecializationId},
    value_objects::Email,
};
use sqlx::{PgPool, postgres::PgArguments, query::Query};

use super::log_query_failure;
use crate::error::InfraError;

/// 医師リポジトリトレイト
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    /// アクティブな医師をすべて取得する（専門分野名付き）
    async fn find_all(&self) -> Result<Vec<Doctor>, InfraError>;

    /// ID でアクティブな医師を検索する
    async fn find_by_id(&self, id: DoctorId) -> Result<Option<Doctor>, InfraError>;

    /// 医師を登録する
    ///
    /// 存在しない専門分野を指定した場合は外部キー違反になる。
    async fn insert(&self, profile: &DoctorProfile) -> Result<Doctor, InfraError>;

    /// 医師情報を全項目更新する（対象行がなければ `Ok(false)`）
    async fn update(&self, id: DoctorId, profile: &DoctorProfile) -> Result<bool, InfraError>;

    /// 医師を論理削除する（対象行がなければ `Ok(false)`）
    async fn deactivate(&self, id: DoctorId) -> Result<bool, InfraError>;

    /// 専門分野でアクティブな医師を検索する
    ///
    /// 専門分野の存在確認は行わず、該当なしは空リストを返す。
    async fn find_by_specialization(
        &self,
        specialization_id: SpecializationId,
    ) -> Result<Vec<Doctor>, InfraError>;
}

/// `doctors` と `specializations` の結合結果の 1 行
#[derive(Debug, sqlx::FromRow)]
struct DoctorRow {
    doctor_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    license_number: String,
    specialization_id: i32,
    specialization_name: String,
    years_experience: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        let profile = DoctorProfile::from_db(
            row.first_name,
            row.last_name,
            Email::from_db(row.email),
            row.phone,
            row.license_number,
            SpecializationId::new(row.specialization_id),
            row.years_experience,
        );

        Doctor::from_db(
            DoctorId::new(row.doctor_id),
            profile,
            row.specialization_name,
            row.is_active,
            row.created_at,
            row.updated_at,
        )
    }
}

/// 結合済みの SELECT 文を組み立てる
///
/// `$source` は `doctors` テーブルまたは同じ列を持つ CTE 名。
macro_rules! doctor_select {
    ($source:literal, $tail:literal) => {
        concat!(
            r#"
    SELECT d.doctor_id, d.first_name, d.last_name, d.email, d.phone, d.license_number,
           d.specialization_id, s.name AS specialization_name, d.years_experience,
           d.is_active, d.created_at, d.updated_at
    FROM "#,
            $source,
            r#" d
    JOIN specializations s ON s.specialization_id = d.specialization_id
    "#,
            $tail
        )
    };
}

const SELECT_ACTIVE: &str = doctor_select!("doctors", "WHERE d.is_active = TRUE ORDER BY d.doctor_id");

const SELECT_ACTIVE_BY_ID: &str =
    doctor_select!("doctors", "WHERE d.doctor_id = $1 AND d.is_active = TRUE");

const SELECT_ACTIVE_BY_SPECIALIZATION: &str = doctor_select!(
    "doctors",
    "WHERE d.specialization_id = $1 AND d.is_active = TRUE ORDER BY d.doctor_id"
);

const INSERT: &str = concat!(
    r#"
    WITH inserted AS (
        INSERT INTO doctors
            (first_name, last_name, email, phone, license_number, specialization_id, years_experience)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
    )"#,
    doctor_select!("inserted", "")
);

const UPDATE: &str = r#"
    UPDATE doctors
    SET first_name = $1,
        last_name = $2,
        email = $3,
        phone = $4,
        license_number = $5,
        specialization_id = $6,
        years_experience = $7,
        updated_at = NOW()
    WHERE doctor_id = $8 AND is_active = TRUE
"#;

const DEACTIVATE: &str = r#"
    UPDATE doctors
    SET is_active = FALSE, updated_at = NOW()
    WHERE doctor_id = $1 AND is_active = TRUE
"#;

/// PostgreSQL 実装の DoctorRepository
#[derive(Debug, Clone)]
pub struct PostgresDoctorRepository {
    pool: PgPool,
}

impl PostgresDoctorRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_profile<'q>(
    query: Query<'q, sqlx::Postgres, PgArguments>,
    profile: &'q DoctorProfile,
) -> Query<'q, sqlx::Postgres, PgArguments> {
    query
        .bind(profile.first_name())
        .bind(profile.last_name())
        .bind(profile.email().as_str())
        .bind(profile.phone())
        .bind(profile.license_number())
        .bind(profile.specialization_id().as_i32())
        .bind(profile.years_experience())
}

#[async_trait]
impl DoctorRepository for PostgresDoctorRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Doctor>, InfraError> {
        let rows = sqlx::query_as::<_, DoctorRow>(SELECT_ACTIVE)
            .fetch_all(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_ACTIVE, "[]"))?;

        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: DoctorId) -> Result<Option<Doctor>, InfraError> {
        let row = sqlx::query_as::<_, DoctorRow>(SELECT_ACTIVE_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_ACTIVE_BY_ID, format!("[{id}]")))?;

        Ok(row.map(Doctor::from))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn insert(&self, profile: &DoctorProfile) -> Result<Doctor, InfraError> {
        let row = bind_profile(sqlx::query(INSERT), profile)
            .try_map(|row| <DoctorRow as sqlx::FromRow<_>>::from_row(&row))
            .fetch_one(&self.pool)
            .await
            .inspect_err(log_query_failure(INSERT, "[profile]"))?;

        let doctor = Doctor::from(row);
        tracing::debug!(doctor_id = %doctor.id(), "医師を登録しました");
        Ok(doctor)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update(&self, id: DoctorId, profile: &DoctorProfile) -> Result<bool, InfraError> {
        let result = bind_profile(sqlx::query(UPDATE), profile)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(UPDATE, format!("[profile, {id}]")))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn deactivate(&self, id: DoctorId) -> Result<bool, InfraError> {
        let result = sqlx::query(DEACTIVATE)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(DEACTIVATE, format!("[{id}]")))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%specialization_id))]
    async fn find_by_specialization(
        &self,
        specialization_id: SpecializationId,
    ) -> Result<Vec<Doctor>, InfraError> {
        let rows = sqlx::query_as::<_, DoctorRow>(SELECT_ACTIVE_BY_SPECIALIZATION)
            .bind(specialization_id.as_i32())
            .fetch_all(&self.pool)
            .await
            .inspect_err(log_query_failure(
                SELECT_ACTIVE_BY_SPECIALIZATION,
                format!("[{specialization_id}]"),
            ))?;

        Ok(rows.into_iter().map(Doctor::from).collect())
    }
}
