//! # AppointmentRepository
//!
//! 予約の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **表示名の結合**: 取得系は患者名・医師名・ステータス名を常に結合して返す
//! - **並び順**: 一覧は予約日・予約時刻の降順
//! - **キャンセル**: 削除は `status_id = 3`（Cancelled）への更新で表現する
//! - **料金**: `NUMERIC(10,2)` を `float8` として読み書きする。桁数はドメインで検証済みなので丸めは起きない

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clinic_domain::{
    appointment::{
        Appointment,
        AppointmentId,
        AppointmentParties,
        AppointmentSchedule,
        AppointmentStatusId,
    },
    doctor::DoctorId,
    patient::PatientId,
};
use sqlx::{PgPool, postgres::PgArguments, query::Query};

use super::log_query_failure;
use crate::error::InfraError;

/// 予約リポジトリトレイト
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// すべての予約を取得する（キャンセル済みを含む）
    async fn find_all(&self) -> Result<Vec<Appointment>, InfraError>;

    /// ID で予約を検索する
    async fn find_by_id(&self, id: AppointmentId) -> Result<Option<Appointment>, InfraError>;

    /// 予約を登録する
    ///
    /// 存在しない患者・医師・ステータスを参照した場合は外部キー違反になる。
    async fn insert(&self, schedule: &AppointmentSchedule) -> Result<Appointment, InfraError>;

    /// 予約内容を全項目更新する（対象行がなければ `Ok(false)`）
    async fn update(
        &self,
        id: AppointmentId,
        schedule: &AppointmentSchedule,
    ) -> Result<bool, InfraError>;

    /// 予約をキャンセルする（対象行がなければ `Ok(false)`）
    ///
    /// キャンセル済みの予約に対しても成功する。
    async fn cancel(&self, id: AppointmentId) -> Result<bool, InfraError>;

    /// 患者の予約一覧を取得する
    async fn find_by_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, InfraError>;

    /// 医師の予約一覧を取得する
    async fn find_by_doctor(&self, doctor_id: DoctorId) -> Result<Vec<Appointment>, InfraError>;
}

/// 予約と関連テーブルの結合結果の 1 行
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    appointment_id: i64,
    patient_id: i64,
    doctor_id: i64,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    duration_minutes: i32,
    status_id: i32,
    reason_for_visit: Option<String>,
    notes: Option<String>,
    total_fee: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    patient_first_name: String,
    patient_last_name: String,
    doctor_first_name: String,
    doctor_last_name: String,
    status_name: String,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        let schedule = AppointmentSchedule::from_db(
            PatientId::new(row.patient_id),
            DoctorId::new(row.doctor_id),
            row.appointment_date,
            row.appointment_time,
            row.duration_minutes,
            AppointmentStatusId::new(row.status_id),
            row.reason_for_visit,
            row.notes,
            row.total_fee,
        );
        let parties = AppointmentParties {
            patient_first_name: row.patient_first_name,
            patient_last_name:  row.patient_last_name,
            doctor_first_name:  row.doctor_first_name,
            doctor_last_name:   row.doctor_last_name,
            status_name:        row.status_name,
        };

        Appointment::from_db(
            AppointmentId::new(row.appointment_id),
            schedule,
            parties,
            row.created_at,
            row.updated_at,
        )
    }
}

/// 結合済みの SELECT 文を組み立てる
///
/// `$source` は `appointments` テーブルまたは同じ列を持つ CTE 名。
macro_rules! appointment_select {
    ($source:literal, $tail:literal) => {
        concat!(
            r#"
    SELECT a.appointment_id, a.patient_id, a.doctor_id, a.appointment_date,
           a.appointment_time, a.duration_minutes, a.status_id, a.reason_for_visit,
           a.notes, a.total_fee::float8 AS total_fee, a.created_at, a.updated_at,
           p.first_name AS patient_first_name, p.last_name AS patient_last_name,
           d.first_name AS doctor_first_name, d.last_name AS doctor_last_name,
           s.status_name
    FROM "#,
            $source,
            r#" a
    JOIN patients p ON p.patient_id = a.patient_id
    JOIN doctors d ON d.doctor_id = a.doctor_id
    JOIN appointment_status s ON s.status_id = a.status_id
    "#,
            $tail
        )
    };
}

const SELECT_ALL: &str = appointment_select!(
    "appointments",
    "ORDER BY a.appointment_date DESC, a.appointment_time DESC"
);

const SELECT_BY_ID: &str = appointment_select!("appointments", "WHERE a.appointment_id = $1");

const SELECT_BY_PATIENT: &str = appointment_select!(
    "appointments",
    "WHERE a.patient_id = $1 ORDER BY a.appointment_date DESC, a.appointment_time DESC"
);

const SELECT_BY_DOCTOR: &str = appointment_select!(
    "appointments",
    "WHERE a.doctor_id = $1 ORDER BY a.appointment_date DESC, a.appointment_time DESC"
);

const INSERT: &str = concat!(
    r#"
    WITH inserted AS (
        INSERT INTO appointments
            (patient_id, doctor_id, appointment_date, appointment_time,
             duration_minutes, status_id, reason_for_visit, notes, total_fee)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
    )"#,
    appointment_select!("inserted", "")
);

const UPDATE: &str = r#"
    UPDATE appointments
    SET patient_id = $1,
        doctor_id = $2,
        appointment_date = $3,
        appointment_time = $4,
        duration_minutes = $5,
        status_id = $6,
        reason_for_visit = $7,
        notes = $8,
        total_fee = $9,
        updated_at = NOW()
    WHERE appointment_id = $10
"#;

const CANCEL: &str = r#"
    UPDATE appointments
    SET status_id = $1, updated_at = NOW()
    WHERE appointment_id = $2
"#;

/// PostgreSQL 実装の AppointmentRepository
#[derive(Debug, Clone)]
pub struct PostgresAppointmentRepository {
    pool: PgPool,
}

impl PostgresAppointmentRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_list(
        &self,
        statement: &'static str,
        key: i64,
    ) -> Result<Vec<Appointment>, InfraError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(statement)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .inspect_err(log_query_failure(statement, format!("[{key}]")))?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }
}

fn bind_schedule<'q>(
    query: Query<'q, sqlx::Postgres, PgArguments>,
    schedule: &'q AppointmentSchedule,
) -> Query<'q, sqlx::Postgres, PgArguments> {
    query
        .bind(schedule.patient_id().as_i64())
        .bind(schedule.doctor_id().as_i64())
        .bind(schedule.appointment_date())
        .bind(schedule.appointment_time())
        .bind(schedule.duration_minutes())
        .bind(schedule.status_id().as_i32())
        .bind(schedule.reason_for_visit())
        .bind(schedule.notes())
        .bind(schedule.total_fee())
}

#[async_trait]
impl AppointmentRepository for PostgresAppointmentRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<Appointment>, InfraError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_ALL, "[]"))?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: AppointmentId) -> Result<Option<Appointment>, InfraError> {
        let row = sqlx::query_as::<_, AppointmentRow>(SELECT_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .inspect_err(log_query_failure(SELECT_BY_ID, format!("[{id}]")))?;

        Ok(row.map(Appointment::from))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(
        patient_id = %schedule.patient_id(),
        doctor_id = %schedule.doctor_id(),
    ))]
    async fn insert(&self, schedule: &AppointmentSchedule) -> Result<Appointment, InfraError> {
        let params = format!("[{}, {}, schedule]", schedule.patient_id(), schedule.doctor_id());
        let row = bind_schedule(sqlx::query(INSERT), schedule)
            .try_map(|row| <AppointmentRow as sqlx::FromRow<_>>::from_row(&row))
            .fetch_one(&self.pool)
            .await
            .inspect_err(log_query_failure(INSERT, params))?;

        let appointment = Appointment::from(row);
        tracing::debug!(appointment_id = %appointment.id(), "予約を登録しました");
        Ok(appointment)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn update(
        &self,
        id: AppointmentId,
        schedule: &AppointmentSchedule,
    ) -> Result<bool, InfraError> {
        let params = format!(
            "[{}, {}, schedule, {id}]",
            schedule.patient_id(),
            schedule.doctor_id()
        );
        let result = bind_schedule(sqlx::query(UPDATE), schedule)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(UPDATE, params))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn cancel(&self, id: AppointmentId) -> Result<bool, InfraError> {
        let result = sqlx::query(CANCEL)
            .bind(AppointmentStatusId::CANCELLED.as_i32())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .inspect_err(log_query_failure(
                CANCEL,
                format!("[{}, {id}]", AppointmentStatusId::CANCELLED),
            ))?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%patient_id))]
    async fn find_by_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, InfraError> {
        self.fetch_list(SELECT_BY_PATIENT, patient_id.as_i64()).await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%doctor_id))]
    async fn find_by_doctor(&self, doctor_id: DoctorId) -> Result<Vec<Appointment>, InfraError> {
        self.fetch_list(SELECT_BY_DOCTOR, doctor_id.as_i64()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_一覧系は予約日時の降順で並べる() {
        for sql in [SELECT_ALL, SELECT_BY_PATIENT, SELECT_BY_DOCTOR] {
            assert!(
                sql.contains("ORDER BY a.appointment_date DESC, a.appointment_time DESC"),
                "{sql}"
            );
        }
    }

    #[test]
    fn test_どの文も物理削除しない() {
        for sql in [SELECT_ALL, SELECT_BY_ID, INSERT, UPDATE, CANCEL] {
            assert!(!sql.to_uppercase().contains("DELETE"), "{sql}");
        }
    }

    #[test]
    fn test_料金はfloat8として読み出す() {
        assert!(SELECT_BY_ID.contains("a.total_fee::float8 AS total_fee"));
    }
}
