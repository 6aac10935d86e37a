//! # 予約（Appointment）
//!
//! 患者と医師の診察予約を表現する。
//!
//! ## ライフサイクル
//!
//! ```text
//! 作成 ──→ Scheduled ──(更新で任意のステータスへ)──→ ...
//!              │
//!              └──(削除)──→ Cancelled
//! ```
//!
//! 削除は行の物理削除ではなく、ステータスを Cancelled に変更する。
//! 同一時間帯の重複予約（ダブルブッキング）は検出しない。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use strum::IntoStaticStr;

use crate::{
    DomainError,
    doctor::DoctorId,
    patient::PatientId,
    value_objects::{optional_text, parse_date, parse_time, required_id, required_text},
};

/// 予約時間（分）の既定値
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// 料金の上限（`NUMERIC(10,2)` に収まる最大値）
pub const TOTAL_FEE_MAX: f64 = 99_999_999.99;

/// 料金の小数部の最大桁数（`NUMERIC(10,2)` のスケール）
const TOTAL_FEE_SCALE: usize = 2;

define_serial_id! {
    /// 予約 ID（`appointments.appointment_id`）
    pub struct AppointmentId(i64) => as_i64;
}

define_serial_id! {
    /// 予約ステータス ID（`appointment_status.status_id`）
    pub struct AppointmentStatusId(i32) => as_i32;
}

impl AppointmentStatusId {
    pub const SCHEDULED: Self = Self::new(1);
    pub const CANCELLED: Self = Self::new(3);
}

/// 予約ステータスのマスタ値
///
/// `appointment_status` テーブルの初期データと一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display, strum::EnumIter)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    pub fn id(&self) -> AppointmentStatusId {
        let id = match self {
            Self::Scheduled => 1,
            Self::Confirmed => 2,
            Self::Cancelled => 3,
            Self::Completed => 4,
            Self::NoShow => 5,
        };
        AppointmentStatusId::new(id)
    }

    /// ID からマスタ値を引く（未定義の ID なら `None`）
    pub fn from_id(id: AppointmentStatusId) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|status| status.id() == id)
    }

    /// `status_name` 列の値
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// 予約作成・更新リクエストの未検証値
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentInput {
    pub patient_id:       Option<i64>,
    pub doctor_id:        Option<i64>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub status_id:        Option<i32>,
    pub reason_for_visit: Option<String>,
    pub notes:            Option<String>,
    pub total_fee:        Option<f64>,
}

/// 検証済みの予約内容
///
/// # 不変条件
///
/// - 予約日時（UTC として解釈）は検証時点より厳密に未来
/// - `duration_minutes` は正の値
/// - `total_fee` は 0 以上 [`TOTAL_FEE_MAX`] 以下、小数部は 2 桁まで
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentSchedule {
    patient_id: PatientId,
    doctor_id: DoctorId,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    duration_minutes: i32,
    status_id: AppointmentStatusId,
    reason_for_visit: Option<String>,
    notes: Option<String>,
    total_fee: Option<f64>,
}

impl AppointmentSchedule {
    /// リクエスト値を検証する
    ///
    /// 患者・医師・ステータスの存在確認は行わない（外部キー制約に委ねる）。
    ///
    /// # 引数
    ///
    /// - `now`: 未来日時判定の基準時刻（呼び出し元から注入）
    pub fn validate(input: AppointmentInput, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let patient_id = required_id("patient_id", input.patient_id)?;
        let doctor_id = required_id("doctor_id", input.doctor_id)?;
        let appointment_date = required_text("appointment_date", input.appointment_date)?;
        let appointment_time = required_text("appointment_time", input.appointment_time)?;
        let status_id = required_id("status_id", input.status_id)?;

        let appointment_date = parse_date("appointment_date", &appointment_date)?;
        let appointment_time = parse_time("appointment_time", &appointment_time)?;
        if appointment_date.and_time(appointment_time).and_utc() <= now {
            return Err(DomainError::Validation(
                "Appointment date must be in the future".to_string(),
            ));
        }

        let duration_minutes = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration_minutes <= 0 {
            return Err(DomainError::Validation(
                "duration_minutes must be a positive integer".to_string(),
            ));
        }

        if let Some(fee) = input.total_fee {
            validate_total_fee(fee)?;
        }

        Ok(Self {
            patient_id: PatientId::new(patient_id),
            doctor_id: DoctorId::new(doctor_id),
            appointment_date,
            appointment_time,
            duration_minutes,
            status_id: AppointmentStatusId::new(status_id),
            reason_for_visit: optional_text(input.reason_for_visit),
            notes: optional_text(input.notes),
            total_fee: input.total_fee,
        })
    }

    /// 既存のデータから復元する（データベースから取得時）
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        patient_id: PatientId,
        doctor_id: DoctorId,
        appointment_date: NaiveDate,
        appointment_time: NaiveTime,
        duration_minutes: i32,
        status_id: AppointmentStatusId,
        reason_for_visit: Option<String>,
        notes: Option<String>,
        total_fee: Option<f64>,
    ) -> Self {
        Self {
            patient_id,
            doctor_id,
            appointment_date,
            appointment_time,
            duration_minutes,
            status_id,
            reason_for_visit,
            notes,
            total_fee,
        }
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn doctor_id(&self) -> DoctorId {
        self.doctor_id
    }

    pub fn appointment_date(&self) -> NaiveDate {
        self.appointment_date
    }

    pub fn appointment_time(&self) -> NaiveTime {
        self.appointment_time
    }

    pub fn duration_minutes(&self) -> i32 {
        self.duration_minutes
    }

    pub fn status_id(&self) -> AppointmentStatusId {
        self.status_id
    }

    pub fn reason_for_visit(&self) -> Option<&str> {
        self.reason_for_visit.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn total_fee(&self) -> Option<f64> {
        self.total_fee
    }
}

/// 料金が `NUMERIC(10,2)` に丸めなしで格納できることを確かめる
///
/// 小数部の桁数は `f64` の最短表現（JSON の入力表記と一致する）で数える。
fn validate_total_fee(fee: f64) -> Result<(), DomainError> {
    if fee < 0.0 {
        return Err(DomainError::Validation(
            "total_fee must not be negative".to_string(),
        ));
    }
    if !fee.is_finite() || fee > TOTAL_FEE_MAX {
        return Err(DomainError::Validation(format!(
            "total_fee must not exceed {TOTAL_FEE_MAX}"
        )));
    }

    let text = fee.to_string();
    let scale = text.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if scale > TOTAL_FEE_SCALE {
        return Err(DomainError::Validation(
            "total_fee must have at most 2 decimal places".to_string(),
        ));
    }
    Ok(())
}

/// 一覧・詳細表示用に結合した関連エンティティの表示名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentParties {
    pub patient_first_name: String,
    pub patient_last_name:  String,
    pub doctor_first_name:  String,
    pub doctor_last_name:   String,
    pub status_name:        String,
}

/// 予約エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    id: AppointmentId,
    schedule: AppointmentSchedule,
    parties: AppointmentParties,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Appointment {
    /// 既存のデータから予約を復元する（データベースから取得時）
    pub fn from_db(
        id: AppointmentId,
        schedule: AppointmentSchedule,
        parties: AppointmentParties,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            schedule,
            parties,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn schedule(&self) -> &AppointmentSchedule {
        &self.schedule
    }

    pub fn parties(&self) -> &AppointmentParties {
        &self.parties
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.schedule.status_id == AppointmentStatusId::CANCELLED
    }

    /// キャンセル後の状態を返す
    pub fn cancelled(self, now: DateTime<Utc>) -> Self {
        let mut schedule = self.schedule;
        schedule.status_id = AppointmentStatusId::CANCELLED;
        let parties = AppointmentParties {
            status_name: AppointmentStatus::Cancelled.name().to_string(),
            ..self.parties
        };

        Self {
            schedule,
            parties,
            updated_at: now,
            ..self
        }
    }

    /// 予約内容更新後の状態を返す
    pub fn with_schedule(
        self,
        schedule: AppointmentSchedule,
        parties: AppointmentParties,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            schedule,
            parties,
            updated_at: now,
            ..self
        }
    }
}
