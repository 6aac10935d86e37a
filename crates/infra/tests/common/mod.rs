//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するプロフィール生成ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use clinic_domain::{
    appointment::{AppointmentSchedule, AppointmentStatusId},
    doctor::{Doctor, DoctorId, DoctorProfile, SpecializationId},
    patient::{Patient, PatientId, PatientProfile},
    value_objects::{Email, Gender},
};
use clinic_infra::repository::{
    DoctorRepository,
    PatientRepository,
    PostgresDoctorRepository,
    PostgresPatientRepository,
};
use sqlx::PgPool;

/// シードデータの専門分野: General Medicine
pub const GENERAL_MEDICINE: SpecializationId = SpecializationId::new(1);

/// シードデータの専門分野: Cardiology
pub const CARDIOLOGY: SpecializationId = SpecializationId::new(2);

pub fn patient_profile(first_name: &str, email: Option<&str>) -> PatientProfile {
    PatientProfile::from_db(
        first_name.to_string(),
        "Diaz".to_string(),
        email.map(|e| Email::from_db(e.to_string())),
        "555-0100".to_string(),
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        Gender::Female,
        Some("1 Main St".to_string()),
        None,
        None,
        None,
        Some("Penicillin".to_string()),
    )
}

pub fn doctor_profile(email: &str, license: &str, specialization: SpecializationId) -> DoctorProfile {
    DoctorProfile::from_db(
        "Gregory".to_string(),
        "House".to_string(),
        Email::from_db(email.to_string()),
        "555-0200".to_string(),
        license.to_string(),
        specialization,
        12,
    )
}

pub fn schedule(
    patient_id: PatientId,
    doctor_id: DoctorId,
    date: (i32, u32, u32),
    time: (u32, u32),
) -> AppointmentSchedule {
    AppointmentSchedule::from_db(
        patient_id,
        doctor_id,
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
        30,
        AppointmentStatusId::SCHEDULED,
        Some("Checkup".to_string()),
        None,
        Some(150.5),
    )
}

/// 予約テスト用に患者を 1 人登録する
pub async fn insert_patient(pool: &PgPool) -> Patient {
    PostgresPatientRepository::new(pool.clone())
        .insert(&patient_profile("Ana", Some("ana@example.com")))
        .await
        .expect("患者の登録に失敗")
}

/// 予約テスト用に医師を 1 人登録する
pub async fn insert_doctor(pool: &PgPool) -> Doctor {
    PostgresDoctorRepository::new(pool.clone())
        .insert(&doctor_profile("house@example.com", "LIC-001", GENERAL_MEDICINE))
        .await
        .expect("医師の登録に失敗")
}
