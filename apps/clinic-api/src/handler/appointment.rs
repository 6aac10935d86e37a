//! # 予約ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /appointments` - 予約一覧（キャンセル済みを含む）
//! - `GET /appointments/{id}` - 予約取得
//! - `POST /appointments` - 予約登録
//! - `PUT /appointments/{id}` - 予約更新
//! - `DELETE /appointments/{id}` - 予約キャンセル
//! - `GET /appointments/patient/{patient_id}` - 患者別の予約一覧
//! - `GET /appointments/doctor/{doctor_id}` - 医師別の予約一覧
//!
//! 取得系のレスポンスには患者名・医師名・ステータス名が含まれる。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{NaiveDate, NaiveTime};
use clinic_domain::{
    appointment::{Appointment, AppointmentId, AppointmentInput},
    doctor::DoctorId,
    patient::PatientId,
};
use clinic_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathId};
use crate::{error::ApiError, usecase::AppointmentUseCaseImpl};

/// 予約 API の共有状態
pub struct AppointmentState {
    pub usecase: AppointmentUseCaseImpl,
}

/// 予約 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDto {
    pub id:                 i64,
    pub patient_id:         i64,
    pub doctor_id:          i64,
    pub appointment_date:   NaiveDate,
    pub appointment_time:   NaiveTime,
    pub duration_minutes:   i32,
    pub status_id:          i32,
    pub status_name:        String,
    pub reason_for_visit:   Option<String>,
    pub notes:              Option<String>,
    pub total_fee:          Option<f64>,
    pub patient_first_name: String,
    pub patient_last_name:  String,
    pub doctor_first_name:  String,
    pub doctor_last_name:   String,
    pub created_at:         String,
    pub updated_at:         String,
}

impl From<&Appointment> for AppointmentDto {
    fn from(appointment: &Appointment) -> Self {
        let schedule = appointment.schedule();
        let parties = appointment.parties();
        Self {
            id:                 appointment.id().as_i64(),
            patient_id:         schedule.patient_id().as_i64(),
            doctor_id:          schedule.doctor_id().as_i64(),
            appointment_date:   schedule.appointment_date(),
            appointment_time:   schedule.appointment_time(),
            duration_minutes:   schedule.duration_minutes(),
            status_id:          schedule.status_id().as_i32(),
            status_name:        parties.status_name.clone(),
            reason_for_visit:   schedule.reason_for_visit().map(str::to_string),
            notes:              schedule.notes().map(str::to_string),
            total_fee:          schedule.total_fee(),
            patient_first_name: parties.patient_first_name.clone(),
            patient_last_name:  parties.patient_last_name.clone(),
            doctor_first_name:  parties.doctor_first_name.clone(),
            doctor_last_name:   parties.doctor_last_name.clone(),
            created_at:         appointment.created_at().to_rfc3339(),
            updated_at:         appointment.updated_at().to_rfc3339(),
        }
    }
}

fn to_dtos(appointments: &[Appointment]) -> Vec<AppointmentDto> {
    appointments.iter().map(AppointmentDto::from).collect()
}

/// GET /appointments
#[tracing::instrument(skip_all)]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
) -> Result<impl IntoResponse, ApiError> {
    let appointments = state.usecase.list_appointments().await?;

    let response = ApiResponse::ok("Appointments retrieved successfully", to_dtos(&appointments));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /appointments/{id}
#[tracing::instrument(skip_all, fields(id))]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let appointment = state.usecase.get_appointment(AppointmentId::new(id)).await?;

    let response = ApiResponse::ok(
        "Appointment retrieved successfully",
        AppointmentDto::from(&appointment),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// POST /appointments
///
/// ## レスポンス
///
/// - `201 Created`: 登録された予約（表示名付き）
/// - `400 Bad Request`: 検証エラー（過去日時を含む）
/// - `500 Internal Server Error`: 存在しない患者・医師・ステータス
#[tracing::instrument(skip_all)]
pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    JsonBody(input): JsonBody<AppointmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let appointment = state.usecase.create_appointment(input).await?;

    let response = ApiResponse::ok(
        "Appointment created successfully",
        AppointmentDto::from(&appointment),
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /appointments/{id}
#[tracing::instrument(skip_all, fields(id))]
pub async fn update_appointment(
    State(state): State<Arc<AppointmentState>>,
    PathId(id): PathId<i64>,
    JsonBody(input): JsonBody<AppointmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let appointment = state
        .usecase
        .update_appointment(AppointmentId::new(id), input)
        .await?;

    let response = ApiResponse::ok(
        "Appointment updated successfully",
        AppointmentDto::from(&appointment),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /appointments/{id}
///
/// 行は削除せず、ステータスを Cancelled にする。
#[tracing::instrument(skip_all, fields(id))]
pub async fn delete_appointment(
    State(state): State<Arc<AppointmentState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    state
        .usecase
        .delete_appointment(AppointmentId::new(id))
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Appointment deleted successfully")),
    ))
}

/// GET /appointments/patient/{patient_id}
#[tracing::instrument(skip_all, fields(patient_id))]
pub async fn list_appointments_by_patient(
    State(state): State<Arc<AppointmentState>>,
    PathId(patient_id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("patient_id", patient_id);
    let appointments = state
        .usecase
        .list_by_patient(PatientId::new(patient_id))
        .await?;

    let response = ApiResponse::ok(
        "Patient appointments retrieved successfully",
        to_dtos(&appointments),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// GET /appointments/doctor/{doctor_id}
#[tracing::instrument(skip_all, fields(doctor_id))]
pub async fn list_appointments_by_doctor(
    State(state): State<Arc<AppointmentState>>,
    PathId(doctor_id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("doctor_id", doctor_id);
    let appointments = state
        .usecase
        .list_by_doctor(DoctorId::new(doctor_id))
        .await?;

    let response = ApiResponse::ok(
        "Doctor appointments retrieved successfully",
        to_dtos(&appointments),
    );
    Ok((StatusCode::OK, Json(response)))
}
