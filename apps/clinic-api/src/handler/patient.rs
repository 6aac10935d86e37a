//! # 患者ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /patients` - アクティブな患者一覧
//! - `GET /patients/{id}` - 患者取得
//! - `POST /patients` - 患者登録
//! - `PUT /patients/{id}` - 患者情報更新（全項目）
//! - `DELETE /patients/{id}` - 患者の論理削除

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use clinic_domain::{
    patient::{Patient, PatientId, PatientInput},
    value_objects::Gender,
};
use clinic_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathId};
use crate::{error::ApiError, usecase::PatientUseCaseImpl};

/// 患者 API の共有状態
pub struct PatientState {
    pub usecase: PatientUseCaseImpl,
}

/// 患者 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PatientDto {
    pub id:                      i64,
    pub first_name:              String,
    pub last_name:               String,
    pub email:                   Option<String>,
    pub phone:                   String,
    pub date_of_birth:           NaiveDate,
    pub gender:                  Gender,
    pub address:                 Option<String>,
    pub emergency_contact_name:  Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history:         Option<String>,
    pub allergies:               Option<String>,
    pub is_active:               bool,
    pub created_at:              String,
    pub updated_at:              String,
}

impl From<&Patient> for PatientDto {
    fn from(patient: &Patient) -> Self {
        let profile = patient.profile();
        Self {
            id:                      patient.id().as_i64(),
            first_name:              profile.first_name().to_string(),
            last_name:               profile.last_name().to_string(),
            email:                   profile.email().map(|e| e.as_str().to_string()),
            phone:                   profile.phone().to_string(),
            date_of_birth:           profile.date_of_birth(),
            gender:                  profile.gender(),
            address:                 profile.address().map(str::to_string),
            emergency_contact_name:  profile.emergency_contact_name().map(str::to_string),
            emergency_contact_phone: profile.emergency_contact_phone().map(str::to_string),
            medical_history:         profile.medical_history().map(str::to_string),
            allergies:               profile.allergies().map(str::to_string),
            is_active:               patient.is_active(),
            created_at:              patient.created_at().to_rfc3339(),
            updated_at:              patient.updated_at().to_rfc3339(),
        }
    }
}

/// GET /patients
#[tracing::instrument(skip_all)]
pub async fn list_patients(
    State(state): State<Arc<PatientState>>,
) -> Result<impl IntoResponse, ApiError> {
    let patients = state.usecase.list_patients().await?;

    let items: Vec<PatientDto> = patients.iter().map(PatientDto::from).collect();
    let response = ApiResponse::ok("Patients retrieved successfully", items);
    Ok((StatusCode::OK, Json(response)))
}

/// GET /patients/{id}
///
/// ## レスポンス
///
/// - `200 OK`: 患者
/// - `404 Not Found`: 存在しない、または論理削除済み
#[tracing::instrument(skip_all, fields(id))]
pub async fn get_patient(
    State(state): State<Arc<PatientState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let patient = state.usecase.get_patient(PatientId::new(id)).await?;

    let response = ApiResponse::ok("Patient retrieved successfully", PatientDto::from(&patient));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /patients
///
/// ## レスポンス
///
/// - `201 Created`: 登録された患者
/// - `400 Bad Request`: 検証エラー
/// - `409 Conflict`: メールアドレスの重複
#[tracing::instrument(skip_all)]
pub async fn create_patient(
    State(state): State<Arc<PatientState>>,
    JsonBody(input): JsonBody<PatientInput>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = state.usecase.create_patient(input).await?;

    let response = ApiResponse::ok("Patient created successfully", PatientDto::from(&patient));
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /patients/{id}
///
/// 全項目を置き換える。省略した任意項目は空になる。
#[tracing::instrument(skip_all, fields(id))]
pub async fn update_patient(
    State(state): State<Arc<PatientState>>,
    PathId(id): PathId<i64>,
    JsonBody(input): JsonBody<PatientInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let patient = state
        .usecase
        .update_patient(PatientId::new(id), input)
        .await?;

    let response = ApiResponse::ok("Patient updated successfully", PatientDto::from(&patient));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /patients/{id}
///
/// 論理削除する。レスポンスに `data` は含まない。
#[tracing::instrument(skip_all, fields(id))]
pub async fn delete_patient(
    State(state): State<Arc<PatientState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    state.usecase.delete_patient(PatientId::new(id)).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Patient deleted successfully")),
    ))
}
