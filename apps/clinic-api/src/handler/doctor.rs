//! # 医師ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /doctors` - アクティブな医師一覧（専門分野名付き）
//! - `GET /doctors/{id}` - 医師取得
//! - `POST /doctors` - 医師登録
//! - `PUT /doctors/{id}` - 医師情報更新
//! - `DELETE /doctors/{id}` - 医師の論理削除
//! - `GET /doctors/specialization/{specialization_id}` - 専門分野別の医師一覧

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use clinic_domain::doctor::{Doctor, DoctorId, DoctorInput, SpecializationId};
use clinic_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathId};
use crate::{error::ApiError, usecase::DoctorUseCaseImpl};

/// 医師 API の共有状態
pub struct DoctorState {
    pub usecase: DoctorUseCaseImpl,
}

/// 医師 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DoctorDto {
    pub id:                  i64,
    pub first_name:          String,
    pub last_name:           String,
    pub email:               String,
    pub phone:               String,
    pub license_number:      String,
    pub specialization_id:   i32,
    pub specialization_name: String,
    pub years_experience:    i32,
    pub is_active:           bool,
    pub created_at:          String,
    pub updated_at:          String,
}

impl From<&Doctor> for DoctorDto {
    fn from(doctor: &Doctor) -> Self {
        let profile = doctor.profile();
        Self {
            id:                  doctor.id().as_i64(),
            first_name:          profile.first_name().to_string(),
            last_name:           profile.last_name().to_string(),
            email:               profile.email().as_str().to_string(),
            phone:               profile.phone().to_string(),
            license_number:      profile.license_number().to_string(),
            specialization_id:   profile.specialization_id().as_i32(),
            specialization_name: doctor.specialization_name().to_string(),
            years_experience:    profile.years_experience(),
            is_active:           doctor.is_active(),
            created_at:          doctor.created_at().to_rfc3339(),
            updated_at:          doctor.updated_at().to_rfc3339(),
        }
    }
}

fn to_dtos(doctors: &[Doctor]) -> Vec<DoctorDto> {
    doctors.iter().map(DoctorDto::from).collect()
}

/// GET /doctors
#[tracing::instrument(skip_all)]
pub async fn list_doctors(
    State(state): State<Arc<DoctorState>>,
) -> Result<impl IntoResponse, ApiError> {
    let doctors = state.usecase.list_doctors().await?;

    let response = ApiResponse::ok("Doctors retrieved successfully", to_dtos(&doctors));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /doctors/{id}
#[tracing::instrument(skip_all, fields(id))]
pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let doctor = state.usecase.get_doctor(DoctorId::new(id)).await?;

    let response = ApiResponse::ok("Doctor retrieved successfully", DoctorDto::from(&doctor));
    Ok((StatusCode::OK, Json(response)))
}

/// POST /doctors
///
/// ## レスポンス
///
/// - `201 Created`: 登録された医師
/// - `400 Bad Request`: 検証エラー
/// - `409 Conflict`: メールアドレスまたは免許番号の重複
/// - `500 Internal Server Error`: 存在しない専門分野
#[tracing::instrument(skip_all)]
pub async fn create_doctor(
    State(state): State<Arc<DoctorState>>,
    JsonBody(input): JsonBody<DoctorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let doctor = state.usecase.create_doctor(input).await?;

    let response = ApiResponse::ok("Doctor created successfully", DoctorDto::from(&doctor));
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /doctors/{id}
#[tracing::instrument(skip_all, fields(id))]
pub async fn update_doctor(
    State(state): State<Arc<DoctorState>>,
    PathId(id): PathId<i64>,
    JsonBody(input): JsonBody<DoctorInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    let doctor = state.usecase.update_doctor(DoctorId::new(id), input).await?;

    let response = ApiResponse::ok("Doctor updated successfully", DoctorDto::from(&doctor));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /doctors/{id}
#[tracing::instrument(skip_all, fields(id))]
pub async fn delete_doctor(
    State(state): State<Arc<DoctorState>>,
    PathId(id): PathId<i64>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("id", id);
    state.usecase.delete_doctor(DoctorId::new(id)).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Doctor deleted successfully")),
    ))
}

/// GET /doctors/specialization/{specialization_id}
///
/// 専門分野の存在確認はしない。該当なしは空配列。
#[tracing::instrument(skip_all, fields(specialization_id))]
pub async fn list_doctors_by_specialization(
    State(state): State<Arc<DoctorState>>,
    PathId(specialization_id): PathId<i32>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::Span::current().record("specialization_id", specialization_id);
    let doctors = state
        .usecase
        .list_by_specialization(SpecializationId::new(specialization_id))
        .await?;

    let response = ApiResponse::ok(
        "Doctors by specialization retrieved successfully",
        to_dtos(&doctors),
    );
    Ok((StatusCode::OK, Json(response)))
}
