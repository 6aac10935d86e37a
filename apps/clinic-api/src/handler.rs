//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各エンティティのハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、検証と存在確認はユースケースに委譲
//! - 不正な JSON ボディと整数でないパスパラメータは [`ApiError::Validation`]（400）にする

pub mod appointment;
pub mod doctor;
pub mod health;
pub mod patient;

use std::{collections::HashMap, str::FromStr};

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

pub use appointment::{
    AppointmentState,
    create_appointment,
    delete_appointment,
    get_appointment,
    list_appointments,
    list_appointments_by_doctor,
    list_appointments_by_patient,
    update_appointment,
};
pub use doctor::{
    DoctorState,
    create_doctor,
    delete_doctor,
    get_doctor,
    list_doctors,
    list_doctors_by_specialization,
    update_doctor,
};
pub use health::{ReadinessState, health_check, readiness_check};
pub use patient::{
    PatientState,
    create_patient,
    delete_patient,
    get_patient,
    list_patients,
    update_patient,
};

use crate::error::ApiError;

/// 整数のパスパラメータ（`/patients/{id}` の `id` など）
///
/// パラメータが 1 つだけのルートで使う。整数として解釈できなければ
/// `"Invalid <name>: must be an integer"` の検証エラーになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId<T>(pub T);

impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: FromStr + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        let (name, raw) = params
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Validation("Missing path parameter".to_string()))?;

        raw.trim()
            .parse()
            .map(Self)
            .map_err(|_| ApiError::Validation(format!("Invalid {name}: must be an integer")))
    }
}

/// JSON リクエストボディ
///
/// `axum::Json` のリジェクション（不正な JSON、Content-Type 不一致など）を
/// 共通の失敗エンベロープ（400）で返すためのラッパー。
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "リクエストボディを解釈できません");
                Err(ApiError::Validation(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                )))
            }
        }
    }
}
