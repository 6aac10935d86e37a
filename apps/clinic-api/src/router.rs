//! # ルーター構築
//!
//! ハンドラの State 組み立てとルート定義を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中し、テストは
//! モックリポジトリで組み立てた [`AppStates`] から同じルーターを作る。

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use clinic_domain::clock::{Clock, SystemClock};
use clinic_infra::repository::{
    PostgresAppointmentRepository,
    PostgresDoctorRepository,
    PostgresPatientRepository,
};
use clinic_shared::ApiResponse;
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handler::{
        AppointmentState,
        DoctorState,
        PatientState,
        ReadinessState,
        create_appointment,
        create_doctor,
        create_patient,
        delete_appointment,
        delete_doctor,
        delete_patient,
        get_appointment,
        get_doctor,
        get_patient,
        health_check,
        list_appointments,
        list_appointments_by_doctor,
        list_appointments_by_patient,
        list_doctors,
        list_doctors_by_specialization,
        list_patients,
        readiness_check,
        update_appointment,
        update_doctor,
        update_patient,
    },
    usecase::{AppointmentUseCaseImpl, DoctorUseCaseImpl, PatientUseCaseImpl},
};

/// ルーターが必要とするすべての State
pub struct AppStates {
    pub patient:     Arc<PatientState>,
    pub doctor:      Arc<DoctorState>,
    pub appointment: Arc<AppointmentState>,
    pub readiness:   Arc<ReadinessState>,
}

impl AppStates {
    /// PostgreSQL リポジトリとシステム時計で State を組み立てる
    pub fn from_pool(pool: PgPool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let patient_repository = Arc::new(PostgresPatientRepository::new(pool.clone()));
        let doctor_repository = Arc::new(PostgresDoctorRepository::new(pool.clone()));
        let appointment_repository = Arc::new(PostgresAppointmentRepository::new(pool.clone()));

        Self {
            patient:     Arc::new(PatientState {
                usecase: PatientUseCaseImpl::new(patient_repository, clock.clone()),
            }),
            doctor:      Arc::new(DoctorState {
                usecase: DoctorUseCaseImpl::new(doctor_repository, clock.clone()),
            }),
            appointment: Arc::new(AppointmentState {
                usecase: AppointmentUseCaseImpl::new(appointment_repository, clock),
            }),
            readiness:   Arc::new(ReadinessState { pool }),
        }
    }
}

/// `GET /` のレスポンスデータ
#[derive(Debug, Clone, Serialize)]
struct Welcome {
    version:   &'static str,
    endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize)]
struct Endpoints {
    patients:     String,
    doctors:      String,
    appointments: String,
}

/// アプリケーション全体のルーターを構築する
///
/// エンティティの API は `api_prefix` 配下に、`/` とヘルスチェックは
/// プレフィックスの外にマウントする。`api_prefix` が空文字ならルート直下。
pub fn build_app(api_prefix: &str, states: AppStates) -> Router {
    let api = api_routes(states.patient, states.doctor, states.appointment);

    let welcome = Welcome {
        version:   env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            patients:     format!("{api_prefix}/patients"),
            doctors:      format!("{api_prefix}/doctors"),
            appointments: format!("{api_prefix}/appointments"),
        },
    };

    let app = Router::new()
        .route(
            "/",
            get(move || {
                let welcome = welcome.clone();
                async move { Json(ApiResponse::ok("Clinic Booking API is running!", welcome)) }
            }),
        )
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(states.readiness);

    let app = if api_prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(api_prefix, api)
    };

    app.fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn api_routes(
    patient: Arc<PatientState>,
    doctor: Arc<DoctorState>,
    appointment: Arc<AppointmentState>,
) -> Router {
    Router::new()
        // 患者 API
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .with_state(patient)
        // 医師 API
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/doctors/specialization/{specialization_id}",
            get(list_doctors_by_specialization),
        )
        .route(
            "/doctors/{id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .with_state(doctor)
        // 予約 API
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/patient/{patient_id}",
            get(list_appointments_by_patient),
        )
        .route(
            "/appointments/doctor/{doctor_id}",
            get(list_appointments_by_doctor),
        )
        .route(
            "/appointments/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .with_state(appointment)
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Route not found")),
    )
}
