//! # ヘルスチェックハンドラ
//!
//! - `/health` - Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready` - Readiness Check（データベースへの疎通と接続プールの状態）
//!
//! レスポンス型は [`clinic_shared::HealthResponse`] / [`clinic_shared::ReadinessResponse`] を参照。
//! どちらも API プレフィックスの外にマウントされ、共通エンベロープで包まない。

use std::{sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use clinic_infra::db;
use clinic_shared::{HealthResponse, ReadinessResponse};
use sqlx::PgPool;

/// 疎通確認の上限時間
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness Check エンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub pool: PgPool,
}

/// Readiness Check エンドポイント
///
/// データベースに `SELECT 1` を発行する。成功 → 200、失敗またはタイムアウト → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let database_ok = match tokio::time::timeout(PING_TIMEOUT, db::ping(&state.pool)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: database ping failed");
            false
        }
        Err(_) => {
            tracing::warn!("readiness check: database ping timed out");
            false
        }
    };

    let response = ReadinessResponse::from_database_check(database_ok, db::pool_stats(&state.pool));
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
