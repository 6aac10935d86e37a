//! # ヘルスチェック共通型
//!
//! Liveness（`/health`）と Readiness（`/health/ready`）エンドポイントで
//! 使用されるレスポンス型を提供する。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// `status` はサービスの稼働状態、`version` は Cargo.toml のバージョンを示す。
///
/// ## 使用例
///
/// ```
/// use clinic_shared::HealthResponse;
///
/// let response = HealthResponse {
///     status:  "healthy".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"` または `"unhealthy"`）
    pub status:  String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version: String,
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// チェック成功
    Ok,
    /// チェック失敗
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// 全依存サービスが利用可能
    Ready,
    /// 一部の依存サービスが利用不可
    NotReady,
}

/// 接続プールの統計情報
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// プールが保持している接続数
    pub size:   u32,
    /// 空き接続数
    pub idle:   u32,
    /// 使用中の接続数
    pub in_use: u32,
}

/// Readiness Check レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// 全体のステータス
    pub status: ReadinessStatus,
    /// 個別チェック結果（キー: チェック名、値: ステータス）
    pub checks: HashMap<String, CheckStatus>,
    /// データベース接続プールの状態
    pub pool:   PoolStats,
}

impl ReadinessResponse {
    /// データベースチェック結果から Readiness レスポンスを組み立てる
    pub fn from_database_check(database_ok: bool, pool: PoolStats) -> Self {
        let (status, check) = if database_ok {
            (ReadinessStatus::Ready, CheckStatus::Ok)
        } else {
            (ReadinessStatus::NotReady, CheckStatus::Error)
        };

        Self {
            status,
            checks: HashMap::from([("database".to_string(), check)]),
            pool,
        }
    }

    /// 全チェックが成功したか
    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}
