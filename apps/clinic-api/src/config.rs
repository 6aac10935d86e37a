//! # Clinic API 設定
//!
//! 環境変数からサーバーとデータベース接続の設定を読み込む。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CLINIC_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CLINIC_PORT` | No | ポート番号（デフォルト: `3000`） |
//! | `API_PREFIX` | No | API のパスプレフィックス（デフォルト: `/api`） |
//! | `DATABASE_URL` | ※ | PostgreSQL 接続 URL |
//! | `DB_HOST` / `DB_USER` / `DB_NAME` | ※ | `DATABASE_URL` 未設定時に必須 |
//! | `DB_PORT` | No | デフォルト: `5432` |
//! | `DB_PASSWORD` | No | デフォルト: 空 |
//! | `DB_MAX_CONNECTIONS` | No | デフォルト: `10` |
//! | `RUN_MIGRATIONS` | No | 起動時にマイグレーションを適用するか（デフォルト: `true`） |

use std::{env, str::FromStr};

use clinic_infra::db::DatabaseSettings;
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{key} の値が不正です: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// 値に資格情報が含まれうるため、エラーメッセージには値を出さない
    #[error("{0} を接続 URL として解釈できません")]
    InvalidUrl(&'static str),
}

/// Clinic API サーバーの設定
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    /// バインドアドレス
    pub host:           String,
    /// ポート番号
    pub port:           u16,
    /// API ルートのマウント先（先頭 `/` あり、末尾 `/` なし。ルート直下なら空文字）
    pub api_prefix:     String,
    /// 接続プールの設定
    pub database:       DatabaseSettings,
    /// 起動時にマイグレーションを適用するか
    pub run_migrations: bool,
}

impl ClinicConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let mut database = DatabaseSettings::new(connect_options(&vars)?);
        database.max_connections = vars.parse_or("DB_MAX_CONNECTIONS", database.max_connections)?;

        Ok(Self {
            host: vars.get("CLINIC_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse_or("CLINIC_PORT", 3000)?,
            api_prefix: normalize_prefix(vars.get("API_PREFIX").as_deref().unwrap_or("/api")),
            database,
            run_migrations: vars.flag_or("RUN_MIGRATIONS", true)?,
        })
    }
}

/// 空文字を未設定として扱う環境変数アクセサ
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }

    fn flag_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
            Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
            Some(value) => Err(ConfigError::Invalid { key, value }),
        }
    }
}

/// `DATABASE_URL`、なければ `DB_*` の個別値から接続先を組み立てる
///
/// 個別値は URL を経由しないので、パスワードに `@` や `/` を含めてよい。
fn connect_options<F: Fn(&str) -> Option<String>>(
    vars: &Vars<F>,
) -> Result<PgConnectOptions, ConfigError> {
    if let Some(url) = vars.get("DATABASE_URL") {
        return PgConnectOptions::from_str(&url)
            .map_err(|_| ConfigError::InvalidUrl("DATABASE_URL"));
    }

    let host = vars.require("DB_HOST")?;
    let user = vars.require("DB_USER")?;
    let name = vars.require("DB_NAME")?;
    let port: u16 = vars.parse_or("DB_PORT", 5432)?;

    let options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .username(&user)
        .database(&name);
    Ok(match vars.get("DB_PASSWORD") {
        Some(password) => options.password(&password),
        None => options,
    })
}

/// `api`、`/api/` などを `/api` に揃える。`/` はルート直下（空文字）
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
