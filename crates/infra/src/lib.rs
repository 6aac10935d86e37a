//! # クリニック予約 インフラ層
//!
//! PostgreSQL との接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはリポジトリトレイトと、その PostgreSQL 実装を提供する。
//! SQL 文と位置パラメータのバインドはすべてこの層に閉じ込め、
//! ユースケース層はトレイト経由でのみデータにアクセスする。
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//!          ↘
//!            shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - 接続プール管理・マイグレーション・トランザクション
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - `mock` - インメモリモック（`test-utils` feature）
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use clinic_infra::{
//!     db::{self, DatabaseSettings},
//!     repository::{PatientRepository, PostgresPatientRepository},
//! };
//!
//! let pool = db::create_pool(&DatabaseSettings::from_url(&database_url)?).await?;
//! let patients = PostgresPatientRepository::new(pool.clone());
//! let active = patients.find_all().await?;
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use error::InfraError;
