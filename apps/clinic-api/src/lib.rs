//! # Clinic API ライブラリ
//!
//! 患者・医師・予約を扱う REST API のユースケース・ハンドラ・ルーターを公開する。
//! `main.rs` はインフラ初期化とサーバー起動に集中し、
//! HTTP テストはこのライブラリのルーターをモックリポジトリで組み立てて使う。
//!
//! ## レイヤー構成
//!
//! ```text
//! router → handler → usecase → clinic_infra::repository → PostgreSQL
//!                       ↓
//!                 clinic_domain（検証）
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod usecase;

pub use router::{AppStates, build_app};
