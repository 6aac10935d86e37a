//! # Clinic ドメイン層
//!
//! クリニック予約システムのドメインモデルと入力検証を定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（Patient, Doctor, Appointment）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（Email, Gender）
//! - **検証済み入力**: `*Profile` / `*Schedule` はリクエスト値の検証を通過した
//!   ことを型で保証する。INSERT / UPDATE はこの型しか受け取らない
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//!
//! ## 使用例
//!
//! ```rust
//! use chrono::NaiveDate;
//! use clinic_domain::patient::{PatientInput, PatientProfile};
//!
//! let input = PatientInput {
//!     first_name: Some("Ana".to_string()),
//!     last_name: Some("Diaz".to_string()),
//!     phone: Some("555-0100".to_string()),
//!     date_of_birth: Some("1990-01-01".to_string()),
//!     gender: Some("Female".to_string()),
//!     ..Default::default()
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//!
//! let profile = PatientProfile::validate(input, today).unwrap();
//! assert_eq!(profile.first_name(), "Ana");
//! ```

#[macro_use]
mod macros;

pub mod appointment;
pub mod clock;
pub mod doctor;
pub mod error;
pub mod patient;
pub mod value_objects;

pub use error::DomainError;
