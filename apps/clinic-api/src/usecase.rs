//! # ユースケース層
//!
//! 患者・医師・予約の業務ロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリと時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、検証・存在確認はユースケースに集約
//! - **存在確認してから書き込む**: 更新・削除は取得（NotFound 判定）→ 検証 → 書き込みの順
//!
//! ## モジュール構成
//!
//! - `patient`: 患者の登録・更新・論理削除
//! - `doctor`: 医師の登録・更新・論理削除、専門分野別一覧
//! - `appointment`: 予約の登録・更新・キャンセル、患者別・医師別一覧

pub mod appointment;
pub mod doctor;
pub mod patient;

pub use appointment::AppointmentUseCaseImpl;
pub use doctor::DoctorUseCaseImpl;
pub use patient::PatientUseCaseImpl;
