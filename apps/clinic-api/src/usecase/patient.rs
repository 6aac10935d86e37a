//! 患者管理ユースケース

use std::sync::Arc;

use clinic_domain::{
    DomainError,
    clock::Clock,
    patient::{Patient, PatientId, PatientInput, PatientProfile},
};
use clinic_infra::repository::PatientRepository;

use crate::error::ApiError;

/// 患者管理ユースケース
pub struct PatientUseCaseImpl {
    patient_repository: Arc<dyn PatientRepository>,
    clock:              Arc<dyn Clock>,
}

impl PatientUseCaseImpl {
    pub fn new(patient_repository: Arc<dyn PatientRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            patient_repository,
            clock,
        }
    }

    /// アクティブな患者の一覧を取得する
    pub async fn list_patients(&self) -> Result<Vec<Patient>, ApiError> {
        Ok(self.patient_repository.find_all().await?)
    }

    /// アクティブな患者を取得する
    pub async fn get_patient(&self, id: PatientId) -> Result<Patient, ApiError> {
        self.patient_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// 患者を登録する
    ///
    /// 生年月日の未来日判定には注入された時刻の日付（UTC）を使う。
    pub async fn create_patient(&self, input: PatientInput) -> Result<Patient, ApiError> {
        let profile = PatientProfile::validate(input, self.clock.today())?;

        let patient = self.patient_repository.insert(&profile).await?;
        tracing::info!(patient_id = %patient.id(), "患者を登録しました");
        Ok(patient)
    }

    /// 患者情報を更新する
    ///
    /// 1. 存在確認（なければ NotFound、検証より先）
    /// 2. 入力値の検証
    /// 3. 全項目更新（0 行なら UpdateFailed）
    /// 4. 更新後の行を取得して返す
    pub async fn update_patient(
        &self,
        id: PatientId,
        input: PatientInput,
    ) -> Result<Patient, ApiError> {
        self.get_patient(id).await?;
        let profile = PatientProfile::validate(input, self.clock.today())?;

        if !self.patient_repository.update(id, &profile).await? {
            return Err(ApiError::UpdateFailed("patient"));
        }
        tracing::info!(patient_id = %id, "患者情報を更新しました");

        self.get_patient(id).await
    }

    /// 患者を論理削除する
    ///
    /// 論理削除済みの患者は取得できないため、2 回目の削除は NotFound になる。
    pub async fn delete_patient(&self, id: PatientId) -> Result<(), ApiError> {
        self.get_patient(id).await?;

        if !self.patient_repository.deactivate(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(patient_id = %id, "患者を論理削除しました");
        Ok(())
    }
}

fn not_found(id: PatientId) -> DomainError {
    DomainError::NotFound {
        entity_type: "Patient",
        id:          id.to_string(),
    }
}
