//! 医師管理ユースケース

use std::sync::Arc;

use clinic_domain::{
    DomainError,
    clock::Clock,
    doctor::{Doctor, DoctorId, DoctorInput, DoctorProfile, SpecializationId},
};
use clinic_infra::repository::DoctorRepository;

use crate::error::ApiError;

/// 医師管理ユースケース
pub struct DoctorUseCaseImpl {
    doctor_repository: Arc<dyn DoctorRepository>,
    clock:             Arc<dyn Clock>,
}

impl DoctorUseCaseImpl {
    pub fn new(doctor_repository: Arc<dyn DoctorRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            doctor_repository,
            clock,
        }
    }

    /// アクティブな医師の一覧を取得する
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, ApiError> {
        Ok(self.doctor_repository.find_all().await?)
    }

    /// アクティブな医師を取得する
    pub async fn get_doctor(&self, id: DoctorId) -> Result<Doctor, ApiError> {
        self.doctor_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// 医師を登録する
    ///
    /// 免許番号・メールアドレスの重複は DB の一意制約で検出する（409）。
    pub async fn create_doctor(&self, input: DoctorInput) -> Result<Doctor, ApiError> {
        let profile = DoctorProfile::validate(input)?;

        let doctor = self.doctor_repository.insert(&profile).await?;
        tracing::info!(
            doctor_id = %doctor.id(),
            at = %self.clock.now(),
            "医師を登録しました"
        );
        Ok(doctor)
    }

    /// 医師情報を更新する
    ///
    /// 存在確認 → 検証 → 全項目更新 → 再取得の順に行う。
    pub async fn update_doctor(&self, id: DoctorId, input: DoctorInput) -> Result<Doctor, ApiError> {
        self.get_doctor(id).await?;
        let profile = DoctorProfile::validate(input)?;

        if !self.doctor_repository.update(id, &profile).await? {
            return Err(ApiError::UpdateFailed("doctor"));
        }
        tracing::info!(doctor_id = %id, "医師情報を更新しました");

        self.get_doctor(id).await
    }

    /// 医師を論理削除する
    pub async fn delete_doctor(&self, id: DoctorId) -> Result<(), ApiError> {
        self.get_doctor(id).await?;

        if !self.doctor_repository.deactivate(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(doctor_id = %id, "医師を論理削除しました");
        Ok(())
    }

    /// 専門分野でアクティブな医師を検索する
    ///
    /// 専門分野の存在確認は行わない（該当なしは空リスト）。
    pub async fn list_by_specialization(
        &self,
        specialization_id: SpecializationId,
    ) -> Result<Vec<Doctor>, ApiError> {
        Ok(self
            .doctor_repository
            .find_by_specialization(specialization_id)
            .await?)
    }
}

fn not_found(id: DoctorId) -> DomainError {
    DomainError::NotFound {
        entity_type: "Doctor",
        id:          id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use clinic_domain::clock::FixedClock;
    use clinic_infra::mock::MockDoctorRepository;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    fn house() -> DoctorInput {
        DoctorInput {
            first_name: Some("Gregory".to_string()),
            last_name: Some("House".to_string()),
            email: Some("house@example.com".to_string()),
            phone: Some("555-0200".to_string()),
            license_number: Some("LIC-001".to_string()),
            specialization_id: Some(1),
            years_experience: None,
        }
    }

    #[fixture]
    fn sut() -> DoctorUseCaseImpl {
        let now = DateTime::<Utc>::from_timestamp(1_717_243_200, 0).unwrap();
        DoctorUseCaseImpl::new(
            Arc::new(MockDoctorRepository::new()),
            Arc::new(FixedClock::new(now)),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn test_経験年数の既定値は0(sut: DoctorUseCaseImpl) {
        let doctor = sut.create_doctor(house()).await.unwrap();

        assert_eq!(doctor.profile().years_experience(), 0);
        assert_eq!(doctor.specialization_name(), "General Medicine");
    }

    #[rstest]
    #[tokio::test]
    async fn test_更新後の取得に変更が反映される(sut: DoctorUseCaseImpl) {
        let doctor = sut.create_doctor(house()).await.unwrap();
        let input = DoctorInput {
            specialization_id: Some(2),
            years_experience: Some(15),
            ..house()
        };

        sut.update_doctor(doctor.id(), input).await.unwrap();
        let found = sut.get_doctor(doctor.id()).await.unwrap();

        assert_eq!(found.profile().specialization_id(), SpecializationId::new(2));
        assert_eq!(found.specialization_name(), "Cardiology");
        assert_eq!(found.profile().years_experience(), 15);
    }

    #[rstest]
    #[tokio::test]
    async fn test_免許番号がなければ検証エラー(sut: DoctorUseCaseImpl) {
        let input = DoctorInput {
            license_number: Some("  ".to_string()),
            ..house()
        };

        let err = sut.create_doctor(input).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(m) if m == "license_number is required"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_削除した医師は一覧にも専門分野検索にも出ない(sut: DoctorUseCaseImpl) {
        let doctor = sut.create_doctor(house()).await.unwrap();

        sut.delete_doctor(doctor.id()).await.unwrap();

        assert!(sut.list_doctors().await.unwrap().is_empty());
        assert!(
            sut.list_by_specialization(SpecializationId::new(1))
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            sut.delete_doctor(doctor.id()).await.unwrap_err(),
            ApiError::NotFound(m) if m == "Doctor not found"
        ));
    }

    #[tokio::test]
    async fn test_存在確認後に0行更新ならupdate_failed() {
        let repo = MockDoctorRepository::new();
        let now = DateTime::<Utc>::from_timestamp(1_717_243_200, 0).unwrap();
        let sut = DoctorUseCaseImpl::new(Arc::new(repo.clone()), Arc::new(FixedClock::new(now)));
        let doctor = sut.create_doctor(house()).await.unwrap();
        repo.miss_next_update();

        let err = sut.update_doctor(doctor.id(), house()).await.unwrap_err();

        assert!(matches!(err, ApiError::UpdateFailed("doctor")));
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しない医師の更新はnot_found(sut: DoctorUseCaseImpl) {
        let err = sut
            .update_doctor(DoctorId::new(999_999), house())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
