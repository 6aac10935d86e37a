//! 予約管理ユースケース

use std::sync::Arc;

use clinic_domain::{
    DomainError,
    appointment::{Appointment, AppointmentId, AppointmentInput, AppointmentSchedule},
    clock::Clock,
    doctor::DoctorId,
    patient::PatientId,
};
use clinic_infra::repository::AppointmentRepository;

use crate::error::ApiError;

/// 予約管理ユースケース
///
/// 同一医師・同一時間帯の重複予約は検出しない。
pub struct AppointmentUseCaseImpl {
    appointment_repository: Arc<dyn AppointmentRepository>,
    clock:                  Arc<dyn Clock>,
}

impl AppointmentUseCaseImpl {
    pub fn new(
        appointment_repository: Arc<dyn AppointmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            appointment_repository,
            clock,
        }
    }

    /// すべての予約を取得する（キャンセル済みを含む、予約日時の降順）
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        Ok(self.appointment_repository.find_all().await?)
    }

    /// 予約を取得する
    pub async fn get_appointment(&self, id: AppointmentId) -> Result<Appointment, ApiError> {
        self.appointment_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id).into())
    }

    /// 予約を登録する
    ///
    /// 予約日時は注入された現在時刻より後でなければならない。
    /// 存在しない患者・医師の参照は外部キー違反（500）になる。
    pub async fn create_appointment(
        &self,
        input: AppointmentInput,
    ) -> Result<Appointment, ApiError> {
        let schedule = AppointmentSchedule::validate(input, self.clock.now())?;

        let appointment = self.appointment_repository.insert(&schedule).await?;
        tracing::info!(
            appointment_id = %appointment.id(),
            patient_id = %schedule.patient_id(),
            doctor_id = %schedule.doctor_id(),
            "予約を登録しました"
        );
        Ok(appointment)
    }

    /// 予約内容を更新する
    ///
    /// 存在確認 → 検証 → 全項目更新 → 再取得の順に行う。
    pub async fn update_appointment(
        &self,
        id: AppointmentId,
        input: AppointmentInput,
    ) -> Result<Appointment, ApiError> {
        self.get_appointment(id).await?;
        let schedule = AppointmentSchedule::validate(input, self.clock.now())?;

        if !self.appointment_repository.update(id, &schedule).await? {
            return Err(ApiError::UpdateFailed("appointment"));
        }
        tracing::info!(appointment_id = %id, "予約を更新しました");

        self.get_appointment(id).await
    }

    /// 予約をキャンセルする
    ///
    /// キャンセル済みの予約も取得できるため、再度のキャンセルも成功する。
    pub async fn delete_appointment(&self, id: AppointmentId) -> Result<(), ApiError> {
        let appointment = self.get_appointment(id).await?;

        if !self.appointment_repository.cancel(id).await? {
            return Err(not_found(id).into());
        }
        tracing::info!(
            appointment_id = %id,
            already_cancelled = appointment.is_cancelled(),
            "予約をキャンセルしました"
        );
        Ok(())
    }

    /// 患者の予約一覧（患者の存在確認はしない）
    pub async fn list_by_patient(
        &self,
        patient_id: PatientId,
    ) -> Result<Vec<Appointment>, ApiError> {
        Ok(self.appointment_repository.find_by_patient(patient_id).await?)
    }

    /// 医師の予約一覧（医師の存在確認はしない）
    pub async fn list_by_doctor(&self, doctor_id: DoctorId) -> Result<Vec<Appointment>, ApiError> {
        Ok(self.appointment_repository.find_by_doctor(doctor_id).await?)
    }
}

fn not_found(id: AppointmentId) -> DomainError {
    DomainError::NotFound {
        entity_type: "Appointment",
        id:          id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use clinic_domain::{
        appointment::AppointmentStatusId,
        clock::FixedClock,
        doctor::DoctorInput,
        patient::PatientInput,
    };
    use clinic_infra::mock::{MockAppointmentRepository, MockDoctorRepository, MockPatientRepository};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::usecase::{DoctorUseCaseImpl, PatientUseCaseImpl};

    struct Sut {
        usecase:    AppointmentUseCaseImpl,
        repo:       MockAppointmentRepository,
        patient_id: i64,
        doctor_id:  i64,
    }

    fn now() -> DateTime<Utc> {
        // 2024-06-01T12:00:00Z
        DateTime::from_timestamp(1_717_243_200, 0).unwrap()
    }

    fn checkup(sut: &Sut) -> AppointmentInput {
        AppointmentInput {
            patient_id: Some(sut.patient_id),
            doctor_id: Some(sut.doctor_id),
            appointment_date: Some("2024-06-10".to_string()),
            appointment_time: Some("09:30".to_string()),
            status_id: Some(1),
            reason_for_visit: Some("Checkup".to_string()),
            total_fee: Some(80.0),
            ..Default::default()
        }
    }

    #[fixture]
    async fn sut() -> Sut {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let patients = MockPatientRepository::new();
        let doctors = MockDoctorRepository::new();

        let patient = PatientUseCaseImpl::new(Arc::new(patients.clone()), clock.clone())
            .create_patient(PatientInput {
                first_name: Some("Ana".to_string()),
                last_name: Some("Diaz".to_string()),
                phone: Some("555-0100".to_string()),
                date_of_birth: Some("1990-01-01".to_string()),
                gender: Some("Female".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let doctor = DoctorUseCaseImpl::new(Arc::new(doctors.clone()), clock.clone())
            .create_doctor(DoctorInput {
                first_name: Some("Gregory".to_string()),
                last_name: Some("House".to_string()),
                email: Some("house@example.com".to_string()),
                phone: Some("555-0200".to_string()),
                license_number: Some("LIC-001".to_string()),
                specialization_id: Some(1),
                years_experience: Some(20),
            })
            .await
            .unwrap();

        let repo = MockAppointmentRepository::new(patients, doctors);
        Sut {
            usecase: AppointmentUseCaseImpl::new(Arc::new(repo.clone()), clock),
            repo,
            patient_id: patient.id().as_i64(),
            doctor_id: doctor.id().as_i64(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_登録した予約は既定の30分でscheduled(#[future] sut: Sut) {
        let sut = sut.await;

        let created = sut.usecase.create_appointment(checkup(&sut)).await.unwrap();

        assert_eq!(created.schedule().duration_minutes(), 30);
        assert_eq!(created.schedule().status_id(), AppointmentStatusId::SCHEDULED);
        assert_eq!(created.parties().doctor_last_name, "House");
    }

    #[rstest]
    #[tokio::test]
    async fn test_過去の日時の予約は検証エラー(#[future] sut: Sut) {
        let sut = sut.await;
        let input = AppointmentInput {
            appointment_date: Some("2024-06-01".to_string()),
            appointment_time: Some("11:59".to_string()),
            ..checkup(&sut)
        };

        let err = sut.usecase.create_appointment(input).await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(m) if m == "Appointment date must be in the future"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しない患者への予約は外部キー違反(#[future] sut: Sut) {
        let sut = sut.await;
        let input = AppointmentInput {
            patient_id: Some(999_999),
            ..checkup(&sut)
        };

        let err = sut.usecase.create_appointment(input).await.unwrap_err();

        assert!(matches!(err, ApiError::Storage(e) if !e.is_duplicate_key()));
    }

    #[rstest]
    #[tokio::test]
    async fn test_キャンセルは繰り返し成功し一覧に残る(#[future] sut: Sut) {
        let sut = sut.await;
        let created = sut.usecase.create_appointment(checkup(&sut)).await.unwrap();

        sut.usecase.delete_appointment(created.id()).await.unwrap();
        sut.usecase.delete_appointment(created.id()).await.unwrap();

        let all = sut.usecase.list_appointments().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_cancelled());
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在しない予約の更新はnot_found(#[future] sut: Sut) {
        let sut = sut.await;

        let err = sut
            .usecase
            .update_appointment(AppointmentId::new(999_999), checkup(&sut))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(m) if m == "Appointment not found"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_存在確認後に0行更新ならupdate_failed(#[future] sut: Sut) {
        let sut = sut.await;
        let created = sut.usecase.create_appointment(checkup(&sut)).await.unwrap();
        sut.repo.miss_next_update();

        let err = sut
            .usecase
            .update_appointment(created.id(), checkup(&sut))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UpdateFailed("appointment")));
    }

    #[rstest]
    #[tokio::test]
    async fn test_更新でステータスを変更できる(#[future] sut: Sut) {
        let sut = sut.await;
        let created = sut.usecase.create_appointment(checkup(&sut)).await.unwrap();
        let input = AppointmentInput {
            status_id: Some(2),
            notes: Some("Bring lab results".to_string()),
            ..checkup(&sut)
        };

        let updated = sut.usecase.update_appointment(created.id(), input).await.unwrap();

        assert_eq!(updated.parties().status_name, "Confirmed");
        assert_eq!(updated.schedule().notes(), Some("Bring lab results"));
    }

    #[rstest]
    #[tokio::test]
    async fn test_患者別と医師別の一覧(#[future] sut: Sut) {
        let sut = sut.await;
        sut.usecase.create_appointment(checkup(&sut)).await.unwrap();

        let by_patient = sut
            .usecase
            .list_by_patient(PatientId::new(sut.patient_id))
            .await
            .unwrap();
        let by_other_doctor = sut.usecase.list_by_doctor(DoctorId::new(42)).await.unwrap();

        assert_eq!(by_patient.len(), 1);
        assert!(by_other_doctor.is_empty());
    }
}
