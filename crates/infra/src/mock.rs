//! # テスト用モックリポジトリ
//!
//! ユースケーステスト・HTTP テストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! clinic-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! PostgreSQL 実装と同じ振る舞いを再現する:
//!
//! - 論理削除済みの患者・医師は取得系から除外する
//! - メールアドレス・免許番号の重複は一意制約違反を返す
//! - 存在しない専門分野・患者・医師の参照は外部キー違反を返す
//!
//! 予約モックは患者・医師モックとストアを共有し、外部キー検査と
//! 表示名の結合に使う。
//!
//! `miss_next_update` を呼ぶと次の `update` が 0 行更新（`Ok(false)`）になる。
//! 存在確認と書き込みの間に行が変わった状況を再現する。

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use clinic_domain::{
    appointment::{
        Appointment,
        AppointmentId,
        AppointmentParties,
        AppointmentSchedule,
        AppointmentStatus,
    },
    doctor::{Doctor, DoctorId, DoctorProfile, SpecializationId},
    patient::{Patient, PatientId, PatientProfile},
};

use crate::{
    error::InfraError,
    repository::{AppointmentRepository, DoctorRepository, PatientRepository},
};

/// マイグレーションで投入する専門分野と同じ内容
const SPECIALIZATIONS: [(i32, &str); 6] = [
    (1, "General Medicine"),
    (2, "Cardiology"),
    (3, "Dermatology"),
    (4, "Pediatrics"),
    (5, "Neurology"),
    (6, "Orthopedics"),
];

fn foreign_key_violation(table: &str, constraint: &str) -> InfraError {
    InfraError::foreign_key(
        constraint,
        format!(
            "insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""
        ),
    )
}

/// 次の `update` を 0 行更新にするフラグ（1 回で解除される）
#[derive(Clone, Default)]
struct UpdateMiss(Arc<AtomicBool>);

impl UpdateMiss {
    fn arm(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// 採番カウンタ（BIGSERIAL 相当、1 始まり）
#[derive(Clone, Default)]
struct Sequence(Arc<Mutex<i64>>);

impl Sequence {
    fn next(&self) -> i64 {
        let mut current = self.0.lock().unwrap();
        *current += 1;
        *current
    }
}

// ===== MockPatientRepository =====

#[derive(Clone, Default)]
pub struct MockPatientRepository {
    patients:    Arc<Mutex<Vec<Patient>>>,
    sequence:    Sequence,
    update_miss: UpdateMiss,
}

impl MockPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 論理削除済みを含むすべての患者
    pub fn all(&self) -> Vec<Patient> {
        self.patients.lock().unwrap().clone()
    }

    pub fn miss_next_update(&self) {
        self.update_miss.arm();
    }

    fn exists(&self, id: PatientId) -> bool {
        self.patients.lock().unwrap().iter().any(|p| p.id() == id)
    }

    fn email_taken(patients: &[Patient], profile: &PatientProfile, except: Option<PatientId>) -> bool {
        let Some(email) = profile.email() else {
            return false;
        };
        patients
            .iter()
            .filter(|p| Some(p.id()) != except)
            .any(|p| p.profile().email() == Some(email))
    }
}

#[async_trait]
impl PatientRepository for MockPatientRepository {
    async fn find_all(&self) -> Result<Vec<Patient>, InfraError> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: PatientId) -> Result<Option<Patient>, InfraError> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id() == id && p.is_active())
            .cloned())
    }

    async fn insert(&self, profile: &PatientProfile) -> Result<Patient, InfraError> {
        let mut patients = self.patients.lock().unwrap();
        if Self::email_taken(&patients, profile, None) {
            return Err(InfraError::duplicate_key("patients_email_key"));
        }

        let now = Utc::now();
        let patient = Patient::from_db(
            PatientId::new(self.sequence.next()),
            profile.clone(),
            true,
            now,
            now,
        );
        patients.push(patient.clone());
        Ok(patient)
    }

    async fn update(&self, id: PatientId, profile: &PatientProfile) -> Result<bool, InfraError> {
        if self.update_miss.take() {
            return Ok(false);
        }
        let mut patients = self.patients.lock().unwrap();
        if Self::email_taken(&patients, profile, Some(id)) {
            return Err(InfraError::duplicate_key("patients_email_key"));
        }

        let Some(pos) = patients.iter().position(|p| p.id() == id && p.is_active()) else {
            return Ok(false);
        };
        let updated = patients[pos].clone().with_profile(profile.clone(), Utc::now());
        patients[pos] = updated;
        Ok(true)
    }

    async fn deactivate(&self, id: PatientId) -> Result<bool, InfraError> {
        let mut patients = self.patients.lock().unwrap();
        let Some(pos) = patients.iter().position(|p| p.id() == id && p.is_active()) else {
            return Ok(false);
        };
        let deactivated = patients[pos].clone().deactivated(Utc::now());
        patients[pos] = deactivated;
        Ok(true)
    }
}

// ===== MockDoctorRepository =====

#[derive(Clone, Default)]
pub struct MockDoctorRepository {
    doctors:     Arc<Mutex<Vec<Doctor>>>,
    sequence:    Sequence,
    update_miss: UpdateMiss,
}

impl MockDoctorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 論理削除済みを含むすべての医師
    pub fn all(&self) -> Vec<Doctor> {
        self.doctors.lock().unwrap().clone()
    }

    pub fn miss_next_update(&self) {
        self.update_miss.arm();
    }

    fn exists(&self, id: DoctorId) -> bool {
        self.doctors.lock().unwrap().iter().any(|d| d.id() == id)
    }

    fn specialization_name(id: SpecializationId) -> Result<String, InfraError> {
        SPECIALIZATIONS
            .iter()
            .find(|(sid, _)| *sid == id.as_i32())
            .map(|(_, name)| (*name).to_string())
            .ok_or_else(|| foreign_key_violation("doctors", "doctors_specialization_id_fkey"))
    }

    fn check_unique(
        doctors: &[Doctor],
        profile: &DoctorProfile,
        except: Option<DoctorId>,
    ) -> Result<(), InfraError> {
        for other in doctors.iter().filter(|d| Some(d.id()) != except) {
            if other.profile().email() == profile.email() {
                return Err(InfraError::duplicate_key("doctors_email_key"));
            }
            if other.profile().license_number() == profile.license_number() {
                return Err(InfraError::duplicate_key("doctors_license_number_key"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DoctorRepository for MockDoctorRepository {
    async fn find_all(&self) -> Result<Vec<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: DoctorId) -> Result<Option<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == id && d.is_active())
            .cloned())
    }

    async fn insert(&self, profile: &DoctorProfile) -> Result<Doctor, InfraError> {
        let mut doctors = self.doctors.lock().unwrap();
        Self::check_unique(&doctors, profile, None)?;
        let specialization_name = Self::specialization_name(profile.specialization_id())?;

        let now = Utc::now();
        let doctor = Doctor::from_db(
            DoctorId::new(self.sequence.next()),
            profile.clone(),
            specialization_name,
            true,
            now,
            now,
        );
        doctors.push(doctor.clone());
        Ok(doctor)
    }

    async fn update(&self, id: DoctorId, profile: &DoctorProfile) -> Result<bool, InfraError> {
        if self.update_miss.take() {
            return Ok(false);
        }
        let mut doctors = self.doctors.lock().unwrap();
        Self::check_unique(&doctors, profile, Some(id))?;
        let specialization_name = Self::specialization_name(profile.specialization_id())?;

        let Some(pos) = doctors.iter().position(|d| d.id() == id && d.is_active()) else {
            return Ok(false);
        };
        let updated =
            doctors[pos]
                .clone()
                .with_profile(profile.clone(), specialization_name, Utc::now());
        doctors[pos] = updated;
        Ok(true)
    }

    async fn deactivate(&self, id: DoctorId) -> Result<bool, InfraError> {
        let mut doctors = self.doctors.lock().unwrap();
        let Some(pos) = doctors.iter().position(|d| d.id() == id && d.is_active()) else {
            return Ok(false);
        };
        let deactivated = doctors[pos].clone().deactivated(Utc::now());
        doctors[pos] = deactivated;
        Ok(true)
    }

    async fn find_by_specialization(
        &self,
        specialization_id: SpecializationId,
    ) -> Result<Vec<Doctor>, InfraError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_active() && d.profile().specialization_id() == specialization_id)
            .cloned()
            .collect())
    }
}

// ===== MockAppointmentRepository =====

#[derive(Clone, Default)]
pub struct MockAppointmentRepository {
    appointments: Arc<Mutex<Vec<Appointment>>>,
    sequence:     Sequence,
    update_miss:  UpdateMiss,
    patients:     MockPatientRepository,
    doctors:      MockDoctorRepository,
}

impl MockAppointmentRepository {
    /// 患者・医師モックとストアを共有する予約モックを作成する
    pub fn new(patients: MockPatientRepository, doctors: MockDoctorRepository) -> Self {
        Self {
            appointments: Arc::new(Mutex::new(Vec::new())),
            sequence: Sequence::default(),
            update_miss: UpdateMiss::default(),
            patients,
            doctors,
        }
    }

    pub fn miss_next_update(&self) {
        self.update_miss.arm();
    }

    /// 外部キーを検査し、表示名を結合する
    ///
    /// 論理削除済みの患者・医師も参照できる（外部キーのみの制約）。
    fn resolve_parties(&self, schedule: &AppointmentSchedule) -> Result<AppointmentParties, InfraError> {
        if !self.patients.exists(schedule.patient_id()) {
            return Err(foreign_key_violation("appointments", "appointments_patient_id_fkey"));
        }
        if !self.doctors.exists(schedule.doctor_id()) {
            return Err(foreign_key_violation("appointments", "appointments_doctor_id_fkey"));
        }
        let status = AppointmentStatus::from_id(schedule.status_id())
            .ok_or_else(|| foreign_key_violation("appointments", "appointments_status_id_fkey"))?;

        let patients = self.patients.all();
        let patient = patients
            .iter()
            .find(|p| p.id() == schedule.patient_id())
            .ok_or_else(|| InfraError::unexpected("patient disappeared"))?;
        let doctors = self.doctors.all();
        let doctor = doctors
            .iter()
            .find(|d| d.id() == schedule.doctor_id())
            .ok_or_else(|| InfraError::unexpected("doctor disappeared"))?;

        Ok(AppointmentParties {
            patient_first_name: patient.profile().first_name().to_string(),
            patient_last_name:  patient.profile().last_name().to_string(),
            doctor_first_name:  doctor.profile().first_name().to_string(),
            doctor_last_name:   doctor.profile().last_name().to_string(),
            status_name:        status.name().to_string(),
        })
    }

    /// 予約日・予約時刻の降順で並べた一覧
    fn sorted(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        let mut list: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            let key = |x: &Appointment| {
                (x.schedule().appointment_date(), x.schedule().appointment_time())
            };
            key(b).cmp(&key(a))
        });
        list
    }
}

#[async_trait]
impl AppointmentRepository for MockAppointmentRepository {
    async fn find_all(&self) -> Result<Vec<Appointment>, InfraError> {
        Ok(self.sorted(|_| true))
    }

    async fn find_by_id(&self, id: AppointmentId) -> Result<Option<Appointment>, InfraError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id() == id)
            .cloned())
    }

    async fn insert(&self, schedule: &AppointmentSchedule) -> Result<Appointment, InfraError> {
        let parties = self.resolve_parties(schedule)?;

        let now = Utc::now();
        let appointment = Appointment::from_db(
            AppointmentId::new(self.sequence.next()),
            schedule.clone(),
            parties,
            now,
            now,
        );
        self.appointments.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn update(
        &self,
        id: AppointmentId,
        schedule: &AppointmentSchedule,
    ) -> Result<bool, InfraError> {
        if self.update_miss.take() {
            return Ok(false);
        }
        let parties = self.resolve_parties(schedule)?;

        let mut appointments = self.appointments.lock().unwrap();
        let Some(pos) = appointments.iter().position(|a| a.id() == id) else {
            return Ok(false);
        };
        let updated = appointments[pos]
            .clone()
            .with_schedule(schedule.clone(), parties, Utc::now());
        appointments[pos] = updated;
        Ok(true)
    }

    async fn cancel(&self, id: AppointmentId) -> Result<bool, InfraError> {
        let mut appointments = self.appointments.lock().unwrap();
        let Some(pos) = appointments.iter().position(|a| a.id() == id) else {
            return Ok(false);
        };
        let cancelled = appointments[pos].clone().cancelled(Utc::now());
        appointments[pos] = cancelled;
        Ok(true)
    }

    async fn find_by_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, InfraError> {
        Ok(self.sorted(|a| a.schedule().patient_id() == patient_id))
    }

    async fn find_by_doctor(&self, doctor_id: DoctorId) -> Result<Vec<Appointment>, InfraError> {
        Ok(self.sorted(|a| a.schedule().doctor_id() == doctor_id))
    }
}
