//! In-memory backend for tests and offline demos.
//!
//! Keeps the same rows and rules as the REST service (unique emails,
//! 401 on bad credentials, 404 on unknown ids) and records every call
//! in arrival order so tests can assert on network traffic.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{BackendError, ClinicBackend, ImageUpload};
use crate::models::{
    Appointment, AppointmentStatus, ClassProbability, Created, Credentials, Doctor,
    DoctorRegistration, DoctorSummary, MrImage, NewAppointment, Notification, Patient,
    PatientRegistration, PredictResponse, Role,
};

/// Password of every seeded account.
pub const SEED_PASSWORD: &str = "1234";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    LoginDoctor,
    LoginPatient,
    RegisterDoctor,
    RegisterPatient,
    DoctorProfile,
    UpdateDoctorProfile,
    PatientProfile,
    UpdatePatientProfile,
    Appointments,
    CreateAppointment,
    UpdateAppointmentStatus,
    DoctorPatients,
    DeletePatient,
    Doctors,
    UploadMrImage,
    MrImages,
    DeleteMrImage,
    Predict,
    Notifications,
}

/// One recorded call. `target` is the id the call addressed: the path id,
/// the owner of an upload, or the `mr_image_id` of a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub endpoint: Endpoint,
    pub target: Option<i64>,
}

#[derive(Debug, Clone)]
struct StoredAppointment {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: String,
    status: AppointmentStatus,
}

#[derive(Debug, Clone)]
struct StoredImage {
    patient_id: i64,
    image: MrImage,
}

#[derive(Debug, Clone)]
struct StoredNotification {
    patient_id: i64,
    notification: Notification,
}

#[derive(Default)]
struct MockState {
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    passwords: HashMap<(Role, String), String>,
    appointments: Vec<StoredAppointment>,
    images: Vec<StoredImage>,
    notifications: Vec<StoredNotification>,
    prediction: Option<PredictResponse>,
    failures: HashMap<Endpoint, BackendError>,
    delays: HashMap<Endpoint, Duration>,
    calls: Vec<MockCall>,
    /// Ids of uploads that completed, so predictions can be checked against them.
    uploaded: HashSet<i64>,
    next_id: i64,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn bump_ids(&mut self, id: i64) {
        self.next_id = self.next_id.max(id);
    }
}

pub struct MockBackend {
    state: Mutex<MockState>,
}

fn not_found(message: &str) -> BackendError {
    BackendError::Rejected {
        status: 404,
        message: message.to_string(),
    }
}

impl MockBackend {
    /// Empty backend: no accounts, no rows.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Backend holding the clinic's demo rows: two patients, two doctors,
    /// two appointments, one MR image per patient. Password is `1234`.
    pub fn seeded() -> Self {
        let backend = Self::new()
            .with_patient(
                Patient {
                    id: 1,
                    first_name: "Zeynep".into(),
                    last_name: "Korkmaz".into(),
                    email: "zeynep@example.com".into(),
                    phone: Some("5551112233".into()),
                    gender: Some("Kadın".into()),
                    address: Some("Adres 1".into()),
                    city: Some("İstanbul".into()),
                },
                SEED_PASSWORD,
            )
            .with_patient(
                Patient {
                    id: 2,
                    first_name: "Mehmet".into(),
                    last_name: "Demir".into(),
                    email: "mehmet@example.com".into(),
                    phone: Some("5552223344".into()),
                    gender: Some("Erkek".into()),
                    address: Some("Adres 2".into()),
                    city: Some("Ankara".into()),
                },
                SEED_PASSWORD,
            )
            .with_doctor(
                Doctor {
                    id: 1,
                    first_name: "Ahmet".into(),
                    last_name: "Yılmaz".into(),
                    title: Some("Doç. Dr.".into()),
                    email: "ahmet@example.com".into(),
                    phone: Some("5553334455".into()),
                    specialty: Some("Nöroloji".into()),
                },
                SEED_PASSWORD,
            )
            .with_doctor(
                Doctor {
                    id: 2,
                    first_name: "Ayşe".into(),
                    last_name: "Demir".into(),
                    title: Some("Uzm. Dr.".into()),
                    email: "ayse@example.com".into(),
                    phone: Some("5554445566".into()),
                    specialty: Some("Radyoloji".into()),
                },
                SEED_PASSWORD,
            )
            .with_appointment(1, 1, "2025-06-10", AppointmentStatus::Confirmed)
            .with_appointment(2, 2, "2025-07-01", AppointmentStatus::Waiting)
            .with_mr_image(1, "glioma_tumor")
            .with_mr_image(2, "pituitary_tumor");
        backend.with_prediction(PredictResponse {
            predicted_class: "glioma_tumor".into(),
            prediction: vec![
                ClassProbability { class: "glioma_tumor".into(), probability: "92.00%".into() },
                ClassProbability { class: "meningioma_tumor".into(), probability: "5.00%".into() },
                ClassProbability { class: "no_tumor".into(), probability: "2.00%".into() },
                ClassProbability { class: "pituitary_tumor".into(), probability: "1.00%".into() },
            ],
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not poison the fixture for the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_doctor(self, doctor: Doctor, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.bump_ids(doctor.id);
            state
                .passwords
                .insert((Role::Doctor, doctor.email.clone()), password.to_string());
            state.doctors.push(doctor);
        }
        self
    }

    pub fn with_patient(self, patient: Patient, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.bump_ids(patient.id);
            state
                .passwords
                .insert((Role::Patient, patient.email.clone()), password.to_string());
            state.patients.push(patient);
        }
        self
    }

    pub fn with_appointment(
        self,
        patient_id: i64,
        doctor_id: i64,
        date: &str,
        status: AppointmentStatus,
    ) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id();
            state.appointments.push(StoredAppointment {
                id,
                patient_id,
                doctor_id,
                date: date.to_string(),
                status,
            });
        }
        self
    }

    pub fn with_mr_image(self, patient_id: i64, prediction: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id();
            state.images.push(StoredImage {
                patient_id,
                image: MrImage {
                    id,
                    file_url: format!("mock://mrimages/{id}.jpg"),
                    prediction: Some(prediction.to_string()),
                    uploaded_at: None,
                },
            });
        }
        self
    }

    pub fn with_notification(self, patient_id: i64, message: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state.next_id();
            state.notifications.push(StoredNotification {
                patient_id,
                notification: Notification {
                    id,
                    message: message.to_string(),
                    is_read: false,
                    created_at: None,
                },
            });
        }
        self
    }

    /// Response returned by `predict`.
    pub fn with_prediction(self, response: PredictResponse) -> Self {
        self.lock().prediction = Some(response);
        self
    }

    /// Make every call to `endpoint` fail with `error` until cleared.
    pub fn fail(&self, endpoint: Endpoint, error: BackendError) {
        self.lock().failures.insert(endpoint, error);
    }

    pub fn clear_failure(&self, endpoint: Endpoint) {
        self.lock().failures.remove(&endpoint);
    }

    /// Make every call to `endpoint` take at least `delay`, like a slow network.
    pub fn delay(&self, endpoint: Endpoint, delay: Duration) {
        self.lock().delays.insert(endpoint, delay);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Backend-side status of an appointment (for asserting persisted mutations).
    pub fn stored_status(&self, appointment_id: i64) -> Option<AppointmentStatus> {
        self.lock()
            .appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .map(|a| a.status)
    }

    /// Whether `mr_image_id` was produced by a completed upload on this backend.
    pub fn was_uploaded(&self, mr_image_id: i64) -> bool {
        self.lock().uploaded.contains(&mr_image_id)
    }

    pub fn stored_doctor(&self, doctor_id: i64) -> Option<Doctor> {
        self.lock().doctors.iter().find(|d| d.id == doctor_id).cloned()
    }

    pub fn stored_patient(&self, patient_id: i64) -> Option<Patient> {
        self.lock().patients.iter().find(|p| p.id == patient_id).cloned()
    }

    /// Record the call, wait out any scripted delay, then return the
    /// scripted failure if one is set.
    fn enter(
        &self,
        endpoint: Endpoint,
        target: Option<i64>,
    ) -> Result<MutexGuard<'_, MockState>, BackendError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(MockCall { endpoint, target });
            state.delays.get(&endpoint).copied()
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let state = self.lock();
        if let Some(err) = state.failures.get(&endpoint).cloned() {
            return Err(err);
        }
        Ok(state)
    }

    fn check_password(
        state: &MockState,
        role: Role,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        match state.passwords.get(&(role, credentials.email.clone())) {
            Some(pw) if *pw == credentials.password => Ok(()),
            _ => Err(BackendError::Rejected {
                status: 401,
                message: "Geçersiz email veya şifre!".into(),
            }),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ClinicBackend for MockBackend {
    fn login_doctor(&self, credentials: &Credentials) -> Result<Doctor, BackendError> {
        let state = self.enter(Endpoint::LoginDoctor, None)?;
        Self::check_password(&state, Role::Doctor, credentials)?;
        state
            .doctors
            .iter()
            .find(|d| d.email == credentials.email)
            .cloned()
            .ok_or_else(|| not_found("Doktor bulunamadı!"))
    }

    fn login_patient(&self, credentials: &Credentials) -> Result<Patient, BackendError> {
        let state = self.enter(Endpoint::LoginPatient, None)?;
        Self::check_password(&state, Role::Patient, credentials)?;
        state
            .patients
            .iter()
            .find(|p| p.email == credentials.email)
            .cloned()
            .ok_or_else(|| not_found("Hasta bulunamadı!"))
    }

    fn register_doctor(&self, registration: &DoctorRegistration) -> Result<Created, BackendError> {
        let mut state = self.enter(Endpoint::RegisterDoctor, None)?;
        if state.doctors.iter().any(|d| d.email == registration.email) {
            return Err(BackendError::Rejected {
                status: 400,
                message: "Bu email ile doktor zaten kayıtlı!".into(),
            });
        }
        let id = state.next_id();
        state.passwords.insert(
            (Role::Doctor, registration.email.clone()),
            registration.password.clone(),
        );
        state.doctors.push(Doctor {
            id,
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            title: registration.title.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            specialty: registration.specialty.clone(),
        });
        Ok(Created {
            id,
            message: Some("Doktor kaydı başarılı!".into()),
        })
    }

    fn register_patient(
        &self,
        registration: &PatientRegistration,
    ) -> Result<Created, BackendError> {
        let mut state = self.enter(Endpoint::RegisterPatient, None)?;
        if state.patients.iter().any(|p| p.email == registration.email) {
            return Err(BackendError::Rejected {
                status: 400,
                message: "Bu email ile hasta zaten kayıtlı!".into(),
            });
        }
        let id = state.next_id();
        state.passwords.insert(
            (Role::Patient, registration.email.clone()),
            registration.password.clone(),
        );
        state.patients.push(Patient {
            id,
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
            email: registration.email.clone(),
            phone: registration.phone.clone(),
            gender: registration.gender.clone(),
            address: registration.address.clone(),
            city: registration.city.clone(),
        });
        Ok(Created {
            id,
            message: Some("Hasta kaydı başarılı!".into()),
        })
    }

    fn doctor_profile(&self, doctor_id: i64) -> Result<Doctor, BackendError> {
        let state = self.enter(Endpoint::DoctorProfile, Some(doctor_id))?;
        state
            .doctors
            .iter()
            .find(|d| d.id == doctor_id)
            .cloned()
            .ok_or_else(|| not_found("Doktor bulunamadı!"))
    }

    fn update_doctor_profile(&self, profile: &Doctor) -> Result<(), BackendError> {
        let mut state = self.enter(Endpoint::UpdateDoctorProfile, Some(profile.id))?;
        let doctor = state
            .doctors
            .iter_mut()
            .find(|d| d.id == profile.id)
            .ok_or_else(|| not_found("Doktor bulunamadı!"))?;
        // The backend does not let a doctor edit their title.
        let title = doctor.title.clone();
        *doctor = Doctor {
            title,
            ..profile.clone()
        };
        Ok(())
    }

    fn patient_profile(&self, patient_id: i64) -> Result<Patient, BackendError> {
        let state = self.enter(Endpoint::PatientProfile, Some(patient_id))?;
        state
            .patients
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or_else(|| not_found("Hasta bulunamadı!"))
    }

    fn update_patient_profile(&self, profile: &Patient) -> Result<(), BackendError> {
        let mut state = self.enter(Endpoint::UpdatePatientProfile, Some(profile.id))?;
        let patient = state
            .patients
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or_else(|| not_found("Hasta bulunamadı!"))?;
        *patient = profile.clone();
        Ok(())
    }

    fn appointments(&self, role: Role, owner_id: i64) -> Result<Vec<Appointment>, BackendError> {
        let state = self.enter(Endpoint::Appointments, Some(owner_id))?;
        let rows = state
            .appointments
            .iter()
            .filter(|a| match role {
                Role::Doctor => a.doctor_id == owner_id,
                Role::Patient => a.patient_id == owner_id,
            })
            .map(|a| {
                let (patient, doctor) = match role {
                    Role::Doctor => (
                        state
                            .patients
                            .iter()
                            .find(|p| p.id == a.patient_id)
                            .map(Patient::full_name),
                        None,
                    ),
                    Role::Patient => (
                        None,
                        state
                            .doctors
                            .iter()
                            .find(|d| d.id == a.doctor_id)
                            .map(|d| format!("{} {}", d.first_name, d.last_name)),
                    ),
                };
                Appointment {
                    id: a.id,
                    date: a.date.clone(),
                    status: a.status,
                    patient,
                    doctor,
                }
            })
            .collect();
        Ok(rows)
    }

    fn create_appointment(&self, appointment: &NewAppointment) -> Result<Created, BackendError> {
        let mut state = self.enter(Endpoint::CreateAppointment, None)?;
        let id = state.next_id();
        state.appointments.push(StoredAppointment {
            id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            date: appointment.date.clone(),
            status: AppointmentStatus::Waiting,
        });
        Ok(Created {
            id,
            message: Some("Randevu eklendi!".into()),
        })
    }

    fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.enter(Endpoint::UpdateAppointmentStatus, Some(appointment_id))?;
        let row = state
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| not_found("Randevu bulunamadı!"))?;
        row.status = status;
        Ok(())
    }

    fn doctor_patients(&self, doctor_id: i64) -> Result<Vec<Patient>, BackendError> {
        let state = self.enter(Endpoint::DoctorPatients, Some(doctor_id))?;
        let ids: HashSet<i64> = state
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .map(|a| a.patient_id)
            .collect();
        Ok(state
            .patients
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn delete_patient(&self, patient_id: i64) -> Result<(), BackendError> {
        let mut state = self.enter(Endpoint::DeletePatient, Some(patient_id))?;
        if !state.patients.iter().any(|p| p.id == patient_id) {
            return Err(not_found("Hasta bulunamadı!"));
        }
        state.patients.retain(|p| p.id != patient_id);
        state.images.retain(|i| i.patient_id != patient_id);
        state.appointments.retain(|a| a.patient_id != patient_id);
        Ok(())
    }

    fn doctors(&self) -> Result<Vec<DoctorSummary>, BackendError> {
        let state = self.enter(Endpoint::Doctors, None)?;
        Ok(state
            .doctors
            .iter()
            .map(|d| DoctorSummary {
                id: d.id,
                first_name: d.first_name.clone(),
                last_name: d.last_name.clone(),
                title: d.title.clone(),
                specialty: d.specialty.clone(),
            })
            .collect())
    }

    fn upload_mr_image(
        &self,
        patient_id: i64,
        image: &ImageUpload,
    ) -> Result<Created, BackendError> {
        let mut state = self.enter(Endpoint::UploadMrImage, Some(patient_id))?;
        let id = state.next_id();
        state.images.push(StoredImage {
            patient_id,
            image: MrImage {
                id,
                file_url: format!("mock://mrimages/{}", image.file_name),
                prediction: None,
                uploaded_at: None,
            },
        });
        state.uploaded.insert(id);
        Ok(Created {
            id,
            message: Some("MR görüntüsü yüklendi!".into()),
        })
    }

    fn mr_images(&self, patient_id: i64) -> Result<Vec<MrImage>, BackendError> {
        let state = self.enter(Endpoint::MrImages, Some(patient_id))?;
        Ok(state
            .images
            .iter()
            .filter(|i| i.patient_id == patient_id)
            .map(|i| i.image.clone())
            .collect())
    }

    fn delete_mr_image(&self, image_id: i64) -> Result<(), BackendError> {
        let mut state = self.enter(Endpoint::DeleteMrImage, Some(image_id))?;
        if !state.images.iter().any(|i| i.image.id == image_id) {
            return Err(not_found("MR görüntüsü bulunamadı!"));
        }
        state.images.retain(|i| i.image.id != image_id);
        Ok(())
    }

    fn predict(
        &self,
        patient_id: i64,
        mr_image_id: i64,
        image: &ImageUpload,
    ) -> Result<PredictResponse, BackendError> {
        let mut state = self.enter(Endpoint::Predict, Some(mr_image_id))?;
        if !image.mime.starts_with("image/") {
            return Err(BackendError::Rejected {
                status: 400,
                message: "Lütfen bir resim dosyası yükleyin!".into(),
            });
        }
        let response = state.prediction.clone().ok_or_else(|| BackendError::Rejected {
            status: 500,
            message: "Model yüklenemedi!".into(),
        })?;

        let id = state.next_id();
        state.notifications.push(StoredNotification {
            patient_id,
            notification: Notification {
                id,
                message: format!("Yapay zeka tahmini sonucu: {}", response.predicted_class),
                is_read: false,
                created_at: None,
            },
        });
        if let Some(stored) = state.images.iter_mut().find(|i| i.image.id == mr_image_id) {
            stored.image.prediction = Some(response.predicted_class.clone());
        }
        Ok(response)
    }

    fn notifications(&self, patient_id: i64) -> Result<Vec<Notification>, BackendError> {
        let state = self.enter(Endpoint::Notifications, Some(patient_id))?;
        // Newest first, like the backend's created_at DESC ordering.
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.patient_id == patient_id)
            .map(|n| n.notification.clone())
            .collect())
    }
}
