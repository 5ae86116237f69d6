//! Doctor dashboard: appointments, the doctor's patients with their MR
//! images, profile editing and the prediction panel.

use std::sync::Arc;

use crate::backend::{BackendError, ClinicBackend, ImageUpload};
use crate::messages;
use crate::models::{Appointment, AppointmentStatus, Doctor, DoctorMenu, MrImage, Patient, Role};
use crate::prediction::{Prediction, PredictionError, PredictionPanel};
use crate::view_state::{Feedback, ListState, MutationError};

use super::{fetched, ProfileEditor};

/// Counters on the dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoctorStats {
    pub appointments: usize,
    pub patients: usize,
    pub pending: usize,
}

pub struct DoctorDashboard {
    backend: Arc<dyn ClinicBackend>,
    doctor_id: i64,
    menu: DoctorMenu,
    profile: ProfileEditor<Doctor>,
    appointments: ListState<Appointment>,
    patients: ListState<Patient>,
    /// MR images of the patient selected in `patients`.
    patient_images: ListState<MrImage>,
    mr_modal_open: bool,
    prediction: PredictionPanel,
    feedback: Feedback,
    load_error: Option<String>,
}

impl DoctorDashboard {
    /// Build the dashboard for `doctor`. Nothing is fetched until `mount`.
    pub fn new(backend: Arc<dyn ClinicBackend>, doctor: Doctor) -> Self {
        Self {
            backend,
            doctor_id: doctor.id,
            menu: DoctorMenu::Dashboard,
            profile: ProfileEditor::new(doctor),
            appointments: ListState::new(),
            patients: ListState::new(),
            patient_images: ListState::new(),
            mr_modal_open: false,
            prediction: PredictionPanel::new(),
            feedback: Feedback::default(),
            load_error: None,
        }
    }

    /// Fetch profile, appointments and patients.
    pub fn mount(&mut self) {
        self.load_error = None;
        let id = self.doctor_id;
        tracing::debug!(doctor_id = id, "Loading doctor dashboard");

        match self.backend.doctor_profile(id) {
            Ok(profile) => self.profile.load(profile),
            Err(e) => {
                tracing::warn!(doctor_id = id, error = %e, "Profile fetch failed");
                self.load_error = Some(messages::LOAD_FAILED.to_string());
            }
        }
        let appointments = fetched(
            "appointments",
            self.backend.appointments(Role::Doctor, id),
            &mut self.load_error,
        );
        self.appointments.replace_all(appointments);
        let patients = fetched(
            "patients",
            self.backend.doctor_patients(id),
            &mut self.load_error,
        );
        self.patients.replace_all(patients);
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn doctor_id(&self) -> i64 {
        self.doctor_id
    }

    pub fn menu(&self) -> DoctorMenu {
        self.menu
    }

    pub fn select_menu(&mut self, menu: DoctorMenu) {
        self.menu = menu;
    }

    pub fn appointments(&self) -> &ListState<Appointment> {
        &self.appointments
    }

    pub fn patients(&self) -> &ListState<Patient> {
        &self.patients
    }

    pub fn patient_images(&self) -> &ListState<MrImage> {
        &self.patient_images
    }

    pub fn is_mr_modal_open(&self) -> bool {
        self.mr_modal_open
    }

    pub fn profile(&self) -> &ProfileEditor<Doctor> {
        &self.profile
    }

    pub fn prediction(&self) -> &PredictionPanel {
        &self.prediction
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn stats(&self) -> DoctorStats {
        DoctorStats {
            appointments: self.appointments.len(),
            patients: self.patients.len(),
            pending: self
                .appointments
                .items()
                .iter()
                .filter(|a| a.status == AppointmentStatus::Waiting)
                .count(),
        }
    }

    // ── Appointments ───────────────────────────────────────

    /// Persist a new status, then show it.
    pub fn change_status(
        &mut self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<(), MutationError<BackendError>> {
        self.feedback.reset();
        let backend = &self.backend;
        let result = self.appointments.mutate_existing(
            appointment_id,
            |_| backend.update_appointment_status(appointment_id, status),
            |a| a.status = status,
        );
        match &result {
            Ok(()) => tracing::info!(appointment_id, %status, "Appointment status changed"),
            Err(e) => {
                tracing::warn!(appointment_id, error = %e, "Appointment status change failed");
                self.feedback.fail(call_message(e, messages::STATUS_UPDATE_FAILED));
            }
        }
        result
    }

    // ── Patients ───────────────────────────────────────────

    pub fn delete_patient(&mut self, patient_id: i64) -> Result<(), MutationError<BackendError>> {
        self.feedback.reset();
        let backend = &self.backend;
        let result = self
            .patients
            .remove_existing(patient_id, |_| backend.delete_patient(patient_id));
        match result {
            Ok(removed) => {
                tracing::info!(patient_id = removed.id, "Patient deleted");
                if self.prediction.selected_patient() == Some(patient_id) {
                    self.prediction.clear_patient();
                }
                if self.mr_modal_open && self.patients.selected_key().is_none() {
                    self.close_mr_modal();
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(patient_id, error = %e, "Patient delete failed");
                self.feedback.fail(call_message(&e, messages::DELETE_FAILED));
                Err(e)
            }
        }
    }

    /// Select a patient and open the MR modal with their images. The
    /// modal opens empty; a failed fetch leaves it empty and sets `feedback`.
    pub fn show_patient_images(&mut self, patient_id: i64) {
        self.feedback.reset();
        self.patients.select(patient_id);
        self.patient_images.replace_all(Vec::new());
        self.mr_modal_open = true;

        match self.backend.mr_images(patient_id) {
            Ok(images) => {
                tracing::debug!(patient_id, count = images.len(), "Patient MR images fetched");
                self.patient_images.replace_all(images);
            }
            Err(e) => {
                tracing::warn!(patient_id, error = %e, "Patient MR images fetch failed");
                self.feedback.fail(e.user_message(messages::LOAD_FAILED));
            }
        }
    }

    pub fn close_mr_modal(&mut self) {
        self.mr_modal_open = false;
        self.patients.clear_selection();
        self.patient_images.replace_all(Vec::new());
    }

    // ── Profile ────────────────────────────────────────────

    pub fn profile_field_change(&mut self, name: &str, value: &str) {
        self.profile.field_change(name, value);
    }

    pub fn submit_profile(&mut self) -> Result<(), BackendError> {
        let backend = &self.backend;
        self.profile.submit(|d| backend.update_doctor_profile(d))
    }

    // ── Prediction panel ───────────────────────────────────

    /// Options of the panel's patient selector.
    pub fn patient_options(&self) -> Vec<(i64, String)> {
        self.patients
            .items()
            .iter()
            .map(|p| (p.id, p.full_name()))
            .collect()
    }

    pub fn select_prediction_patient(&mut self, patient_id: i64) {
        self.prediction.select_patient(patient_id);
    }

    pub fn predict(&mut self, image: ImageUpload) -> Result<&Prediction, PredictionError> {
        self.prediction.submit(self.backend.as_ref(), image)
    }
}

fn call_message(e: &MutationError<BackendError>, fallback: &str) -> String {
    match e {
        MutationError::Call(e) => e.user_message(fallback),
        MutationError::View(_) => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Endpoint, MockBackend};
    use crate::view_state::ViewError;

    fn dashboard(backend: &Arc<MockBackend>, doctor_id: i64) -> DoctorDashboard {
        let doctor = backend.stored_doctor(doctor_id).unwrap();
        let mut dash = DoctorDashboard::new(backend.clone(), doctor);
        dash.mount();
        dash
    }

    #[test]
    fn mount_loads_role_scoped_lists() {
        let backend = Arc::new(MockBackend::seeded());
        let dash = dashboard(&backend, 1);

        assert_eq!(dash.appointments().len(), 1);
        assert_eq!(dash.patients().len(), 1);
        assert_eq!(dash.menu(), DoctorMenu::Dashboard);
        assert_eq!(dash.load_error(), None);
        assert_eq!(
            dash.stats(),
            DoctorStats { appointments: 1, patients: 1, pending: 0 }
        );
    }

    #[test]
    fn failed_fetch_leaves_list_empty() {
        let backend = Arc::new(MockBackend::seeded());
        backend.fail(Endpoint::DoctorPatients, BackendError::Timeout(30));
        let dash = dashboard(&backend, 2);

        assert!(dash.patients().is_empty());
        assert_eq!(dash.appointments().len(), 1);
        assert_eq!(dash.load_error(), Some("Veriler yüklenemedi."));
    }

    #[test]
    fn status_change_is_persisted_then_shown() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 2);
        let id = dash.appointments().items()[0].id;

        dash.change_status(id, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(dash.appointments().get(id).unwrap().status, AppointmentStatus::Confirmed);
        assert_eq!(backend.stored_status(id), Some(AppointmentStatus::Confirmed));
        assert_eq!(dash.stats().pending, 0);
    }

    #[test]
    fn failed_status_change_keeps_row() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 2);
        let id = dash.appointments().items()[0].id;
        backend.fail(
            Endpoint::UpdateAppointmentStatus,
            BackendError::UnexpectedStatus { status: 500, body: String::new() },
        );

        dash.change_status(id, AppointmentStatus::Completed).unwrap_err();
        assert_eq!(dash.appointments().get(id).unwrap().status, AppointmentStatus::Waiting);
        assert_eq!(
            dash.feedback().error.as_deref(),
            Some("Randevu durumu güncellenemedi!")
        );
    }

    #[test]
    fn unknown_appointment_is_not_sent() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        backend.clear_calls();

        let err = dash.change_status(999, AppointmentStatus::Completed).unwrap_err();
        assert_eq!(err, MutationError::View(ViewError::UnknownRecord(999)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn delete_patient_removes_row_after_backend() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        dash.select_prediction_patient(1);

        dash.delete_patient(1).unwrap();
        assert!(dash.patients().is_empty());
        assert_eq!(dash.prediction().selected_patient(), None);
        assert!(backend.stored_patient(1).is_none());
    }

    #[test]
    fn failed_delete_shows_backend_message() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        backend.fail(
            Endpoint::DeletePatient,
            BackendError::Rejected { status: 404, message: "Hasta bulunamadı!".into() },
        );

        dash.delete_patient(1).unwrap_err();
        assert_eq!(dash.patients().len(), 1);
        assert_eq!(dash.feedback().error.as_deref(), Some("Hasta bulunamadı!"));
    }

    #[test]
    fn show_patient_images_fills_side_list() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);

        dash.show_patient_images(1);
        assert!(dash.is_mr_modal_open());
        assert_eq!(dash.patients().selected().map(|p| p.id), Some(1));
        assert_eq!(dash.patient_images().len(), 1);
        assert_eq!(
            dash.patient_images().items()[0].prediction_label(),
            "glioma tumor"
        );

        dash.close_mr_modal();
        assert!(!dash.is_mr_modal_open());
        assert!(dash.patient_images().is_empty());
    }

    #[test]
    fn failed_image_fetch_opens_empty_modal() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        backend.fail(Endpoint::MrImages, BackendError::Timeout(30));

        dash.show_patient_images(1);
        assert!(dash.is_mr_modal_open());
        assert!(dash.patient_images().is_empty());
    }

    #[test]
    fn failed_image_fetch_is_reported_and_cleared_on_retry() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        backend.fail(Endpoint::MrImages, BackendError::Timeout(30));

        dash.show_patient_images(1);
        assert_eq!(dash.feedback().error.as_deref(), Some("Veriler yüklenemedi."));
        dash.close_mr_modal();

        backend.clear_failure(Endpoint::MrImages);
        dash.show_patient_images(1);
        assert_eq!(dash.feedback().error, None);
        assert!(!dash.patient_images().is_empty());
    }

    #[test]
    fn profile_edit_round_trips_through_backend() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);

        dash.profile_field_change("specialty", "Beyin Cerrahisi");
        dash.submit_profile().unwrap();
        assert_eq!(
            backend.stored_doctor(1).unwrap().specialty.as_deref(),
            Some("Beyin Cerrahisi")
        );
        assert_eq!(dash.profile().feedback().success.as_deref(), Some("Profil güncellendi!"));
    }

    #[test]
    fn prediction_runs_over_own_patients() {
        let backend = Arc::new(MockBackend::seeded());
        let mut dash = dashboard(&backend, 1);
        assert_eq!(dash.patient_options(), vec![(1, "Zeynep Korkmaz".to_string())]);

        dash.select_prediction_patient(1);
        let prediction = dash.predict(ImageUpload::from_bytes(vec![7])).unwrap().clone();
        assert_eq!(prediction.kind, "glioma_tumor");
        assert_eq!(prediction.score, "92.00");
    }
}
