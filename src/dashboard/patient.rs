//! Patient dashboard: profile, appointment booking and history, MR
//! uploads and notifications.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::backend::{BackendError, ClinicBackend, ImageUpload};
use crate::messages::{self, FormError};
use crate::models::{
    Appointment, AppointmentStatus, DoctorSummary, MrImage, NewAppointment, Notification, Patient,
    PatientMenu, Role,
};
use crate::notifications::NotificationPoller;
use crate::view_state::{Feedback, ListState, MutationError};

use super::{fetched, ProfileEditor};

/// Notifications listed on the dashboard tab before the "+N" line.
const NOTIFICATION_PREVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatientActionError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PatientActionError {
    fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Backend(e) => e.user_message(fallback),
        }
    }
}

/// The "Randevu Al" form.
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub doctor_id: Option<i64>,
    /// `YYYY-MM-DD`.
    pub date: String,
    feedback: Feedback,
}

impl BookingForm {
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn validate(&self, patient_id: i64) -> Result<NewAppointment, FormError> {
        let doctor_id = self.doctor_id.ok_or(FormError::MissingFields)?;
        let date = self.date.trim();
        if date.is_empty() {
            return Err(FormError::MissingFields);
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| FormError::InvalidDate)?;
        Ok(NewAppointment {
            patient_id,
            doctor_id,
            date: date.to_string(),
        })
    }

    fn reset(&mut self) {
        self.doctor_id = None;
        self.date.clear();
    }
}

pub struct PatientDashboard {
    backend: Arc<dyn ClinicBackend>,
    patient_id: i64,
    menu: PatientMenu,
    profile: ProfileEditor<Patient>,
    appointments: ListState<Appointment>,
    /// Selection doubles as the open image preview.
    images: ListState<MrImage>,
    doctors: Vec<DoctorSummary>,
    booking: BookingForm,
    pending_file: Option<ImageUpload>,
    upload_feedback: Feedback,
    feedback: Feedback,
    poller: Option<NotificationPoller>,
    load_error: Option<String>,
}

impl PatientDashboard {
    pub fn new(backend: Arc<dyn ClinicBackend>, patient: Patient) -> Self {
        Self {
            backend,
            patient_id: patient.id,
            menu: PatientMenu::Dashboard,
            profile: ProfileEditor::new(patient),
            appointments: ListState::new(),
            images: ListState::new(),
            doctors: Vec::new(),
            booking: BookingForm::default(),
            pending_file: None,
            upload_feedback: Feedback::default(),
            feedback: Feedback::default(),
            poller: None,
            load_error: None,
        }
    }

    /// Fetch profile, appointments, MR images and doctors, then start
    /// polling notifications every `poll_interval`.
    pub fn mount(&mut self, poll_interval: Duration) {
        self.load_error = None;
        let id = self.patient_id;
        tracing::debug!(patient_id = id, "Loading patient dashboard");

        match self.backend.patient_profile(id) {
            Ok(profile) => self.profile.load(profile),
            Err(e) => {
                tracing::warn!(patient_id = id, error = %e, "Profile fetch failed");
                self.load_error = Some(messages::LOAD_FAILED.to_string());
            }
        }
        let appointments = fetched(
            "appointments",
            self.backend.appointments(Role::Patient, id),
            &mut self.load_error,
        );
        self.appointments.replace_all(appointments);
        let images = fetched("mr_images", self.backend.mr_images(id), &mut self.load_error);
        self.images.replace_all(images);
        // An unavailable doctor list only disables booking.
        self.doctors = self.backend.doctors().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Doctor list fetch failed");
            Vec::new()
        });

        self.poller = Some(NotificationPoller::start(self.backend.clone(), id, poll_interval));
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn patient_id(&self) -> i64 {
        self.patient_id
    }

    pub fn menu(&self) -> PatientMenu {
        self.menu
    }

    /// Switch tab. Opening the booking tab refreshes the doctor list.
    pub fn select_menu(&mut self, menu: PatientMenu) {
        self.menu = menu;
        if menu == PatientMenu::Appointment {
            self.refresh_doctors();
        }
    }

    pub fn appointments(&self) -> &ListState<Appointment> {
        &self.appointments
    }

    pub fn images(&self) -> &ListState<MrImage> {
        &self.images
    }

    pub fn doctors(&self) -> &[DoctorSummary] {
        &self.doctors
    }

    pub fn profile(&self) -> &ProfileEditor<Patient> {
        &self.profile
    }

    pub fn booking(&self) -> &BookingForm {
        &self.booking
    }

    pub fn booking_mut(&mut self) -> &mut BookingForm {
        &mut self.booking
    }

    pub fn upload_feedback(&self) -> &Feedback {
        &self.upload_feedback
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    // ── Notifications ──────────────────────────────────────

    pub fn notifications(&self) -> Vec<Notification> {
        self.poller
            .as_ref()
            .map(NotificationPoller::latest)
            .unwrap_or_default()
    }

    /// The newest three notifications and, when there are more, the
    /// "+N daha fazla bildirim" line.
    pub fn notification_preview(&self) -> (Vec<Notification>, Option<String>) {
        let mut all = self.notifications();
        let more = all.len().saturating_sub(NOTIFICATION_PREVIEW);
        all.truncate(NOTIFICATION_PREVIEW);
        let footer = (more > 0).then(|| format!("+{more} daha fazla bildirim"));
        (all, footer)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_stopped())
    }

    /// Stop and join the poller.
    pub fn stop_polling(&mut self) {
        self.poller = None;
    }

    // ── Doctors + booking ──────────────────────────────────

    pub fn refresh_doctors(&mut self) {
        match self.backend.doctors() {
            Ok(doctors) => self.doctors = doctors,
            Err(e) => {
                tracing::warn!(error = %e, "Doctor list fetch failed");
                self.doctors.clear();
            }
        }
    }

    /// Book with the selected doctor. On success the form resets and the
    /// new appointment joins the history under the id the backend returned.
    pub fn book_appointment(&mut self) -> Result<&Appointment, PatientActionError> {
        self.booking.feedback.reset();
        let result = self
            .booking
            .validate(self.patient_id)
            .map_err(PatientActionError::from)
            .and_then(|request| {
                let created = self.backend.create_appointment(&request)?;
                Ok((created, request))
            });

        match result {
            Ok((created, request)) => {
                tracing::info!(
                    appointment_id = created.id,
                    doctor_id = request.doctor_id,
                    "Appointment booked"
                );
                let doctor = self
                    .doctors
                    .iter()
                    .find(|d| d.id == request.doctor_id)
                    .map(|d| format!("{} {}", d.first_name, d.last_name));
                self.appointments.push(Appointment {
                    id: created.id,
                    date: request.date,
                    status: AppointmentStatus::Waiting,
                    patient: None,
                    doctor,
                });
                self.booking.reset();
                self.booking.feedback.succeed(messages::APPOINTMENT_CREATED);
                let last = self.appointments.len() - 1;
                Ok(&self.appointments.items()[last])
            }
            Err(e) => {
                tracing::warn!(patient_id = self.patient_id, error = %e, "Booking failed");
                self.booking.feedback.fail(e.user_message(messages::APPOINTMENT_FAILED));
                Err(e)
            }
        }
    }

    // ── MR images ──────────────────────────────────────────

    pub fn choose_file(&mut self, image: ImageUpload) {
        self.pending_file = Some(image);
    }

    pub fn pending_file(&self) -> Option<&ImageUpload> {
        self.pending_file.as_ref()
    }

    /// Store the chosen image without classifying it, then reload the list.
    pub fn upload_image(&mut self) -> Result<i64, PatientActionError> {
        self.upload_feedback.reset();
        let result = match &self.pending_file {
            None => Err(PatientActionError::from(FormError::NoFileSelected)),
            Some(image) => self
                .backend
                .upload_mr_image(self.patient_id, image)
                .map_err(PatientActionError::from),
        };

        match result {
            Ok(created) => {
                tracing::info!(patient_id = self.patient_id, image_id = created.id, "MR image uploaded");
                self.pending_file = None;
                self.upload_feedback.succeed(messages::MR_UPLOADED);
                self.refresh_images();
                Ok(created.id)
            }
            Err(e) => {
                tracing::warn!(patient_id = self.patient_id, error = %e, "MR upload failed");
                self.upload_feedback.fail(e.user_message(messages::MR_UPLOAD_FAILED));
                Err(e)
            }
        }
    }

    pub fn refresh_images(&mut self) {
        match self.backend.mr_images(self.patient_id) {
            Ok(images) => self.images.replace_all(images),
            Err(e) => {
                tracing::warn!(patient_id = self.patient_id, error = %e, "MR list refresh failed");
                self.feedback.fail(messages::LOAD_FAILED);
            }
        }
    }

    pub fn delete_image(&mut self, image_id: i64) -> Result<(), MutationError<BackendError>> {
        self.feedback.reset();
        let backend = &self.backend;
        let result = self
            .images
            .remove_existing(image_id, |_| backend.delete_mr_image(image_id));
        match result {
            Ok(_) => {
                tracing::info!(image_id, "MR image deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(image_id, error = %e, "MR image delete failed");
                let message = match &e {
                    MutationError::Call(e) => e.user_message(messages::DELETE_FAILED),
                    MutationError::View(_) => messages::DELETE_FAILED.to_string(),
                };
                self.feedback.fail(message);
                Err(e)
            }
        }
    }

    pub fn open_preview(&mut self, image_id: i64) {
        if self.images.get(image_id).is_some() {
            self.images.select(image_id);
        }
    }

    pub fn close_preview(&mut self) {
        self.images.clear_selection();
    }

    pub fn preview(&self) -> Option<&MrImage> {
        self.images.selected()
    }

    // ── Profile ────────────────────────────────────────────

    pub fn profile_field_change(&mut self, name: &str, value: &str) {
        self.profile.field_change(name, value);
    }

    pub fn submit_profile(&mut self) -> Result<(), BackendError> {
        let backend = &self.backend;
        self.profile.submit(|p| backend.update_patient_profile(p))
    }
}
