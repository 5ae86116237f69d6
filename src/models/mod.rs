//! Records exchanged with the clinic backend.
//!
//! Every entity is owned by the backend; these types only carry the
//! fields the dashboard reads or writes. Optional fields default to
//! `None` because list endpoints return trimmed records.

pub mod appointment;
pub mod enums;
pub mod mr_image;
pub mod notification;
pub mod person;
pub mod prediction;
pub mod ward;

pub use appointment::{Appointment, NewAppointment};
pub use enums::{AppointmentStatus, DoctorMenu, PatientMenu, Role, WardMenu, WardModal};
pub use mr_image::MrImage;
pub use notification::Notification;
pub use person::{
    Credentials, Doctor, DoctorRegistration, DoctorSummary, Patient, PatientRegistration,
};
pub use prediction::{ClassProbability, PredictResponse};
pub use ward::{Surgery, WardPatient, WardVisit};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}

/// Backend acknowledgement carrying the id of a created row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Created {
    pub id: i64,
    #[serde(default)]
    pub message: Option<String>,
}
