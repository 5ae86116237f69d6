//! Clinic backend client.
//!
//! `ClinicBackend` is the seam between view-models and the REST service.
//! `HttpBackend` talks to the real backend over blocking `reqwest`;
//! `MockBackend` is an in-memory stand-in that records every call.

pub mod http;
pub mod mock;

use std::path::Path;

use serde::Deserialize;

use crate::models::{
    Appointment, AppointmentStatus, Created, Credentials, Doctor, DoctorRegistration,
    DoctorSummary, MrImage, NewAppointment, Notification, Patient, PatientRegistration,
    PredictResponse, Role,
};

pub use http::HttpBackend;
pub use mock::{Endpoint, MockBackend, MockCall};

/// File name used when an image arrives as raw bytes.
pub const DEFAULT_IMAGE_NAME: &str = "mr_image.png";

/// Every REST operation the dashboard performs.
///
/// Implementations must be shareable with the notification poller thread.
pub trait ClinicBackend: Send + Sync {
    fn login_doctor(&self, credentials: &Credentials) -> Result<Doctor, BackendError>;
    fn login_patient(&self, credentials: &Credentials) -> Result<Patient, BackendError>;
    fn register_doctor(&self, registration: &DoctorRegistration) -> Result<Created, BackendError>;
    fn register_patient(&self, registration: &PatientRegistration)
        -> Result<Created, BackendError>;

    fn doctor_profile(&self, doctor_id: i64) -> Result<Doctor, BackendError>;
    fn update_doctor_profile(&self, profile: &Doctor) -> Result<(), BackendError>;
    fn patient_profile(&self, patient_id: i64) -> Result<Patient, BackendError>;
    fn update_patient_profile(&self, profile: &Patient) -> Result<(), BackendError>;

    /// Appointments of one doctor or one patient.
    fn appointments(&self, role: Role, owner_id: i64) -> Result<Vec<Appointment>, BackendError>;
    fn create_appointment(&self, appointment: &NewAppointment) -> Result<Created, BackendError>;
    fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<(), BackendError>;

    fn doctor_patients(&self, doctor_id: i64) -> Result<Vec<Patient>, BackendError>;
    fn delete_patient(&self, patient_id: i64) -> Result<(), BackendError>;
    fn doctors(&self) -> Result<Vec<DoctorSummary>, BackendError>;

    fn upload_mr_image(&self, patient_id: i64, image: &ImageUpload)
        -> Result<Created, BackendError>;
    fn mr_images(&self, patient_id: i64) -> Result<Vec<MrImage>, BackendError>;
    fn delete_mr_image(&self, image_id: i64) -> Result<(), BackendError>;

    /// Classify an already uploaded image. `mr_image_id` must come from
    /// a successful `upload_mr_image`.
    fn predict(
        &self,
        patient_id: i64,
        mr_image_id: i64,
        image: &ImageUpload,
    ) -> Result<PredictResponse, BackendError>;

    fn notifications(&self, patient_id: i64) -> Result<Vec<Notification>, BackendError>;
}

/// Backend call failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Cannot connect to backend at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx response carrying `{"error": "..."}`.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Backend returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("{0}")]
    InvalidInput(String),
}

impl BackendError {
    /// Text for the page's error slot: backend-reported messages verbatim,
    /// everything else collapsed to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message, .. } | Self::InvalidInput(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body used by every backend route.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// An image picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk. The content type is guessed from the
    /// extension and must be `image/*`.
    pub fn from_path(path: &Path) -> Result<Self, BackendError> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(BackendError::InvalidInput(
                "Lütfen bir resim dosyası yükleyin!".into(),
            ));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            BackendError::InvalidInput(format!("Dosya okunamadı: {e}"))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string());

        Ok(Self {
            file_name,
            mime: mime.essence_str().to_string(),
            bytes,
        })
    }

    /// Wrap raw PNG bytes under the default upload name.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            file_name: DEFAULT_IMAGE_NAME.to_string(),
            mime: "image/png".to_string(),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = BackendError::Rejected {
            status: 401,
            message: "Geçersiz email veya şifre!".into(),
        };
        assert_eq!(err.user_message("Giriş başarısız!"), "Geçersiz email veya şifre!");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn transport_failures_collapse_to_fallback() {
        let fallback = "Tahmin alınırken hata oluştu.";
        for err in [
            BackendError::Connection("http://localhost:5000".into()),
            BackendError::Timeout(30),
            BackendError::ResponseParsing("eof".into()),
            BackendError::UnexpectedStatus { status: 502, body: "<html>".into() },
        ] {
            assert_eq!(err.user_message(fallback), fallback);
        }
    }

    #[test]
    fn image_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let image = ImageUpload::from_path(&path).unwrap();
        assert_eq!(image.file_name, "scan.jpg");
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn image_from_path_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = ImageUpload::from_path(&path).unwrap_err();
        assert_eq!(err.user_message(""), "Lütfen bir resim dosyası yükleyin!");
    }

    #[test]
    fn image_from_missing_path_is_invalid_input() {
        let err = ImageUpload::from_path(Path::new("/nonexistent/scan.png")).unwrap_err();
        assert!(matches!(err, BackendError::InvalidInput(_)));
    }

    #[test]
    fn raw_bytes_use_default_name() {
        let image = ImageUpload::from_bytes(vec![1, 2, 3]);
        assert_eq!(image.file_name, "mr_image.png");
        assert_eq!(image.mime, "image/png");
    }
}
