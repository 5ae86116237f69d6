use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BackendError, ClinicBackend, ErrorBody, ImageUpload};
use crate::config::ClientConfig;
use crate::models::{
    Appointment, AppointmentStatus, Created, Credentials, Doctor, DoctorRegistration,
    DoctorSummary, MrImage, NewAppointment, Notification, Patient, PatientRegistration,
    PredictResponse, Role,
};

/// HTTP client for the clinic REST backend.
pub struct HttpBackend {
    base_url: String,
    client: Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: AppointmentStatus,
}

impl HttpBackend {
    /// Create a client for the configured backend origin.
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().map_err(|e| {
            if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => Err(BackendError::Rejected {
                status: status.as_u16(),
                message: parsed.error,
            }),
            Err(_) => Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }

    fn parse<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json()
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        tracing::debug!(path, "GET");
        let response = self.send(self.client.get(self.url(path)))?;
        Self::parse(response)
    }

    fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        tracing::debug!(path, "POST");
        let response = self.send(self.client.post(self.url(path)).json(body))?;
        Self::parse(response)
    }

    /// PUT whose acknowledgement body is not needed.
    fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), BackendError> {
        tracing::debug!(path, "PUT");
        self.send(self.client.put(self.url(path)).json(body))?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), BackendError> {
        tracing::debug!(path, "DELETE");
        self.send(self.client.delete(self.url(path)))?;
        Ok(())
    }

    fn image_part(image: &ImageUpload) -> Result<Part, BackendError> {
        Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)
            .map_err(|e| BackendError::InvalidInput(e.to_string()))
    }

    fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, BackendError> {
        tracing::debug!(path, "POST multipart");
        let response = self.send(self.client.post(self.url(path)).multipart(form))?;
        Self::parse(response)
    }
}

impl ClinicBackend for HttpBackend {
    fn login_doctor(&self, credentials: &Credentials) -> Result<Doctor, BackendError> {
        self.post_json("/login/doctor", credentials)
    }

    fn login_patient(&self, credentials: &Credentials) -> Result<Patient, BackendError> {
        self.post_json("/login/patient", credentials)
    }

    fn register_doctor(&self, registration: &DoctorRegistration) -> Result<Created, BackendError> {
        self.post_json("/register/doctor", registration)
    }

    fn register_patient(
        &self,
        registration: &PatientRegistration,
    ) -> Result<Created, BackendError> {
        self.post_json("/register/patient", registration)
    }

    fn doctor_profile(&self, doctor_id: i64) -> Result<Doctor, BackendError> {
        self.get_json(&format!("/profile/doctor/{doctor_id}"))
    }

    fn update_doctor_profile(&self, profile: &Doctor) -> Result<(), BackendError> {
        self.put_json(&format!("/profile/doctor/{}", profile.id), profile)
    }

    fn patient_profile(&self, patient_id: i64) -> Result<Patient, BackendError> {
        self.get_json(&format!("/profile/patient/{patient_id}"))
    }

    fn update_patient_profile(&self, profile: &Patient) -> Result<(), BackendError> {
        self.put_json(&format!("/profile/patient/{}", profile.id), profile)
    }

    fn appointments(&self, role: Role, owner_id: i64) -> Result<Vec<Appointment>, BackendError> {
        self.get_json(&format!("/appointments/{}/{owner_id}", role.as_str()))
    }

    fn create_appointment(&self, appointment: &NewAppointment) -> Result<Created, BackendError> {
        self.post_json("/appointments", appointment)
    }

    fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<(), BackendError> {
        self.put_json(
            &format!("/appointments/{appointment_id}/status"),
            &StatusUpdate { status },
        )
    }

    fn doctor_patients(&self, doctor_id: i64) -> Result<Vec<Patient>, BackendError> {
        self.get_json(&format!("/patients/doctor/{doctor_id}"))
    }

    fn delete_patient(&self, patient_id: i64) -> Result<(), BackendError> {
        self.delete(&format!("/patients/{patient_id}"))
    }

    fn doctors(&self) -> Result<Vec<DoctorSummary>, BackendError> {
        self.get_json("/doctors")
    }

    fn upload_mr_image(
        &self,
        patient_id: i64,
        image: &ImageUpload,
    ) -> Result<Created, BackendError> {
        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("patient_id", patient_id.to_string());
        self.post_multipart("/mrimages/upload", form)
    }

    fn mr_images(&self, patient_id: i64) -> Result<Vec<MrImage>, BackendError> {
        self.get_json(&format!("/mrimages/patient/{patient_id}"))
    }

    fn delete_mr_image(&self, image_id: i64) -> Result<(), BackendError> {
        self.delete(&format!("/mrimages/{image_id}"))
    }

    fn predict(
        &self,
        patient_id: i64,
        mr_image_id: i64,
        image: &ImageUpload,
    ) -> Result<PredictResponse, BackendError> {
        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("patient_id", patient_id.to_string())
            .text("mr_image_id", mr_image_id.to_string());
        self.post_multipart("/predict", form)
    }

    fn notifications(&self, patient_id: i64) -> Result<Vec<Notification>, BackendError> {
        self.get_json(&format!("/notifications/patient/{patient_id}"))
    }
}
