//! Login and registration pages.
//!
//! Each form validates locally before its single backend call. Messages
//! the backend reports (`{"error": ..}`) are shown as-is; transport and
//! parse failures fall back to a generic text.

use crate::backend::{BackendError, ClinicBackend};
use crate::messages::{self, FormError};
use crate::models::{Created, Credentials, DoctorRegistration, PatientRegistration, Role};
use crate::session::Identity;
use crate::view_state::Feedback;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] FormError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AuthError {
    fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Backend(e) => e.user_message(fallback),
        }
    }
}

/// Empty optional fields are sent as absent, not as "".
fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ═══════════════════════════════════════════════════════════
// Login
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct LoginForm {
    role: Role,
    pub email: String,
    pub password: String,
    feedback: Feedback,
    loading: bool,
}

impl LoginForm {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            email: String::new(),
            password: String::new(),
            feedback: Feedback::default(),
            loading: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Log in against the role's endpoint. The caller stores the returned
    /// identity in the session.
    pub fn submit(&mut self, backend: &dyn ClinicBackend) -> Result<Identity, AuthError> {
        self.feedback.reset();
        let result = self.try_login(backend);
        if let Err(e) = &result {
            tracing::warn!(role = %self.role, error = %e, "Login failed");
            self.feedback.fail(e.user_message(messages::LOGIN_FAILED));
        }
        result
    }

    fn try_login(&mut self, backend: &dyn ClinicBackend) -> Result<Identity, AuthError> {
        if blank(&self.email) || self.password.is_empty() {
            return Err(FormError::MissingCredentials.into());
        }
        let credentials = Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };

        self.loading = true;
        let identity = match self.role {
            Role::Doctor => backend.login_doctor(&credentials).map(Identity::Doctor),
            Role::Patient => backend.login_patient(&credentials).map(Identity::Patient),
        };
        self.loading = false;

        let identity = identity?;
        self.password.clear();
        Ok(identity)
    }
}

// ═══════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct PatientRegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub password: String,
    pub password_confirm: String,
    pub terms_accepted: bool,
    feedback: Feedback,
}

impl PatientRegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn validate(&self) -> Result<PatientRegistration, FormError> {
        let missing = [&self.first_name, &self.last_name, &self.email]
            .iter()
            .any(|v| blank(v))
            || self.password.is_empty()
            || self.password_confirm.is_empty();
        if missing || !self.terms_accepted {
            return Err(FormError::IncompletePatientRegistration);
        }
        if self.password != self.password_confirm {
            return Err(FormError::PasswordMismatch);
        }

        Ok(PatientRegistration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            gender: optional(&self.gender),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            address: optional(&self.address),
            city: optional(&self.city),
            password: self.password.clone(),
        })
    }

    /// Register; on success the app moves to the patient login page.
    pub fn submit(&mut self, backend: &dyn ClinicBackend) -> Result<Created, AuthError> {
        self.feedback.reset();
        let result = self
            .validate()
            .map_err(AuthError::from)
            .and_then(|registration| Ok(backend.register_patient(&registration)?));

        match &result {
            Ok(created) => tracing::info!(patient_id = created.id, "Patient registered"),
            Err(e) => {
                tracing::warn!(error = %e, "Patient registration failed");
                self.feedback.fail(e.user_message(messages::REGISTER_FAILED));
            }
        }
        result
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorRegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    pub password: String,
    feedback: Feedback,
}

impl DoctorRegisterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    fn validate(&self) -> Result<DoctorRegistration, FormError> {
        if [&self.first_name, &self.last_name, &self.email]
            .iter()
            .any(|v| blank(v))
            || self.password.is_empty()
        {
            return Err(FormError::MissingFields);
        }

        Ok(DoctorRegistration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            title: optional(&self.title),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            specialty: optional(&self.specialty),
            password: self.password.clone(),
        })
    }

    /// Register; on success a confirmation is shown before the app moves
    /// to the doctor login page.
    pub fn submit(&mut self, backend: &dyn ClinicBackend) -> Result<Created, AuthError> {
        self.feedback.reset();
        let result = self
            .validate()
            .map_err(AuthError::from)
            .and_then(|registration| Ok(backend.register_doctor(&registration)?));

        match &result {
            Ok(created) => {
                tracing::info!(doctor_id = created.id, "Doctor registered");
                self.feedback.succeed(messages::DOCTOR_REGISTERED);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Doctor registration failed");
                self.feedback.fail(e.user_message(messages::REGISTER_FAILED));
            }
        }
        result
    }
}
