//! Role dashboards.
//!
//! Each dashboard owns its copies of the rows it fetched on mount. A
//! list whose fetch fails stays empty and the dashboard records a load
//! error; the other lists are still shown.

pub mod doctor;
pub mod patient;
pub mod ward;

pub use doctor::{DoctorDashboard, DoctorStats};
pub use patient::{BookingForm, PatientDashboard};
pub use ward::WardPanel;

use crate::backend::BackendError;
use crate::messages;
use crate::models::{Doctor, Patient};
use crate::view_state::{Draft, Feedback};

/// Unwrap a mount-time fetch. Failures are logged, recorded in
/// `load_error`, and replaced by the empty value.
pub(crate) fn fetched<T: Default>(
    what: &'static str,
    result: Result<T, BackendError>,
    load_error: &mut Option<String>,
) -> T {
    match result {
        Ok(value) => {
            tracing::debug!(what, "Fetched");
            value
        }
        Err(e) => {
            tracing::warn!(what, error = %e, "Fetch failed");
            *load_error = Some(messages::LOAD_FAILED.to_string());
            T::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Profile editing
// ═══════════════════════════════════════════════════════════

/// A profile the dashboard can edit through a string draft.
pub trait EditableProfile: Clone {
    /// Draft field names, in form order.
    const FIELDS: &'static [&'static str];

    fn profile_id(&self) -> i64;
    fn field(&self, name: &str) -> String;
    /// `self` with every editable field taken from `draft`.
    fn with_draft(&self, draft: &Draft) -> Self;

    fn to_draft(&self) -> Draft {
        let mut draft = Draft::new();
        for name in Self::FIELDS {
            draft.set(name, &self.field(name));
        }
        draft
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn non_blank(draft: &Draft, name: &str) -> Option<String> {
    let value = draft.get(name).trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl EditableProfile for Doctor {
    const FIELDS: &'static [&'static str] =
        &["first_name", "last_name", "email", "phone", "specialty"];

    fn profile_id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> String {
        match name {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "email" => self.email.clone(),
            "phone" => opt(&self.phone),
            "specialty" => opt(&self.specialty),
            _ => String::new(),
        }
    }

    fn with_draft(&self, draft: &Draft) -> Self {
        Self {
            first_name: draft.get("first_name").trim().to_string(),
            last_name: draft.get("last_name").trim().to_string(),
            email: draft.get("email").trim().to_string(),
            phone: non_blank(draft, "phone"),
            specialty: non_blank(draft, "specialty"),
            ..self.clone()
        }
    }
}

impl EditableProfile for Patient {
    const FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "phone",
        "gender",
        "address",
        "city",
    ];

    fn profile_id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> String {
        match name {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "email" => self.email.clone(),
            "phone" => opt(&self.phone),
            "gender" => opt(&self.gender),
            "address" => opt(&self.address),
            "city" => opt(&self.city),
            _ => String::new(),
        }
    }

    fn with_draft(&self, draft: &Draft) -> Self {
        Self {
            first_name: draft.get("first_name").trim().to_string(),
            last_name: draft.get("last_name").trim().to_string(),
            email: draft.get("email").trim().to_string(),
            phone: non_blank(draft, "phone"),
            gender: non_blank(draft, "gender"),
            address: non_blank(draft, "address"),
            city: non_blank(draft, "city"),
            ..self.clone()
        }
    }
}

/// The "Profil" tab: the last known profile and the draft being edited.
#[derive(Debug, Clone)]
pub struct ProfileEditor<P: EditableProfile> {
    profile: P,
    draft: Draft,
    feedback: Feedback,
}

impl<P: EditableProfile> ProfileEditor<P> {
    pub fn new(profile: P) -> Self {
        let draft = profile.to_draft();
        Self {
            profile,
            draft,
            feedback: Feedback::default(),
        }
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Replace the profile with a fresh copy and restart the draft from it.
    pub fn load(&mut self, profile: P) {
        self.draft = profile.to_draft();
        self.profile = profile;
    }

    pub fn field_change(&mut self, name: &str, value: &str) {
        self.draft.set(name, value);
    }

    /// Send the edited profile; the local copy changes only on success.
    pub fn submit(
        &mut self,
        update: impl FnOnce(&P) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        self.feedback.reset();
        let edited = self.profile.with_draft(&self.draft);
        match update(&edited) {
            Ok(()) => {
                tracing::info!(id = edited.profile_id(), "Profile updated");
                self.profile = edited;
                self.feedback.succeed(messages::PROFILE_UPDATED);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = self.profile.profile_id(), error = %e, "Profile update failed");
                self.feedback.fail(e.user_message(messages::PROFILE_UPDATE_FAILED));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Doctor {
        Doctor {
            id: 1,
            first_name: "Ahmet".into(),
            last_name: "Yılmaz".into(),
            title: Some("Doç. Dr.".into()),
            email: "ahmet@example.com".into(),
            phone: None,
            specialty: Some("Nöroloji".into()),
        }
    }

    #[test]
    fn draft_starts_from_profile() {
        let editor = ProfileEditor::new(doctor());
        assert_eq!(editor.draft().get("first_name"), "Ahmet");
        assert_eq!(editor.draft().get("phone"), "");
        assert_eq!(editor.draft().get("specialty"), "Nöroloji");
    }

    #[test]
    fn successful_submit_updates_profile_and_keeps_title() {
        let mut editor = ProfileEditor::new(doctor());
        editor.field_change("phone", "5550001122");
        editor.field_change("specialty", " ");

        let mut sent = None;
        editor
            .submit(|d| {
                sent = Some(d.clone());
                Ok(())
            })
            .unwrap();

        let sent = sent.unwrap();
        assert_eq!(sent.phone.as_deref(), Some("5550001122"));
        assert_eq!(sent.specialty, None);
        assert_eq!(sent.title.as_deref(), Some("Doç. Dr."));
        assert_eq!(editor.profile(), &sent);
        assert_eq!(editor.feedback().success.as_deref(), Some("Profil güncellendi!"));
    }

    #[test]
    fn failed_submit_keeps_old_profile() {
        let mut editor = ProfileEditor::new(doctor());
        editor.field_change("first_name", "Mehmet");

        let err = editor
            .submit(|_| Err(BackendError::Timeout(30)))
            .unwrap_err();
        assert_eq!(err, BackendError::Timeout(30));
        assert_eq!(editor.profile().first_name, "Ahmet");
        assert_eq!(editor.draft().get("first_name"), "Mehmet");
        assert_eq!(editor.feedback().error.as_deref(), Some("Güncelleme başarısız!"));
    }

    #[test]
    fn fetched_records_load_error() {
        let mut load_error = None;
        let rows: Vec<i64> = fetched("rows", Err(BackendError::Timeout(30)), &mut load_error);
        assert!(rows.is_empty());
        assert_eq!(load_error.as_deref(), Some("Veriler yüklenemedi."));

        let mut load_error = None;
        let rows = fetched("rows", Ok(vec![1, 2]), &mut load_error);
        assert_eq!(rows, vec![1, 2]);
        assert_eq!(load_error, None);
    }
}
