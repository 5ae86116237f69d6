//! Login identity holder.
//!
//! `Session` holds at most one identity, doctor or patient, and mirrors
//! it to durable storage so a restart lands back on the right dashboard.
//! Storage is best-effort: write failures are logged, and a missing or
//! unreadable blob on startup means "logged out".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::{Doctor, Patient, Role};

/// Storage key of a persisted doctor identity.
pub const DOCTOR_KEY: &str = "doctor";
/// Storage key of a persisted patient identity.
pub const PATIENT_KEY: &str = "patient";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Identity storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Identity serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// IdentityStore: durable key/value blobs
// ═══════════════════════════════════════════════════════════

/// Key/value storage for the persisted identity.
pub trait IdentityStore: Send {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn save(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// One `<key>.json` file per entry under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store under `~/tumorAI/session/`.
    pub fn default_location() -> Self {
        Self::new(crate::config::session_dir())
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl IdentityStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, for tests and for running without a home directory.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Identity + Session
// ═══════════════════════════════════════════════════════════

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Doctor(Doctor),
    Patient(Patient),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Self::Doctor(_) => Role::Doctor,
            Self::Patient(_) => Role::Patient,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Doctor(d) => d.id,
            Self::Patient(p) => p.id,
        }
    }

    fn storage_key(&self) -> &'static str {
        match self {
            Self::Doctor(_) => DOCTOR_KEY,
            Self::Patient(_) => PATIENT_KEY,
        }
    }

    fn other_key(&self) -> &'static str {
        match self {
            Self::Doctor(_) => PATIENT_KEY,
            Self::Patient(_) => DOCTOR_KEY,
        }
    }

    fn to_json(&self) -> Result<String, SessionError> {
        let json = match self {
            Self::Doctor(d) => serde_json::to_string(d)?,
            Self::Patient(p) => serde_json::to_string(p)?,
        };
        Ok(json)
    }
}

/// Session context owned by the app and lent to pages.
pub struct Session {
    identity: Option<Identity>,
    store: Box<dyn IdentityStore>,
}

impl Session {
    /// Rehydrate from `store`. A doctor blob wins over a patient blob;
    /// the loser is removed so the two never coexist again.
    pub fn restore(store: Box<dyn IdentityStore>) -> Self {
        let doctor = load_identity::<Doctor>(store.as_ref(), DOCTOR_KEY).map(Identity::Doctor);
        let identity = match doctor {
            Some(doctor) => {
                if let Err(e) = store.remove(PATIENT_KEY) {
                    tracing::warn!(error = %e, "Failed to drop stale patient identity");
                }
                Some(doctor)
            }
            None => load_identity::<Patient>(store.as_ref(), PATIENT_KEY).map(Identity::Patient),
        };

        if let Some(identity) = &identity {
            tracing::info!(role = %identity.role(), id = identity.id(), "Session restored");
        }
        Self { identity, store }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn doctor(&self) -> Option<&Doctor> {
        match &self.identity {
            Some(Identity::Doctor(d)) => Some(d),
            _ => None,
        }
    }

    pub fn patient(&self) -> Option<&Patient> {
        match &self.identity {
            Some(Identity::Patient(p)) => Some(p),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Log in as `identity`, replacing whoever was logged in.
    pub fn set(&mut self, identity: Identity) {
        let saved = identity
            .to_json()
            .and_then(|json| self.store.save(identity.storage_key(), &json));
        if let Err(e) = saved {
            tracing::warn!(error = %e, "Failed to persist identity");
        }
        // The other role's blob goes even when the save failed.
        if let Err(e) = self.store.remove(identity.other_key()) {
            tracing::warn!(error = %e, key = identity.other_key(), "Failed to remove stale identity");
        }

        tracing::info!(role = %identity.role(), id = identity.id(), "Logged in");
        self.identity = Some(identity);
    }

    pub fn set_doctor(&mut self, doctor: Doctor) {
        self.set(Identity::Doctor(doctor));
    }

    pub fn set_patient(&mut self, patient: Patient) {
        self.set(Identity::Patient(patient));
    }

    /// Log out and forget the persisted identity.
    pub fn clear(&mut self) {
        let role = self.identity.take().map(|i| i.role());
        for key in [DOCTOR_KEY, PATIENT_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(error = %e, key, "Failed to remove persisted identity");
            }
        }
        if let Some(role) = role {
            tracing::info!(%role, "Logged out");
        }
    }
}

fn load_identity<T: serde::de::DeserializeOwned>(
    store: &dyn IdentityStore,
    key: &str,
) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, key, "Persisted identity unreadable");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, key, "Persisted identity corrupt, discarding");
            if let Err(e) = store.remove(key) {
                tracing::warn!(error = %e, key, "Failed to discard corrupt identity");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

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

    fn patient() -> Patient {
        Patient {
            id: 2,
            first_name: "Mehmet".into(),
            last_name: "Demir".into(),
            email: "mehmet@example.com".into(),
            phone: None,
            gender: Some("Erkek".into()),
            address: None,
            city: Some("Ankara".into()),
        }
    }

    #[test]
    fn new_session_is_logged_out() {
        let session = Session::restore(Box::new(MemoryStore::new()));
        assert!(!session.is_logged_in());
        assert!(session.doctor().is_none());
        assert!(session.patient().is_none());
    }

    #[test]
    fn doctor_and_patient_are_mutually_exclusive() {
        let mut session = Session::restore(Box::new(MemoryStore::new()));
        session.set_doctor(doctor());
        assert!(session.doctor().is_some());
        assert!(session.patient().is_none());

        session.set_patient(patient());
        assert!(session.doctor().is_none());
        assert_eq!(session.patient().map(|p| p.id), Some(2));
        assert_eq!(session.identity().map(Identity::role), Some(Role::Patient));
    }

    #[test]
    fn identity_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = Session::restore(Box::new(FileStore::new(dir.path().to_path_buf())));
            session.set_doctor(doctor());
        }
        let session = Session::restore(Box::new(FileStore::new(dir.path().to_path_buf())));
        assert_eq!(session.doctor(), Some(&doctor()));
    }

    #[test]
    fn switching_role_removes_other_blob() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::restore(Box::new(FileStore::new(dir.path().to_path_buf())));
        session.set_doctor(doctor());
        session.set_patient(patient());

        assert!(!dir.path().join("doctor.json").exists());
        assert!(dir.path().join("patient.json").exists());
    }

    #[test]
    fn clear_removes_persisted_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::restore(Box::new(FileStore::new(dir.path().to_path_buf())));
        session.set_patient(patient());
        session.clear();
        assert!(!session.is_logged_in());

        let reloaded = Session::restore(Box::new(FileStore::new(dir.path().to_path_buf())));
        assert!(!reloaded.is_logged_in());
    }

    #[test]
    fn corrupt_blob_means_logged_out() {
        let store = MemoryStore::new();
        store.save(PATIENT_KEY, "{not json").unwrap();
        let session = Session::restore(Box::new(store));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn doctor_blob_wins_over_patient_blob() {
        let store = MemoryStore::new();
        store
            .save(DOCTOR_KEY, &serde_json::to_string(&doctor()).unwrap())
            .unwrap();
        store
            .save(PATIENT_KEY, &serde_json::to_string(&patient()).unwrap())
            .unwrap();
        let session = Session::restore(Box::new(store));
        assert!(session.doctor().is_some());
        assert!(session.patient().is_none());
    }

    /// Shares a `MemoryStore` with the test and refuses every save.
    struct SaveFails(Arc<MemoryStore>);

    impl IdentityStore for SaveFails {
        fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.0.load(key)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
            Err(SessionError::Io(std::io::Error::other("read-only")))
        }

        fn remove(&self, key: &str) -> Result<(), SessionError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn failed_save_still_removes_other_role_blob() {
        let inner = Arc::new(MemoryStore::new());
        inner
            .save(DOCTOR_KEY, &serde_json::to_string(&doctor()).unwrap())
            .unwrap();

        let mut session = Session::restore(Box::new(SaveFails(inner.clone())));
        assert!(session.doctor().is_some());
        session.set_patient(patient());
        assert!(session.patient().is_some());

        assert_eq!(inner.load(DOCTOR_KEY).unwrap(), None);
        assert_eq!(inner.load(PATIENT_KEY).unwrap(), None);
        let reloaded = Session::restore(Box::new(SaveFails(inner)));
        assert!(!reloaded.is_logged_in());
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.load(DOCTOR_KEY).unwrap(), None);
        store.remove(DOCTOR_KEY).unwrap();
    }
}
