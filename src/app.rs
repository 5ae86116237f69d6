//! Top-level page routing.
//!
//! `App` owns the backend handle and the session. Whoever is logged in
//! gets their dashboard; everyone else moves between role selection,
//! login and registration.

use std::sync::Arc;

use crate::auth::{AuthError, DoctorRegisterForm, LoginForm, PatientRegisterForm};
use crate::backend::{BackendError, ClinicBackend, HttpBackend};
use crate::config::ClientConfig;
use crate::dashboard::{DoctorDashboard, PatientDashboard};
use crate::messages;
use crate::models::{Created, Role};
use crate::session::{FileStore, Identity, Session};

/// Which page is shown, without its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    RoleSelect,
    DoctorLogin,
    PatientLogin,
    DoctorRegister,
    PatientRegister,
    DoctorDashboard,
    PatientDashboard,
}

/// The current page and its view-model.
pub enum Page {
    RoleSelect,
    Login(LoginForm),
    DoctorRegister(DoctorRegisterForm),
    PatientRegister(PatientRegisterForm),
    DoctorDashboard(Box<DoctorDashboard>),
    PatientDashboard(Box<PatientDashboard>),
}

impl Page {
    pub fn screen(&self) -> Screen {
        match self {
            Self::RoleSelect => Screen::RoleSelect,
            Self::Login(form) => match form.role() {
                Role::Doctor => Screen::DoctorLogin,
                Role::Patient => Screen::PatientLogin,
            },
            Self::DoctorRegister(_) => Screen::DoctorRegister,
            Self::PatientRegister(_) => Screen::PatientRegister,
            Self::DoctorDashboard(_) => Screen::DoctorDashboard,
            Self::PatientDashboard(_) => Screen::PatientDashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Action not available on the {0:?} page")]
    WrongPage(Screen),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct App {
    backend: Arc<dyn ClinicBackend>,
    config: ClientConfig,
    session: Session,
    page: Page,
    /// One-shot message carried to the next page.
    notice: Option<String>,
}

impl App {
    /// Start on the restored identity's dashboard, or on role selection.
    pub fn new(backend: Arc<dyn ClinicBackend>, session: Session, config: ClientConfig) -> Self {
        let mut app = Self {
            backend,
            config,
            session,
            page: Page::RoleSelect,
            notice: None,
        };
        if let Some(identity) = app.session.identity().cloned() {
            app.enter_dashboard(identity);
        }
        app
    }

    /// HTTP backend from `config`, identity persisted under the app data dir.
    pub fn with_http_backend(config: ClientConfig) -> Result<Self, BackendError> {
        let backend = HttpBackend::new(&config)?;
        tracing::info!(backend_url = %backend.base_url(), "Using HTTP backend");
        let session = Session::restore(Box::new(FileStore::default_location()));
        Ok(Self::new(Arc::new(backend), session, config))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn screen(&self) -> Screen {
        self.page.screen()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn backend(&self) -> &Arc<dyn ClinicBackend> {
        &self.backend
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn show(&mut self, page: Page) {
        tracing::debug!(from = ?self.page.screen(), to = ?page.screen(), "Navigate");
        self.page = page;
    }

    fn enter_dashboard(&mut self, identity: Identity) {
        self.notice = None;
        match identity {
            Identity::Doctor(doctor) => {
                let mut dash = DoctorDashboard::new(self.backend.clone(), doctor);
                dash.mount();
                self.show(Page::DoctorDashboard(Box::new(dash)));
            }
            Identity::Patient(patient) => {
                let mut dash = PatientDashboard::new(self.backend.clone(), patient);
                dash.mount(self.config.poll_interval);
                self.show(Page::PatientDashboard(Box::new(dash)));
            }
        }
    }

    // ── Navigation ─────────────────────────────────────────

    /// Open `role`'s login page. Ignored while logged in.
    pub fn choose_role(&mut self, role: Role) {
        if self.session.is_logged_in() {
            return;
        }
        self.notice = None;
        self.show(Page::Login(LoginForm::new(role)));
    }

    /// Open `role`'s registration page. Ignored while logged in.
    pub fn go_register(&mut self, role: Role) {
        if self.session.is_logged_in() {
            return;
        }
        self.notice = None;
        let page = match role {
            Role::Doctor => Page::DoctorRegister(DoctorRegisterForm::new()),
            Role::Patient => Page::PatientRegister(PatientRegisterForm::new()),
        };
        self.show(page);
    }

    pub fn go_back(&mut self) {
        if self.session.is_logged_in() {
            return;
        }
        self.notice = None;
        self.show(Page::RoleSelect);
    }

    // ── Forms ──────────────────────────────────────────────

    /// Submit the login form; success stores the identity and opens its dashboard.
    pub fn submit_login(&mut self) -> Result<(), NavigationError> {
        let screen = self.page.screen();
        let Page::Login(form) = &mut self.page else {
            return Err(NavigationError::WrongPage(screen));
        };
        let identity = form.submit(self.backend.as_ref())?;
        self.session.set(identity.clone());
        self.enter_dashboard(identity);
        Ok(())
    }

    /// Submit the open registration form; success moves to that role's login.
    pub fn submit_registration(&mut self) -> Result<Created, NavigationError> {
        let (created, role) = match &mut self.page {
            Page::PatientRegister(form) => (form.submit(self.backend.as_ref())?, Role::Patient),
            Page::DoctorRegister(form) => (form.submit(self.backend.as_ref())?, Role::Doctor),
            other => return Err(NavigationError::WrongPage(other.screen())),
        };

        self.show(Page::Login(LoginForm::new(role)));
        if role == Role::Doctor {
            self.notice = Some(messages::DOCTOR_REGISTERED.to_string());
        }
        Ok(created)
    }

    /// Forget the identity and return to role selection. Dropping the
    /// dashboard stops its background work. If the notification poller is
    /// mid-request, this waits for that request to finish, which is bounded
    /// by `ClientConfig::request_timeout`.
    pub fn logout(&mut self) {
        self.session.clear();
        self.notice = None;
        self.show(Page::RoleSelect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::SEED_PASSWORD;
    use crate::backend::{Endpoint, MockBackend};
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::default().with_poll_interval(Duration::from_secs(3600))
    }

    fn app_in(dir: &std::path::Path, backend: &Arc<MockBackend>) -> App {
        let session = Session::restore(Box::new(FileStore::new(dir.to_path_buf())));
        App::new(backend.clone(), session, config())
    }

    fn fill_login(app: &mut App, email: &str) {
        match app.page_mut() {
            Page::Login(form) => {
                form.email = email.into();
                form.password = SEED_PASSWORD.into();
            }
            _ => panic!("not on a login page"),
        }
    }

    #[test]
    fn fresh_start_shows_role_selection() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let app = app_in(dir.path(), &backend);
        assert_eq!(app.screen(), Screen::RoleSelect);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn doctor_login_opens_dashboard_and_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        {
            let mut app = app_in(dir.path(), &backend);
            app.choose_role(Role::Doctor);
            assert_eq!(app.screen(), Screen::DoctorLogin);
            fill_login(&mut app, "ahmet@example.com");
            app.submit_login().unwrap();
            assert_eq!(app.screen(), Screen::DoctorDashboard);
        }

        let app = app_in(dir.path(), &backend);
        assert_eq!(app.screen(), Screen::DoctorDashboard);
        assert_eq!(app.session().doctor().map(|d| d.id), Some(1));
    }

    #[test]
    fn logout_clears_identity_and_reload_shows_role_selection() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.choose_role(Role::Patient);
        fill_login(&mut app, "zeynep@example.com");
        app.submit_login().unwrap();
        assert_eq!(app.screen(), Screen::PatientDashboard);

        app.logout();
        assert_eq!(app.screen(), Screen::RoleSelect);
        assert!(!app.session().is_logged_in());

        let reloaded = app_in(dir.path(), &backend);
        assert_eq!(reloaded.screen(), Screen::RoleSelect);
    }

    #[test]
    fn failed_login_stays_on_page() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.choose_role(Role::Doctor);
        if let Page::Login(form) = app.page_mut() {
            form.email = "ahmet@example.com".into();
            form.password = "yanlış".into();
        }

        let err = app.submit_login().unwrap_err();
        assert!(matches!(err, NavigationError::Auth(AuthError::Backend(_))));
        assert_eq!(app.screen(), Screen::DoctorLogin);
        assert!(!app.session().is_logged_in());
    }

    #[test]
    fn login_on_wrong_page_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        assert_eq!(
            app.submit_login().unwrap_err(),
            NavigationError::WrongPage(Screen::RoleSelect)
        );
    }

    #[test]
    fn doctor_registration_moves_to_login_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.go_register(Role::Doctor);
        if let Page::DoctorRegister(form) = app.page_mut() {
            form.first_name = "Can".into();
            form.last_name = "Öz".into();
            form.email = "can@example.com".into();
            form.password = "x".into();
        }

        app.submit_registration().unwrap();
        assert_eq!(app.screen(), Screen::DoctorLogin);
        assert_eq!(
            app.notice(),
            Some("Kayıt başarılı! Giriş ekranına yönlendiriliyorsunuz...")
        );
        app.go_back();
        assert_eq!(app.notice(), None);
    }

    #[test]
    fn invalid_patient_registration_stays_on_page() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.go_register(Role::Patient);

        app.submit_registration().unwrap_err();
        assert_eq!(app.screen(), Screen::PatientRegister);
        assert_eq!(backend.call_count(Endpoint::RegisterPatient), 0);
    }

    #[test]
    fn go_back_is_ignored_while_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.choose_role(Role::Doctor);
        fill_login(&mut app, "ayse@example.com");
        app.submit_login().unwrap();

        app.go_back();
        assert_eq!(app.screen(), Screen::DoctorDashboard);
    }

    #[test]
    fn role_and_register_pages_are_ignored_while_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MockBackend::seeded());
        let mut app = app_in(dir.path(), &backend);
        app.choose_role(Role::Patient);
        fill_login(&mut app, "zeynep@example.com");
        app.submit_login().unwrap();

        app.choose_role(Role::Doctor);
        assert_eq!(app.screen(), Screen::PatientDashboard);
        app.go_register(Role::Doctor);
        assert_eq!(app.screen(), Screen::PatientDashboard);
        app.go_register(Role::Patient);
        assert_eq!(app.screen(), Screen::PatientDashboard);

        assert!(app.session().is_logged_in());
        match app.page() {
            Page::PatientDashboard(dash) => assert!(dash.is_polling()),
            _ => panic!("dashboard was replaced"),
        }
    }
}
