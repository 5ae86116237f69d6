//! Ward panel of the legacy doctor view.
//!
//! Visits, ward patients and surgeries live only in this panel. Rows are
//! added through one modal at a time and never reach the backend.

use std::convert::Infallible;

use crate::models::{Surgery, WardMenu, WardModal, WardPatient, WardVisit};
use crate::prediction::PredictionPanel;
use crate::view_state::{Draft, FromDraft, ListState, MutationError, Record, ViewError};

// ── Draft field names ──────────────────────────────────────

pub const FIELD_PATIENT: &str = "patient";
pub const FIELD_DATE: &str = "date";
pub const FIELD_TIME: &str = "time";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_NAME: &str = "name";
pub const FIELD_AGE: &str = "age";
pub const FIELD_GENDER: &str = "gender";
pub const FIELD_DIAGNOSIS: &str = "diagnosis";
pub const FIELD_KIND: &str = "kind";

impl Record for WardVisit {
    fn id(&self) -> i64 {
        self.id
    }
}

impl FromDraft for WardVisit {
    fn from_draft(id: i64, draft: &Draft) -> Self {
        Self {
            id,
            patient: draft.get(FIELD_PATIENT).to_string(),
            date: draft.get(FIELD_DATE).to_string(),
            time: draft.get(FIELD_TIME).to_string(),
            status: draft.get_or(FIELD_STATUS, &WardVisit::default_status()),
        }
    }
}

impl Record for WardPatient {
    fn id(&self) -> i64 {
        self.id
    }
}

impl FromDraft for WardPatient {
    fn from_draft(id: i64, draft: &Draft) -> Self {
        Self {
            id,
            name: draft.get(FIELD_NAME).to_string(),
            age: draft.get(FIELD_AGE).to_string(),
            gender: draft.get(FIELD_GENDER).to_string(),
            diagnosis: draft.get(FIELD_DIAGNOSIS).to_string(),
        }
    }
}

impl Record for Surgery {
    fn id(&self) -> i64 {
        self.id
    }
}

impl FromDraft for Surgery {
    fn from_draft(id: i64, draft: &Draft) -> Self {
        Self {
            id,
            patient: draft.get(FIELD_PATIENT).to_string(),
            date: draft.get(FIELD_DATE).to_string(),
            kind: draft.get(FIELD_KIND).to_string(),
        }
    }
}

/// Local rows need no confirmation from anyone.
fn keep_locally(_: WardModal, _: &Draft) -> Result<(), Infallible> {
    Ok(())
}

fn created<R>(result: Result<&R, MutationError<Infallible>>) -> Result<i64, ViewError>
where
    R: Record,
{
    match result {
        Ok(row) => Ok(row.id()),
        Err(MutationError::View(e)) => Err(e),
        Err(MutationError::Call(never)) => match never {},
    }
}

pub struct WardPanel {
    menu: WardMenu,
    visits: ListState<WardVisit, WardModal>,
    patients: ListState<WardPatient, WardModal>,
    surgeries: ListState<Surgery, WardModal>,
    prediction: PredictionPanel,
}

impl Default for WardPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl WardPanel {
    pub fn new() -> Self {
        Self {
            menu: WardMenu::Visits,
            visits: ListState::new(),
            patients: ListState::new(),
            surgeries: ListState::new(),
            prediction: PredictionPanel::new(),
        }
    }

    /// Panel with the sample ward rows it opens with.
    pub fn with_sample_rows() -> Self {
        Self {
            visits: ListState::with_items(vec![
                WardVisit {
                    id: 1,
                    patient: "Zeynep Korkmaz".into(),
                    date: "2025-06-01".into(),
                    time: "10:00".into(),
                    status: "Bekliyor".into(),
                },
                WardVisit {
                    id: 2,
                    patient: "Mehmet Demir".into(),
                    date: "2025-06-02".into(),
                    time: "14:30".into(),
                    status: "Tamamlandı".into(),
                },
            ]),
            patients: ListState::with_items(vec![
                WardPatient {
                    id: 1,
                    name: "Zeynep Korkmaz".into(),
                    age: "45".into(),
                    gender: "Kadın".into(),
                    diagnosis: "Glioma".into(),
                },
                WardPatient {
                    id: 2,
                    name: "Mehmet Demir".into(),
                    age: "52".into(),
                    gender: "Erkek".into(),
                    diagnosis: "Pituitary".into(),
                },
            ]),
            surgeries: ListState::with_items(vec![Surgery {
                id: 1,
                patient: "Zeynep Korkmaz".into(),
                date: "2025-06-10".into(),
                kind: "Tümör Rezeksiyonu".into(),
            }]),
            ..Self::new()
        }
    }

    pub fn menu(&self) -> WardMenu {
        self.menu
    }

    pub fn select_menu(&mut self, menu: WardMenu) {
        self.menu = menu;
    }

    pub fn visits(&self) -> &ListState<WardVisit, WardModal> {
        &self.visits
    }

    pub fn patients(&self) -> &ListState<WardPatient, WardModal> {
        &self.patients
    }

    pub fn surgeries(&self) -> &ListState<Surgery, WardModal> {
        &self.surgeries
    }

    pub fn prediction(&self) -> &PredictionPanel {
        &self.prediction
    }

    pub fn prediction_mut(&mut self) -> &mut PredictionPanel {
        &mut self.prediction
    }

    /// The modal currently shown, if any.
    pub fn modal_open(&self) -> Option<WardModal> {
        self.visits
            .modal_open()
            .or_else(|| self.patients.modal_open())
            .or_else(|| self.surgeries.modal_open())
    }

    /// Open the form of `kind` with an empty draft. Any other open form closes.
    pub fn open_modal(&mut self, kind: WardModal) {
        self.close_modal();
        match kind {
            WardModal::Visit => self.visits.open_create(kind),
            WardModal::Patient => self.patients.open_create(kind),
            WardModal::Surgery => self.surgeries.open_create(kind),
        }
    }

    pub fn close_modal(&mut self) {
        self.visits.close_modal();
        self.patients.close_modal();
        self.surgeries.close_modal();
    }

    /// Update a field of the open form. Ignored when no form is open.
    pub fn field_change(&mut self, name: &str, value: &str) {
        match self.modal_open() {
            Some(WardModal::Visit) => self.visits.field_change(name, value),
            Some(WardModal::Patient) => self.patients.field_change(name, value),
            Some(WardModal::Surgery) => self.surgeries.field_change(name, value),
            None => {}
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self.modal_open()? {
            WardModal::Visit => Some(self.visits.draft()),
            WardModal::Patient => Some(self.patients.draft()),
            WardModal::Surgery => Some(self.surgeries.draft()),
        }
    }

    /// Add a row from the open form and close it. Returns the new row's id.
    pub fn submit(&mut self) -> Result<i64, ViewError> {
        let kind = self.modal_open().ok_or(ViewError::NoModalOpen)?;
        let id = match kind {
            WardModal::Visit => created(self.visits.submit_create(keep_locally))?,
            WardModal::Patient => created(self.patients.submit_create(keep_locally))?,
            WardModal::Surgery => created(self.surgeries.submit_create(keep_locally))?,
        };
        tracing::debug!(modal = %kind, id, "Ward row added");
        Ok(id)
    }
}
