//! List/modal view-state shared by every dashboard panel.
//!
//! A panel keeps a local copy of backend rows (`items`), one highlighted
//! row, at most one open modal and the draft of the form inside it.
//! Local rows change only after the backend call that backs the change
//! has succeeded.

use std::collections::BTreeMap;

use crate::models::{Appointment, MrImage, Notification, Patient};

/// A row that can live in a `ListState`.
pub trait Record: Clone {
    fn id(&self) -> i64;
}

/// A row that can be synthesised from a form draft.
pub trait FromDraft: Record {
    fn from_draft(id: i64, draft: &Draft) -> Self;
}

impl Record for Appointment {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Patient {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for MrImage {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Notification {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Form field values keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    fields: BTreeMap<String, String>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    /// Field value, empty when never set.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Field value or `default` when unset or blank.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        match self.fields.get(name).filter(|v| !v.trim().is_empty()) {
            Some(v) => v.clone(),
            None => default.to_string(),
        }
    }

    pub fn is_blank(&self, name: &str) -> bool {
        self.get(name).trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Error and success text a page shows next to its form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Feedback {
    pub fn reset(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = None;
        self.error = Some(message.into());
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.error = None;
        self.success = Some(message.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("No form is open")]
    NoModalOpen,
    #[error("Record {0} is not in the list")]
    UnknownRecord(i64),
}

/// Error of a list mutation: either the list refused it, or the backend did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError<E> {
    View(ViewError),
    Call(E),
}

impl<E: std::fmt::Display> std::fmt::Display for MutationError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View(e) => std::fmt::Display::fmt(e, f),
            Self::Call(e) => std::fmt::Display::fmt(e, f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for MutationError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::View(e) => Some(e),
            Self::Call(e) => Some(e),
        }
    }
}

/// Client-side temporary id: current time in milliseconds.
fn temporary_id() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone)]
pub struct ListState<R: Record, K = ()> {
    items: Vec<R>,
    selected_key: Option<i64>,
    modal_open: Option<K>,
    form_draft: Draft,
}

impl<R: Record, K> Default for ListState<R, K> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected_key: None,
            modal_open: None,
            form_draft: Draft::new(),
        }
    }
}

impl<R: Record, K: Copy + PartialEq> ListState<R, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<R>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Swap in a fresh snapshot from the backend. A selection whose row is
    /// gone is dropped.
    pub fn replace_all(&mut self, items: Vec<R>) {
        self.items = items;
        if let Some(key) = self.selected_key {
            if self.get(key).is_none() {
                self.selected_key = None;
            }
        }
    }

    /// Append a row the backend has already stored.
    pub fn push(&mut self, item: R) {
        self.items.push(item);
    }

    // ── Selection ──────────────────────────────────────────

    pub fn select(&mut self, id: i64) {
        self.selected_key = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_key = None;
    }

    pub fn selected_key(&self) -> Option<i64> {
        self.selected_key
    }

    pub fn selected(&self) -> Option<&R> {
        self.selected_key.and_then(|id| self.get(id))
    }

    // ── Modal + draft ──────────────────────────────────────

    /// Open the create form of `kind` with an empty draft.
    pub fn open_create(&mut self, kind: K) {
        self.form_draft.clear();
        self.modal_open = Some(kind);
    }

    pub fn field_change(&mut self, name: &str, value: &str) {
        self.form_draft.set(name, value);
    }

    pub fn close_modal(&mut self) {
        self.modal_open = None;
        self.form_draft.clear();
    }

    pub fn modal_open(&self) -> Option<K> {
        self.modal_open
    }

    pub fn is_open(&self, kind: K) -> bool {
        self.modal_open == Some(kind)
    }

    pub fn draft(&self) -> &Draft {
        &self.form_draft
    }

    // ── Mutations ──────────────────────────────────────────

    /// Apply `patch` to row `id` once `call` succeeds.
    pub fn mutate_existing<E>(
        &mut self,
        id: i64,
        call: impl FnOnce(&R) -> Result<(), E>,
        patch: impl FnOnce(&mut R),
    ) -> Result<(), MutationError<E>> {
        let index = self
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or(MutationError::View(ViewError::UnknownRecord(id)))?;
        call(&self.items[index]).map_err(MutationError::Call)?;
        patch(&mut self.items[index]);
        Ok(())
    }

    /// Remove row `id` once `call` succeeds.
    pub fn remove_existing<E>(
        &mut self,
        id: i64,
        call: impl FnOnce(&R) -> Result<(), E>,
    ) -> Result<R, MutationError<E>> {
        let index = self
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or(MutationError::View(ViewError::UnknownRecord(id)))?;
        call(&self.items[index]).map_err(MutationError::Call)?;
        if self.selected_key == Some(id) {
            self.selected_key = None;
        }
        Ok(self.items.remove(index))
    }
}

impl<R: FromDraft, K: Copy + PartialEq> ListState<R, K> {
    /// Submit the open form. `persist` sees the open modal kind and the
    /// draft; only when it succeeds is a row synthesised from the draft
    /// appended and the modal closed. On failure nothing changes.
    pub fn submit_create<E>(
        &mut self,
        persist: impl FnOnce(K, &Draft) -> Result<(), E>,
    ) -> Result<&R, MutationError<E>> {
        let kind = self
            .modal_open
            .ok_or(MutationError::View(ViewError::NoModalOpen))?;
        persist(kind, &self.form_draft).map_err(MutationError::Call)?;

        let id = self.unique_id(temporary_id());
        let record = R::from_draft(id, &self.form_draft);
        self.items.push(record);
        self.close_modal();
        let last = self.items.len() - 1;
        Ok(&self.items[last])
    }

    /// Timestamps collide when two rows are added within a millisecond.
    fn unique_id(&self, candidate: i64) -> i64 {
        let max = self.items.iter().map(Record::id).max();
        match max {
            Some(max) if candidate <= max => max + 1,
            _ => candidate,
        }
    }
}
