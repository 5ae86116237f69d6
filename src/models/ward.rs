//! Local-only ward lists of the legacy doctor panel. These rows never
//! reach the backend; ids are client-generated timestamps.

use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardVisit {
    pub id: i64,
    pub patient: String,
    pub date: String,
    pub time: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardPatient {
    pub id: i64,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surgery {
    pub id: i64,
    pub patient: String,
    pub date: String,
    pub kind: String,
}

impl WardVisit {
    pub fn default_status() -> String {
        AppointmentStatus::Waiting.as_str().to_string()
    }
}
