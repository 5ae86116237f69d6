use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// Appointment row. Doctor-scoped lists carry `patient`, patient-scoped
/// lists carry `doctor`; both are display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub date: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub patient: Option<String>,
    #[serde(default)]
    pub doctor: Option<String>,
}

impl Appointment {
    /// Date as shown in lists: `2025-06-10` becomes `10.06.2025`.
    /// Anything that is not an ISO date is shown as received.
    pub fn display_date(&self) -> String {
        format_date_tr(&self.date)
    }
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
}

pub fn format_date_tr(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%d.%m.%Y").to_string(),
        Err(_) => date.to_string(),
    }
}
