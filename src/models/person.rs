use serde::{Deserialize, Serialize};

/// A doctor as returned by login and `/profile/doctor/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl Doctor {
    /// "Doç. Dr. Ahmet Yılmaz", or just the name when no title is known.
    pub fn display_name(&self) -> String {
        match self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => format!("{title} {} {}", self.first_name, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// A patient as returned by login, `/profile/patient/{id}` and `/patients/doctor/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Entry of the public `/doctors` list used by the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl DoctorSummary {
    /// Option label in the booking form: "Uzm. Dr. Ayşe Demir (Radyoloji)".
    pub fn option_label(&self) -> String {
        let mut label = match self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => format!("{title} {} {}", self.first_name, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        };
        if let Some(specialty) = self.specialty.as_deref().filter(|s| !s.trim().is_empty()) {
            label.push_str(&format!(" ({specialty})"));
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorRegistration {
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientRegistration {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub password: String,
}
