use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde wire form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Waiting => "Bekliyor",
    Confirmed => "Onaylandı",
    Completed => "Tamamlandı",
});

str_enum!(Role {
    Doctor => "doctor",
    Patient => "patient",
});

str_enum!(DoctorMenu {
    Dashboard => "dashboard",
    Appointments => "appointments",
    Patients => "patients",
    MrZeka => "mrzeka",
});

str_enum!(PatientMenu {
    Dashboard => "dashboard",
    Profile => "profile",
    Appointment => "appointment",
    History => "history",
    MrImages => "mrimages",
});

str_enum!(WardMenu {
    Visits => "randevular",
    Patients => "hastalar",
    Surgeries => "ameliyatlar",
    MrZeka => "mrzeka",
});

str_enum!(WardModal {
    Visit => "randevu",
    Patient => "hasta",
    Surgery => "ameliyat",
});

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Waiting
    }
}

impl AppointmentStatus {
    /// Menu label shown in the status selector.
    pub fn label(&self) -> &'static str {
        self.as_str()
    }
}

impl DoctorMenu {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Gösterge Paneli",
            Self::Appointments => "Randevularım",
            Self::Patients => "Hastalarım",
            Self::MrZeka => "MR & Yapay Zeka",
        }
    }
}

impl PatientMenu {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Gösterge Paneli",
            Self::Profile => "Profilim",
            Self::Appointment => "Randevu Al",
            Self::History => "Randevu Geçmişi",
            Self::MrImages => "MR Görüntülerim",
        }
    }
}

impl WardMenu {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Visits => "Randevular",
            Self::Patients => "Hastalar",
            Self::Surgeries => "Ameliyatlar",
            Self::MrZeka => "MR & Yapay Zeka",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_status_uses_turkish_wire_names() {
        for (variant, s) in [
            (AppointmentStatus::Waiting, "Bekliyor"),
            (AppointmentStatus::Confirmed, "Onaylandı"),
            (AppointmentStatus::Completed, "Tamamlandı"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentStatus::from_str(s).unwrap(), variant);
            assert_eq!(serde_json::to_string(&variant).unwrap(), format!("\"{s}\""));
        }
    }

    #[test]
    fn status_deserializes_from_backend_json() {
        let status: AppointmentStatus = serde_json::from_str("\"Onaylandı\"").unwrap();
        assert_eq!(status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn default_status_is_waiting() {
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Waiting);
    }

    #[test]
    fn menus_list_every_entry_in_order() {
        assert_eq!(DoctorMenu::ALL.len(), 4);
        assert_eq!(DoctorMenu::ALL[0], DoctorMenu::Dashboard);
        assert_eq!(PatientMenu::ALL.len(), 5);
        assert_eq!(PatientMenu::ALL[4].as_str(), "mrimages");
        assert_eq!(WardMenu::ALL[0].label(), "Randevular");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(AppointmentStatus::from_str("Cancelled").is_err());
        assert!(Role::from_str("nurse").is_err());
        assert!(WardModal::from_str("").is_err());
    }
}
