//! Staff roles used to target alerts and filter the live feed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Dashboard role of a connected user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Hospital administrator.
    Admin,
    /// Physician or surgeon.
    Doctor,
    /// Nursing staff.
    Nurse,
    /// Lab or theater technician.
    Technician,
    /// Pharmacy staff.
    Pharmacist,
    /// Patient self-service dashboard.
    Patient,
}

text_enum!(StaffRole, "staff role" {
    Admin => "admin",
    Doctor => "doctor",
    Nurse => "nurse",
    Technician => "technician",
    Pharmacist => "pharmacist",
    Patient => "patient",
});

impl StaffRole {
    /// Every role, in dashboard menu order.
    pub const ALL: [Self; 6] = [
        Self::Admin,
        Self::Doctor,
        Self::Nurse,
        Self::Technician,
        Self::Pharmacist,
        Self::Patient,
    ];

    /// Short description shown by the roles catalog endpoint.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Departments, theaters and staff management",
            Self::Doctor => "Surgery schedule, patients and emergency queue",
            Self::Nurse => "Token queue, patients and emergency alerts",
            Self::Technician => "Theater turnover and equipment readiness",
            Self::Pharmacist => "Prescriptions and stock alerts",
            Self::Patient => "Own tokens and appointments",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_round_trips() {
        for role in StaffRole::ALL {
            assert_eq!(role.as_str().parse::<StaffRole>().ok(), Some(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("janitor".parse::<StaffRole>().is_err());
    }
}
