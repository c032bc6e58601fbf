use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Veterinary service offered by the clinic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    #[serde(rename = "General Checkup")]
    GeneralCheckup,
    Vaccination,
    Grooming,
}

impl Default for ServiceType {
    fn default() -> Self {
        ServiceType::GeneralCheckup
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceType::GeneralCheckup => "General Checkup",
            ServiceType::Vaccination => "Vaccination",
            ServiceType::Grooming => "Grooming",
        };
        f.write_str(label)
    }
}

impl FromStr for ServiceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "General Checkup" => Ok(ServiceType::GeneralCheckup),
            "Vaccination" => Ok(ServiceType::Vaccination),
            "Grooming" => Ok(ServiceType::Grooming),
            _ => Err(()),
        }
    }
}

/// Appointment lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for AppointmentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AppointmentStatus::Pending),
            "Confirmed" => Ok(AppointmentStatus::Confirmed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// A booked veterinary appointment. `time` is one of the fixed slot
/// labels ("09:00" through "16:00"); only non-cancelled appointments
/// occupy their (date, time) slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub user_id: String,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether this appointment occupies its slot on the grid.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

/// Validated input for creating an appointment. Identifier and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub pet_id: Uuid,
    pub user_id: String,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
}

impl NewAppointment {
    /// Materialize the record with a fresh id, Pending status and
    /// system timestamps.
    pub fn into_appointment(self) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            pet_id: self.pet_id,
            user_id: self.user_id,
            service_type: self.service_type,
            date: self.date,
            time: self.time,
            notes: self.notes,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_round_trip() {
        for label in ["General Checkup", "Vaccination", "Grooming"] {
            let parsed: ServiceType = label.parse().unwrap();
            assert_eq!(parsed.to_string(), label);
        }
        assert!("Dental".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Cancelled".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::Cancelled
        );
        assert!("Done".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_new_appointment_defaults() {
        let new = NewAppointment {
            pet_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            service_type: ServiceType::default(),
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            time: "09:00".to_string(),
            notes: String::new(),
        };
        let appt = new.into_appointment();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.service_type, ServiceType::GeneralCheckup);
        assert!(appt.occupies_slot());
    }
}
