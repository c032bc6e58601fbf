//! Booking orchestrator: validates and creates a new appointment. The
//! pre-flight conflict lookup produces the friendly error; the store's
//! atomic insert is the authoritative guard, so a race between two
//! requests for the same slot always leaves exactly one winner.

use std::sync::Arc;

use chrono::NaiveDate;
use pawhaven_core::{
    Appointment, AppointmentRepository, NewAppointment, PetDirectory, SchedulingError,
    ServiceType, StoreError, SLOT_TAKEN_MSG,
};
use tracing::info;
use uuid::Uuid;

use crate::slots;

/// Raw booking input as it arrives from the API boundary.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub pet_id: Uuid,
    pub user_id: String,
    pub service_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

pub struct BookingService {
    store: Arc<dyn AppointmentRepository>,
    pets: Arc<dyn PetDirectory>,
}

impl BookingService {
    pub fn new(store: Arc<dyn AppointmentRepository>, pets: Arc<dyn PetDirectory>) -> Self {
        Self { store, pets }
    }

    pub async fn book(&self, req: BookingRequest) -> Result<Appointment, SchedulingError> {
        // 1. The referenced pet must exist
        if !self.pets.exists(req.pet_id).await? {
            return Err(SchedulingError::NotFound("Pet not found".to_string()));
        }

        // 2. Date and time are both required
        let (date, time) = match (req.date, req.time) {
            (Some(date), Some(time)) => (date, time),
            _ => {
                return Err(SchedulingError::InvalidInput(
                    "Please provide appointment date and time".to_string(),
                ))
            }
        };

        // 3. Service type must be one of the offered services
        let service_type = parse_service_type(req.service_type.as_deref())?;

        // 4. Time must be on the slot grid
        if !slots::is_slot_label(&time) {
            return Err(SchedulingError::InvalidInput(
                "Invalid time slot".to_string(),
            ));
        }

        // 5. Pre-flight conflict check against non-cancelled appointments
        let conflicts = self.store.find_conflicting(date, &time, None).await?;
        if !conflicts.is_empty() {
            return Err(SchedulingError::Conflict(SLOT_TAKEN_MSG.to_string()));
        }

        // 6. Insert. The store re-checks the slot atomically, closing
        //    the window between steps 5 and 6.
        let new = NewAppointment {
            pet_id: req.pet_id,
            user_id: req.user_id,
            service_type,
            date,
            time,
            notes: req.notes.unwrap_or_default(),
        };
        let appointment = match self.store.insert(new).await {
            Ok(appointment) => appointment,
            Err(StoreError::SlotTaken) => {
                return Err(SchedulingError::Conflict(SLOT_TAKEN_MSG.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            appointment_id = %appointment.id,
            date = %appointment.date,
            time = %appointment.time,
            "Appointment booked"
        );
        Ok(appointment)
    }
}

/// Parse an optional wire-form service type, defaulting to General
/// Checkup when omitted.
pub(crate) fn parse_service_type(raw: Option<&str>) -> Result<ServiceType, SchedulingError> {
    match raw {
        None => Ok(ServiceType::default()),
        Some(label) => label
            .parse()
            .map_err(|_| SchedulingError::InvalidInput("Invalid service type".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_type_defaults() {
        assert_eq!(
            parse_service_type(None).unwrap(),
            ServiceType::GeneralCheckup
        );
        assert_eq!(
            parse_service_type(Some("Grooming")).unwrap(),
            ServiceType::Grooming
        );
        assert!(matches!(
            parse_service_type(Some("Surgery")),
            Err(SchedulingError::InvalidInput(msg)) if msg == "Invalid service type"
        ));
    }
}
