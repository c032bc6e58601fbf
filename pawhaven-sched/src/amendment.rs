//! Amendment orchestrator: reschedules or edits an existing
//! appointment. The conflict check only fires when the effective
//! (date, time) actually changes, and always excludes the appointment's
//! own id, so re-selecting the current slot never self-conflicts.

use std::sync::Arc;

use chrono::NaiveDate;
use pawhaven_core::{
    Appointment, AppointmentRepository, AppointmentUpdate, Identity, PetDirectory,
    SchedulingError, StoreError, SLOT_TAKEN_MSG,
};
use tracing::info;
use uuid::Uuid;

use crate::booking::parse_service_type;
use crate::slots;

/// Any subset of the mutable appointment fields.
#[derive(Debug, Clone, Default)]
pub struct AmendmentRequest {
    pub pet_id: Option<Uuid>,
    pub service_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

pub struct AmendmentService {
    store: Arc<dyn AppointmentRepository>,
    pets: Arc<dyn PetDirectory>,
}

impl AmendmentService {
    pub fn new(store: Arc<dyn AppointmentRepository>, pets: Arc<dyn PetDirectory>) -> Self {
        Self { store, pets }
    }

    pub async fn amend(
        &self,
        id: Uuid,
        caller: &Identity,
        req: AmendmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        // 1. Load
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment not found".to_string()))?;

        // 2. Authorize: owner or admin
        if !caller.may_act_on(&current) {
            return Err(SchedulingError::Forbidden(
                "Not authorized to update this appointment".to_string(),
            ));
        }

        // 3. Validate service type if supplied
        let service_type = match req.service_type.as_deref() {
            Some(label) => Some(parse_service_type(Some(label))?),
            None => None,
        };

        // 4. Conflict check, only when the effective slot moves
        if let Some(time) = req.time.as_deref() {
            if !slots::is_slot_label(time) {
                return Err(SchedulingError::InvalidInput(
                    "Invalid time slot".to_string(),
                ));
            }
        }
        let new_date = req.date.unwrap_or(current.date);
        let new_time = req.time.clone().unwrap_or_else(|| current.time.clone());
        let slot_moved = new_date != current.date || new_time != current.time;
        if slot_moved {
            let conflicts = self
                .store
                .find_conflicting(new_date, &new_time, Some(id))
                .await?;
            if !conflicts.is_empty() {
                return Err(SchedulingError::Conflict(SLOT_TAKEN_MSG.to_string()));
            }
        }

        // 5. Validate the replacement pet if supplied
        if let Some(pet_id) = req.pet_id {
            if !self.pets.exists(pet_id).await? {
                return Err(SchedulingError::NotFound("Pet not found".to_string()));
            }
        }

        // 6. Apply. The store re-claims the slot atomically when it moved.
        let update = AppointmentUpdate {
            pet_id: req.pet_id,
            service_type,
            date: req.date,
            time: req.time,
            notes: req.notes,
        };
        let updated = match self.store.apply_update(id, update).await {
            Ok(updated) => updated,
            Err(StoreError::SlotTaken) => {
                return Err(SchedulingError::Conflict(SLOT_TAKEN_MSG.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        if slot_moved {
            info!(
                appointment_id = %updated.id,
                date = %updated.date,
                time = %updated.time,
                "Appointment rescheduled"
            );
        }
        Ok(updated)
    }

    /// Authorization-checked read, shared with the API's by-id endpoint.
    pub async fn load_for(
        &self,
        id: Uuid,
        caller: &Identity,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment not found".to_string()))?;
        if !caller.may_act_on(&appointment) {
            return Err(SchedulingError::Forbidden(
                "Not authorized to access this appointment".to_string(),
            ));
        }
        Ok(appointment)
    }
}
