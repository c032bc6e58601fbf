//! Status lifecycle manager. Pending is the initial state; Confirmed is
//! reached only through the admin status endpoint; Cancelled is terminal
//! and reachable from anywhere. A cancelled appointment frees its slot
//! immediately and cannot be revived (re-booking is a new appointment).

use std::sync::Arc;

use pawhaven_core::{
    Appointment, AppointmentRepository, AppointmentStatus, Identity, SchedulingError,
};
use tracing::info;
use uuid::Uuid;

pub struct LifecycleService {
    store: Arc<dyn AppointmentRepository>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn AppointmentRepository>) -> Self {
        Self { store }
    }

    /// Admin status update. `target` arrives as the wire label.
    pub async fn set_status(
        &self,
        id: Uuid,
        target: &str,
    ) -> Result<Appointment, SchedulingError> {
        let target: AppointmentStatus = target
            .parse()
            .map_err(|_| SchedulingError::InvalidInput("Invalid status value".to_string()))?;

        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment not found".to_string()))?;

        if !transition_allowed(current.status, target) {
            return Err(SchedulingError::InvalidInput(format!(
                "Cannot change status from {} to {}",
                current.status, target
            )));
        }
        if current.status == target {
            return Ok(current);
        }

        let updated = self.store.set_status(id, target).await?;
        info!(appointment_id = %id, status = %target, "Appointment status updated");
        Ok(updated)
    }

    /// Owner- or admin-initiated cancellation (the DELETE operation).
    /// Soft: the record stays, its slot is freed. Idempotent.
    pub async fn cancel(
        &self,
        id: Uuid,
        caller: &Identity,
    ) -> Result<Appointment, SchedulingError> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment not found".to_string()))?;

        if !caller.may_act_on(&current) {
            return Err(SchedulingError::Forbidden(
                "Not authorized to delete this appointment".to_string(),
            ));
        }

        if current.status == AppointmentStatus::Cancelled {
            return Ok(current);
        }

        let cancelled = self
            .store
            .set_status(id, AppointmentStatus::Cancelled)
            .await?;
        info!(appointment_id = %id, "Appointment cancelled");
        Ok(cancelled)
    }
}

/// Identity transitions are permitted; otherwise only Pending→Confirmed
/// and any→Cancelled. Nothing leaves Cancelled.
fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    match (from, to) {
        (a, b) if a == b => true,
        (_, Cancelled) => true,
        (Pending, Confirmed) => true,
        _ => false,
    }
}
