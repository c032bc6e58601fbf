/// User-facing message for a slot collision, surfaced verbatim by the API.
pub const SLOT_TAKEN_MSG: &str = "This time slot is already booked. Please select another time.";

/// Failures from the appointment store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Slot already has a non-cancelled appointment")]
    SlotTaken,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Domain error taxonomy for the scheduling services. Each variant maps
/// to one HTTP status at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SchedulingError::NotFound("Appointment not found".to_string()),
            StoreError::SlotTaken => SchedulingError::Conflict(SLOT_TAKEN_MSG.to_string()),
            StoreError::Backend(msg) => SchedulingError::Internal(msg),
        }
    }
}
