use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::appointment::{Appointment, AppointmentStatus, NewAppointment, ServiceType};
use crate::error::StoreError;

/// Partial update applied by the amendment flow. Absent fields are left
/// unchanged. Date/time changes must be re-validated against the slot
/// uniqueness constraint by the implementation, atomically.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    pub pet_id: Option<Uuid>,
    pub service_type: Option<ServiceType>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.pet_id.is_none()
            && self.service_type.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.notes.is_none()
    }
}

/// Filters for the admin listing.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub pet_id: Option<Uuid>,
    /// Restrict to this id set (derived from a pet-name search).
    /// `Some(vec![])` matches nothing.
    pub pet_ids: Option<Vec<Uuid>>,
    pub date: Option<NaiveDate>,
    pub page: u32,
    pub limit: u32,
}

/// One page of the admin listing, ordered by date then time ascending.
#[derive(Debug, Clone)]
pub struct AppointmentPage {
    pub appointments: Vec<Appointment>,
    pub total: u64,
    pub total_pages: u32,
    pub page: u32,
}

/// Durable appointment storage. Implementations must enforce the slot
/// uniqueness invariant at write time: among non-cancelled appointments,
/// (date, time) is unique, and the loser of a concurrent write receives
/// [`StoreError::SlotTaken`].
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Persist a new Pending appointment with a fresh id and timestamps.
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// All appointments for a user, date then time ascending.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Non-cancelled appointments occupying exactly (date, time),
    /// optionally excluding one id (the amendment's own prior slot).
    async fn find_conflicting(
        &self,
        date: NaiveDate,
        time: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Non-cancelled appointments with date in [start, end] inclusive.
    async fn find_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Filtered, paginated admin listing.
    async fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, StoreError>;

    /// Apply a partial update, re-claiming the slot when date/time move.
    async fn apply_update(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<Appointment, StoreError>;

    /// Set the lifecycle status. Entering Cancelled frees the slot;
    /// leaving Cancelled re-claims it or fails with `SlotTaken`.
    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;
}

/// Collaborator surface over the externally-owned pet catalog.
#[async_trait]
pub trait PetDirectory: Send + Sync {
    async fn exists(&self, pet_id: Uuid) -> Result<bool, StoreError>;

    /// Ids of pets whose name contains the fragment, case-insensitive.
    /// Backs the admin listing's `search` filter.
    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, StoreError>;
}
