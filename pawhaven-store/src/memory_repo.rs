//! In-memory appointment store. The slot index inside the single mutex
//! is the uniqueness constraint: every mutation that claims or frees a
//! (date, time) slot happens as one critical section, so concurrent
//! bookings for the same slot resolve to exactly one winner.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use pawhaven_core::{
    Appointment, AppointmentFilter, AppointmentPage, AppointmentRepository, AppointmentStatus,
    AppointmentUpdate, NewAppointment, StoreError,
};
use uuid::Uuid;

type SlotKey = (NaiveDate, String);

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, Appointment>,
    /// (date, time) → occupant, non-cancelled appointments only.
    slot_index: HashMap<SlotKey, Uuid>,
}

#[derive(Default)]
pub struct MemoryAppointmentStore {
    inner: Mutex<Inner>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("appointment store lock poisoned".to_string()))
    }
}

impl Inner {
    /// Claim a slot for `id`, failing if another non-cancelled
    /// appointment already holds it.
    fn claim_slot(&mut self, date: NaiveDate, time: &str, id: Uuid) -> Result<(), StoreError> {
        let key = (date, time.to_string());
        match self.slot_index.get(&key) {
            Some(&occupant) if occupant != id => Err(StoreError::SlotTaken),
            _ => {
                self.slot_index.insert(key, id);
                Ok(())
            }
        }
    }

    fn free_slot(&mut self, date: NaiveDate, time: &str, id: Uuid) {
        let key = (date, time.to_string());
        if self.slot_index.get(&key) == Some(&id) {
            self.slot_index.remove(&key);
        }
    }

    fn sorted(&self, mut appts: Vec<Appointment>) -> Vec<Appointment> {
        appts.sort_by(|a, b| (a.date, a.time.as_str()).cmp(&(b.date, b.time.as_str())));
        appts
    }
}

#[async_trait]
impl AppointmentRepository for MemoryAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let appointment = new.into_appointment();
        let mut inner = self.locked()?;
        inner.claim_slot(appointment.date, &appointment.time, appointment.id)?;
        inner.by_id.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.locked()?.by_id.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.locked()?;
        let matches: Vec<_> = inner
            .by_id
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(inner.sorted(matches))
    }

    async fn find_conflicting(
        &self,
        date: NaiveDate,
        time: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.locked()?;
        Ok(inner
            .by_id
            .values()
            .filter(|a| {
                a.occupies_slot()
                    && a.date == date
                    && a.time == time
                    && exclude != Some(a.id)
            })
            .cloned()
            .collect())
    }

    async fn find_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.locked()?;
        let matches: Vec<_> = inner
            .by_id
            .values()
            .filter(|a| a.occupies_slot() && a.date >= start && a.date <= end)
            .cloned()
            .collect();
        Ok(inner.sorted(matches))
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, StoreError> {
        let inner = self.locked()?;
        let matches: Vec<_> = inner
            .by_id
            .values()
            .filter(|a| {
                filter.status.map_or(true, |s| a.status == s)
                    && filter.pet_id.map_or(true, |p| a.pet_id == p)
                    && filter
                        .pet_ids
                        .as_ref()
                        .map_or(true, |ids| ids.contains(&a.pet_id))
                    && filter.date.map_or(true, |d| a.date == d)
            })
            .cloned()
            .collect();
        let sorted = inner.sorted(matches);

        let total = sorted.len() as u64;
        let limit = filter.limit.max(1) as usize;
        let page = filter.page.max(1);
        let total_pages = ((total as usize + limit - 1) / limit) as u32;
        let start = (page as usize - 1) * limit;
        let appointments = sorted.into_iter().skip(start).take(limit).collect();

        Ok(AppointmentPage {
            appointments,
            total,
            total_pages,
            page,
        })
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: AppointmentUpdate,
    ) -> Result<Appointment, StoreError> {
        let mut inner = self.locked()?;
        let current = inner.by_id.get(&id).cloned().ok_or(StoreError::NotFound)?;

        let new_date = update.date.unwrap_or(current.date);
        let new_time = update.time.clone().unwrap_or_else(|| current.time.clone());
        let slot_moved = new_date != current.date || new_time != current.time;

        if slot_moved && current.occupies_slot() {
            inner.claim_slot(new_date, &new_time, id)?;
            inner.free_slot(current.date, &current.time, id);
        }

        let appt = inner
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::NotFound)?;
        if let Some(pet_id) = update.pet_id {
            appt.pet_id = pet_id;
        }
        if let Some(service_type) = update.service_type {
            appt.service_type = service_type;
        }
        appt.date = new_date;
        appt.time = new_time;
        if let Some(notes) = update.notes {
            appt.notes = notes;
        }
        appt.updated_at = Utc::now();
        Ok(appt.clone())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut inner = self.locked()?;
        let current = inner.by_id.get(&id).cloned().ok_or(StoreError::NotFound)?;

        match (current.occupies_slot(), status != AppointmentStatus::Cancelled) {
            // Leaving Cancelled: the slot must be re-claimed first
            (false, true) => inner.claim_slot(current.date, &current.time, id)?,
            // Entering Cancelled: the slot becomes free immediately
            (true, false) => inner.free_slot(current.date, &current.time, id),
            _ => {}
        }

        let appt = inner
            .by_id
            .get_mut(&id)
            .ok_or(StoreError::NotFound)?;
        appt.status = status;
        appt.updated_at = Utc::now();
        Ok(appt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawhaven_core::ServiceType;

    fn new_appointment(user: &str, date: NaiveDate, time: &str) -> NewAppointment {
        NewAppointment {
            pet_id: Uuid::new_v4(),
            user_id: user.to_string(),
            service_type: ServiceType::default(),
            date,
            time: time.to_string(),
            notes: String::new(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_occupied_slot() {
        let store = MemoryAppointmentStore::new();
        store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        let err = store
            .insert(new_appointment("u2", day(10), "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotTaken));

        // A different time on the same day is fine
        store
            .insert(new_appointment("u2", day(10), "10:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_for_rebooking() {
        let store = MemoryAppointmentStore::new();
        let appt = store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        store
            .set_status(appt.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        store
            .insert(new_appointment("u2", day(10), "09:00"))
            .await
            .unwrap();
        // The cancelled record is retained
        assert!(store.find_by_id(appt.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_to_own_slot_is_not_a_conflict() {
        let store = MemoryAppointmentStore::new();
        let appt = store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        let update = AppointmentUpdate {
            date: Some(day(10)),
            time: Some("09:00".to_string()),
            notes: Some("bring records".to_string()),
            ..Default::default()
        };
        let updated = store.apply_update(appt.id, update).await.unwrap();
        assert_eq!(updated.notes, "bring records");
    }

    #[tokio::test]
    async fn test_reschedule_frees_old_slot_and_claims_new() {
        let store = MemoryAppointmentStore::new();
        let appt = store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        let update = AppointmentUpdate {
            time: Some("10:00".to_string()),
            ..Default::default()
        };
        store.apply_update(appt.id, update).await.unwrap();

        // Old slot is free again, new slot is taken
        store
            .insert(new_appointment("u2", day(10), "09:00"))
            .await
            .unwrap();
        let err = store
            .insert(new_appointment("u3", day(10), "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SlotTaken));
    }

    #[tokio::test]
    async fn test_reschedule_onto_taken_slot_fails_and_keeps_old_slot() {
        let store = MemoryAppointmentStore::new();
        let first = store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        store
            .insert(new_appointment("u2", day(10), "10:00"))
            .await
            .unwrap();

        let update = AppointmentUpdate {
            time: Some("10:00".to_string()),
            ..Default::default()
        };
        let err = store.apply_update(first.id, update).await.unwrap_err();
        assert!(matches!(err, StoreError::SlotTaken));

        // The failed move left the original claim intact
        let conflicts = store
            .find_conflicting(day(10), "09:00", None)
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, first.id);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = MemoryAppointmentStore::new();
        for d in 10..15 {
            store
                .insert(new_appointment("u1", day(d), "09:00"))
                .await
                .unwrap();
        }
        let page = store
            .list(&AppointmentFilter {
                page: 2,
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.appointments.len(), 2);
        assert_eq!(page.appointments[0].date, day(12));

        let pending = store
            .list(&AppointmentFilter {
                status: Some(AppointmentStatus::Pending),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.total, 5);
    }

    #[tokio::test]
    async fn test_find_by_user_ordering() {
        let store = MemoryAppointmentStore::new();
        store
            .insert(new_appointment("u1", day(12), "09:00"))
            .await
            .unwrap();
        store
            .insert(new_appointment("u1", day(10), "11:00"))
            .await
            .unwrap();
        store
            .insert(new_appointment("u1", day(10), "09:00"))
            .await
            .unwrap();
        store
            .insert(new_appointment("u2", day(10), "10:00"))
            .await
            .unwrap();

        let mine = store.find_by_user("u1").await.unwrap();
        assert_eq!(mine.len(), 3);
        assert_eq!((mine[0].date, mine[0].time.as_str()), (day(10), "09:00"));
        assert_eq!((mine[1].date, mine[1].time.as_str()), (day(10), "11:00"));
        assert_eq!((mine[2].date, mine[2].time.as_str()), (day(12), "09:00"));
    }
}
