//! Availability query service: which dates in the horizon still have
//! free slots, and which times on a given date are taken. Read-only;
//! always re-reads the store so a cancellation frees its slot on the
//! very next query.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use pawhaven_core::{AppointmentRepository, SchedulingError};
use serde::Serialize;
use uuid::Uuid;

use crate::slots::{self, HORIZON_DAYS};

/// Occupancy summary for one date in the horizon.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub appointment_count: usize,
    pub total_slots: usize,
    pub available: bool,
}

/// Full 30-day summary plus the date → occupied-times map the booking
/// UI uses to grey out taken slots once a date is picked.
#[derive(Debug, Clone, Serialize)]
pub struct HorizonAvailability {
    pub dates: Vec<DayAvailability>,
    pub booked_slots: BTreeMap<NaiveDate, Vec<String>>,
}

pub struct AvailabilityService {
    store: Arc<dyn AppointmentRepository>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AppointmentRepository>) -> Self {
        Self { store }
    }

    /// Availability for every date in the horizon relative to `now`.
    pub async fn horizon(&self, now: NaiveDate) -> Result<HorizonAvailability, SchedulingError> {
        let start = now + Duration::days(1);
        let end = now + Duration::days(HORIZON_DAYS);
        let occupied = self.store.find_in_range(start, end).await?;

        let mut booked_slots: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
        for appt in occupied {
            booked_slots.entry(appt.date).or_default().push(appt.time);
        }
        for times in booked_slots.values_mut() {
            times.sort();
        }

        let total_slots = slots::total_daily_capacity();
        let dates = slots::horizon_dates(now)
            .map(|date| {
                let count = booked_slots.get(&date).map_or(0, Vec::len);
                DayAvailability {
                    date,
                    appointment_count: count,
                    total_slots,
                    available: count < total_slots,
                }
            })
            .collect();

        Ok(HorizonAvailability {
            dates,
            booked_slots,
        })
    }

    /// Occupied time labels for one date, in slot order. Pass the id of
    /// an appointment being amended to keep its own slot out of the set.
    pub async fn booked_times(
        &self,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<String>, SchedulingError> {
        let occupied = self.store.find_in_range(date, date).await?;
        let mut times: Vec<String> = occupied
            .into_iter()
            .filter(|appt| exclude != Some(appt.id))
            .map(|appt| appt.time)
            .collect();
        times.sort();
        Ok(times)
    }
}
