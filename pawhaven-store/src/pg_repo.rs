//! Postgres appointment store. The double-booking invariant is a real
//! database constraint here: a partial unique index on
//! `(date, slot_time) WHERE status <> 'Cancelled'` (see migrations), so
//! the losing side of any concurrent claim gets a unique violation that
//! maps to [`StoreError::SlotTaken`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pawhaven_core::{
    Appointment, AppointmentFilter, AppointmentPage, AppointmentRepository, AppointmentStatus,
    AppointmentUpdate, NewAppointment, StoreError,
};
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, pet_id, user_id, service_type, date, slot_time, notes, status, created_at, updated_at";

pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    pet_id: Uuid,
    user_id: String,
    service_type: String,
    date: NaiveDate,
    slot_time: String,
    notes: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let service_type = row
            .service_type
            .parse()
            .map_err(|_| StoreError::Backend(format!("bad service_type: {}", row.service_type)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| StoreError::Backend(format!("bad status: {}", row.status)))?;
        Ok(Appointment {
            id: row.id,
            pet_id: row.pet_id,
            user_id: row.user_id,
            service_type,
            date: row.date,
            time: row.slot_time,
            notes: row.notes,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::SlotTaken;
        }
    }
    StoreError::Backend(err.to_string())
}

fn rows_to_appointments(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>, StoreError> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[async_trait]
impl AppointmentRepository for PgAppointmentStore {
    async fn insert(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let appointment = new.into_appointment();
        sqlx::query(
            r#"
            INSERT INTO appointments
                (id, pet_id, user_id, service_type, date, slot_time, notes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.pet_id)
        .bind(&appointment.user_id)
        .bind(appointment.service_type.to_string())
        .bind(appointment.date)
        .bind(&appointment.time)
        .bind(&appointment.notes)
        .bind(appointment.status.to_string())
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(appointment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let row: Option<AppointmentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(Appointment::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM appointments WHERE user_id = $1 ORDER BY date, slot_time"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows_to_appointments(rows)
    }

    async fn find_conflicting(
        &self,
        date: NaiveDate,
        time: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM appointments
            WHERE date = $1 AND slot_time = $2 AND status <> 'Cancelled'
              AND ($3::uuid IS NULL OR id <> $3)
            "#
        ))
        .bind(date)
        .bind(time)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows_to_appointments(rows)
    }

    async fn find_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM appointments
            WHERE date BETWEEN $1 AND $2 AND status <> 'Cancelled'
            ORDER BY date, slot_time
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        rows_to_appointments(rows)
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, StoreError> {
        let status = filter.status.map(|s| s.to_string());
        let limit = filter.limit.max(1) as i64;
        let page = filter.page.max(1);
        let offset = (page as i64 - 1) * limit;

        const WHERE_CLAUSE: &str = r#"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR pet_id = $2)
              AND ($3::uuid[] IS NULL OR pet_id = ANY($3))
              AND ($4::date IS NULL OR date = $4)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM appointments {WHERE_CLAUSE}"
        ))
        .bind(&status)
        .bind(filter.pet_id)
        .bind(&filter.pet_ids)
        .bind(filter.date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;

        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM appointments {WHERE_CLAUSE}
            ORDER BY date, slot_time
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(&status)
        .bind(filter.pet_id)
        .bind(&filter.pet_ids)
        .bind(filter.date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        let total = total as u64;
        let total_pages = ((total + limit as u64 - 1) / limit as u64) as u32;
        Ok(AppointmentPage {
            appointments: rows_to_appointments(rows)?,
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
        let row: Option<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE appointments SET
                pet_id = COALESCE($2, pet_id),
                service_type = COALESCE($3, service_type),
                date = COALESCE($4, date),
                slot_time = COALESCE($5, slot_time),
                notes = COALESCE($6, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.pet_id)
        .bind(update.service_type.map(|s| s.to_string()))
        .bind(update.date)
        .bind(update.time)
        .bind(update.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let row: Option<AppointmentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE appointments SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.ok_or(StoreError::NotFound)?.try_into()
    }
}
