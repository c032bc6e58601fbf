use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use pawhaven_core::{Appointment, AppointmentFilter};
use pawhaven_sched::{AmendmentRequest, BookingRequest};

use crate::error::AppError;
use crate::middleware::auth::{auth_middleware, require_admin, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Wire form of an appointment, matching the public API contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub user_id: String,
    pub service_type: String,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentView {
    fn from(appt: Appointment) -> Self {
        Self {
            id: appt.id,
            pet_id: appt.pet_id,
            user_id: appt.user_id,
            service_type: appt.service_type.to_string(),
            date: appt.date,
            time: appt.time,
            notes: appt.notes,
            status: appt.status.to_string(),
            created_at: appt.created_at,
            updated_at: appt.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub pet_id: Uuid,
    pub service_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub pet_id: Option<Uuid>,
    pub service_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    pub pet_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BookedSlotsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentEnvelope {
    pub success: bool,
    pub appointment: AppointmentView,
}

#[derive(Debug, Serialize)]
pub struct UserAppointmentsResponse {
    pub success: bool,
    pub count: usize,
    pub appointments: Vec<AppointmentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub appointments: Vec<AppointmentView>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBookedSlotsResponse {
    pub success: bool,
    pub date: NaiveDate,
    pub booked_times: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSummaryView {
    pub date: NaiveDate,
    pub available: bool,
    pub appointment_count: usize,
    pub total_slots: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonResponse {
    pub success: bool,
    pub booked_slots: BTreeMap<NaiveDate, Vec<String>>,
    pub dates: Vec<DateSummaryView>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/api/appointments",
            post(create_appointment).get(get_appointments),
        )
        .route("/api/appointments/user", get(get_user_appointments))
        .route(
            "/api/appointments/{id}",
            get(get_appointment_by_id)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route(
            "/api/appointments/{id}/status",
            axum::routing::patch(update_appointment_status),
        )
        .layer(axum::middleware::from_fn_with_state(state, auth_middleware));

    // Availability is public so the booking wizard works pre-login
    Router::new()
        .route("/api/appointments/booked-slots", get(get_booked_slots))
        .merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/appointments
/// Book a new appointment (status starts Pending)
async fn create_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentEnvelope>), AppError> {
    let appointment = state
        .booking
        .book(BookingRequest {
            pet_id: req.pet_id,
            user_id: claims.sub.clone(),
            service_type: req.service_type,
            date: req.date,
            time: req.time,
            notes: req.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AppointmentEnvelope {
            success: true,
            appointment: appointment.into(),
        }),
    ))
}

/// GET /api/appointments (admin)
/// Filtered, paginated listing of all appointments
async fn get_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<ListQuery>,
) -> Result<Json<AdminListResponse>, AppError> {
    require_admin(&claims)?;

    let status = match q.status.as_deref() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| AppError::BadRequest("Invalid status value".to_string()))?,
        ),
        None => None,
    };

    // A pet-name search narrows the listing to the matching pet ids
    let pet_ids = match q.search.as_deref() {
        Some(fragment) if !fragment.is_empty() => {
            Some(state.pets.find_ids_by_name(fragment).await?)
        }
        _ => None,
    };

    let filter = AppointmentFilter {
        status,
        pet_id: q.pet_id,
        pet_ids,
        date: q.date,
        page: q.page.unwrap_or(1),
        limit: q.limit.unwrap_or(10),
    };
    let page = state.store.list(&filter).await?;

    Ok(Json(AdminListResponse {
        success: true,
        count: page.appointments.len(),
        total: page.total,
        total_pages: page.total_pages,
        current_page: page.page,
        appointments: page.appointments.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/appointments/user
/// The caller's own appointments, date then time ascending
async fn get_user_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserAppointmentsResponse>, AppError> {
    let appointments = state.store.find_by_user(&claims.sub).await?;
    Ok(Json(UserAppointmentsResponse {
        success: true,
        count: appointments.len(),
        appointments: appointments.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/appointments/:id
/// Authorization-checked read (owner or admin)
async fn get_appointment_by_id(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let appointment = state.amendments.load_for(id, &claims.identity()).await?;
    Ok(Json(AppointmentEnvelope {
        success: true,
        appointment: appointment.into(),
    }))
}

/// PUT /api/appointments/:id
/// Partial update: reschedule and/or change pet, service, notes
async fn update_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    let appointment = state
        .amendments
        .amend(
            id,
            &claims.identity(),
            AmendmentRequest {
                pet_id: req.pet_id,
                service_type: req.service_type,
                date: req.date,
                time: req.time,
                notes: req.notes,
            },
        )
        .await?;

    Ok(Json(AppointmentEnvelope {
        success: true,
        appointment: appointment.into(),
    }))
}

/// PATCH /api/appointments/:id/status (admin)
/// Lifecycle transition: Pending → Confirmed, any → Cancelled
async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<AppointmentEnvelope>, AppError> {
    require_admin(&claims)?;
    let appointment = state.lifecycle.set_status(id, &req.status).await?;
    Ok(Json(AppointmentEnvelope {
        success: true,
        appointment: appointment.into(),
    }))
}

/// DELETE /api/appointments/:id
/// Owner- or admin-initiated cancellation; frees the slot immediately
async fn delete_appointment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.lifecycle.cancel(id, &claims.identity()).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Appointment removed".to_string(),
    }))
}

/// GET /api/appointments/booked-slots
/// With ?date=: occupied times for that date. Without: the rolling
/// 30-day horizon summary plus the date → occupied-times map.
async fn get_booked_slots(
    State(state): State<AppState>,
    Query(q): Query<BookedSlotsQuery>,
) -> Result<axum::response::Response, AppError> {
    use axum::response::IntoResponse;

    if let Some(date) = q.date {
        let booked_times = state.availability.booked_times(date, None).await?;
        return Ok(Json(DayBookedSlotsResponse {
            success: true,
            date,
            booked_times,
        })
        .into_response());
    }

    let now = Utc::now().date_naive();
    let horizon = state.availability.horizon(now).await?;
    Ok(Json(HorizonResponse {
        success: true,
        booked_slots: horizon.booked_slots,
        dates: horizon
            .dates
            .into_iter()
            .map(|d| DateSummaryView {
                date: d.date,
                available: d.available,
                appointment_count: d.appointment_count,
                total_slots: d.total_slots,
            })
            .collect(),
    })
    .into_response())
}
