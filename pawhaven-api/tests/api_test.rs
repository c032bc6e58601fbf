use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use pawhaven_api::{app, AppState, AuthConfig};
use pawhaven_core::{AppointmentRepository, Pet, PetDirectory};
use pawhaven_store::{MemoryAppointmentStore, MemoryPetDirectory};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "test-secret";

fn test_app() -> (Router, Uuid) {
    let store: Arc<dyn AppointmentRepository> = Arc::new(MemoryAppointmentStore::new());
    let pet_id = Uuid::new_v4();
    let pets: Arc<dyn PetDirectory> = Arc::new(MemoryPetDirectory::with_pets(vec![Pet {
        id: pet_id,
        name: "Rex".to_string(),
        species: "Dog".to_string(),
    }]));
    let state = AppState::new(
        store,
        pets,
        AuthConfig {
            secret: TEST_SECRET.to_string(),
            expiration: 3600,
        },
    );
    (app(state), pet_id)
}

fn token_for(sub: &str, role: &str) -> String {
    let claims = json!({
        "sub": sub,
        "role": role,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn book(
    app: &Router,
    token: &str,
    pet_id: Uuid,
    date: &str,
    time: &str,
) -> axum::response::Response {
    app.clone()
        .oneshot(request(
            Method::POST,
            "/api/appointments",
            Some(token),
            Some(json!({ "petId": pet_id, "date": date, "time": time })),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_appointment_defaults() {
    let (app, pet_id) = test_app();
    let token = token_for("u1", "user");

    let response = book(&app, &token, pet_id, "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("Pending"));
    assert_eq!(body["appointment"]["serviceType"], json!("General Checkup"));
    assert_eq!(body["appointment"]["userId"], json!("u1"));
    assert_eq!(body["appointment"]["time"], json!("09:00"));
}

#[tokio::test]
async fn test_double_booking_conflict() {
    let (app, pet_id) = test_app();

    let response = book(&app, &token_for("u1", "user"), pet_id, "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = book(&app, &token_for("u2", "user"), pet_id, "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        json!("This time slot is already booked. Please select another time.")
    );
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (app, pet_id) = test_app();
    let token = token_for("u1", "user");

    // Unknown pet
    let response = book(&app, &token, Uuid::new_v4(), "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], json!("Pet not found"));

    // Unknown service type
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/appointments",
            Some(&token),
            Some(json!({
                "petId": pet_id,
                "serviceType": "Surgery",
                "date": "2025-06-10",
                "time": "09:00",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        json!("Invalid service type")
    );

    // Missing date/time
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/appointments",
            Some(&token),
            Some(json!({ "petId": pet_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        json!("Please provide appointment date and time")
    );
}

#[tokio::test]
async fn test_requires_token() {
    let (app, pet_id) = test_app();

    let response = book(&app, "not-a-jwt", pet_id, "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/appointments/user", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ownership_enforced_on_update_and_read() {
    let (app, pet_id) = test_app();
    let owner = token_for("u1", "user");
    let stranger = token_for("u2", "user");

    let created = json_body(book(&app, &owner, pet_id, "2025-06-10", "09:00").await).await;
    let id = created["appointment"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::PUT,
            &format!("/api/appointments/{id}"),
            Some(&stranger),
            Some(json!({ "time": "10:00" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["error"],
        json!("Not authorized to update this appointment")
    );

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/appointments/{id}"),
            Some(&stranger),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner's update goes through
    let response = app
        .clone()
        .oneshot(request(
            Method::PUT,
            &format!("/api/appointments/{id}"),
            Some(&owner),
            Some(json!({ "time": "10:00" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["appointment"]["time"], json!("10:00"));
}

#[tokio::test]
async fn test_admin_routes_are_gated() {
    let (app, pet_id) = test_app();
    let user = token_for("u1", "user");
    let admin = token_for("staff", "admin");

    let created = json_body(book(&app, &user, pet_id, "2025-06-10", "09:00").await).await;
    let id = created["appointment"]["id"].as_str().unwrap().to_string();

    // Plain users get neither the listing nor the status endpoint
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/appointments", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["error"],
        json!("Access denied: Admin privileges required")
    );

    let response = app
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/appointments/{id}/status"),
            Some(&user),
            Some(json!({ "status": "Confirmed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin confirms
    let response = app
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/appointments/{id}/status"),
            Some(&admin),
            Some(json!({ "status": "Confirmed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["appointment"]["status"],
        json!("Confirmed")
    );

    // Bad status label
    let response = app
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/api/appointments/{id}/status"),
            Some(&admin),
            Some(json!({ "status": "Done" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        json!("Invalid status value")
    );
}

#[tokio::test]
async fn test_admin_listing_filters_and_paginates() {
    let (app, pet_id) = test_app();
    let user = token_for("u1", "user");
    let admin = token_for("staff", "admin");

    for time in ["09:00", "10:00", "11:00"] {
        let response = book(&app, &user, pet_id, "2025-06-10", time).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/appointments?page=1&limit=2",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["total"], json!(3));
    assert_eq!(body["totalPages"], json!(2));
    assert_eq!(body["currentPage"], json!(1));

    // Pet-name search routes through the directory
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/appointments?search=rex",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], json!(3));

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/appointments?search=muffin",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total"], json!(0));
}

#[tokio::test]
async fn test_user_appointments_listing() {
    let (app, pet_id) = test_app();
    let u1 = token_for("u1", "user");
    let u2 = token_for("u2", "user");

    book(&app, &u1, pet_id, "2025-06-10", "09:00").await;
    book(&app, &u2, pet_id, "2025-06-10", "10:00").await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/appointments/user", Some(&u1), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["appointments"][0]["userId"], json!("u1"));
}

#[tokio::test]
async fn test_delete_frees_slot() {
    let (app, pet_id) = test_app();
    let u1 = token_for("u1", "user");
    let u2 = token_for("u2", "user");

    let created = json_body(book(&app, &u1, pet_id, "2025-06-10", "09:00").await).await;
    let id = created["appointment"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/api/appointments/{id}"),
            Some(&u2),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["error"],
        json!("Not authorized to delete this appointment")
    );

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            &format!("/api/appointments/{id}"),
            Some(&u1),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["message"],
        json!("Appointment removed")
    );

    // The slot is open again
    let response = book(&app, &u2, pet_id, "2025-06-10", "09:00").await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_booked_slots_is_public() {
    let (app, pet_id) = test_app();
    let token = token_for("u1", "user");

    // Pick a date inside the rolling horizon so it shows up in both views
    let date = (Utc::now().date_naive() + Duration::days(3))
        .format("%Y-%m-%d")
        .to_string();
    book(&app, &token, pet_id, &date, "09:00").await;
    book(&app, &token, pet_id, &date, "11:00").await;

    // Per-date view, no token required
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/appointments/booked-slots?date={date}"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["bookedTimes"], json!(["09:00", "11:00"]));

    // Horizon view
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/appointments/booked-slots",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["dates"].as_array().unwrap().len(), 30);
    assert_eq!(body["bookedSlots"][&date], json!(["09:00", "11:00"]));
    let day = body["dates"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["date"] == json!(date))
        .unwrap();
    assert_eq!(day["appointmentCount"], json!(2));
    assert_eq!(day["totalSlots"], json!(8));
    assert_eq!(day["available"], json!(true));
}

#[tokio::test]
async fn test_missing_appointment_is_not_found() {
    let (app, _) = test_app();
    let admin = token_for("staff", "admin");

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/api/appointments/{}", Uuid::new_v4()),
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await["error"],
        json!("Appointment not found")
    );
}
