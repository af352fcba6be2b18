use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};
use trekdesk_core::{BatchRepository, BookingRepository, UserRepository};
use trekdesk_shared::{AdminCancelRequest, Batch, BatchUpdate, RefundType};
use trekdesk_store::app_config::{BackendConfig, BackendMode};
use trekdesk_store::RestBackend;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    tokens: Arc<Mutex<Vec<String>>>,
}

fn sample_batch(trek_id: Uuid, batch_id: Uuid) -> Batch {
    let start = Utc::now() + Duration::days(15);
    Batch {
        id: batch_id,
        trek_id,
        start_date: start,
        end_date: start + Duration::days(3),
        price: 9_000,
        max_participants: 20,
        current_participants: 10,
        reserved_slots: 0,
    }
}

async fn get_batch(
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
    State(received): State<Received>,
    headers: HeaderMap,
) -> Json<Batch> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        received.tokens.lock().unwrap().push(auth.to_string());
    }
    Json(sample_batch(trek_id, batch_id))
}

async fn put_batch(
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
    State(received): State<Received>,
    Json(body): Json<serde_json::Value>,
) -> Json<Batch> {
    received.bodies.lock().unwrap().push(("updateBatch".to_string(), body.clone()));
    let mut batch = sample_batch(trek_id, batch_id);
    let update: BatchUpdate = serde_json::from_value(body).unwrap();
    batch.apply(&update);
    Json(batch)
}

async fn cancel(State(received): State<Received>, Json(body): Json<serde_json::Value>) -> StatusCode {
    received.bodies.lock().unwrap().push(("adminCancelBooking".to_string(), body));
    StatusCode::OK
}

async fn missing() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
}

async fn spawn_backend(received: Received) -> String {
    let app = Router::new()
        .route("/api/treks/{trek_id}/batches/{batch_id}", get(get_batch).put(put_batch))
        .route("/api/admin/bookings/cancel", post(cancel))
        .route("/api/bookings/{id}", get(missing))
        .route("/api/users/by-phone/{phone}", get(broken))
        .with_state(received);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: String, token: Option<&str>) -> RestBackend {
    RestBackend::new(&BackendConfig {
        mode: BackendMode::Rest,
        base_url,
        timeout_seconds: 5,
        api_token: token.map(str::to_string),
    })
    .unwrap()
}

#[tokio::test]
async fn test_batch_round_trip_and_bearer_token() {
    let received = Received::default();
    let backend = client(spawn_backend(received.clone()).await, Some("admin-token"));
    let (trek_id, batch_id) = (Uuid::new_v4(), Uuid::new_v4());

    let batch = backend.get_batch(trek_id, batch_id).await.unwrap().unwrap();
    assert_eq!(batch.id, batch_id);
    assert_eq!(received.tokens.lock().unwrap().as_slice(), ["Bearer admin-token"]);

    let updated = backend
        .update_batch(trek_id, batch_id, &BatchUpdate::reserved(10))
        .await
        .unwrap();
    assert_eq!(updated.reserved_slots, 10);

    let bodies = received.bodies.lock().unwrap().clone();
    assert_eq!(bodies[0].0, "updateBatch");
    assert_eq!(bodies[0].1, serde_json::json!({ "reservedSlots": 10 }));
}

#[tokio::test]
async fn test_cancel_payload_shape() {
    let received = Received::default();
    let backend = client(spawn_backend(received.clone()).await, None);
    let booking_id = Uuid::new_v4();

    backend
        .admin_cancel_booking(&AdminCancelRequest {
            booking_id,
            refund: 500,
            refund_type: RefundType::Auto,
        })
        .await
        .unwrap();

    let bodies = received.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies[0].1,
        serde_json::json!({ "bookingId": booking_id, "refund": 500, "refundType": "auto" })
    );
}

#[tokio::test]
async fn test_not_found_and_server_errors() {
    let backend = client(spawn_backend(Received::default()).await, None);

    assert!(backend.get_booking(Uuid::new_v4()).await.unwrap().is_none());

    let err = backend.find_by_phone("9123456789").await.unwrap_err();
    assert!(err.to_string().contains("500"));
}
