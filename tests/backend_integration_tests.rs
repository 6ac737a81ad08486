use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use staybook::backend::{
    AuthProvider, AuthSession, BackendError, CardStore, NewCard, NewReservation, ReservationFeed,
    ReservationQuery, ReservationStore, SupabaseClient, UserId,
};
use staybook::core::pricing::PricingCalculator;
use staybook::core::selection::DateSelection;
use staybook::core::submit::{ReservationSubmitter, SubmitError, SubmitPhase};
use tokio::sync::mpsc;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

// ============================================================================
// Helper Functions
// ============================================================================

const ANON_KEY: &str = "anon-key";
const USER: &str = "6f1c2d7e-8a3b-4c5d-9e0f-112233445566";

fn user_id() -> UserId {
    UserId(Uuid::parse_str(USER).unwrap())
}

fn signed_in_client(server: &MockServer) -> SupabaseClient {
    let client = SupabaseClient::new(server.uri(), ANON_KEY.to_string());
    client.set_session(Some(AuthSession {
        access_token: "access-token".into(),
        refresh_token: "refresh-token".into(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
        user_id: user_id(),
        email: Some("ana@example.com".into()),
    }));
    client
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn new_reservation() -> NewReservation {
    NewReservation {
        user_id: user_id(),
        check_in: day(6, 10),
        check_out: day(6, 15),
        guests: 2,
        total_price: Decimal::new(7975, 1),
        created_at: Utc::now(),
    }
}

fn row_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": USER,
        "check_in": "2025-06-10",
        "check_out": "2025-06-15",
        "guests": 2,
        "total_price": 797.5,
        "created_at": "2025-05-01T12:00:00Z"
    })
}

fn token_json() -> serde_json::Value {
    serde_json::json!({
        "access_token": "fresh-access",
        "refresh_token": "fresh-refresh",
        "expires_in": 3600,
        "token_type": "bearer",
        "user": { "id": USER, "email": "ana@example.com" }
    })
}

async fn mock_insert(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .respond_with(response)
        .mount(server)
        .await;
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_sign_in_caches_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = SupabaseClient::new(server.uri(), ANON_KEY.to_string());
    assert_eq!(client.current_user(), None);

    let session = client
        .sign_in_with_password("ana@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.access_token, "fresh-access");
    assert_eq!(client.current_user(), Some(user_id()));
}

#[tokio::test]
async fn test_sign_in_bad_credentials_is_auth_required() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(server.uri(), ANON_KEY.to_string());
    let err = client
        .sign_in_with_password("ana@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::AuthRequired);
    assert_eq!(client.current_user(), None);
}

#[tokio::test]
async fn test_refresh_replaces_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json()))
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let fresh = client.refresh_session().await.unwrap();
    assert_eq!(fresh.refresh_token, "fresh-refresh");
    assert_eq!(client.session().map(|s| s.access_token).as_deref(), Some("fresh-access"));
}

#[tokio::test]
async fn test_failed_refresh_drops_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let err = client.refresh_session().await.unwrap_err();
    assert_eq!(err, BackendError::AuthRequired);
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer access-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    client.sign_out().await.unwrap();
    assert_eq!(client.current_user(), None);
}

// ============================================================================
// Reservations
// ============================================================================

#[tokio::test]
async fn test_insert_returns_persisted_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reservations"))
        .and(header("apikey", ANON_KEY))
        .and(header("Authorization", "Bearer access-token"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([row_json(42)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let saved = client.insert(&new_reservation()).await.unwrap();
    assert_eq!(saved.id.0, 42);
    assert_eq!(saved.nights(), 5);
    assert_eq!(saved.total_price, Decimal::new(7975, 1));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], USER);
    assert_eq!(rows[0]["check_in"], "2025-06-10");
    assert_eq!(rows[0]["guests"], 2);
}

#[tokio::test]
async fn test_insert_without_session_never_hits_network() {
    let server = MockServer::start().await;
    mock_insert(&server, ResponseTemplate::new(201)).await;

    let client = SupabaseClient::new(server.uri(), ANON_KEY.to_string());
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert_eq!(err, BackendError::AuthRequired);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_401_is_auth_required() {
    let server = MockServer::start().await;
    mock_insert(
        &server,
        ResponseTemplate::new(401).set_body_string(r#"{"message":"JWT expired"}"#),
    )
    .await;

    let client = signed_in_client(&server);
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert_eq!(err, BackendError::AuthRequired);
}

#[tokio::test]
async fn test_insert_conflict_is_constraint_violation() {
    let server = MockServer::start().await;
    mock_insert(
        &server,
        ResponseTemplate::new(409).set_body_string(r#"{"code":"23505","message":"duplicate key"}"#),
    )
    .await;

    let client = signed_in_client(&server);
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert!(matches!(err, BackendError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_insert_check_constraint_is_constraint_violation() {
    let server = MockServer::start().await;
    mock_insert(
        &server,
        ResponseTemplate::new(400)
            .set_body_string(r#"{"code":"23514","message":"violates check constraint"}"#),
    )
    .await;

    let client = signed_in_client(&server);
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert!(matches!(err, BackendError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_insert_server_error_is_api_error() {
    let server = MockServer::start().await;
    mock_insert(&server, ResponseTemplate::new(500).set_body_string("boom")).await;

    let client = signed_in_client(&server);
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Api {
            status: 500,
            message: "boom".into()
        }
    );
}

#[tokio::test]
async fn test_insert_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    mock_insert(&server, ResponseTemplate::new(201).set_body_string("not json")).await;

    let client = signed_in_client(&server);
    let err = client.insert(&new_reservation()).await.unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[tokio::test]
async fn test_query_sends_filter_order_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", format!("eq.{USER}")))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([row_json(2), row_json(1)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let rows = client
        .query(&ReservationQuery::for_user(user_id()).limit(5))
        .await
        .unwrap();
    assert_eq!(rows.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![2, 1]);
}

// ============================================================================
// Submitter against the REST client
// ============================================================================

#[tokio::test]
async fn test_submitter_confirms_through_backend() {
    let server = MockServer::start().await;
    mock_insert(
        &server,
        ResponseTemplate::new(201).set_body_json(serde_json::json!([row_json(7)])),
    )
    .await;

    let client = signed_in_client(&server);
    let mut selection = DateSelection::new();
    selection.on_day_tapped(day(6, 10));
    selection.on_day_tapped(day(6, 15));

    let mut submitter = ReservationSubmitter::new();
    submitter
        .submit(&selection, 2, &PricingCalculator::default(), &client, &client)
        .await;

    let confirmed = submitter.confirmed().expect("confirmed");
    assert_eq!(confirmed.id.0, 7);
}

#[tokio::test]
async fn test_submitter_surfaces_expired_token() {
    let server = MockServer::start().await;
    mock_insert(&server, ResponseTemplate::new(401)).await;

    let client = signed_in_client(&server);
    let mut selection = DateSelection::new();
    selection.on_day_tapped(day(6, 10));
    selection.on_day_tapped(day(6, 11));

    let mut submitter = ReservationSubmitter::new();
    let phase = submitter
        .submit(&selection, 1, &PricingCalculator::default(), &client, &client)
        .await;
    assert_eq!(*phase, SubmitPhase::Failed(SubmitError::AuthenticationRequired));
}

// ============================================================================
// Cards
// ============================================================================

#[tokio::test]
async fn test_card_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/cards"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
            "user_id": USER,
            "last4": "4242",
            "name_on_card": "ANA SOUZA",
            "expiry": "12/29"
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cards"))
        .and(query_param("user_id", format!("eq.{USER}")))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/cards"))
        .and(query_param("user_id", format!("eq.{USER}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in_client(&server);
    let saved = client
        .insert_card(&NewCard {
            user_id: user_id(),
            last4: "4242".into(),
            name_on_card: "ANA SOUZA".into(),
            expiry: "12/29".into(),
        })
        .await
        .unwrap();
    assert_eq!(saved.last4, "4242");

    assert!(client.saved_card(user_id()).await.unwrap().is_none());
    client.delete_cards(user_id()).await.unwrap();
}

// ============================================================================
// Change feed
// ============================================================================

#[tokio::test]
async fn test_feed_delivers_each_row_once_until_unsubscribed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservations"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([row_json(9)])))
        .mount(&server)
        .await;

    let store: Arc<dyn ReservationStore> = Arc::new(signed_in_client(&server));
    let since = "2025-01-01T00:00:00Z".parse().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let mut subscription =
        ReservationFeed::subscribe_since(store, user_id(), since, Duration::from_millis(20), tx);

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id.0, 9);

    // Same row on later polls is not redelivered.
    let again = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(again.is_err());
    assert!(subscription.is_active());

    subscription.unsubscribe();
    assert!(!subscription.is_active());
    let after = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(!matches!(after, Ok(Some(_))));
}
