use std::fmt;

use async_trait::async_trait;

use super::types::{Card, NewCard, NewReservation, Reservation, ReservationQuery, UserId};

/// Errors surfaced by the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Client misconfigured (missing URL or key).
    Config(String),
    /// No signed-in user, or the token was rejected.
    AuthRequired,
    /// A row constraint rejected the write (duplicate, check constraint, FK).
    ConstraintViolation(String),
    /// Transport-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Any other non-success response.
    Api { status: u16, message: String },
    /// The response body could not be decoded.
    Parse(String),
}

impl BackendError {
    /// Classifies a non-success HTTP response.
    ///
    /// PostgREST reports database errors with a SQLSTATE `code` in the body;
    /// class `23` is integrity-constraint violation.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => BackendError::AuthRequired,
            409 => BackendError::ConstraintViolation(body),
            _ if sqlstate(&body).is_some_and(|code| code.starts_with("23")) => {
                BackendError::ConstraintViolation(body)
            }
            _ => BackendError::Api {
                status,
                message: body,
            },
        }
    }
}

fn sqlstate(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("code")?.as_str().map(str::to_string)
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "backend config error: {msg}"),
            BackendError::AuthRequired => write!(f, "not logged in"),
            BackendError::ConstraintViolation(msg) => write!(f, "rejected by backend: {msg}"),
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "backend error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Identity service: who is signed in right now.
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Row storage for reservations.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert(&self, reservation: &NewReservation) -> Result<Reservation, BackendError>;

    async fn query(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, BackendError>;
}

/// Row storage for the user's saved payment card.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn insert_card(&self, card: &NewCard) -> Result<Card, BackendError>;

    async fn saved_card(&self, user_id: UserId) -> Result<Option<Card>, BackendError>;

    async fn delete_cards(&self, user_id: UserId) -> Result<(), BackendError>;
}
