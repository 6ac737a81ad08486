//! Client for the hosted backend (Supabase-style REST: GoTrue auth under
//! `/auth/v1`, PostgREST rows under `/rest/v1`).
//!
//! The client caches the signed-in session and uses its access token for
//! row requests; without a session it falls back to the anon key, which
//! row-level security on the backend will reject for user-owned tables.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::collaborator::{AuthProvider, BackendError, CardStore, ReservationStore};
use super::types::{Card, NewCard, NewReservation, Reservation, ReservationQuery, UserId};

const RESERVATIONS_TABLE: &str = "reservations";
const CARDS_TABLE: &str = "cards";

/// A signed-in session as returned by the token endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: UserId,
    pub email: Option<String>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Deserialize, Debug)]
struct AuthUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

/// Sign-up answers with a session when e-mail confirmation is off, or with
/// the bare user object when it is on.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
            user_id: self.user.id,
            email: self.user.email,
        }
    }
}

pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<AuthSession>>,
}

impl SupabaseClient {
    /// Creates a client for the project at `base_url` (no trailing slash needed).
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    /// Returns a copy of the cached session, if any.
    pub fn session(&self) -> Option<AuthSession> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the cached session (e.g. with one restored from disk).
    pub fn set_session(&self, session: Option<AuthSession>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn bearer(&self) -> String {
        self.session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Sends a request and returns the successful response, mapping
    /// transport and status failures to `BackendError`.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        debug!("Backend response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Backend error: {} - {}", status, body);
            return Err(BackendError::from_status(status, body));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(format!("{e}: {body}")))
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        info!("Signing in as {}", email);
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password });

        let token: TokenResponse = self.send_json(request).await.map_err(auth_failure)?;
        let session = token.into_session(Utc::now());
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Registers a new account. Returns the new user's id; a session is
    /// cached only if the backend hands one out immediately.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, BackendError> {
        info!("Signing up {}", email);
        let request = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&PasswordCredentials { email, password });

        match self.send_json::<SignUpResponse>(request).await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                let user_id = session.user_id;
                self.set_session(Some(session));
                Ok(user_id)
            }
            SignUpResponse::User(user) => Ok(user.id),
        }
    }

    /// Exchanges the cached refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<AuthSession, BackendError> {
        let current = self.session().ok_or(BackendError::AuthRequired)?;
        debug!("Refreshing session for {}", current.user_id);
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&RefreshGrant {
                refresh_token: &current.refresh_token,
            });

        match self.send_json::<TokenResponse>(request).await {
            Ok(token) => {
                let session = token.into_session(Utc::now());
                self.set_session(Some(session.clone()));
                Ok(session)
            }
            Err(e) => {
                self.set_session(None);
                Err(auth_failure(e))
            }
        }
    }

    /// Revokes the session server-side and forgets it locally. The local
    /// session is dropped even if the server call fails.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        if self.session().is_none() {
            return Ok(());
        }
        let request = self.authorized(self.client.post(self.auth_url("logout")));
        let result = self.send(request).await.map(|_| ());
        self.set_session(None);
        result
    }
}

/// Credential and token rejections come back as 400 from the token endpoint.
fn auth_failure(err: BackendError) -> BackendError {
    match err {
        BackendError::Api { status: 400, .. } => BackendError::AuthRequired,
        other => other,
    }
}

impl AuthProvider for SupabaseClient {
    fn current_user(&self) -> Option<UserId> {
        self.session().map(|s| s.user_id)
    }
}

#[async_trait]
impl ReservationStore for SupabaseClient {
    async fn insert(&self, reservation: &NewReservation) -> Result<Reservation, BackendError> {
        if self.session().is_none() {
            return Err(BackendError::AuthRequired);
        }
        info!(
            "Inserting reservation {} -> {} for {}",
            reservation.check_in, reservation.check_out, reservation.user_id
        );
        let request = self
            .authorized(self.client.post(self.rest_url(RESERVATIONS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&[reservation]);

        let rows: Vec<Reservation> = self.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("insert returned no rows".to_string()))
    }

    async fn query(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, BackendError> {
        debug!("Querying reservations: {:?}", query);
        let request = self
            .authorized(self.client.get(self.rest_url(RESERVATIONS_TABLE)))
            .query(&query.to_params());
        self.send_json(request).await
    }
}

#[async_trait]
impl CardStore for SupabaseClient {
    async fn insert_card(&self, card: &NewCard) -> Result<Card, BackendError> {
        info!("Saving card ending in {}", card.last4);
        let request = self
            .authorized(self.client.post(self.rest_url(CARDS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&[card]);

        let rows: Vec<Card> = self.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("insert returned no rows".to_string()))
    }

    async fn saved_card(&self, user_id: UserId) -> Result<Option<Card>, BackendError> {
        let request = self
            .authorized(self.client.get(self.rest_url(CARDS_TABLE)))
            .query(&[
                ("select", "last4,name_on_card,expiry".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ]);
        let rows: Vec<Card> = self.send_json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_cards(&self, user_id: UserId) -> Result<(), BackendError> {
        info!("Removing saved cards for {}", user_id);
        let request = self
            .authorized(self.client.delete(self.rest_url(CARDS_TABLE)))
            .query(&[("user_id", format!("eq.{user_id}"))]);
        self.send(request).await.map(|_| ())
    }
}
