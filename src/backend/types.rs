use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of an authenticated user, as issued by the auth service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row id assigned by the backend on insert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ReservationId(pub i64);

/// Payload sent to the persistence collaborator when a booking is submitted.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A persisted reservation. Immutable from the app's point of view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Nights between check-in and check-out (check-out day excluded).
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Ascending,
    #[default]
    Descending,
}

/// Column the rows are sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    CreatedAt,
    /// Server-assigned, so insertion order regardless of client clocks.
    Id,
}

impl SortColumn {
    fn name(self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::Id => "id",
        }
    }
}

/// Filter / order / limit query over the reservations table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationQuery {
    pub user_id: Option<UserId>,
    pub created_after: Option<DateTime<Utc>>,
    pub after_id: Option<ReservationId>,
    pub sort: SortColumn,
    pub order: Order,
    pub limit: Option<usize>,
}

impl ReservationQuery {
    /// All reservations of a user, newest first.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    /// Only rows inserted after the given one.
    pub fn after_id(mut self, id: ReservationId) -> Self {
        self.after_id = Some(id);
        self
    }

    pub fn sort(mut self, column: SortColumn) -> Self {
        self.sort = column;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the query as PostgREST-style URL parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(user_id) = self.user_id {
            params.push(("user_id".to_string(), format!("eq.{user_id}")));
        }
        if let Some(after) = self.created_after {
            params.push((
                "created_at".to_string(),
                format!("gt.{}", after.to_rfc3339()),
            ));
        }
        if let Some(id) = self.after_id {
            params.push(("id".to_string(), format!("gt.{}", id.0)));
        }
        let direction = match self.order {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        };
        params.push((
            "order".to_string(),
            format!("{}.{direction}", self.sort.name()),
        ));
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// In-memory evaluation, used by fakes and by callers that filter locally.
    pub fn matches(&self, reservation: &Reservation) -> bool {
        if let Some(user_id) = self.user_id {
            if reservation.user_id != user_id {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if reservation.created_at <= after {
                return false;
            }
        }
        if let Some(id) = self.after_id {
            if reservation.id <= id {
                return false;
            }
        }
        true
    }
}

/// Card row payload. Only the last four digits ever leave the device.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub user_id: UserId,
    pub last4: String,
    pub name_on_card: String,
    pub expiry: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub last4: String,
    #[serde(default)]
    pub name_on_card: String,
    #[serde(default)]
    pub expiry: String,
}
