//! Change feed for newly inserted reservations.
//!
//! The backend pushes inserts over a socket; here the same contract is met
//! by polling the row store on an interval and forwarding each unseen row
//! exactly once into a channel. Delivery stops when the returned
//! [`Subscription`] is unsubscribed or dropped, or when the receiver goes away.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

use super::collaborator::ReservationStore;
use super::types::{Order, Reservation, ReservationId, ReservationQuery, SortColumn, UserId};

/// Handle to a running feed. Dropping it unsubscribes.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stops delivery. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Reservation feed unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub struct ReservationFeed;

impl ReservationFeed {
    /// Starts polling for the user's reservations created after now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(
        store: Arc<dyn ReservationStore>,
        user_id: UserId,
        interval: Duration,
        sender: Sender<Reservation>,
    ) -> Subscription {
        Self::subscribe_since(store, user_id, Utc::now(), interval, sender)
    }

    pub fn subscribe_since(
        store: Arc<dyn ReservationStore>,
        user_id: UserId,
        since: DateTime<Utc>,
        interval: Duration,
        sender: Sender<Reservation>,
    ) -> Subscription {
        info!("Reservation feed subscribed for {} (every {:?})", user_id, interval);
        let handle = tokio::spawn(poll_loop(store, user_id, since, interval, sender));
        Subscription {
            handle: Some(handle),
        }
    }
}

async fn poll_loop(
    store: Arc<dyn ReservationStore>,
    user_id: UserId,
    since: DateTime<Utc>,
    interval: Duration,
    sender: Sender<Reservation>,
) {
    // `created_at` comes from the inserting client, so it only bounds the
    // window until the first row is seen. After that the server-assigned id
    // is the watermark.
    let mut last_seen: Option<ReservationId> = None;

    loop {
        let query = match last_seen {
            Some(id) => ReservationQuery::for_user(user_id).after_id(id),
            None => ReservationQuery::for_user(user_id).created_after(since),
        }
        .sort(SortColumn::Id)
        .order(Order::Ascending);

        match store.query(&query).await {
            Ok(rows) => {
                for row in rows {
                    if last_seen.is_some_and(|id| row.id <= id) {
                        continue;
                    }
                    last_seen = Some(row.id);
                    debug!("Feed delivering reservation {:?}", row.id);
                    if sender.send(row).await.is_err() {
                        debug!("Feed receiver dropped, stopping");
                        return;
                    }
                }
            }
            // Transient failures are skipped; the next tick retries the same window.
            Err(e) => warn!("Reservation feed poll failed: {}", e),
        }

        if sender.is_closed() {
            return;
        }
        tokio::time::sleep(interval).await;
    }
}
