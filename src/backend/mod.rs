pub mod collaborator;
pub mod feed;
pub mod supabase;
pub mod types;

pub use collaborator::{AuthProvider, BackendError, CardStore, ReservationStore};
pub use feed::{ReservationFeed, Subscription};
pub use supabase::{AuthSession, SupabaseClient};
pub use types::{
    Card, NewCard, NewReservation, Order, Reservation, ReservationId, ReservationQuery,
    SortColumn, UserId,
};
