use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named trip container owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Itinerary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub itinerary_name: String,
    pub created_at: DateTime<Utc>,
}

/// A scheduled activity within an itinerary.
///
/// Create/update payloads carry these fields flattened onto the itinerary;
/// the service maintains the initial event implicitly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub itinerary_id: Uuid,
    pub time_of_event: Option<NaiveDateTime>,
    pub event_name: String,
    pub event_description: String,
    pub event_location: String,
    pub event_address: String,
    pub event_city: String,
    pub event_state: String,
}
