use axum::{extract::Path, response::Json, Extension};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::itinerary_service::{ItineraryFilter, ItineraryPatch, ItineraryService};

/// GET /api/itineraries/:id - fetch one owned itinerary with its events.
///
/// A foreign-owned id yields the same 404 as a missing one.
pub async fn itinerary_get(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    let (itinerary, events) = service
        .get_one_with_events(auth.user_id, ItineraryFilter::ById(id))
        .await?;

    Ok(Json(json!({
        "itinerary": itinerary,
        "events": events,
    })))
}

/// PUT /api/itineraries/:id - partial update of an owned itinerary.
///
/// Absent patch fields are left unchanged; an invalid `time_of_event`
/// aborts the whole update.
pub async fn itinerary_update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ItineraryPatch>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    service
        .update(auth.user_id, ItineraryFilter::ById(id), patch)
        .await?;

    Ok(Json(json!({ "message": "Itinerary updated successfully" })))
}

/// DELETE /api/itineraries/:id - remove an owned itinerary and its events
pub async fn itinerary_delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    service
        .delete(auth.user_id, ItineraryFilter::ById(id))
        .await?;

    Ok(Json(json!({ "message": "Itinerary deleted successfully" })))
}
