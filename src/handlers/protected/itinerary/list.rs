use axum::{extract::Query, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::itinerary_service::{ItineraryFilter, ItineraryService};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Exact id lookup; takes precedence over `name`
    pub id: Option<Uuid>,
    /// Case-insensitive substring match on itinerary_name
    pub name: Option<String>,
}

/// GET /api/itineraries - list the caller's itineraries.
///
/// Always 200; an empty result is an empty array, never a 404. Use the
/// record route for single-object semantics.
pub async fn itinerary_list(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    let filter = ItineraryFilter::from_parts(query.id, query.name);
    let itineraries = service.list(auth.user_id, filter).await?;

    Ok(Json(json!({ "itineraries": itineraries })))
}
