use axum::{http::StatusCode, response::Json, Extension};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::itinerary_service::{CreateItinerary, ItineraryService};

/// POST /api/itineraries - create an itinerary owned by the caller
///
/// The payload carries the fields of the itinerary's initial event alongside
/// `itinerary_name`; see `CreateItinerary` for the validation rules.
pub async fn itinerary_create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateItinerary>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    let itinerary_id = service.create(auth.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Itinerary created successfully",
            "itinerary": itinerary_id,
        })),
    ))
}
