use axum::{extract::Path, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::itinerary_service::{ItineraryService, ShareMode};

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub mode: Option<String>,
}

/// POST /api/itineraries/:id/share - share an owned itinerary.
///
/// `mode` is `platform` (accepted, in-app sharing reserved) or `link`
/// (returns a deterministic share link); anything else is a 400.
pub async fn itinerary_share(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, ApiError> {
    let mode = ShareMode::parse(payload.mode.as_deref().unwrap_or(""))?;

    let pool = DatabaseManager::pool().await?;
    let service = ItineraryService::new(pool);

    let link = service.share(auth.user_id, id, mode).await?;

    let mut body = json!({ "message": "Itinerary shared successfully" });
    if let Some(link) = link {
        body["link"] = json!(link);
    }
    Ok(Json(body))
}
