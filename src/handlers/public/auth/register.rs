use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::user_service::{RegisterUser, UserService};

/// POST /auth/register - create a new account
///
/// Requires `username`, `email_address`, and `password`; duplicate username
/// or email yields 409.
pub async fn register_post(
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = UserService::new(pool);

    service.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    ))
}
