use axum::response::Json;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::user_service::{LoginUser, UserService};

/// POST /auth/login - verify credentials and issue a JWT bearer token
pub async fn login_post(Json(payload): Json<LoginUser>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let service = UserService::new(pool);

    let user = service.login(&payload).await?;

    let claims = Claims::new(user.id, user.username.clone());
    let token = generate_jwt(claims).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(Json(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "email_address": user.email_address,
            "created_at": user.created_at,
        },
        "expires_in": expires_in,
    })))
}
