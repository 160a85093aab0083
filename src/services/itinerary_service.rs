use chrono::NaiveDateTime;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{Event, Itinerary};

/// Accepted format for `time_of_event` fields
const TIME_OF_EVENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ItineraryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Storage(#[source] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Ownership-scoped itinerary lookup.
///
/// Every variant is additionally constrained by `user_id = caller` before any
/// other predicate; an id filter wins over a name filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryFilter {
    ById(Uuid),
    ByNameContains(String),
    All,
}

impl ItineraryFilter {
    /// Build a filter from optional query parameters, id taking precedence
    pub fn from_parts(id: Option<Uuid>, name_contains: Option<String>) -> Self {
        match (id, name_contains) {
            (Some(id), _) => ItineraryFilter::ById(id),
            (None, Some(name)) if !name.trim().is_empty() => {
                ItineraryFilter::ByNameContains(name)
            }
            _ => ItineraryFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Reserved for in-app sharing; accepted but currently a no-op
    Platform,
    /// Produce a deterministic shareable link derived from the itinerary id
    Link,
}

impl ShareMode {
    pub fn parse(raw: &str) -> Result<Self, ItineraryError> {
        match raw {
            "platform" => Ok(ShareMode::Platform),
            "link" => Ok(ShareMode::Link),
            other => Err(ItineraryError::Validation(format!(
                "unknown share mode '{}', expected 'platform' or 'link'",
                other
            ))),
        }
    }
}

/// Create payload. Event fields describe the itinerary's initial event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItinerary {
    pub itinerary_name: Option<String>,
    pub time_of_event: Option<String>,
    pub event_name: Option<String>,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub event_address: Option<String>,
    pub event_city: Option<String>,
    pub event_state: Option<String>,
}

/// Partial update payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItineraryPatch {
    pub itinerary_name: Option<String>,
    pub time_of_event: Option<String>,
    pub event_name: Option<String>,
    pub event_description: Option<String>,
    pub event_location: Option<String>,
    pub event_address: Option<String>,
    pub event_city: Option<String>,
    pub event_state: Option<String>,
}

/// Itinerary CRUD and ownership-scoped query engine.
///
/// Validation happens before any store access; every mutation runs inside a
/// single transaction so commit failures leave no partial state.
pub struct ItineraryService {
    pool: PgPool,
}

impl ItineraryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an itinerary (and its initial event) owned by `caller`
    pub async fn create(
        &self,
        caller: Uuid,
        payload: CreateItinerary,
    ) -> Result<Uuid, ItineraryError> {
        let itinerary_name = required_field("itinerary_name", payload.itinerary_name.as_deref())?;
        let event_name = required_field("event_name", payload.event_name.as_deref())?;
        let event_location = required_field("event_location", payload.event_location.as_deref())?;
        let time_of_event = parse_time_of_event(payload.time_of_event.as_deref())?;

        let mut tx = self.pool.begin().await.map_err(ItineraryError::Storage)?;

        let itinerary_id = Uuid::new_v4();
        sqlx::query("INSERT INTO itineraries (id, user_id, itinerary_name) VALUES ($1, $2, $3)")
            .bind(itinerary_id)
            .bind(caller)
            .bind(&itinerary_name)
            .execute(&mut *tx)
            .await
            .map_err(classify_write_error)?;

        sqlx::query(
            "INSERT INTO events \
             (id, itinerary_id, time_of_event, event_name, event_description, \
              event_location, event_address, event_city, event_state) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(Uuid::new_v4())
        .bind(itinerary_id)
        .bind(time_of_event)
        .bind(&event_name)
        .bind(payload.event_description.unwrap_or_default())
        .bind(&event_location)
        .bind(payload.event_address.unwrap_or_default())
        .bind(payload.event_city.unwrap_or_default())
        .bind(payload.event_state.unwrap_or_default())
        .execute(&mut *tx)
        .await
        .map_err(classify_write_error)?;

        tx.commit().await.map_err(classify_write_error)?;
        tracing::info!(%caller, %itinerary_id, "itinerary created");
        Ok(itinerary_id)
    }

    /// List itineraries owned by `caller` matching the filter.
    ///
    /// The list contract: an empty result is an empty vec, never an error.
    pub async fn list(
        &self,
        caller: Uuid,
        filter: ItineraryFilter,
    ) -> Result<Vec<Itinerary>, ItineraryError> {
        let rows = match &filter {
            ItineraryFilter::ById(id) => {
                sqlx::query_as::<_, Itinerary>(
                    "SELECT id, user_id, itinerary_name, created_at FROM itineraries \
                     WHERE user_id = $1 AND id = $2",
                )
                .bind(caller)
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            ItineraryFilter::ByNameContains(name) => {
                sqlx::query_as::<_, Itinerary>(
                    "SELECT id, user_id, itinerary_name, created_at FROM itineraries \
                     WHERE user_id = $1 AND itinerary_name ILIKE $2 \
                     ORDER BY created_at, id",
                )
                .bind(caller)
                .bind(contains_pattern(name))
                .fetch_all(&self.pool)
                .await
            }
            ItineraryFilter::All => {
                sqlx::query_as::<_, Itinerary>(
                    "SELECT id, user_id, itinerary_name, created_at FROM itineraries \
                     WHERE user_id = $1 ORDER BY created_at, id",
                )
                .bind(caller)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(ItineraryError::Storage)?;

        Ok(rows)
    }

    /// Single-record contract: first match in deterministic order, 404 on none.
    ///
    /// A foreign-owned id and an absent id are indistinguishable to the caller.
    pub async fn get_one(
        &self,
        caller: Uuid,
        filter: ItineraryFilter,
    ) -> Result<Itinerary, ItineraryError> {
        self.list(caller, filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ItineraryError::NotFound("Itinerary not found".to_string()))
    }

    /// Fetch a single itinerary together with its events
    pub async fn get_one_with_events(
        &self,
        caller: Uuid,
        filter: ItineraryFilter,
    ) -> Result<(Itinerary, Vec<Event>), ItineraryError> {
        let itinerary = self.get_one(caller, filter).await?;

        let events = sqlx::query_as::<_, Event>(
            "SELECT id, itinerary_id, time_of_event, event_name, event_description, \
             event_location, event_address, event_city, event_state \
             FROM events WHERE itinerary_id = $1 ORDER BY id",
        )
        .bind(itinerary.id)
        .fetch_all(&self.pool)
        .await
        .map_err(ItineraryError::Storage)?;

        Ok((itinerary, events))
    }

    /// Apply a partial update to the first itinerary matching the filter.
    ///
    /// All-or-nothing: validation failures abort before any write, and the
    /// itinerary row and event row are patched inside one transaction.
    pub async fn update(
        &self,
        caller: Uuid,
        filter: ItineraryFilter,
        patch: ItineraryPatch,
    ) -> Result<(), ItineraryError> {
        // Re-validate patched fields with the create rules before touching the store
        let time_of_event = parse_time_of_event(patch.time_of_event.as_deref())?;
        if let Some(name) = patch.itinerary_name.as_deref() {
            required_field("itinerary_name", Some(name))?;
        }
        if let Some(name) = patch.event_name.as_deref() {
            required_field("event_name", Some(name))?;
        }
        if let Some(location) = patch.event_location.as_deref() {
            required_field("event_location", Some(location))?;
        }

        let mut tx = self.pool.begin().await.map_err(ItineraryError::Storage)?;
        let target = resolve_one(&mut tx, caller, &filter).await?;

        if let Some(name) = &patch.itinerary_name {
            sqlx::query("UPDATE itineraries SET itinerary_name = $1 WHERE id = $2")
                .bind(name)
                .bind(target)
                .execute(&mut *tx)
                .await
                .map_err(classify_write_error)?;
        }

        // COALESCE keeps absent patch fields at their stored values
        sqlx::query(
            "UPDATE events SET \
             time_of_event = COALESCE($1, time_of_event), \
             event_name = COALESCE($2, event_name), \
             event_description = COALESCE($3, event_description), \
             event_location = COALESCE($4, event_location), \
             event_address = COALESCE($5, event_address), \
             event_city = COALESCE($6, event_city), \
             event_state = COALESCE($7, event_state) \
             WHERE itinerary_id = $8",
        )
        .bind(time_of_event)
        .bind(patch.event_name)
        .bind(patch.event_description)
        .bind(patch.event_location)
        .bind(patch.event_address)
        .bind(patch.event_city)
        .bind(patch.event_state)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(classify_write_error)?;

        tx.commit().await.map_err(classify_write_error)?;
        tracing::info!(%caller, itinerary_id = %target, "itinerary updated");
        Ok(())
    }

    /// Delete the first itinerary matching the filter, cascading to its events
    pub async fn delete(
        &self,
        caller: Uuid,
        filter: ItineraryFilter,
    ) -> Result<(), ItineraryError> {
        let mut tx = self.pool.begin().await.map_err(ItineraryError::Storage)?;
        let target = resolve_one(&mut tx, caller, &filter).await?;

        // Schema declares ON DELETE CASCADE; the explicit delete keeps the
        // cascade visible in the transaction regardless of DDL state.
        sqlx::query("DELETE FROM events WHERE itinerary_id = $1")
            .bind(target)
            .execute(&mut *tx)
            .await
            .map_err(classify_write_error)?;

        sqlx::query("DELETE FROM itineraries WHERE id = $1")
            .bind(target)
            .execute(&mut *tx)
            .await
            .map_err(classify_write_error)?;

        tx.commit().await.map_err(classify_write_error)?;
        tracing::info!(%caller, itinerary_id = %target, "itinerary deleted");
        Ok(())
    }

    /// Share an owned itinerary.
    ///
    /// Returns the share link for `ShareMode::Link`, `None` for
    /// `ShareMode::Platform`.
    pub async fn share(
        &self,
        caller: Uuid,
        itinerary_id: Uuid,
        mode: ShareMode,
    ) -> Result<Option<String>, ItineraryError> {
        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM itineraries WHERE user_id = $1 AND id = $2")
                .bind(caller)
                .bind(itinerary_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(ItineraryError::Storage)?;

        if owned.is_none() {
            return Err(ItineraryError::NotFound("Itinerary not found".to_string()));
        }

        match mode {
            ShareMode::Platform => Ok(None),
            ShareMode::Link => Ok(Some(share_link(itinerary_id))),
        }
    }
}

/// Resolve exactly one ownership-scoped target inside the caller's
/// transaction; first match by (created_at, id) when the filter is ambiguous
async fn resolve_one(
    tx: &mut Transaction<'_, Postgres>,
    caller: Uuid,
    filter: &ItineraryFilter,
) -> Result<Uuid, ItineraryError> {
    let row: Option<(Uuid,)> = match filter {
        ItineraryFilter::ById(id) => {
            sqlx::query_as("SELECT id FROM itineraries WHERE user_id = $1 AND id = $2")
                .bind(caller)
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
        }
        ItineraryFilter::ByNameContains(name) => {
            sqlx::query_as(
                "SELECT id FROM itineraries WHERE user_id = $1 AND itinerary_name ILIKE $2 \
                 ORDER BY created_at, id LIMIT 1",
            )
            .bind(caller)
            .bind(contains_pattern(name))
            .fetch_optional(&mut **tx)
            .await
        }
        ItineraryFilter::All => {
            sqlx::query_as(
                "SELECT id FROM itineraries WHERE user_id = $1 ORDER BY created_at, id LIMIT 1",
            )
            .bind(caller)
            .fetch_optional(&mut **tx)
            .await
        }
    }
    .map_err(ItineraryError::Storage)?;

    row.map(|(id,)| id)
        .ok_or_else(|| ItineraryError::NotFound("Itinerary not found".to_string()))
}

fn required_field(field: &str, value: Option<&str>) -> Result<String, ItineraryError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ItineraryError::Validation(format!("{} required", field))),
    }
}

fn parse_time_of_event(raw: Option<&str>) -> Result<Option<NaiveDateTime>, ItineraryError> {
    match raw {
        None => Ok(None),
        Some(s) => NaiveDateTime::parse_from_str(s, TIME_OF_EVENT_FORMAT)
            .map(Some)
            .map_err(|_| {
                ItineraryError::Validation(
                    "invalid time_of_event format, expected YYYY-MM-DD HH:MM:SS".to_string(),
                )
            }),
    }
}

/// Case-insensitive substring pattern with LIKE metacharacters escaped
fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Deterministic, itinerary-id-derived shareable reference
pub fn share_link(itinerary_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(itinerary_id.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("/share/{}", &hash[..16])
}

/// Map store-layer write failures onto the error taxonomy: integrity
/// violations become conflicts, everything else is a storage fault
fn classify_write_error(e: sqlx::Error) -> ItineraryError {
    use sqlx::error::ErrorKind;

    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => {
                return ItineraryError::Conflict(
                    "Itinerary conflicts with a storage constraint".to_string(),
                );
            }
            _ => {}
        }
    }
    ItineraryError::Storage(e)
}
