mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

async fn create_itinerary(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    payload: serde_json::Value,
) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{}/api/itineraries", base_url))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?)
}

/// The end-to-end scenario: create as user A, visible only to A, deleted by A.
#[tokio::test]
async fn chilangolandia_lifecycle_with_ownership_isolation() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user_a, token_a) = common::register_and_login(&server.base_url).await?;
    let (_user_b, token_b) = common::register_and_login(&server.base_url).await?;

    // Create as user A
    let res = create_itinerary(
        &client,
        &server.base_url,
        &token_a,
        json!({
            "itinerary_name": "Chilangolandia",
            "time_of_event": "2024-03-15 09:00:00",
            "event_name": "Visiting Mexico City",
            "event_description": "Tour of the city",
            "event_location": "CDMX",
        }),
    )
    .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let id = body["itinerary"].as_str().expect("itinerary id").to_string();

    // Fields round-trip for the owner
    let res = client
        .get(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token_a)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["itinerary"]["itinerary_name"], "Chilangolandia");
    let event = &body["events"][0];
    assert_eq!(event["event_name"], "Visiting Mexico City");
    assert_eq!(event["event_location"], "CDMX");
    assert_eq!(event["event_description"], "Tour of the city");
    assert_eq!(event["time_of_event"], "2024-03-15T09:00:00");
    // Optional fields defaulted to empty
    assert_eq!(event["event_city"], "");

    // Foreign user sees a 404, not the record
    let res = client
        .get(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token_b)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Foreign delete is also a 404 and mutates nothing
    let res = client
        .delete(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token_b)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Owner delete succeeds, then the id is gone
    let res = client
        .delete(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token_a)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token_a)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn create_validation_failures_leave_store_unchanged() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user, token) = common::register_and_login(&server.base_url).await?;

    let invalid_payloads = [
        // Missing itinerary_name
        json!({ "event_name": "Walk", "event_location": "Park" }),
        // Missing event_location
        json!({ "itinerary_name": "Weekend", "event_name": "Walk" }),
        // Malformed time_of_event
        json!({
            "itinerary_name": "Weekend",
            "event_name": "Walk",
            "event_location": "Park",
            "time_of_event": "not-a-date",
        }),
    ];

    for payload in invalid_payloads {
        let res = create_itinerary(&client, &server.base_url, &token, payload.clone()).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "payload should be rejected: {}",
            payload
        );
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    // Nothing was written for this fresh user
    let res = client
        .get(format!("{}/api/itineraries", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["itineraries"].as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn list_filters_by_fuzzy_name() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user, token) = common::register_and_login(&server.base_url).await?;

    for name in ["Beach Week", "Mountain Trek", "beach day"] {
        let res = create_itinerary(
            &client,
            &server.base_url,
            &token,
            json!({
                "itinerary_name": name,
                "event_name": "Kickoff",
                "event_location": "TBD",
            }),
        )
        .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Case-insensitive substring match
    let res = client
        .get(format!("{}/api/itineraries?name=BEACH", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let names: Vec<&str> = body["itineraries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["itinerary_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Beach Week", "beach day"]);

    // No match is an empty list on the list route, not a 404
    let res = client
        .get(format!("{}/api/itineraries?name=desert", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["itineraries"].as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn update_is_partial_idempotent_and_all_or_nothing() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user, token) = common::register_and_login(&server.base_url).await?;

    let res = create_itinerary(
        &client,
        &server.base_url,
        &token,
        json!({
            "itinerary_name": "Draft Trip",
            "event_name": "Arrival",
            "event_location": "Airport",
            "event_city": "Lisbon",
        }),
    )
    .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    let id = body["itinerary"].as_str().unwrap().to_string();

    // Apply the same patch twice; the final state must be identical
    for _ in 0..2 {
        let res = client
            .put(format!("{}/api/itineraries/{}", server.base_url, id))
            .bearer_auth(&token)
            .json(&json!({ "itinerary_name": "Lisbon Trip" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["itinerary"]["itinerary_name"], "Lisbon Trip");
    // Untouched fields survive the partial update
    assert_eq!(body["events"][0]["event_city"], "Lisbon");

    // A malformed timestamp aborts the whole patch, including valid fields
    let res = client
        .put(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({
            "itinerary_name": "Should Not Stick",
            "time_of_event": "bogus",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/api/itineraries/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["itinerary"]["itinerary_name"], "Lisbon Trip");

    // Updating a nonexistent id is a 404
    let res = client
        .put(format!(
            "{}/api/itineraries/00000000-0000-0000-0000-000000000000",
            server.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "itinerary_name": "Ghost" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn share_modes_and_ownership() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_user_a, token_a) = common::register_and_login(&server.base_url).await?;
    let (_user_b, token_b) = common::register_and_login(&server.base_url).await?;

    let res = create_itinerary(
        &client,
        &server.base_url,
        &token_a,
        json!({
            "itinerary_name": "Shareable",
            "event_name": "Dinner",
            "event_location": "Downtown",
        }),
    )
    .await?;
    let body = res.json::<serde_json::Value>().await?;
    let id = body["itinerary"].as_str().unwrap().to_string();
    let share_url = format!("{}/api/itineraries/{}/share", server.base_url, id);

    // Link mode returns a deterministic link
    let mut links = Vec::new();
    for _ in 0..2 {
        let res = client
            .post(&share_url)
            .bearer_auth(&token_a)
            .json(&json!({ "mode": "link" }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.json::<serde_json::Value>().await?;
        links.push(body["link"].as_str().unwrap().to_string());
    }
    assert_eq!(links[0], links[1]);

    // Platform mode succeeds without a link
    let res = client
        .post(&share_url)
        .bearer_auth(&token_a)
        .json(&json!({ "mode": "platform" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("link").is_none());

    // Unknown mode is a validation failure
    let res = client
        .post(&share_url)
        .bearer_auth(&token_a)
        .json(&json!({ "mode": "email" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Foreign owner cannot tell the itinerary exists
    let res = client
        .post(&share_url)
        .bearer_auth(&token_b)
        .json(&json!({ "mode": "link" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
