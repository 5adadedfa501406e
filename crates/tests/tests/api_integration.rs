use std::path::PathBuf;

use atoll_api::build_app;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn catalog_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/catalog")
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", "dev-atoll-key");
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, parsed)
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["status"], "ok");
    assert!(parsed.get("metrics").is_some());
    assert!(parsed["catalog"]["locations"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn plan_requires_api_key() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/plan")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "selection": { "location_ids": ["cellular-jail"] }
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn plan_returns_costed_itinerary() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (status, parsed) = send_json(
        &app,
        "POST",
        "/v1/plan",
        Some(json!({
            "selection": {
                "location_ids": ["cellular-jail", "radhanagar-beach"],
                "adults": 2
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);

    let days = parsed["days"].as_array().unwrap();
    assert!(!days.is_empty());
    assert_eq!(days[0]["items"][0]["kind"], "arrival");

    assert_eq!(parsed["summary"]["day_count"].as_u64().unwrap() as usize, days.len());
    assert_eq!(parsed["summary"]["ferry_legs"], 2);
    assert!(parsed["costs"]["total"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn trip_flow_versions_across_updates() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (status, created) = send_json(
        &app,
        "POST",
        "/v1/trips",
        Some(json!({
            "selection": { "location_ids": ["cellular-jail", "radhanagar-beach"] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], 1);
    let trip_id = created["trip_id"].as_str().unwrap().to_string();

    // Input-only updates refresh the stored trip without a version bump.
    let (status, updated) = send_json(
        &app,
        "POST",
        &format!("/v1/trips/{trip_id}/essentials"),
        Some(json!({
            "ferry_class": "deluxe",
            "vehicle_id": "innova",
            "flat_islands": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 1);

    let (status, edited) = send_json(
        &app,
        "POST",
        &format!("/v1/trips/{trip_id}/edits"),
        Some(json!({ "op": "set_transport", "day": 1, "mode": "Bicycle" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["version"], 2);
    assert_eq!(edited["days"][1]["transport"], "Bicycle");

    let (status, fetched) = send_json(&app, "GET", &format!("/v1/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["version"], 2);
    assert_eq!(fetched["days"][1]["transport"], "Bicycle");
    assert_eq!(fetched["essentials"]["ferry_class"], "deluxe");
}

#[tokio::test]
async fn selection_update_discards_manual_edits() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (_, created) = send_json(
        &app,
        "POST",
        "/v1/trips",
        Some(json!({
            "selection": { "location_ids": ["cellular-jail", "radhanagar-beach"] }
        })),
    )
    .await;
    let trip_id = created["trip_id"].as_str().unwrap().to_string();

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/v1/trips/{trip_id}/edits"),
        Some(json!({ "op": "set_transport", "day": 1, "mode": "Bicycle" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, regenerated) = send_json(
        &app,
        "POST",
        &format!("/v1/trips/{trip_id}/selection"),
        Some(json!({
            "location_ids": ["cellular-jail", "corbyns-cove", "radhanagar-beach"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(regenerated["version"], 3);
    assert_eq!(regenerated["days"][1]["transport"], "Point-to-Point");
}

#[tokio::test]
async fn unknown_trip_and_locked_edits_map_to_errors() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (status, body) = send_json(&app, "GET", "/v1/trips/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "trip_not_found");

    let (_, created) = send_json(
        &app,
        "POST",
        "/v1/trips",
        Some(json!({
            "selection": { "location_ids": ["cellular-jail"] }
        })),
    )
    .await;
    let trip_id = created["trip_id"].as_str().unwrap().to_string();

    // The arrival day cannot be deleted.
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/v1/trips/{trip_id}/edits"),
        Some(json!({ "op": "delete_day", "index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "edit_rejected");

    // A rejected edit leaves the stored version untouched.
    let (_, fetched) = send_json(&app, "GET", &format!("/v1/trips/{trip_id}"), None).await;
    assert_eq!(fetched["version"], 1);
}

#[tokio::test]
async fn deleted_trips_are_gone() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (_, created) = send_json(
        &app,
        "POST",
        "/v1/trips",
        Some(json!({
            "selection": { "location_ids": ["bharatpur-beach"] }
        })),
    )
    .await;
    let trip_id = created["trip_id"].as_str().unwrap().to_string();

    let (status, _) = send_json(&app, "DELETE", &format!("/v1/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, "GET", &format!("/v1/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, "DELETE", &format!("/v1/trips/{trip_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggestions_surface_linked_activities() {
    let app = build_app(catalog_root()).await.expect("app should build");

    let (status, parsed) = send_json(
        &app,
        "GET",
        "/v1/catalog/locations/elephant-beach/suggestions",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|activity| activity["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["snorkeling", "sea-walk", "jet-ski"]);

    let (status, _) = send_json(
        &app,
        "GET",
        "/v1/catalog/locations/atlantis/suggestions",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
