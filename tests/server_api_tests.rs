use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use porygon::data::{load_catalog, FilterOptions};
use porygon::server::routes::route_request;
use porygon::server::{app, ApiState};
use tower::ServiceExt;

fn state() -> ApiState {
    let catalog = load_catalog(concat!(env!("CARGO_MANIFEST_DIR"), "/data/pokemon.csv"))
        .expect("shipped catalog should load");
    ApiState::new(catalog)
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("response should be valid json")
}

#[test]
fn health_endpoint_returns_ok_json() {
    let response = route_request(&state(), "GET", "/api/health", "");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type, "application/json");
    assert!(response.body.contains("\"status\": \"ok\""));
}

#[test]
fn index_serves_the_form() {
    let response = route_request(&state(), "GET", "/", "");
    assert_eq!(response.status_code, 200);
    assert!(response.content_type.starts_with("text/html"));
    assert!(response.body.contains("/api/optimize"));
}

#[test]
fn categories_endpoint_follows_generation() {
    let state = state();
    let gen1 = json(&route_request(&state, "GET", "/api/categories?generation=1", "").body);
    assert_eq!(gen1["categories"].as_array().map(Vec::len), Some(15));

    let latest = json(&route_request(&state, "GET", "/api/categories", "").body);
    assert_eq!(latest["generation"], 9);
    assert_eq!(latest["categories"].as_array().map(Vec::len), Some(18));

    let bad = route_request(&state, "GET", "/api/categories?generation=abc", "");
    assert_eq!(bad.status_code, 400);
}

#[test]
fn candidates_endpoint_applies_default_filter() {
    let payload = json(&route_request(&state(), "GET", "/api/candidates", "").body);
    let names: Vec<&str> = payload["candidates"]
        .as_array()
        .expect("candidates array")
        .iter()
        .filter_map(|name| name.as_str())
        .collect();
    assert!(names.contains(&"snorlax"));
    assert!(!names.contains(&"mewtwo"), "legendaries are excluded by default");
    assert!(!names.contains(&"garchomp"), "pseudo-legendaries are excluded by default");
    assert_eq!(payload["count"].as_u64(), Some(names.len() as u64));
}

#[test]
fn optimize_endpoint_returns_team_and_resistances() {
    let body = r#"{"team_size": 6, "include": ["Lapras"], "filter": {"fossils": "none"}}"#;
    let response = route_request(&state(), "POST", "/api/optimize", body);
    assert_eq!(response.status_code, 200, "{}", response.body);

    let payload = json(&response.body);
    assert_eq!(payload["status"], "optimal");
    let members = payload["members"].as_array().expect("members array");
    assert_eq!(members.len(), 6);
    assert!(members.iter().any(|m| m["name"] == "lapras"));
    assert!(members.iter().all(|m| m["type1"].is_string()));
    assert!(members
        .iter()
        .all(|m| !["omastar", "kabutops", "aerodactyl"].contains(&m["name"].as_str().unwrap_or(""))));

    let resistances = payload["resistances"].as_array().expect("resistances array");
    assert_eq!(resistances.len(), 18);
    for resistance in resistances {
        assert!(resistance["min_multiplier"].as_f64().unwrap() <= 0.5);
        let defender = resistance["defender"].as_str().unwrap();
        assert!(members.iter().any(|m| m["name"] == defender));
    }
}

#[test]
fn infeasible_request_is_a_normal_response() {
    let response = route_request(&state(), "POST", "/api/optimize", r#"{"team_size": 1}"#);
    assert_eq!(response.status_code, 200);
    let payload = json(&response.body);
    assert_eq!(payload["status"], "infeasible");
    assert!(payload["members"].as_array().unwrap().is_empty());
    assert!(payload.get("total_strength").is_none());
}

#[test]
fn invalid_requests_are_bad_request() {
    let state = state();
    let unknown = route_request(&state, "POST", "/api/optimize", r#"{"include": ["mewtwo"]}"#);
    assert_eq!(unknown.status_code, 400);
    assert!(json(&unknown.body)["message"]
        .as_str()
        .unwrap()
        .contains("mewtwo"));

    let overlap = route_request(
        &state,
        "POST",
        "/api/optimize",
        r#"{"include": ["lapras"], "exclude": ["lapras"]}"#,
    );
    assert_eq!(overlap.status_code, 400);

    let malformed = route_request(&state, "POST", "/api/optimize", "{\"team_size\": -1}");
    assert_eq!(malformed.status_code, 400);
}

#[test]
fn unknown_routes_and_methods() {
    let state = state();
    assert_eq!(route_request(&state, "GET", "/api/nope", "").status_code, 404);
    assert_eq!(route_request(&state, "GET", "/api/optimize", "").status_code, 405);
}

#[test]
fn server_default_filter_is_used_without_override() {
    let mut state = state();
    state.default_filter = FilterOptions {
        generation_cap: Some(1),
        ..FilterOptions::default()
    };
    let payload = json(&route_request(&state, "GET", "/api/candidates", "").body);
    let names: Vec<&str> = payload["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|name| name.as_str())
        .collect();
    assert!(names.contains(&"lapras"));
    assert!(!names.contains(&"umbreon"));
}

#[tokio::test]
async fn axum_app_dispatches_through_routes() {
    let app = app(Arc::new(state()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/categories?generation=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["categories"].as_array().map(Vec::len), Some(17));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/optimize")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"include": ["nobody"]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn axum_app_carries_error_statuses_and_json_bodies() {
    let app = app(Arc::new(state()));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/optimize").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = app
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["message"], "Route not found");
}
