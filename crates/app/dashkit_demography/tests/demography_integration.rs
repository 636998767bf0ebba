//! Integration test — load the bundled dataset, build the router, drive it over HTTP.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use dashkit_api::AppState;
use dashkit_api::resource::DirectoryResources;
use dashkit_core::Dispatcher;
use serde_json::{Value, json};
use tower::ServiceExt;

fn dataset_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/world.json")
}

async fn app() -> axum::Router {
    let state = dashkit_demography::init(&dataset_path())
        .await
        .expect("load dataset");
    let dispatcher = Dispatcher::new(dashkit_demography::build_app(state));
    dashkit_api::router(AppState::new(dispatcher))
}

async fn post(app: axum::Router, body: Value) -> Value {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("parse JSON")
}

#[tokio::test]
async fn manifest_describes_the_app() {
    let m = post(app().await, json!({"action": "info"})).await;
    assert_eq!(m["ns"], "demography");
    assert_eq!(m["title"], "World Demography");

    let tools: Vec<&String> = m["tools"].as_object().unwrap().keys().collect();
    assert_eq!(
        tools,
        vec![
            "CountryTable",
            "CountryInfoBox",
            "DemographyByCountryAndYear",
            "DemographyByCountryOverTime",
            "WorldFertilityByYear"
        ]
    );
    assert_eq!(m["tagValues"]["Country"]["icon"], "flag");
}

#[tokio::test]
async fn info_box_defaults_to_brazil() {
    let out = post(
        app().await,
        json!({"action": "request", "opName": "CountryInfoBox", "info": {}}),
    )
    .await;
    assert_eq!(out["info"]["type"], "infobox");
    assert_eq!(out["data"]["row"][0], "Brazil");
    assert_eq!(out["data"]["row"][2], "BRA");
}

#[tokio::test]
async fn pyramid_for_france() {
    let out = post(
        app().await,
        json!({"action": "request", "opName": "DemographyByCountryAndYear", "info": {"country": "FRA", "year": 2023}}),
    )
    .await;
    let items = out["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["label"], "65+");
    assert!(items.iter().all(|i| i["start"].as_i64().unwrap() > 0));
}

#[tokio::test]
async fn aggregate_rows_are_not_loaded() {
    let out = post(
        app().await,
        json!({"action": "request", "opName": "WorldFertilityByYear", "info": {"year": 2023}}),
    )
    .await;
    let areas = out["data"]["areas"].as_array().unwrap();
    assert_eq!(areas.len(), 9);
    assert!(areas.iter().all(|a| a["name"] != ""));
}

#[tokio::test]
async fn match_by_alpha_2() {
    let out = post(
        app().await,
        json!({"action": "request", "opName": "MatchCountry", "info": {"value": "de"}}),
    )
    .await;
    assert_eq!(out, json!({"entry": ["DEU", "Germany"]}));
}

#[tokio::test]
async fn resource_dir_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), "demography data").unwrap();

    let state = dashkit_demography::init(&dataset_path()).await.unwrap();
    let app_state = AppState::new(Dispatcher::new(dashkit_demography::build_app(state)))
        .with_resources(DirectoryResources::new(dir.path()));
    let app = dashkit_api::router(app_state);

    let req = Request::builder()
        .uri("/resource/readme.txt")
        .header(header::RANGE, "bytes=0-9")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"demography");
}
