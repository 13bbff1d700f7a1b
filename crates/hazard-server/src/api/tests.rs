use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::future::BoxFuture;
use hazard_core::{GeoPoint, NavigationRules, RawRoute, Step};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::{api, config::Config, oracle::RouteOracle, state::AppState};

/// Oracle answering with a direct route and a slower dog-leg.
struct StubOracle {
    fail: bool,
}

impl RouteOracle for StubOracle {
    fn get_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> BoxFuture<'_, anyhow::Result<Vec<RawRoute>>> {
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                anyhow::bail!("oracle unreachable");
            }
            let corner = GeoPoint::new(origin.lat + 0.01, destination.lng);
            Ok(vec![
                route(vec![origin, corner, destination], 300.0),
                route(vec![origin, destination], 120.0),
            ])
        })
    }
}

fn route(points: Vec<GeoPoint>, duration_sec: f64) -> RawRoute {
    let steps = points
        .iter()
        .enumerate()
        .map(|(idx, point)| Step {
            point: *point,
            instruction: format!("Step {}", idx + 1),
            distance_km: 0.5,
            duration_sec: duration_sec / points.len() as f64,
        })
        .collect();
    RawRoute {
        points,
        steps,
        distance_km: 1.5,
        duration_sec,
    }
}

fn setup_app_with(fail: bool) -> (Router, Arc<AppState>) {
    let state = AppState::start(
        Config::default(),
        NavigationRules::default(),
        Arc::new(StubOracle { fail }),
    )
    .expect("start engine");
    let app = api::routes().with_state(state.clone());
    (app, state)
}

fn setup_app() -> (Router, Arc<AppState>) {
    setup_app_with(false)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn wait_for_routes(state: &AppState) {
    let mut rx = state.subscribe_snapshots();
    tokio::time::timeout(
        Duration::from_secs(2),
        rx.wait_for(|snapshot| !snapshot.session.routes.is_empty()),
    )
    .await
    .expect("routes in time")
    .expect("engine running");
}

const HOME: (f64, f64) = (4.6097, -74.0817);
const WORK: (f64, f64) = (4.6280, -74.0650);

#[tokio::test]
async fn health_check() {
    let (app, _state) = setup_app();
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_position_is_rejected() {
    let (app, state) = setup_app();
    let res = app
        .oneshot(post("/v1/positions", json!({ "lat": 95.0, "lng": 10.0 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(state.snapshot().session.current_location.is_none());
}

#[tokio::test]
async fn destination_requires_a_fix() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post(
            "/v1/navigation/destination",
            json!({ "lat": WORK.0, "lng": WORK.1 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = read_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("position"));
}

#[tokio::test]
async fn destination_routes_and_navigation() {
    let (app, state) = setup_app();

    let res = app
        .clone()
        .oneshot(post("/v1/positions", json!({ "lat": HOME.0, "lng": HOME.1 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(post(
            "/v1/navigation/destination",
            json!({ "lat": WORK.0, "lng": WORK.1, "preference": "fastest" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let ticket = read_json(res).await;
    assert_eq!(ticket["id"], 1);

    wait_for_routes(&state).await;

    let res = app.clone().oneshot(get("/v1/navigation/routes")).await.unwrap();
    let routes = read_json(res).await;
    let routes = routes.as_array().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0]["id"], "route-1-1");
    assert_eq!(routes[0]["is_recommended"], true);

    let res = app
        .clone()
        .oneshot(post("/v1/navigation/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["session"]["is_navigating"], true);
    assert_eq!(snapshot["session"]["selected_route"]["id"], "route-1-1");

    let res = app
        .clone()
        .oneshot(post("/v1/navigation/select", json!({ "route_id": "nope" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .oneshot(post("/v1/navigation/stop", json!({})))
        .await
        .unwrap();
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["session"]["is_navigating"], false);
}

#[tokio::test]
async fn newer_destination_wins() {
    let (app, state) = setup_app();
    app.clone()
        .oneshot(post("/v1/positions", json!({ "lat": HOME.0, "lng": HOME.1 })))
        .await
        .unwrap();

    for (lat, lng) in [(4.70, -74.05), WORK] {
        let res = app
            .clone()
            .oneshot(post("/v1/navigation/destination", json!({ "lat": lat, "lng": lng })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
    }

    wait_for_routes(&state).await;
    let snapshot = state.snapshot();
    let target = GeoPoint::new(WORK.0, WORK.1);
    assert_eq!(snapshot.session.destination, Some(target));
    assert!(snapshot
        .session
        .routes
        .iter()
        .all(|route| route.destination() == Some(target) && route.id.starts_with("route-2-")));
}

#[tokio::test]
async fn oracle_failure_reports_no_routes() {
    let (app, state) = setup_app_with(true);
    let mut stream = state.tx.subscribe();

    app.clone()
        .oneshot(post("/v1/positions", json!({ "lat": HOME.0, "lng": HOME.1 })))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/v1/navigation/destination",
            json!({ "lat": WORK.0, "lng": WORK.1 }),
        ))
        .await
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(2), stream.recv())
        .await
        .expect("event in time")
        .expect("stream open");
    let event: Value = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(event["kind"], "STATUS");
    assert_eq!(event["payload"], "no_routes_found");

    let res = app
        .oneshot(post("/v1/navigation/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn alert_lifecycle() {
    let (app, _state) = setup_app();
    let body = json!({
        "id": "closure-7",
        "severity": "ALTA",
        "type": "road_closure",
        "lat": 4.61,
        "lng": -74.08,
        "title": "Lane closed"
    });

    let res = app.clone().oneshot(post("/v1/alerts", body.clone())).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app.clone().oneshot(post("/v1/alerts", body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(get("/v1/alerts")).await.unwrap();
    let alerts = read_json(res).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["severity"], "ALTA");

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/v1/alerts/closure-7")
            .body(Body::empty())
            .unwrap()
    };
    let res = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.oneshot(delete()).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn geofencing_over_http() {
    let (app, _state) = setup_app();
    app.clone()
        .oneshot(post("/v1/positions", json!({ "lat": HOME.0, "lng": HOME.1 })))
        .await
        .unwrap();
    app.clone()
        .oneshot(post(
            "/v1/alerts",
            json!({
                "severity": "CRITICA",
                "type": "landslide",
                "lat": HOME.0,
                "lng": HOME.1,
                "title": "Landslide"
            }),
        ))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(post("/v1/geofence/start", json!({})))
        .await
        .unwrap();
    let status = read_json(res).await;
    assert_eq!(status["active"], true);
    assert_eq!(status["entered_zones"].as_array().unwrap().len(), 1);
    assert_eq!(status["entered_zones"][0]["radius_meters"], 1000.0);

    let res = app
        .clone()
        .oneshot(get("/v1/geofence/nearby?radius_m=500"))
        .await
        .unwrap();
    let nearby = read_json(res).await;
    assert_eq!(nearby.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(get("/v1/geofence/nearby?radius_m=-3"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post("/v1/geofence/stop", json!({})))
        .await
        .unwrap();
    let status = read_json(res).await;
    assert_eq!(status["active"], false);
    assert!(status["entered_zones"].as_array().unwrap().is_empty());
}
