//! HTTP surface tests: the router wired to the in-memory store, driven with
//! `tower::ServiceExt::oneshot`. Identity arrives as the trusted
//! `x-user-*` headers the auth proxy would inject.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use accessdesk::api;
use accessdesk::config::Config;
use accessdesk::notification::provisioner::PipelineTrigger;
use accessdesk::store::memory::MemoryStore;
use accessdesk::AppState;

fn app() -> Router {
    let state = Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
        provisioner: PipelineTrigger::new(None).unwrap(),
        config: Config {
            port: 0,
            database_url: String::new(),
            environment: "test".into(),
            provisioning_url: None,
        },
    });
    Router::new().nest("/api", api::api_router()).with_state(state)
}

fn researcher_headers(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("x-user-id", "res-1")
        .header("x-user-name", "Rina Researcher")
        .header("x-user-roles", "Researcher")
}

fn reviewer_headers(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("x-user-id", "dm-1")
        .header("x-user-name", "Devi Manager")
        .header("x-user-roles", "DataManager")
}

fn full_request_body() -> Value {
    json!({
        "projectId": "P01",
        "projectName": "Sepsis outcomes",
        "title": "Adult sepsis cohort",
        "description": "Retrospective cohort of adult admissions",
        "workspaceId": "ws-42",
        "dataset": "RIO",
        "cohortSelectionQuery": "age > 18"
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    researcher_headers(Request::builder().method("POST").uri(path))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn create_assigns_identity_and_draft_status() {
    let app = app();
    let (status, body) = send(&app, post_json("/api/request", full_request_body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Draft");
    assert_eq!(body["requestor"]["id"], "res-1");
    assert!(body["id"].is_string());
    assert!(body["requestedWhen"].is_string());
    // the initial feed entry records every filled field
    assert_eq!(body["updates"][0]["updatedFields"]["title"]["to"], "Adult sepsis cohort");
}

#[tokio::test]
async fn missing_identity_headers_are_rejected() {
    let app = app();
    let request = Request::builder()
        .method("GET")
        .uri("/api/request/my")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn submit_revalidates_server_side() {
    let app = app();
    let mut incomplete = full_request_body();
    incomplete["cohortSelectionQuery"] = json!("");
    let (_, created) = send(&app, post_json("/api/request", incomplete)).await;
    let id = created["id"].as_str().unwrap().to_string();

    let request = researcher_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/submit")),
    )
    .body(Body::empty())
    .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "missing_required_fields");
    assert_eq!(
        body["error"]["message"],
        "missing required fields: cohortSelectionQuery"
    );
}

#[tokio::test]
async fn full_review_flow_over_http() {
    let app = app();
    let (_, created) = send(&app, post_json("/api/request", full_request_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    // researcher submits
    let request = researcher_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/submit")),
    )
    .body(Body::empty())
    .unwrap();
    let (status, submitted) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "Pending");

    // a researcher cannot list the pending queue
    let request = researcher_headers(
        Request::builder().method("GET").uri("/api/request/pending"),
    )
    .body(Body::empty())
    .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // the reviewer sees it and rejects with a comment
    let request = reviewer_headers(
        Request::builder().method("GET").uri("/api/request/pending"),
    )
    .body(Body::empty())
    .unwrap();
    let (status, pending) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let request = reviewer_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/status")),
    )
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(
        json!({ "status": "Rejected", "comment": "insufficient justification" }).to_string(),
    ))
    .unwrap();
    let (status, rejected) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "Rejected");

    // the feed shows the rejection comment
    let request = researcher_headers(
        Request::builder()
            .method("GET")
            .uri(format!("/api/request/{id}/message")),
    )
    .body(Body::empty())
    .unwrap();
    let (_, messages) = send(&app, request).await;
    let comments: Vec<_> = messages
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["comment"].as_str())
        .collect();
    assert_eq!(comments, vec!["insufficient justification"]);
}

#[tokio::test]
async fn edits_after_submission_return_the_stored_record() {
    let app = app();
    let (_, created) = send(&app, post_json("/api/request", full_request_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let request = researcher_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/submit")),
    )
    .body(Body::empty())
    .unwrap();
    send(&app, request).await;

    let mut tampered = full_request_body();
    tampered["title"] = json!("Different title");
    let request = researcher_headers(
        Request::builder()
            .method("PUT")
            .uri(format!("/api/request/{id}")),
    )
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(tampered.to_string()))
    .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Adult sepsis cohort");
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn reviewer_decision_on_a_draft_conflicts() {
    let app = app();
    let (_, created) = send(&app, post_json("/api/request", full_request_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let request = reviewer_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/status")),
    )
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "status": "Approved" }).to_string()))
    .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "invalid_transition");
}

#[tokio::test]
async fn comments_round_trip_through_the_message_endpoint() {
    let app = app();
    let (_, created) = send(&app, post_json("/api/request", full_request_body())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let request = researcher_headers(
        Request::builder()
            .method("POST")
            .uri(format!("/api/request/{id}/message")),
    )
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(json!({ "comment": "any update on this?" }).to_string()))
    .unwrap();
    let (status, posted) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["comment"], "any update on this?");
    assert_eq!(posted["updatedBy"]["id"], "res-1");
}

#[tokio::test]
async fn me_echoes_the_resolved_identity() {
    let app = app();
    let request = reviewer_headers(Request::builder().method("GET").uri("/api/me"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "dm-1");
    assert_eq!(body["roles"], json!(["DataManager"]));
}
