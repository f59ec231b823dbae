//! End-to-end tests for the HTTP routes, driven through the router without a
//! socket. External services are replaced by the fakes in `helpers`.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;

use helpers::{noun, rel, session_payload, BagOfWordsEmbedder, CannedExtractor, FailingAnswer};
use omiverse::api::{self, AppState};
use omiverse::config::OrphanPolicy;
use omiverse::graph::types::NounType;
use omiverse::llm::Extraction;
use omiverse::pipeline::{AnswerEngine, SubstringEvidenceFilter};
use serde_json::{json, Value};
use tower::ServiceExt;

const MEETUP: &str = "Dana met Eli at the Rust meetup.";

fn app(answer: &str) -> Router {
    let db = helpers::test_db();
    let extractor = CannedExtractor::default().with(
        MEETUP,
        Extraction {
            nouns: vec![
                noun("Dana", NounType::Person, "dana"),
                noun("Eli", NounType::Person, "eli"),
                noun("Rust meetup", NounType::Thing, "rust meetup"),
            ],
            relationships: vec![
                rel("Dana", "met", "Eli", "meet"),
                rel("Eli", "attended", "Rust meetup", "attend"),
            ],
        },
    );
    api::router(helpers::app_state(&db, extractor, answer))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body)).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(json!({}));
    (status, json)
}

async fn post_transcript(app: &Router, uid: &str, payload: Value) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/webhook/transcript?uid={uid}"),
        Some(payload.to_string()),
    )
    .await
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app("");
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn webhook_stores_transcript_and_returns_201() {
    let app = app("");
    let (status, body) = post_transcript(&app, "u1", session_payload("s1", MEETUP)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Transcript stored successfully");
    let id = body["transcriptId"].as_str().unwrap();
    assert_eq!(body["report"]["transcriptId"], id);
    assert_eq!(body["report"]["nounsCreated"], 3);
    assert_eq!(body["report"]["relationshipsStored"], 2);

    let (status, listed) = send(&app, "GET", "/transcripts?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id);
    assert_eq!(listed[0]["sessionId"], "s1");
    assert!(listed[0]["embeddingDims"].as_u64().unwrap() > 0);
    assert!(listed[0].get("embedding").is_none());
}

#[tokio::test]
async fn webhook_requires_uid() {
    let app = app("");
    let (status, body) = send(
        &app,
        "POST",
        "/webhook/transcript",
        Some(session_payload("s1", MEETUP).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User ID (uid) is required as a query parameter");
}

#[tokio::test]
async fn webhook_rejects_malformed_or_empty_transcripts() {
    let app = app("");

    let (status, body) = send(
        &app,
        "POST",
        "/webhook/transcript?uid=u1",
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid transcript data");

    let (status, body) = post_transcript(&app, "u1", json!({ "sessionId": "s1", "segments": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid transcript data");

    let (_, listed) = send(&app, "GET", "/transcripts", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn graph_returns_nodes_and_edges_for_user() {
    let app = app("");
    post_transcript(&app, "u1", session_payload("s1", MEETUP)).await;

    let (status, body) = send(&app, "GET", "/graph?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(body["edges"].as_array().unwrap().len(), 2);
    assert!(body["edges"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["label"] == "met"));

    let (status, other) = send(&app, "GET", "/graph?userId=u2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(other["nodes"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/graph", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn search_answers_with_pruned_graph() {
    let app = app("Dana met Eli.");
    post_transcript(&app, "u1", session_payload("s1", MEETUP)).await;

    let (status, body) = send(&app, "GET", "/search?userId=u1&query=Who%20did%20Dana%20meet", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Dana met Eli.");
    let edges = body["graphData"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["label"], "met");
    assert_eq!(body["graphData"]["nodes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_requires_query_and_user() {
    let app = app("");

    let (status, _) = send(&app, "GET", "/search?userId=u1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/search?query=hello", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/search?userId=u1&query=%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_can_be_created_and_fetched() {
    let app = app("");

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "name": "Ada", "email": "ada@example.com" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["userId"].as_str().unwrap().to_string();

    let (status, user) = send(&app, "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["email"], "ada@example.com");

    let (status, all) = send(&app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/users/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "POST", "/users", Some(json!({ "name": "Bo" }).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name and email are required");
}

#[tokio::test]
async fn webhook_hides_pipeline_failures_behind_generic_500() {
    let db = helpers::test_db();
    let app = api::router(helpers::app_state(&db, CannedExtractor::failing(), ""));

    let (status, body) = post_transcript(&app, "u1", session_payload("s1", MEETUP)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to store transcript" }));
}

#[tokio::test]
async fn search_hides_generation_failures_behind_generic_500() {
    let db = helpers::test_db();
    let embedder: Arc<BagOfWordsEmbedder> = Arc::new(BagOfWordsEmbedder::default());
    let ingestor = helpers::ingestor(
        &db,
        embedder.clone(),
        CannedExtractor::default(),
        OrphanPolicy::KeepOrphan,
    );
    let answers = AnswerEngine::new(
        Arc::clone(&db),
        embedder,
        Arc::new(FailingAnswer),
        Arc::new(SubstringEvidenceFilter),
    );
    let app = api::router(AppState::new(Arc::clone(&db), Arc::new(ingestor), Arc::new(answers)));
    post_transcript(&app, "u1", session_payload("s1", MEETUP)).await;

    let (status, body) = send(&app, "GET", "/search?userId=u1&query=Dana", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to answer query" }));
}

#[tokio::test]
async fn webhook_accepts_numeric_device_ids() {
    let app = app("");
    let payload = json!({
        "id": 42,
        "structured": { "title": "Meetup", "overview": MEETUP },
        "transcript_segments": [{ "text": "hi", "speaker": "SPEAKER_0" }]
    });

    let (status, _) = post_transcript(&app, "u1", payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = send(&app, "GET", "/transcripts?userId=u1", None).await;
    assert_eq!(listed[0]["sessionId"], "42");
}
