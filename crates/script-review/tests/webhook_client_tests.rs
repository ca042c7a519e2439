/// Webhook client against an in-process axum server.
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use script_review::*;
use serde_json::{json, Value};
use std::sync::Arc;

type Received = Arc<Mutex<Vec<(String, Value)>>>;

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn webhook_router(received: Received) -> Router {
    Router::new()
        .route(
            "/webhook/frontend",
            post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().push(("frontend".to_string(), body));
                    Json(json!({
                        "content": { "text": "Hello" },
                        "videoUrl": "https://cdn.example/v1.mp4",
                        "responseId": "r1",
                        "timestamp": "t1"
                    }))
                },
            ),
        )
        .route(
            "/webhook/approve",
            post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().push(("approve".to_string(), body.clone()));
                    if body["status"] == "refine" {
                        Json(json!({ "text": "Shorter hello" }))
                    } else {
                        Json(json!({ "success": true }))
                    }
                },
            ),
        )
        .route(
            "/webhook/approve-video",
            post(
                |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().push(("approve-video".to_string(), body));
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/webhook/reject-video",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        )
        .with_state(received)
}

fn params() -> RequestParameters {
    RequestParameters::new("cats", Tone::Funny, Genre::Entertainment).unwrap()
}

#[tokio::test]
async fn test_generate_and_refine_over_http() {
    let received: Received = Arc::default();
    let base = spawn_server(webhook_router(received.clone())).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();

    let generated = client.generate(&GenerateRequest::new(&params())).await.unwrap();
    assert_eq!(generated.text, "Hello");
    assert_eq!(generated.video_url.as_deref(), Some("https://cdn.example/v1.mp4"));
    assert_eq!(generated.response_id, Some(CorrelationToken::new("r1")));

    let request = DecisionRequest {
        response_id: generated.response_id.clone(),
        content: models::ScriptContent {
            text: generated.text.clone(),
        },
        topic: "cats".to_string(),
        tone: Tone::Funny,
        genre: Genre::Entertainment,
        feedback: "make it shorter".to_string(),
        status: DecisionKind::Refine,
        timestamp: generated.response_timestamp.clone(),
    };
    let reply = client.submit_decision(&request).await.unwrap();
    assert_eq!(reply, DecisionReply::Refined("Shorter hello".to_string()));

    let approve = DecisionRequest {
        status: DecisionKind::Approved,
        feedback: String::new(),
        ..request
    };
    assert_eq!(
        client.submit_decision(&approve).await.unwrap(),
        DecisionReply::Acknowledged
    );

    let received = received.lock();
    let (_, generate_body) = &received[0];
    assert_eq!(generate_body["topic"], "cats");
    assert_eq!(generate_body["tone"], "Funny");
    assert_eq!(generate_body["genre"], "Entertainment");
    assert!(generate_body["id"].is_string());
    let (_, refine_body) = &received[1];
    assert_eq!(refine_body["responseId"], "r1");
    assert_eq!(refine_body["timestamp"], "t1");
    assert_eq!(refine_body["content"]["text"], "Hello");
    assert_eq!(refine_body["status"], "refine");
}

#[tokio::test]
async fn test_video_decisions_route_by_status() {
    let received: Received = Arc::default();
    let base = spawn_server(webhook_router(received.clone())).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();

    client
        .submit_video_decision(&VideoDecisionRequest {
            video_url: "v1".to_string(),
            status: VideoDecision::Approved,
        })
        .await
        .unwrap();
    assert_eq!(
        received.lock()[0],
        (
            "approve-video".to_string(),
            json!({ "videoUrl": "v1", "status": "approved" })
        )
    );

    let err = client
        .submit_video_decision(&VideoDecisionRequest {
            video_url: "v1".to_string(),
            status: VideoDecision::Rejected,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_non_json_generate_reply_is_a_failure() {
    let router = Router::new().route("/webhook/frontend", post(|| async { "<html>oops</html>" }));
    let base = spawn_server(router).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();

    let err = client
        .generate(&GenerateRequest::new(&params()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_loosely_typed_generate_reply_is_still_a_script() {
    let router = Router::new().route(
        "/webhook/frontend",
        post(|| async { Json(json!({ "content": "Hello", "videoUrl": 5, "responseId": "r1" })) }),
    );
    let base = spawn_server(router).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();
    let mut session = ReviewSession::new(Arc::new(client), ReviewConfig::with_base_url(&base));

    session.submit(params()).unwrap();
    assert_eq!(
        session.settle().await,
        vec![Transition::Generated { has_video: false }]
    );
    let draft = session.machine().session().unwrap().draft();
    assert_eq!(draft.committed_text(), "");
    assert_eq!(draft.response_id(), Some(&CorrelationToken::new("r1")));
}

#[tokio::test]
async fn test_refine_reply_without_text_is_a_failure() {
    let router = Router::new().route(
        "/webhook/approve",
        post(|| async { Json(json!({ "success": true })) }),
    );
    let base = spawn_server(router).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();

    let request = DecisionRequest {
        response_id: None,
        content: models::ScriptContent {
            text: "Hello".to_string(),
        },
        topic: "cats".to_string(),
        tone: Tone::Casual,
        genre: Genre::Tutorial,
        feedback: "shorter".to_string(),
        status: DecisionKind::Refine,
        timestamp: None,
    };
    let err = client.submit_decision(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_session_over_http_generate_failure() {
    let router = Router::new().route(
        "/webhook/frontend",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let base = spawn_server(router).await;
    let client = WebhookClient::new(&ReviewConfig::with_base_url(&base)).unwrap();
    let mut session = ReviewSession::new(Arc::new(client), ReviewConfig::with_base_url(&base));

    session.submit(params()).unwrap();
    assert_eq!(session.settle().await, vec![Transition::GenerateFailed]);
    assert_eq!(session.state(), ReviewState::Idle);
}
