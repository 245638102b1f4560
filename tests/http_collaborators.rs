//! Video token and syllabus endpoints against a mock server.

#[macro_use]
mod common;

use chessroom::client::ClassroomApi;
use chessroom::shared::{AppConfig, ClassroomError};
use common::lesson;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_for(server: &MockServer) -> ClassroomApi {
    let config = assert_ok!(AppConfig::builder().server_url(server.uri()).build());
    ClassroomApi::new(&config)
}

#[tokio::test]
async fn test_fetch_video_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/livekit/token"))
        .and(query_param("roomId", common::LESSON))
        .and(header("Authorization", "Bearer session-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "lk-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server).await.with_bearer("session-jwt");
    let token = assert_ok!(api.fetch_video_token(&lesson()).await);
    assert_eq!(token, "lk-123");
}

#[tokio::test]
async fn test_fetch_syllabus_chapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/syllabus/course/c-7"))
        .and(query_param("level", "beginner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "_id": "ch1", "name": "Opening principles", "pgn": "1. e4 e5 2. Nf3" },
                { "_id": "ch2", "name": "Lucena", "pgn": "", "fen": "1K1k4/1P6/8/8/8/8/r7/2R5 w - - 0 1" }
            ]
        })))
        .mount(&server)
        .await;

    let chapters = assert_ok!(api_for(&server).await.fetch_syllabus("c-7", "beginner").await);
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].id.as_deref(), Some("ch1"));
    assert_eq!(chapters[1].payload(), Some("1K1k4/1P6/8/8/8/8/r7/2R5 w - - 0 1"));
}

#[tokio::test]
async fn test_fetch_syllabus_techniques_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/syllabus/course/c-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "techniques": [ { "name": "Pin", "pgn": "1. d4" } ] }
        })))
        .mount(&server)
        .await;

    let chapters = assert_ok!(api_for(&server).await.fetch_syllabus("c-9", "advanced").await);
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].name, "Pin");
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/livekit/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("not enrolled"))
        .mount(&server)
        .await;

    let result = api_for(&server).await.fetch_video_token(&lesson()).await;
    match result {
        Err(ClassroomError::ApiError { status, message }) => {
            assert_eq!(status, 403);
            assert_contains!(message, "not enrolled");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_course_id_is_rejected_without_request() {
    let server = MockServer::start().await;
    let result = api_for(&server).await.fetch_syllabus("  ", "beginner").await;
    assert_err!(result, ClassroomError::ValidationError { .. });
    assert!(server.received_requests().await.unwrap().is_empty());
}
