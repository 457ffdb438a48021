//! Integration tests for the HTTP directory client against a stub chat service.

use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

use hiroba_client::{
    domain::{DirectoryError, DirectoryService, MessageType, RoomId, Username},
    infrastructure::{DirectoryConfig, HttpDirectoryClient},
};

/// Requests seen by the stub, in arrival order
type Calls = Arc<Mutex<Vec<String>>>;

fn room_json(id: i64, name: &str, participants: &[&str]) -> Value {
    json!({
        "id": id,
        "roomName": name,
        "createdAt": "2024-01-01T09:00:00",
        "participants": participants,
    })
}

fn message_json(room_id: i64, sender: &str, content: &str, timestamp: &str) -> Value {
    json!({
        "roomId": room_id,
        "sender": sender,
        "content": content,
        "type": "CHAT",
        "timestamp": timestamp,
    })
}

async fn list_rooms() -> Json<Value> {
    Json(json!([
        room_json(3, "general", &["carol", "alice"]),
        room_json(9, "random", &[]),
    ]))
}

async fn user_rooms(State(calls): State<Calls>, Path(username): Path<String>) -> Json<Value> {
    calls.lock().push(format!("user-rooms {}", username));
    Json(json!([room_json(3, "general", &[username.as_str()])]))
}

async fn get_room(Path(id): Path<i64>) -> Response {
    if id == 404 {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(room_json(id, "general", &["alice"])).into_response()
}

async fn create_room(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    calls.lock().push(format!("create {}", body));
    let name = body["roomName"].as_str().unwrap_or_default().to_string();
    let creator = body["creator"].as_str().unwrap_or_default().to_string();
    Json(room_json(11, &name, &[creator.as_str()]))
}

async fn join_room(
    State(calls): State<Calls>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    calls.lock().push(format!("join {} {}", id, body["username"]));
    StatusCode::OK
}

async fn leave_room(
    State(calls): State<Calls>,
    Path((id, username)): Path<(i64, String)>,
) -> StatusCode {
    if id == 13 {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    calls.lock().push(format!("leave {} {}", id, username));
    StatusCode::NO_CONTENT
}

async fn recent_messages(
    State(calls): State<Calls>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    calls
        .lock()
        .push(format!("recent {} limit={:?}", id, params.get("limit")));
    Json(json!([
        message_json(id, "bob", "second", "2024-01-01T09:01:00"),
        message_json(id, "alice", "first", "2024-01-01T09:00:00"),
    ]))
}

async fn all_messages(Path(id): Path<i64>) -> Response {
    if id == 99 {
        return "not json".into_response();
    }
    Json(json!([
        message_json(id, "bob", "third", "2024-01-01T09:02:00"),
        {"roomId": id, "sender": "carol", "content": null, "type": "JOIN", "timestamp": null},
    ]))
    .into_response()
}

/// Start the stub service on an ephemeral port and return a client for it
async fn start_stub() -> (HttpDirectoryClient, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/user/{username}", get(user_rooms))
        .route("/api/rooms/{id}", get(get_room))
        .route("/api/rooms/{id}/participants", post(join_room))
        .route("/api/rooms/{id}/participants/{username}", delete(leave_room))
        .route("/api/messages/{id}/recent", get(recent_messages))
        .route("/api/messages/{id}", get(all_messages))
        .with_state(Arc::clone(&calls));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = DirectoryConfig::new(format!("http://{}/api", addr));
    (HttpDirectoryClient::new(config).unwrap(), calls)
}

fn username(name: &str) -> Username {
    Username::new(name.to_string()).unwrap()
}

#[tokio::test]
async fn test_list_rooms() {
    // テスト項目: ルーム一覧が取得され、参加者が整列される
    // given (前提条件):
    let (client, _calls) = start_stub().await;

    // when (操作):
    let rooms = client.list_rooms().await.unwrap();

    // then (期待する結果):
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].id, RoomId::new(3));
    assert_eq!(rooms[0].name, "general");
    assert_eq!(rooms[0].participants, vec!["alice", "carol"]);
    assert_eq!(rooms[1].participant_count(), 0);
}

#[tokio::test]
async fn test_list_user_rooms_encodes_username() {
    // テスト項目: ユーザー名がパスとしてエンコードされ、サーバー側で元に戻る
    // given (前提条件):
    let (client, calls) = start_stub().await;

    // when (操作):
    let rooms = client.list_user_rooms(&username("al ice")).await.unwrap();

    // then (期待する結果):
    assert_eq!(rooms.len(), 1);
    assert_eq!(calls.lock().as_slice(), ["user-rooms al ice"]);
}

#[tokio::test]
async fn test_get_missing_room_is_not_found() {
    // テスト項目: 存在しないルームの取得は NotFound になる
    // given (前提条件):
    let (client, _calls) = start_stub().await;

    // when (操作):
    let result = client.get_room(RoomId::new(404)).await;

    // then (期待する結果):
    assert!(matches!(result, Err(DirectoryError::NotFound(url)) if url.ends_with("/api/rooms/404")));
}

#[tokio::test]
async fn test_create_room_sends_name_and_creator() {
    // テスト項目: ルーム作成でルーム名と作成者が送信され、作成されたルームが返る
    // given (前提条件):
    let (client, calls) = start_stub().await;

    // when (操作):
    let room = client.create_room("study", &username("alice")).await.unwrap();

    // then (期待する結果):
    assert_eq!(room.id, RoomId::new(11));
    assert_eq!(room.name, "study");
    assert!(room.has_participant(&username("alice")));
    let calls = calls.lock();
    let body: Value = serde_json::from_str(calls[0].trim_start_matches("create ")).unwrap();
    assert_eq!(body, json!({"roomName": "study", "creator": "alice"}));
}

#[tokio::test]
async fn test_join_and_leave_membership() {
    // テスト項目: メンバー登録と削除がそれぞれのエンドポイントに送信される
    // given (前提条件):
    let (client, calls) = start_stub().await;
    let alice = username("alice");

    // when (操作):
    client.join_room(RoomId::new(7), &alice).await.unwrap();
    client.leave_room(RoomId::new(7), &alice).await.unwrap();

    // then (期待する結果):
    assert_eq!(
        calls.lock().as_slice(),
        ["join 7 \"alice\"", "leave 7 alice"]
    );
}

#[tokio::test]
async fn test_leave_failure_reports_status() {
    // テスト項目: サーバーエラーはステータスコード付きのエラーになる
    // given (前提条件):
    let (client, _calls) = start_stub().await;

    // when (操作):
    let result = client.leave_room(RoomId::new(13), &username("alice")).await;

    // then (期待する結果):
    assert!(matches!(
        result,
        Err(DirectoryError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_recent_messages_passes_limit() {
    // テスト項目: 直近の履歴取得で件数が送信され、新しい順のまま返される
    // given (前提条件):
    let (client, calls) = start_stub().await;

    // when (操作):
    let messages = client.recent_messages(RoomId::new(7), 50).await.unwrap();

    // then (期待する結果):
    let contents: Vec<_> = messages.iter().map(|m| m.content()).collect();
    assert_eq!(contents, vec!["second", "first"]);
    assert_eq!(calls.lock().as_slice(), ["recent 7 limit=Some(\"50\")"]);
}

#[tokio::test]
async fn test_all_messages_accepts_null_fields() {
    // テスト項目: 全履歴の取得で null の本文・時刻が空文字として扱われる
    // given (前提条件):
    let (client, _calls) = start_stub().await;

    // when (操作):
    let messages = client.all_messages(RoomId::new(7)).await.unwrap();

    // then (期待する結果):
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].message_type(), MessageType::Join);
    assert_eq!(messages[1].content(), "");
    assert_eq!(messages[1].timestamp(), "");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    // テスト項目: JSON でない応答はデコードエラーになる
    // given (前提条件):
    let (client, _calls) = start_stub().await;

    // when (操作):
    let result = client.all_messages(RoomId::new(99)).await;

    // then (期待する結果):
    assert!(matches!(result, Err(DirectoryError::Decode(_))));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    // テスト項目: 接続できないサービスへのリクエストはネットワークエラーになる
    // given (前提条件):
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client =
        HttpDirectoryClient::new(DirectoryConfig::new(format!("http://{}/api", addr))).unwrap();

    // when (操作):
    let result = client.list_rooms().await;

    // then (期待する結果):
    assert!(matches!(result, Err(DirectoryError::Network(_))));
}
