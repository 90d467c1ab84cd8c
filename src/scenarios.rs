//! End-to-end flows over the assembled router, served on a loopback socket.

use std::net::SocketAddr;

use serde_json::{json, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::{
    app::build_app,
    state::AppState,
    workouts::repo_types::{WorkoutEntry, WorkoutInput},
};

struct Reply {
    status: u16,
    head: String,
    body: Value,
}

async fn spawn(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(state)).await.unwrap();
    });
    addr
}

async fn call(
    addr: SocketAddr,
    method: &str,
    path: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(auth) = auth {
        req.push_str(&format!("Authorization: {auth}\r\n"));
    }
    if !body.is_empty() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let (head, payload) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    Reply {
        status,
        head: head.to_ascii_lowercase(),
        body: serde_json::from_str(payload).unwrap_or(Value::Null),
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

async fn register_and_login(addr: SocketAddr, username: &str, password: &str) -> String {
    let res = call(
        addr,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        })),
    )
    .await;
    assert_eq!(res.status, 201);

    let res = call(
        addr,
        "POST",
        "/tokens/authentication",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(res.status, 201);
    res.body["auth_token"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn alice_cannot_delete_someone_elses_workout() {
    let state = AppState::fake();
    let foreign = state
        .workouts
        .create_workout(
            42,
            &WorkoutInput {
                title: "not alice's".into(),
                description: String::new(),
                duration_minutes: 30,
                calories_burned: 200,
                entries: vec![WorkoutEntry {
                    id: 0,
                    exercise_name: "row".into(),
                    sets: 1,
                    reps: None,
                    duration_seconds: Some(1800),
                    weight: None,
                    notes: String::new(),
                    order_index: 0,
                }],
            },
        )
        .await
        .unwrap();
    let addr = spawn(state.clone()).await;

    let res = call(
        addr,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(res.status, 201);
    assert_eq!(res.body["user"]["username"], "alice");
    assert!(res.body["user"].get("password_hash").is_none());

    let res = call(
        addr,
        "POST",
        "/tokens/authentication",
        None,
        Some(json!({ "username": "alice", "password": "secret123" })),
    )
    .await;
    assert_eq!(res.status, 201);
    let token = res.body["auth_token"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let res = call(addr, "GET", "/users/me", Some(&bearer(&token)), None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["user"]["username"], "alice");
    assert!(res.head.contains("vary: authorization"));

    let path = format!("/workouts/{}", foreign.id);
    let res = call(addr, "DELETE", &path, Some(&bearer(&token)), None).await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["error"], "not authorized");
    assert!(state.workouts.get_workout_by_id(foreign.id).await.unwrap().is_some());
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let addr = spawn(AppState::fake()).await;
    register_and_login(addr, "alice", "secret123").await;

    let wrong_password = call(
        addr,
        "POST",
        "/tokens/authentication",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    let unknown_user = call(
        addr,
        "POST",
        "/tokens/authentication",
        None,
        Some(json!({ "username": "mallory", "password": "secret123" })),
    )
    .await;

    assert_eq!(wrong_password.status, 401);
    assert_eq!(unknown_user.status, 401);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "invalid credentials");
}

#[tokio::test]
async fn bearer_header_edge_cases() {
    let addr = spawn(AppState::fake()).await;

    let res = call(addr, "GET", "/users/me", None, None).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error"], "authentication required");

    let res = call(addr, "GET", "/users/me", Some("Bearer "), None).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error"], "invalid authorization header");

    let res = call(addr, "GET", "/users/me", Some("Token abc"), None).await;
    assert_eq!(res.body["error"], "invalid authorization header");

    let res = call(addr, "GET", "/users/me", Some("Bearer abc"), None).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error"], "invalid or expired token");
    assert!(res.head.contains("vary: authorization"));
}

#[tokio::test]
async fn anonymous_can_read_but_not_write() {
    let addr = spawn(AppState::fake()).await;
    let token = register_and_login(addr, "alice", "secret123").await;

    let res = call(
        addr,
        "POST",
        "/workouts",
        Some(&bearer(&token)),
        Some(json!({
            "title": "push day",
            "user_id": 999,
            "entries": [{ "exercise_name": "bench", "sets": 3, "reps": 5 }],
        })),
    )
    .await;
    assert_eq!(res.status, 201);
    let id = res.body["workout"]["id"].as_i64().unwrap();
    assert_eq!(res.body["workout"]["user_id"], 1);

    let path = format!("/workouts/{id}");
    let res = call(addr, "GET", &path, None, None).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["workout"]["title"], "push day");

    let res = call(addr, "PUT", &path, None, Some(json!({ "title": "stolen" }))).await;
    assert_eq!(res.status, 401);

    let res = call(addr, "PUT", &path, Some(&bearer(&token)), Some(json!({ "title": "pull day" }))).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["workout"]["title"], "pull day");

    let res = call(addr, "DELETE", &path, Some(&bearer(&token)), None).await;
    assert_eq!(res.status, 204);

    let res = call(addr, "GET", &path, None, None).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let addr = spawn(AppState::fake()).await;
    let token = register_and_login(addr, "alice", "secret123").await;

    let res = call(addr, "DELETE", "/tokens/authentication", Some(&bearer(&token)), None).await;
    assert_eq!(res.status, 204);

    let res = call(addr, "GET", "/users/me", Some(&bearer(&token)), None).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error"], "invalid or expired token");
}

#[tokio::test]
async fn health_is_public() {
    let addr = spawn(AppState::fake()).await;
    let res = call(addr, "GET", "/health", Some("garbage"), None).await;
    assert_eq!(res.status, 200);
}
