mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chitchat::models::Role;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn ping_answers_pong() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "code": 200, "message": "success", "data": "pong" }));
}

#[tokio::test]
async fn register_issues_a_token_the_gate_accepts() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "email": "alice@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password_hash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, me) = app
        .send(Method::GET, "/api/v1/users/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["username"], "alice");
}

#[tokio::test]
async fn duplicate_registration_is_a_bad_request() {
    let app = TestApp::new();
    app.store.add_user("alice", Role::User);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "alice", "email": "new@example.com", "password": "secret1" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "username already exists");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "bob", "email": "alice@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email already exists");
}

#[tokio::test]
async fn register_validates_fields() {
    let app = TestApp::new();
    for payload in [
        json!({ "username": "al", "email": "al@example.com", "password": "secret1" }),
        json!({ "username": "alice", "email": "not-an-email", "password": "secret1" }),
        json!({ "username": "alice", "email": "alice@example.com", "password": "short" }),
    ] {
        let (status, body) = app
            .send(Method::POST, "/api/v1/auth/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }
}

#[tokio::test]
async fn login_round_trip_and_failures_look_alike() {
    let app = TestApp::new();
    app.send(
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "username": "alice", "email": "alice@example.com", "password": "secret1" })),
    )
    .await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some());

    let (status, wrong_password) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unknown_user) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "secret1" })),
        )
        .await;
    assert_eq!(wrong_password["message"], unknown_user["message"]);
}

#[tokio::test]
async fn stub_endpoints_answer_not_implemented() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice", Role::User);

    for (method, uri) in [
        (Method::POST, "/api/v1/posts/1/like"),
        (Method::DELETE, "/api/v1/comments/1/like"),
        (Method::GET, "/api/v1/notifications"),
        (Method::PUT, "/api/v1/notifications/read-all"),
        (Method::POST, "/api/v1/follows/2"),
        (Method::GET, "/api/v1/follows/followers"),
    ] {
        let (status, body) = app.send(method.clone(), uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{method} {uri}");
        assert_eq!(body["code"], 501);
    }

    let (status, _) = app
        .send(Method::POST, "/api/v1/posts/1/like", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_gets_not_found_envelope() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn malformed_input_is_rejected_inside_the_envelope() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice", Role::User);

    let (status, body) = app.send(Method::GET, "/api/v1/posts/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(&token),
            Some(json!({ "title": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = app
        .send(Method::GET, "/api/v1/posts?page=first", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_lifecycle_over_http_keeps_counters() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("alice", Role::User);
    let (_, other) = app.user_with_token("bob", Role::User);
    let tech = app.store.add_category("Tech");
    let life = app.store.add_category("Life");

    let (status, created) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(&token),
            Some(json!({ "title": "Hi", "content": "Body", "category_id": tech.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let post_id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["author_name"], "alice");
    assert_eq!(app.store.post_count(tech.id), 1);

    let uri = format!("/api/v1/posts/{post_id}");
    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&other),
            Some(json!({ "category_id": life.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
    assert_eq!(app.store.post_count(tech.id), 1);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "category_id": life.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.post_count(tech.id), 0);
    assert_eq!(app.store.post_count(life.id), 1);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "post deleted");
    assert_eq!(app.store.post_count(life.id), 0);

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_list_envelope_carries_meta() {
    let app = TestApp::new();
    let (user, _) = app.user_with_token("alice", Role::User);
    for _ in 0..3 {
        app.store.add_post(user.id, None);
    }

    let (status, body) = app
        .send(Method::GET, "/api/v1/posts?page=2&page_size=2", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"], json!({ "total": 3, "page": 2, "page_size": 2 }));
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn page_past_the_end_is_an_empty_page() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("alice", Role::User);
    let post = app.store.add_post(user.id, None);

    for (uri, items) in [
        ("/api/v1/posts?page=9223372036854775807".to_string(), "posts"),
        (format!("/api/v1/users/{}/posts?page=9223372036854775807", user.id), "posts"),
        (format!("/api/v1/posts/{}/comments?page=9223372036854775807", post.id), "comments"),
        ("/api/v1/users?page=9223372036854775807&page_size=100".to_string(), "users"),
    ] {
        let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["code"], 200);
        assert!(body["data"][items].as_array().unwrap().is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn viewing_a_post_bumps_its_view_count_in_the_background() {
    let app = TestApp::new();
    let (user, _) = app.user_with_token("alice", Role::User);
    let post = app.store.add_post(user.id, None);

    let (status, _) = app
        .send(Method::GET, &format!("/api/v1/posts/{}", post.id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut views = 0;
    for _ in 0..50 {
        views = app.store.post(post.id).unwrap().view_count;
        if views == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(views, 1);
}

#[tokio::test]
async fn comments_flow_over_http() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("alice", Role::User);
    let post = app.store.add_post(user.id, None);

    let (status, root) = app
        .send(
            Method::POST,
            "/api/v1/comments",
            Some(&token),
            Some(json!({ "post_id": post.id, "content": "nice" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let root_id = root["data"]["id"].as_i64().unwrap();

    app.send(
        Method::POST,
        "/api/v1/comments",
        Some(&token),
        Some(json!({ "post_id": post.id, "content": "agreed", "parent_id": root_id })),
    )
    .await;

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/v1/posts/{}/comments", post.id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["comments"][0]["comment"]["id"], root_id);
    assert_eq!(body["data"]["comments"][0]["replies"][0]["content"], "agreed");
}

#[tokio::test]
async fn admin_manages_categories_and_users() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("root", Role::Admin);
    let (target, _) = app.user_with_token("bob", Role::User);
    let tech = app.store.add_category("Tech");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/admin/categories/{}", tech.id),
            Some(&admin),
            Some(json!({ "name": "", "description": "All things tech" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Tech");
    assert_eq!(body["data"]["description"], "All things tech");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/admin/users/{}/role", target.id),
            Some(&admin),
            Some(json!({ "role": "overlord" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/admin/users/{}/role", target.id),
            Some(&admin),
            Some(json!({ "role": "moderator" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "moderator");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/admin/users/{}", target.id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.user(target.id).is_none());
}
