//! Integration tests for the library API
//!
//! These tests require a running server on BASE_URL backed by a database,
//! with an admin account created from ADMIN_EMAIL / ADMIN_PASSWORD.
//! Run with `cargo test --test api_tests -- --ignored`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api";

fn admin_credentials() -> (String, String) {
    (
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@library.local".to_string()),
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
    )
}

/// Suffix that keeps emails and ISBNs unique across runs
fn unique() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", nanos % 1_000_000_000_000)
}

async fn get_auth_token(client: &Client) -> String {
    let (email, password) = admin_credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["token"].as_str().unwrap().to_string()
}

async fn create_book(client: &Client, token: &str, total_copies: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "The Left Hand of Darkness",
            "author": "Ursula K. Le Guin",
            "isbn": unique(),
            "published_year": 1969,
            "total_copies": total_copies
        }))
        .send()
        .await
        .expect("Failed to create book");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn create_member(client: &Client, token: &str) -> Value {
    let response = client
        .post(format!("{}/members", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": "Test Reader",
            "email": format!("reader{}@example.com", unique())
        }))
        .send()
        .await
        .expect("Failed to create member");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

/// Sign up a fresh member, returning its token and member id
async fn sign_up(client: &Client) -> (String, i64) {
    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "email": format!("member{}@example.com", unique()),
            "password": "secret123",
            "name": "Signed Up Reader"
        }))
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["member_id"].as_i64().unwrap(),
    )
}

async fn borrow(client: &Client, token: &str, book_id: i64, member_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/borrowings", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "book_id": book_id, "member_id": member_id }))
        .send()
        .await
        .expect("Failed to send borrow request")
}

async fn give_back(client: &Client, token: &str, borrowing_id: i64) -> reqwest::Response {
    client
        .put(format!("{}/borrowings/{}/return", BASE_URL, borrowing_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send return request")
}

async fn available_copies(client: &Client, book_id: i64) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to fetch book");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["available_copies"].as_i64().unwrap()
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();
    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_success() {
    let client = Client::new();
    let (email, password) = admin_credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = admin_credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_signup_then_duplicate() {
    let client = Client::new();
    let email = format!("signup{}@example.com", unique());
    let payload = json!({ "email": email, "password": "secret123", "name": "New Reader" });

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "member");
    assert!(body["user"]["member_id"].is_i64());

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_list_books_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?per_page=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_book_write_requires_admin() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "Anonymous", "author": "Nobody" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrowing_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book = create_book(&client, &token, 2).await;
    let book_id = book["id"].as_i64().unwrap();
    assert_eq!(book["available_copies"], 2);

    let first_member = create_member(&client, &token).await["id"].as_i64().unwrap();
    let second_member = create_member(&client, &token).await["id"].as_i64().unwrap();
    let third_member = create_member(&client, &token).await["id"].as_i64().unwrap();

    let response = borrow(&client, &token, book_id, first_member).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["status"], "borrowed");
    assert_eq!(first["is_overdue"], false);

    // The same member cannot hold two copies of one title
    let response = borrow(&client, &token, book_id, first_member).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = borrow(&client, &token, book_id, second_member).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(available_copies(&client, book_id).await, 0);

    let response = borrow(&client, &token, book_id, third_member).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Conflict");

    let first_id = first["id"].as_i64().unwrap();
    let response = give_back(&client, &token, first_id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["status"], "returned");
    assert!(returned["return_date"].is_string());
    assert_eq!(available_copies(&client, book_id).await, 1);

    let response = give_back(&client, &token, first_id).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(available_copies(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_returned_borrowing_keeps_stock() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, 1).await["id"].as_i64().unwrap();
    let member_id = create_member(&client, &token).await["id"].as_i64().unwrap();

    let borrowing: Value = borrow(&client, &token, book_id, member_id)
        .await
        .json()
        .await
        .unwrap();
    let borrowing_id = borrowing["id"].as_i64().unwrap();

    assert_eq!(give_back(&client, &token, borrowing_id).await.status(), StatusCode::OK);
    assert_eq!(available_copies(&client, book_id).await, 1);

    let response = client
        .delete(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(available_copies(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_active_borrowing_restores_copy() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, 1).await["id"].as_i64().unwrap();
    let member_id = create_member(&client, &token).await["id"].as_i64().unwrap();

    let borrowing: Value = borrow(&client, &token, book_id, member_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(available_copies(&client, book_id).await, 0);

    let response = client
        .delete(format!("{}/borrowings/{}", BASE_URL, borrowing["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(available_copies(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_member_with_active_borrowing_cannot_be_deleted() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book_id = create_book(&client, &token, 1).await["id"].as_i64().unwrap();
    let member_id = create_member(&client, &token).await["id"].as_i64().unwrap();
    assert_eq!(
        borrow(&client, &token, book_id, member_id).await.status(),
        StatusCode::CREATED
    );

    let response = client
        .delete(format!("{}/members/{}", BASE_URL, member_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_stats_is_public() {
    let client = Client::new();

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["available_books"].is_i64());
    assert!(body["overdue_books"].is_i64());
}

#[tokio::test]
#[ignore]
async fn test_signin_alias() {
    let client = Client::new();
    let (email, password) = admin_credentials();

    let response = client
        .post(format!("{}/auth/signin", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_members_cannot_touch_each_others_borrowings() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;

    let (_, owner_member) = sign_up(&client).await;
    let (other_token, _) = sign_up(&client).await;

    let book_id = create_book(&client, &admin, 1).await["id"].as_i64().unwrap();
    let response = borrow(&client, &admin, book_id, owner_member).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let borrowing: Value = response.json().await.unwrap();
    let borrowing_id = borrowing["id"].as_i64().unwrap();

    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = give_back(&client, &other_token, borrowing_id).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(available_copies(&client, book_id).await, 0);

    let response = client
        .get(format!("{}/borrowings?member_id={}", BASE_URL, owner_member))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let ids: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .collect();
    assert!(!ids.contains(&borrowing_id));

    // The admin can still see and close it
    let response = client
        .get(format!("{}/borrowings/{}", BASE_URL, borrowing_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(give_back(&client, &admin, borrowing_id).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_member_cannot_set_fine() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let (token, member_id) = sign_up(&client).await;

    let book_id = create_book(&client, &admin, 1).await["id"].as_i64().unwrap();
    let borrowing: Value = borrow(&client, &admin, book_id, member_id)
        .await
        .json()
        .await
        .unwrap();

    let response = client
        .put(format!("{}/borrowings/{}/return", BASE_URL, borrowing["id"]))
        .bearer_auth(&token)
        .json(&json!({ "fine_amount": "0" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(available_copies(&client, book_id).await, 0);

    // Without an override the member returns their own book
    let response = give_back(&client, &token, borrowing["id"].as_i64().unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(available_copies(&client, book_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_admin_cannot_demote_self_through_member_profile() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;

    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Give the admin a member profile first
    let response = client
        .put(format!("{}/profile", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Head Librarian" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me_after: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let member_id = me_after["member_id"].as_i64().unwrap();
    assert_eq!(me["id"], me_after["id"]);

    let response = client
        .put(format!("{}/members/{}", BASE_URL, member_id))
        .bearer_auth(&admin)
        .json(&json!({ "update_user_account": true, "role": "member" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/members/{}", BASE_URL, member_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/members/{}/user", BASE_URL, member_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let account: Value = response.json().await.unwrap();
    assert_eq!(account["has_user_account"], true);
    assert_eq!(account["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_never_oversell() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;

    let book_id = create_book(&client, &admin, 2).await["id"].as_i64().unwrap();
    let mut members = Vec::new();
    for _ in 0..6 {
        members.push(create_member(&client, &admin).await["id"].as_i64().unwrap());
    }

    let handles: Vec<_> = members
        .into_iter()
        .map(|member_id| {
            let client = client.clone();
            let admin = admin.clone();
            tokio::spawn(async move { borrow(&client, &admin, book_id, member_id).await.status() })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 2);
    assert_eq!(conflicts, 4);
    assert_eq!(available_copies(&client, book_id).await, 0);
}
