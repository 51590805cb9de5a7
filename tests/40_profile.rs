mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn get_profile_hides_credentials() -> Result<()> {
    let server = common::spawn_server().await?;
    let (user, token) = server.user("alice@example.com").await?;

    let res = server
        .client
        .get(server.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["id"], user.id.to_string());
    assert!(body.get("password_hash").is_none(), "leaked secret: {}", body);
    Ok(())
}

#[tokio::test]
async fn update_email_returns_new_address() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("alice@example.com").await?;

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "alice@new.example" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!("alice@new.example"));

    let res = server
        .client
        .get(server.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["email"], "alice@new.example");
    Ok(())
}

#[tokio::test]
async fn omitted_email_is_untouched_but_empty_email_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("alice@example.com").await?;

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body, json!("alice@example.com"));

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["field_errors"]["email"].is_string(), "missing field error: {}", body);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.user("alice@example.com").await?;
    server.user("bob@example.com").await?;

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn deleted_user_gets_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let (user, token) = server.user("gone@example.com").await?;
    server.store.remove_user(user.id).await;

    let res = server
        .client
        .get(server.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "back@example.com" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
