//! Integration tests for the `/ndas` workflow.

mod common;

use axum::body::Body;
use axum::http::StatusCode;
use common::{authed, body_json, build_test_app, BUYER, OTHER_BUYER, SELLER};
use dealroom_core::repository::NdaRepository;
use dealroom_core::roles::ROLE_BUYER;
use dealroom_events::types::{NDA_REJECTED, NDA_REQUESTED, NDA_SENT, NDA_SIGNED};
use serde_json::json;

#[tokio::test]
async fn full_workflow_grants_access() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();

    // Nothing yet.
    let response = app
        .get(&format!("/api/v1/ndas/listing/{}/status", listing.id), &buyer)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["has_access"], false);
    assert!(json["data"]["nda"].is_null());

    let nda_id = app.signed_nda(listing.id, &buyer).await;

    let json = body_json(app.get(&format!("/api/v1/ndas/{nda_id}"), &buyer).await).await;
    assert_eq!(json["data"]["status"], "signed");
    assert_eq!(json["data"]["is_valid"], true);
    assert!(json["data"]["expires_at"].is_string());

    let json = body_json(
        app.get(&format!("/api/v1/ndas/listing/{}/status", listing.id), &buyer)
            .await,
    )
    .await;
    assert_eq!(json["data"]["has_access"], true);
    assert_eq!(json["data"]["nda"]["id"], nda_id);
}

#[tokio::test]
async fn request_is_idempotent() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();
    let body = json!({ "listing_id": listing.id });

    let first = app.post_json("/api/v1/ndas/request", &buyer, body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["data"]["message"], "NDA request submitted successfully");
    assert_eq!(first["data"]["nda"]["status"], "pending");

    let second = app.post_json("/api/v1/ndas/request", &buyer, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["data"]["message"], "NDA request already pending");
    assert_eq!(second["data"]["nda"]["id"], first["data"]["nda"]["id"]);
}

#[tokio::test]
async fn seller_cannot_request_own_listing() {
    let app = build_test_app();
    let listing = app.listing().await;

    let response = app
        .post_json(
            "/api/v1/ndas/request",
            &app.seller_token(),
            json!({ "listing_id": listing.id }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REQUESTER");
}

#[tokio::test]
async fn request_for_missing_listing_is_404() {
    let app = build_test_app();
    let response = app
        .post_json(
            "/api/v1/ndas/request",
            &app.buyer_token(),
            json!({ "listing_id": 999 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_records_forwarded_client() {
    let app = build_test_app();
    let listing = app.listing().await;

    let request = authed("POST", "/api/v1/ndas/request", &app.buyer_token())
        .header("content-type", "application/json")
        .header("x-forwarded-for", "1.2.3.4, 10.0.0.1")
        .header("user-agent", "integration-test/1.0")
        .body(Body::from(json!({ "listing_id": listing.id }).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let nda_id = body_json(response).await["data"]["nda"]["id"]
        .as_i64()
        .unwrap();

    let stored = app.store.find_nda(nda_id).await.unwrap().unwrap();
    assert_eq!(stored.ip_address.as_deref(), Some("1.2.3.4"));
    assert_eq!(stored.user_agent.as_deref(), Some("integration-test/1.0"));
}

#[tokio::test]
async fn only_listing_seller_may_send() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();
    let created = app
        .post_json(
            "/api/v1/ndas/request",
            &buyer,
            json!({ "listing_id": listing.id }),
        )
        .await;
    let nda_id = body_json(created).await["data"]["nda"]["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post_json(&format!("/api/v1/ndas/{nda_id}/send"), &buyer, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json(
            &format!("/api/v1/ndas/{nda_id}/send"),
            &app.seller_token(),
            json!({ "document_url": "https://files.example/nda.pdf" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "NDA sent to buyer");
    assert_eq!(json["data"]["nda"]["status"], "sent");
    assert_eq!(
        json["data"]["nda"]["document_url"],
        "https://files.example/nda.pdf"
    );

    // A second send is no longer valid.
    let response = app
        .post_json(
            &format!("/api/v1/ndas/{nda_id}/send"),
            &app.seller_token(),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn other_buyer_cannot_sign_or_read() {
    let app = build_test_app();
    let listing = app.listing().await;
    let created = app
        .post_json(
            "/api/v1/ndas/request",
            &app.buyer_token(),
            json!({ "listing_id": listing.id }),
        )
        .await;
    let nda_id = body_json(created).await["data"]["nda"]["id"]
        .as_i64()
        .unwrap();
    let stranger = app.token(OTHER_BUYER, ROLE_BUYER);

    let response = app
        .post_json(&format!("/api/v1/ndas/{nda_id}/sign"), &stranger, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get(&format!("/api/v1/ndas/{nda_id}"), &stranger).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_request_cannot_be_renewed() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();
    let mut events = app.event_bus.subscribe();

    let created = app
        .post_json(
            "/api/v1/ndas/request",
            &buyer,
            json!({ "listing_id": listing.id }),
        )
        .await;
    let nda_id = body_json(created).await["data"]["nda"]["id"]
        .as_i64()
        .unwrap();

    let response = app
        .post_json(
            &format!("/api/v1/ndas/{nda_id}/reject"),
            &app.seller_token(),
            json!({ "reason": "Buyer not qualified" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["nda"]["status"], "rejected");

    let requested = events.recv().await.unwrap();
    assert_eq!(requested.event_type, NDA_REQUESTED);
    let rejected = events.recv().await.unwrap();
    assert_eq!(rejected.event_type, NDA_REJECTED);
    assert_eq!(rejected.payload["reason"], "Buyer not qualified");

    let response = app
        .post_json(
            "/api/v1/ndas/request",
            &buyer,
            json!({ "listing_id": listing.id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "REQUEST_REJECTED");
}

#[tokio::test]
async fn lapsed_nda_reads_expired_and_renews() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();
    let nda_id = app.signed_nda(listing.id, &buyer).await;

    app.clock.advance(chrono::Duration::days(366));

    let json = body_json(app.get(&format!("/api/v1/ndas/{nda_id}"), &buyer).await).await;
    assert_eq!(json["data"]["status"], "expired");
    assert_eq!(json["data"]["is_valid"], false);

    // Signing a lapsed NDA is not allowed; it must be re-requested.
    let response = app
        .post_json(&format!("/api/v1/ndas/{nda_id}/sign"), &buyer, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post_json(
            "/api/v1/ndas/request",
            &buyer,
            json!({ "listing_id": listing.id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["message"], "NDA request renewed");
    assert_eq!(json["data"]["nda"]["id"], nda_id);
    assert_eq!(json["data"]["nda"]["status"], "pending");
}

#[tokio::test]
async fn sign_publishes_event_once() {
    let app = build_test_app();
    let listing = app.listing().await;
    let buyer = app.buyer_token();
    let mut events = app.event_bus.subscribe();

    let nda_id = app.signed_nda(listing.id, &buyer).await;
    let response = app
        .post_json(&format!("/api/v1/ndas/{nda_id}/sign"), &buyer, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["message"],
        "NDA already signed and valid"
    );

    let kinds: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.event_type)
        .collect();
    assert_eq!(kinds, vec![NDA_REQUESTED, NDA_SENT, NDA_SIGNED]);
}

#[tokio::test]
async fn list_as_buyer_and_as_seller() {
    let app = build_test_app();
    let listing = app.listing().await;
    let other_listing = app.store.seed_listing(SELLER, "Auto Shop").await;
    app.signed_nda(listing.id, &app.buyer_token()).await;
    app.post_json(
        "/api/v1/ndas/request",
        &app.token(OTHER_BUYER, ROLE_BUYER),
        json!({ "listing_id": other_listing.id }),
    )
    .await;

    let json = body_json(app.get("/api/v1/ndas", &app.buyer_token()).await).await;
    let mine = json["data"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["buyer_id"], BUYER);

    let seller = app.seller_token();
    let json = body_json(app.get("/api/v1/ndas?as_seller=true", &seller).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(
        app.get(
            &format!("/api/v1/ndas?as_seller=true&listing_id={}", other_listing.id),
            &seller,
        )
        .await,
    )
    .await;
    let scoped = json["data"].as_array().unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0]["buyer_id"], OTHER_BUYER);
}

#[tokio::test]
async fn inactive_account_is_rejected() {
    let app = build_test_app();
    let listing = app.listing().await;
    let token = dealroom_api::auth::jwt::generate_access_token(
        BUYER,
        ROLE_BUYER,
        false,
        &app.config.jwt,
    )
    .unwrap();

    let request = authed("POST", "/api/v1/ndas/request", &token)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "listing_id": listing.id }).to_string()))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Account is inactive");
}
