//! Integration tests for listings and the NDA-gated financials.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, SELLER};
use dealroom_core::roles::ROLE_ADMIN;
use serde_json::json;

fn listing_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Family-run bakery with two locations",
        "industry": "Food & Beverage",
        "location": "Austin, TX",
        "asking_price": 450000,
        "financials": { "revenue": 1200000, "profit": 210000 }
    })
}

#[tokio::test]
async fn seller_creates_draft_listing() {
    let app = build_test_app();

    let response = app
        .post_json("/api/v1/listings", &app.seller_token(), listing_body("Corner Bakery"))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Corner Bakery");
    assert_eq!(json["data"]["seller_id"], SELLER);
    assert_eq!(json["data"]["status"], "draft");
    // Financials are never part of the public view.
    assert!(json["data"].get("financials").is_none());
}

#[tokio::test]
async fn admin_may_create_but_buyer_may_not() {
    let app = build_test_app();

    let response = app
        .post_json("/api/v1/listings", &app.buyer_token(), listing_body("Nope"))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_json(
            "/api/v1/listings",
            &app.token(1, ROLE_ADMIN),
            listing_body("Admin listing"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_listing_is_rejected() {
    let app = build_test_app();
    let response = app
        .post_json("/api/v1/listings", &app.seller_token(), listing_body(""))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn mine_lists_only_own_listings() {
    let app = build_test_app();
    app.listing().await;
    app.store.seed_listing(SELLER + 1, "Someone else's").await;

    let json = body_json(app.get("/api/v1/listings/mine", &app.seller_token()).await).await;
    let listings = json["data"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["seller_id"], SELLER);
}

#[tokio::test]
async fn public_view_needs_no_token() {
    let app = build_test_app();
    let listing = app.listing().await;

    let response = app
        .send(
            Request::get(format!("/api/v1/listings/{}", listing.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], listing.id);

    let response = app
        .send(Request::get("/api/v1/listings/999").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn financials_follow_the_nda_gate() {
    let app = build_test_app();
    let listing = app.listing().await;
    let uri = format!("/api/v1/listings/{}/financials", listing.id);
    let buyer = app.buyer_token();

    let response = app.get(&uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "NDA_REQUIRED");

    let response = app.get(&uri, &app.seller_token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.signed_nda(listing.id, &buyer).await;
    let response = app.get(&uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["listing_id"], listing.id);
    assert_eq!(json["data"]["revenue"], 500_000);
    assert_eq!(json["data"]["profit"], 90_000);
}
