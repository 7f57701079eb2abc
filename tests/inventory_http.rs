use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use coah::{
    inventory_router, InMemoryInventorySource, InventoryItem, InventorySource, LockPolicy,
    SourceError,
};
use regex::Regex;
use tower::util::ServiceExt;

fn item(purchase: Option<&str>, name: &str, special: &str, float: Option<f64>) -> InventoryItem {
    InventoryItem {
        purchase_date: purchase.map(|v| v.to_string()),
        name: name.to_string(),
        special: special.to_string(),
        float,
        image: None,
        show: true,
        sold: None,
    }
}

fn app() -> Router {
    let source = Arc::new(InMemoryInventorySource::new(vec![
        item(Some("2024-01-10T20:00:00Z"), "★ Flip Knife | Lore", "", Some(0.02)),
        item(Some("2024-02-10T20:00:00Z"), "AK-47 | Vulcan", "Kato14 holo", Some(0.19)),
        item(Some("2099-01-01T00:00:00Z"), "AWP | Gungnir", "", Some(0.5)),
        item(None, "Sticker | Crown <Foil>", "", None),
        InventoryItem {
            sold: Some("x".to_string()),
            ..item(Some("2024-03-01T00:00:00Z"), "M4A1-S | Printstream", "", Some(0.1))
        },
    ]));
    inventory_router(source, LockPolicy::default())
}

struct FailingSource;

impl InventorySource for FailingSource {
    fn items(&self) -> Result<Vec<InventoryItem>, SourceError> {
        Err(SourceError::HttpRequest {
            url: "https://sheet.example/exec".to_string(),
            message: "unexpected HTTP status 500".to_string(),
        })
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn grid_page_renders_listed_cards_and_filters() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("Showing 4 items"));
    assert!(text.contains("id=\"category-filter\""));
    assert!(text.contains("id=\"sort-filter\""));
    assert!(text.contains("id=\"unlocked-filter\""));
    assert!(text.contains("Condition: Factory New"));
    assert!(text.contains("Condition: unknown"));
    let countdown = Regex::new(r"Trade locked for \d+ days ([0-9]|1[0-9]|2[0-3]) hours").unwrap();
    assert!(countdown.is_match(&text));
    assert!(text.contains("Sticker | Crown &lt;Foil&gt;"));
    assert!(!text.contains("Printstream"));
}

#[tokio::test]
async fn items_endpoint_returns_cards_sorted_newest_first() {
    let (status, body) = get(app(), "/items").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let cards = json["cards"].as_array().unwrap();
    assert_eq!(json["total_visible"], 4);
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[0]["name"], "AWP | Gungnir");
    assert_eq!(cards[3]["name"], "Sticker | Crown <Foil>");

    assert_eq!(cards[0]["condition"]["label"], "Battle-Scarred");
    assert!(cards[0]["lock"]["countdown"]["days"].as_u64().unwrap() > 0);
    assert_eq!(cards[1]["status_text"], "Unlocked");
    assert!(cards[3]["lock"]["unlock_at"].is_null());
    assert!(cards[3]["lock"]["countdown"].is_null());
}

#[tokio::test]
async fn items_endpoint_applies_query_filters() {
    let (_, body) = get(app(), "/items?only_unlocked=true&sort=oldest").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = json["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Sticker | Crown <Foil>", "★ Flip Knife | Lore", "AK-47 | Vulcan"]
    );

    let (_, body) = get(app(), "/items?category=kato14").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["cards"].as_array().unwrap().len(), 1);
    assert_eq!(json["cards"][0]["name"], "AK-47 | Vulcan");

    let (_, body) = get(app(), "/items?search=LORE&category=Knives").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["cards"][0]["category"], "Knives");
}

#[tokio::test]
async fn unlocked_cards_carry_no_unlock_label() {
    let (_, body) = get(app(), "/items").await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let cards = json["cards"].as_array().unwrap();

    assert!(cards[0]["unlock_local"].is_string());
    assert_eq!(cards[1]["status_text"], "Unlocked");
    assert!(cards[1]["lock"]["unlock_at"].is_string());
    assert!(cards[1]["unlock_local"].is_null());
}

#[tokio::test]
async fn debug_query_reports_item_counts() {
    let (status, body) = get(app(), "/items?debug=1&category=guns").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["normalized_count"], 5);
    assert_eq!(json["visible_count"], 4);
    assert_eq!(json["card_count"], 2);
    assert_eq!(json["first_visible_sample"].as_array().unwrap().len(), 4);
    assert!(json.get("cards").is_none());
}

#[tokio::test]
async fn unknown_query_values_fall_back_to_defaults() {
    let (status, body) = get(app(), "/items?category=boats&sort=sideways").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["cards"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn source_failure_renders_error_state() {
    let failing = || inventory_router(Arc::new(FailingSource), LockPolicy::default());

    let (status, body) = get(failing(), "/").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("Could not load items"));
    assert!(text.contains("Showing 0 items"));

    let (status, body) = get(failing(), "/items").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Could not load items");
}
