//! Inventory grid: filtering, card building, HTML rendering and HTTP routes.

use std::cmp::Reverse;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::parse_switch;
use crate::item::{Category, InventoryItem};
use crate::source::{InventorySource, SourceError};
use crate::unlock::{
    compute_lock_state_raw, format_lock_status, parse_purchase_instant, LockPolicy, LockState,
};
use crate::wear::{classify, ConditionBand, WEAR_BANDS};

pub const PLACEHOLDER_IMAGE: &str = "assets/chicken.png";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Knives,
    Gloves,
    Guns,
    Other,
    Kato14,
}

impl CategoryFilter {
    pub const ALL: [CategoryFilter; 6] = [
        CategoryFilter::All,
        CategoryFilter::Knives,
        CategoryFilter::Gloves,
        CategoryFilter::Guns,
        CategoryFilter::Other,
        CategoryFilter::Kato14,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Some(CategoryFilter::All),
            "knives" => Some(CategoryFilter::Knives),
            "gloves" => Some(CategoryFilter::Gloves),
            "guns" => Some(CategoryFilter::Guns),
            "other" => Some(CategoryFilter::Other),
            "kato14" => Some(CategoryFilter::Kato14),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Knives => "Knives",
            CategoryFilter::Gloves => "Gloves",
            CategoryFilter::Guns => "Guns",
            CategoryFilter::Other => "Other",
            CategoryFilter::Kato14 => "Kato14",
        }
    }

    pub fn matches(self, item: &InventoryItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Kato14 => item.is_kato14(),
            CategoryFilter::Knives => item.category() == Category::Knives,
            CategoryFilter::Gloves => item.category() == Category::Gloves,
            CategoryFilter::Guns => item.category() == Category::Guns,
            CategoryFilter::Other => item.category() == Category::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Unsorted,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Newest, SortOrder::Oldest, SortOrder::Unsorted];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" | "" => Some(SortOrder::Newest),
            "oldest" => Some(SortOrder::Oldest),
            "none" | "unsorted" => Some(SortOrder::Unsorted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest",
            SortOrder::Oldest => "Oldest",
            SortOrder::Unsorted => "Unsorted",
        }
    }
}

/// View state owned by the caller; nothing here is global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridFilters {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortOrder,
    pub only_unlocked: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub only_unlocked: Option<String>,
    pub debug: Option<String>,
}

impl GridFilters {
    /// Unknown values fall back to the defaults rather than rejecting the
    /// request.
    pub fn from_query(query: &GridQuery) -> Self {
        Self {
            search: query.search.clone().unwrap_or_default(),
            category: query
                .category
                .as_deref()
                .and_then(CategoryFilter::parse)
                .unwrap_or_default(),
            sort: query
                .sort
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
            only_unlocked: query
                .only_unlocked
                .as_deref()
                .and_then(parse_switch)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCard {
    pub name: String,
    pub special: String,
    pub image: String,
    pub category: Category,
    pub purchased_at: Option<DateTime<Utc>>,
    pub condition: ConditionBand,
    pub lock: LockState,
    pub status_text: String,
    pub unlock_local: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridView {
    pub cards: Vec<ItemCard>,
    pub total_visible: usize,
}

const DIAGNOSTIC_SAMPLE_LEN: usize = 5;

/// Counts reported by `GET /items?debug=1` for checking the sheet columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridDiagnostics {
    pub normalized_count: usize,
    pub visible_count: usize,
    pub card_count: usize,
    pub normalized_sample: Vec<InventoryItem>,
    pub first_visible_sample: Vec<InventoryItem>,
}

impl GridDiagnostics {
    pub fn new(items: &[InventoryItem], view: &GridView) -> Self {
        Self {
            normalized_count: items.len(),
            visible_count: view.total_visible,
            card_count: view.cards.len(),
            normalized_sample: items.iter().take(DIAGNOSTIC_SAMPLE_LEN).cloned().collect(),
            first_visible_sample: items
                .iter()
                .filter(|item| item.is_visible())
                .take(DIAGNOSTIC_SAMPLE_LEN)
                .cloned()
                .collect(),
        }
    }
}

pub fn build_card(item: &InventoryItem, policy: &LockPolicy, now: DateTime<Utc>) -> ItemCard {
    let purchase_raw = item.purchase_date.as_deref();
    let lock = compute_lock_state_raw(purchase_raw, policy, now);
    let unlock_local = lock.countdown.and(lock.unlock_at).map(|unlock_at| {
        unlock_at
            .with_timezone(&policy.time_zone)
            .format("%b %-d, %H:%M %Z")
            .to_string()
    });

    ItemCard {
        name: display_or_dash(&item.name),
        special: item.special.clone(),
        image: item
            .image
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        category: item.category(),
        purchased_at: purchase_raw.and_then(|raw| parse_purchase_instant(raw, policy.time_zone)),
        condition: classify(item.float),
        status_text: format_lock_status(&lock),
        lock,
        unlock_local,
    }
}

pub fn build_grid(
    items: &[InventoryItem],
    filters: &GridFilters,
    policy: &LockPolicy,
    now: DateTime<Utc>,
) -> GridView {
    let listed: Vec<&InventoryItem> = items.iter().filter(|item| item.is_visible()).collect();
    let total_visible = listed.len();
    let query = filters.search.trim().to_lowercase();

    let mut cards: Vec<ItemCard> = listed
        .into_iter()
        .filter(|item| matches_search(item, &query))
        .filter(|item| filters.category.matches(item))
        .map(|item| build_card(item, policy, now))
        .filter(|card| !filters.only_unlocked || !card.lock.is_locked())
        .collect();

    match filters.sort {
        SortOrder::Newest => cards.sort_by_key(|card| Reverse(sort_key(card))),
        SortOrder::Oldest => cards.sort_by_key(sort_key),
        SortOrder::Unsorted => {}
    }

    GridView {
        cards,
        total_visible,
    }
}

pub fn render_grid_html(view: &GridView, filters: &GridFilters) -> String {
    let mut out = page_head();
    out.push_str(&render_filters_form(filters));
    out.push_str(&format!(
        "<p id=\"item-count\">Showing {} items</p>\n",
        view.cards.len()
    ));
    out.push_str("<section id=\"cards-container\" class=\"grid\">\n");

    if view.cards.is_empty() {
        out.push_str("<div class=\"empty\">No items match the current filters.</div>\n");
    }
    for card in &view.cards {
        out.push_str(&render_card(card));
    }

    out.push_str("</section></main></body></html>\n");
    out
}

pub fn render_error_html() -> String {
    let mut out = page_head();
    out.push_str("<p id=\"item-count\">Showing 0 items</p>\n");
    out.push_str("<section id=\"cards-container\" class=\"grid\">");
    out.push_str("<div class=\"error\">Could not load items. Please try again later.</div>");
    out.push_str("</section></main></body></html>\n");
    out
}

pub fn inventory_router(source: Arc<dyn InventorySource>, policy: LockPolicy) -> Router {
    Router::new()
        .route("/", get(get_grid_html))
        .route("/items", get(get_grid_json))
        .with_state(InventoryAppState { source, policy })
}

fn page_head() -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>COAH Inventory</title>\n");
    out.push_str("<style>*{box-sizing:border-box}body{margin:0;background:#111417;color:#e8ecef;font-family:\"Inter\",\"Segoe UI\",sans-serif}.shell{max-width:1400px;margin:0 auto;padding:20px}.filters{display:flex;gap:12px;flex-wrap:wrap;align-items:center;margin-bottom:12px}.filters input,.filters select{background:#1d2227;color:inherit;border:1px solid #333b42;border-radius:8px;padding:6px 10px}.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:16px}.card{background:#1a1f24;border:1px solid #2b3238;border-radius:12px;padding:12px}.card h3{font-size:.95rem;margin:8px 0}.card p{margin:4px 0;font-size:.82rem}.image-container img{width:100%;aspect-ratio:4/3;object-fit:contain}.wear-bar{position:relative;display:flex;height:6px;border-radius:3px;overflow:hidden;margin:6px 0}.wear-seg{height:100%}.seg-0{background:#2e9e5b}.seg-1{background:#7fbf3f}.seg-2{background:#e0b030}.seg-3{background:#e07b30}.seg-4{background:#c7423a}.wear-marker{position:absolute;top:-2px;width:2px;height:10px;background:#fff}.status.locked{color:#f0a35e}.status.unlocked{color:#6fd08c}.empty,.error{grid-column:1/-1;padding:24px;text-align:center;color:#98a2ab}</style>\n");
    out.push_str("</head><body><main class=\"shell\">\n<h1>Inventory</h1>\n");
    out
}

fn render_filters_form(filters: &GridFilters) -> String {
    let mut out = String::new();
    out.push_str("<form class=\"filters\" method=\"get\" action=\"/\">");
    out.push_str(&format!(
        "<input id=\"search-bar\" type=\"search\" name=\"search\" placeholder=\"Search\" value=\"{}\">",
        escape_html(&filters.search)
    ));

    out.push_str("<select id=\"category-filter\" name=\"category\">");
    for category in CategoryFilter::ALL {
        out.push_str(&option_html(category.as_str(), category == filters.category));
    }
    out.push_str("</select>");

    out.push_str("<select id=\"sort-filter\" name=\"sort\">");
    for sort in SortOrder::ALL {
        out.push_str(&option_html(sort.as_str(), sort == filters.sort));
    }
    out.push_str("</select>");

    out.push_str(&format!(
        "<label><input id=\"unlocked-filter\" type=\"checkbox\" name=\"only_unlocked\" value=\"true\"{}> Only unlocked</label>",
        if filters.only_unlocked { " checked" } else { "" }
    ));
    out.push_str("<button type=\"submit\">Apply</button></form>\n");
    out
}

fn option_html(value: &str, selected: bool) -> String {
    format!(
        "<option value=\"{0}\"{1}>{0}</option>",
        escape_html(value),
        if selected { " selected" } else { "" }
    )
}

fn render_card(card: &ItemCard) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"card\" data-category=\"{}\">",
        card.category.as_str()
    ));
    out.push_str(&format!(
        "<div class=\"image-container\"><img loading=\"lazy\" alt=\"{0}\" src=\"{1}\"></div>",
        escape_html(&card.name),
        escape_html(&card.image)
    ));
    out.push_str(&format!("<h3>{}</h3>", escape_html(&card.name)));
    out.push_str(&format!(
        "<p class=\"condition\">Condition: {}</p>",
        card.condition.label
    ));

    out.push_str("<div class=\"wear-bar\">");
    for (idx, band) in WEAR_BANDS.iter().enumerate() {
        out.push_str(&format!(
            "<span class=\"wear-seg seg-{idx}\" style=\"width:{:.3}%\" title=\"{}\"></span>",
            band.bar_width, band.label
        ));
    }
    out.push_str(&format!(
        "<span class=\"wear-marker\" style=\"left:{:.3}%\"></span></div>",
        card.condition.bar_percent
    ));

    if !card.special.is_empty() {
        out.push_str(&format!(
            "<p class=\"special\">Special: {}</p>",
            escape_html(&card.special)
        ));
    }

    let status_class = if card.lock.is_locked() {
        "locked"
    } else {
        "unlocked"
    };
    out.push_str(&format!(
        "<p class=\"status {status_class}\">{}</p>",
        escape_html(&card.status_text)
    ));
    if let Some(unlock_local) = card.unlock_local.as_deref() {
        out.push_str(&format!(
            "<p class=\"unlock-at\">Unlocks {}</p>",
            escape_html(unlock_local)
        ));
    }

    out.push_str("</div>\n");
    out
}

fn matches_search(item: &InventoryItem, query: &str) -> bool {
    query.is_empty()
        || item.name.to_lowercase().contains(query)
        || item.special.to_lowercase().contains(query)
}

fn sort_key(card: &ItemCard) -> i64 {
    card.purchased_at
        .map(|instant| instant.timestamp_millis())
        .unwrap_or(0)
}

fn display_or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Clone)]
struct InventoryAppState {
    source: Arc<dyn InventorySource>,
    policy: LockPolicy,
}

async fn load_items(state: &InventoryAppState) -> Result<Vec<InventoryItem>, SourceError> {
    let source = Arc::clone(&state.source);
    tokio::task::spawn_blocking(move || source.items())
        .await
        .map_err(|err| SourceError::Task(err.to_string()))?
}

fn log_source_error(route: &str, err: &SourceError) {
    warn!(
        component = "inventory_server",
        event = "http.items.source_error",
        route,
        error = %err
    );
}

async fn get_grid_html(
    State(state): State<InventoryAppState>,
    Query(query): Query<GridQuery>,
) -> Response {
    let filters = GridFilters::from_query(&query);
    let items = match load_items(&state).await {
        Ok(items) => items,
        Err(err) => {
            log_source_error("/", &err);
            return (StatusCode::BAD_GATEWAY, Html(render_error_html())).into_response();
        }
    };

    let view = build_grid(&items, &filters, &state.policy, Utc::now());
    info!(
        component = "inventory_server",
        event = "http.grid.request",
        card_count = view.cards.len(),
        total_visible = view.total_visible
    );
    Html(render_grid_html(&view, &filters)).into_response()
}

async fn get_grid_json(
    State(state): State<InventoryAppState>,
    Query(query): Query<GridQuery>,
) -> Response {
    let filters = GridFilters::from_query(&query);
    let items = match load_items(&state).await {
        Ok(items) => items,
        Err(err) => {
            log_source_error("/items", &err);
            return (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "Could not load items" })),
            )
                .into_response();
        }
    };

    let view = build_grid(&items, &filters, &state.policy, Utc::now());
    let debug_enabled = query.debug.as_deref().and_then(parse_switch).unwrap_or(false);
    info!(
        component = "inventory_server",
        event = "http.items.request",
        card_count = view.cards.len(),
        total_visible = view.total_visible,
        debug = debug_enabled
    );

    if debug_enabled {
        Json(GridDiagnostics::new(&items, &view)).into_response()
    } else {
        Json(view).into_response()
    }
}
