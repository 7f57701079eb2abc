//! COAH inventory core crate.
//!
//! Current implemented scope:
//! - trade-lock unlock scheduling on Pacific calendar days
//! - wear float classification and wear-bar placement
//! - item payload normalization, sources and the inventory grid server

mod config;
mod grid;
mod item;
mod observability;
mod source;
#[cfg(test)]
mod test_env;
mod unlock;
mod wear;

pub use config::{
    parse_lock_days, parse_time_zone, site_config_from_env, ConfigError, SiteConfig,
    SourceChoice, DEFAULT_ADDR, DEFAULT_HTTP_TIMEOUT_MS,
};
pub use grid::{
    build_card, build_grid, inventory_router, render_error_html, render_grid_html,
    CategoryFilter, GridDiagnostics, GridFilters, GridQuery, GridView, ItemCard, SortOrder,
    PLACEHOLDER_IMAGE,
};
pub use item::{
    detect_category, is_blank, is_kato14, is_truthy, item_from_object, normalize_payload,
    Category, InventoryItem,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_source_selected, logging_config_from_env,
    LogFormat, LoggingConfig, LoggingInitError,
};
pub use source::{
    demo_items, load_items_csv, parse_items_csv, parse_items_json, CsvInventorySource,
    InMemoryInventorySource, InventorySource, SheetInventorySource, SourceError,
};
pub use unlock::{
    compute_lock_state, compute_lock_state_raw, format_lock_status, local_midnight,
    parse_purchase_instant, unlock_instant, Countdown, LockPolicy, LockState, UnlockError,
    DEFAULT_LOCK_DAYS,
};
pub use wear::{
    band_for, classify, classify_raw, ConditionBand, ConditionLabel, WearBand, BAR_SCALE_MAX,
    WEAR_BANDS,
};
