//! Inventory item records as delivered by the spreadsheet backend.

use chrono_tz::UTC;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::unlock::parse_purchase_instant;

const PAYLOAD_LIST_KEYS: [&str; 3] = ["items", "rows", "data"];

const PURCHASE_DATE_KEYS: [&str; 4] = ["purchaseDate", "Date of Purchase", "date", "Date"];
const NAME_KEYS: [&str; 4] = ["name", "Name", "Item", "Item Name"];
const SPECIAL_KEYS: [&str; 3] = ["special", "Special", "Special Characteristics"];
const FLOAT_KEYS: [&str; 3] = ["float", "Float", "Float Value"];
const IMAGE_KEYS: [&str; 2] = ["image", "Image"];
const SHOW_KEYS: [&str; 5] = ["show", "Show", "include", "Include", "Column F"];
const SOLD_KEYS: [&str; 5] = ["sold", "Sold", "status", "Status", "Column G"];

const TRUTHY_WORDS: [&str; 6] = ["true", "yes", "y", "1", "show", "x"];

const GUN_KEYWORDS: [&str; 41] = [
    "ak-47",
    "ak47",
    "m4a1",
    "m4a4",
    "awp",
    "usp",
    "p250",
    "famas",
    "galil",
    "aug",
    "ssg",
    "scar",
    "mac",
    "mac-10",
    "mac10",
    "mp7",
    "mp9",
    "ump",
    "p90",
    "pp-bizon",
    "bizon",
    "nova",
    "xm1014",
    "mag-7",
    "mag7",
    "sawed-off",
    "sawed off",
    "negev",
    "m249",
    "desert eagle",
    "deagle",
    "dual berettas",
    "dualies",
    "five-seven",
    "fiveseven",
    "cz75",
    "tec-9",
    "tec9",
    "glock",
    "r8",
    "mp5",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub purchase_date: Option<String>,
    pub name: String,
    pub special: String,
    pub float: Option<f64>,
    pub image: Option<String>,
    pub show: bool,
    pub sold: Option<String>,
}

impl InventoryItem {
    /// Listed items are flagged for display and not marked as sold.
    pub fn is_visible(&self) -> bool {
        self.show && self.sold.as_deref().map_or(true, is_blank)
    }

    pub fn category(&self) -> Category {
        detect_category(&self.name)
    }

    pub fn is_kato14(&self) -> bool {
        is_kato14(&self.special)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Knives,
    Gloves,
    Guns,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Knives => "Knives",
            Category::Gloves => "Gloves",
            Category::Guns => "Guns",
            Category::Other => "Other",
        }
    }
}

/// Normalizes a backend payload into items.
///
/// Accepts a bare array or an object carrying an `items`, `rows` or `data`
/// array. Rows may be positional arrays (with an optional header row) or
/// objects keyed by any of the known column aliases.
pub fn normalize_payload(payload: &Value) -> Vec<InventoryItem> {
    let Some(rows) = payload_rows(payload) else {
        warn!(
            component = "item",
            event = "item.payload.unexpected_shape",
            kind = value_kind(payload)
        );
        return Vec::new();
    };

    if rows.first().is_some_and(Value::is_array) {
        rows.iter()
            .enumerate()
            .filter(|(idx, row)| !(*idx == 0 && is_header_row(row)))
            .filter_map(|(_, row)| row.as_array())
            .map(|cells| item_from_cells(cells))
            .collect()
    } else {
        rows.iter()
            .filter_map(Value::as_object)
            .map(item_from_object)
            .collect()
    }
}

pub fn item_from_object(row: &Map<String, Value>) -> InventoryItem {
    InventoryItem {
        purchase_date: first_field(row, &PURCHASE_DATE_KEYS).and_then(cell_text),
        name: first_field(row, &NAME_KEYS)
            .and_then(cell_text)
            .unwrap_or_default(),
        special: first_field(row, &SPECIAL_KEYS)
            .and_then(cell_text)
            .unwrap_or_default(),
        float: first_field(row, &FLOAT_KEYS).and_then(cell_float),
        image: first_field(row, &IMAGE_KEYS).and_then(cell_text),
        show: first_field(row, &SHOW_KEYS).is_some_and(cell_truthy),
        sold: first_field(row, &SOLD_KEYS).and_then(cell_text),
    }
}

fn item_from_cells(cells: &[Value]) -> InventoryItem {
    let cell = |idx: usize| cells.get(idx);
    InventoryItem {
        purchase_date: cell(0).and_then(cell_text),
        name: cell(1).and_then(cell_text).unwrap_or_default(),
        special: cell(2).and_then(cell_text).unwrap_or_default(),
        float: cell(3).and_then(cell_float),
        image: cell(4).and_then(cell_text),
        show: cell(5).is_some_and(cell_truthy),
        sold: cell(6).and_then(cell_text),
    }
}

pub fn is_truthy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    TRUTHY_WORDS.contains(&normalized.as_str())
}

pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

pub fn detect_category(name: &str) -> Category {
    let name = name.to_lowercase();
    if name.contains("knife") {
        return Category::Knives;
    }
    if name.contains("glove") {
        return Category::Gloves;
    }
    if GUN_KEYWORDS.iter().any(|keyword| name.contains(keyword)) {
        return Category::Guns;
    }
    Category::Other
}

pub fn is_kato14(special: &str) -> bool {
    let special = special.to_lowercase();
    special.contains("kato") || special.contains("k14")
}

fn payload_rows(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => PAYLOAD_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

// A leading all-text row is a header unless its date or float column holds
// real data.
fn is_header_row(row: &Value) -> bool {
    let Some(cells) = row.as_array() else {
        return false;
    };
    let dated = cells
        .first()
        .and_then(Value::as_str)
        .and_then(|raw| parse_purchase_instant(raw, UTC))
        .is_some();
    !cells.is_empty()
        && cells.iter().all(Value::is_string)
        && cells.get(3).and_then(cell_float).is_none()
        && !dated
}

fn first_field<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number
            .as_i64()
            .map(|whole| whole.to_string())
            .unwrap_or_else(|| number.to_string()),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

fn cell_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        other => cell_text(other).is_some_and(|text| is_truthy(&text)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dated_text_row_without_float_is_kept() {
        let payload = json!([
            ["2025-08-10", "Sticker | Crown", "", "", "", "TRUE", ""],
            ["8/11/2025", "Patch | Hello", "", "", "", "TRUE", ""],
        ]);

        let items = normalize_payload(&payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Sticker | Crown");
        assert_eq!(items[0].float, None);
        assert!(items[0].is_visible());
    }

    #[test]
    fn positional_rows_drop_header_and_map_columns() {
        let payload = json!([
            ["Date of Purchase", "Item Name", "Special", "Float", "Image", "Show", "Sold"],
            ["2025-08-10T18:00:00Z", "AK-47 | Redline", "", 0.21, "", true, ""],
            ["2025-08-11T18:00:00Z", "Karambit | Doppler", "kato14 sticker", "0.01", null, "x", "sold"],
        ]);

        let items = normalize_payload(&payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "AK-47 | Redline");
        assert_eq!(items[0].float, Some(0.21));
        assert_eq!(items[0].purchase_date.as_deref(), Some("2025-08-10T18:00:00Z"));
        assert!(items[0].is_visible());
        assert_eq!(items[1].float, Some(0.01));
        assert!(items[1].show);
        assert!(!items[1].is_visible());
        assert!(items[1].is_kato14());
    }

    #[test]
    fn all_text_first_row_with_numeric_float_is_data() {
        let payload = json!([["2025-08-10", "Glock-18 | Fade", "", "0.03", "", "yes", ""]]);
        let items = normalize_payload(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category(), Category::Guns);
    }

    #[test]
    fn object_rows_accept_aliases_and_wrappers() {
        let payload = json!({
            "rows": [
                {"Date": "2025-08-10", "Item": "Sport Gloves | Vice", "Float Value": "0.4", "Include": "TRUE"},
                {"purchaseDate": null, "date": "2025-08-12", "name": "Sticker", "float": "n/a", "show": false},
            ]
        });

        let items = normalize_payload(&payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Sport Gloves | Vice");
        assert_eq!(items[0].category(), Category::Gloves);
        assert_eq!(items[0].float, Some(0.4));
        assert!(items[0].is_visible());
        assert_eq!(items[1].purchase_date.as_deref(), Some("2025-08-12"));
        assert_eq!(items[1].float, None);
        assert!(!items[1].is_visible());
    }

    #[test]
    fn unexpected_payload_shapes_are_empty() {
        assert!(normalize_payload(&json!({"error": "nope"})).is_empty());
        assert!(normalize_payload(&json!("text")).is_empty());
        assert!(normalize_payload(&json!([])).is_empty());
    }

    #[test]
    fn truthiness_and_blankness_follow_sheet_conventions() {
        for raw in ["true", "TRUE", " yes ", "Y", "1", "show", "x"] {
            assert!(is_truthy(raw), "{raw}");
        }
        for raw in ["", "false", "no", "0", "maybe"] {
            assert!(!is_truthy(raw), "{raw}");
        }
        assert!(is_blank("  "));
        assert!(!is_blank("sold"));
    }

    #[test]
    fn categories_prefer_knives_then_gloves_then_guns() {
        assert_eq!(detect_category("★ Butterfly Knife | Fade"), Category::Knives);
        assert_eq!(detect_category("★ Driver Gloves | King Snake"), Category::Gloves);
        assert_eq!(detect_category("AWP | Asiimov"), Category::Guns);
        assert_eq!(detect_category("Sticker | Kato 2014"), Category::Other);
    }
}
