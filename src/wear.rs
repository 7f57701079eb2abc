//! Wear float classification and wear-bar placement.
//!
//! The float domain [0, 1] is split into five bands with inclusive upper
//! bounds. The display bar is split into five segments of deliberately
//! unequal width; a float is placed by linear interpolation inside its band's
//! segment, so the bar position is continuous across band boundaries.

use std::fmt;

use serde::Serialize;
use tracing::debug;

pub const BAR_SCALE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConditionLabel {
    #[serde(rename = "Factory New")]
    FactoryNew,
    #[serde(rename = "Minimal Wear")]
    MinimalWear,
    #[serde(rename = "Field-Tested")]
    FieldTested,
    #[serde(rename = "Well-Worn")]
    WellWorn,
    #[serde(rename = "Battle-Scarred")]
    BattleScarred,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ConditionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionLabel::FactoryNew => "Factory New",
            ConditionLabel::MinimalWear => "Minimal Wear",
            ConditionLabel::FieldTested => "Field-Tested",
            ConditionLabel::WellWorn => "Well-Worn",
            ConditionLabel::BattleScarred => "Battle-Scarred",
            ConditionLabel::Unknown => "unknown",
        }
    }

    pub fn short_code(self) -> &'static str {
        match self {
            ConditionLabel::FactoryNew => "FN",
            ConditionLabel::MinimalWear => "MW",
            ConditionLabel::FieldTested => "FT",
            ConditionLabel::WellWorn => "WW",
            ConditionLabel::BattleScarred => "BS",
            ConditionLabel::Unknown => "-",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WearBand {
    pub label: ConditionLabel,
    /// Inclusive upper bound in the float domain.
    pub float_upper: f64,
    /// Segment width on the bar, in percent of the full scale.
    pub bar_width: f64,
}

// Segment widths sum to exactly BAR_SCALE_MAX; the last segment takes the
// remainder of the scale.
pub static WEAR_BANDS: [WearBand; 5] = [
    WearBand {
        label: ConditionLabel::FactoryNew,
        float_upper: 0.0799,
        bar_width: 7.99,
    },
    WearBand {
        label: ConditionLabel::MinimalWear,
        float_upper: 0.1499,
        bar_width: 6.99,
    },
    WearBand {
        label: ConditionLabel::FieldTested,
        float_upper: 0.37999,
        bar_width: 22.999,
    },
    WearBand {
        label: ConditionLabel::WellWorn,
        float_upper: 0.4499,
        bar_width: 6.99,
    },
    WearBand {
        label: ConditionLabel::BattleScarred,
        float_upper: 1.0,
        bar_width: 55.031,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionBand {
    pub label: ConditionLabel,
    pub bar_percent: f64,
}

impl ConditionBand {
    pub const UNKNOWN: ConditionBand = ConditionBand {
        label: ConditionLabel::Unknown,
        bar_percent: 0.0,
    };
}

pub fn classify(wear: Option<f64>) -> ConditionBand {
    let Some(wear) = wear.filter(|value| value.is_finite()) else {
        return ConditionBand::UNKNOWN;
    };
    let wear = wear.clamp(0.0, 1.0);

    let mut band_lower = 0.0;
    let mut bar_before = 0.0;
    for band in &WEAR_BANDS {
        if wear <= band.float_upper {
            let fraction = (wear - band_lower) / (band.float_upper - band_lower);
            let bar_percent = (bar_before + fraction * band.bar_width).clamp(0.0, BAR_SCALE_MAX);
            return ConditionBand {
                label: band.label,
                bar_percent,
            };
        }
        band_lower = band.float_upper;
        bar_before += band.bar_width;
    }

    ConditionBand {
        label: ConditionLabel::BattleScarred,
        bar_percent: BAR_SCALE_MAX,
    }
}

/// Classifies a raw float cell. Text that is not a finite number is unknown.
pub fn classify_raw(raw: Option<&str>) -> ConditionBand {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return ConditionBand::UNKNOWN;
    };

    match raw.parse::<f64>() {
        Ok(value) => classify(Some(value)),
        Err(_) => {
            debug!(component = "wear", event = "wear.float.unparseable", raw);
            ConditionBand::UNKNOWN
        }
    }
}

pub fn band_for(wear: f64) -> Option<&'static WearBand> {
    if !wear.is_finite() {
        return None;
    }
    let wear = wear.clamp(0.0, 1.0);
    WEAR_BANDS.iter().find(|band| wear <= band.float_upper)
}
