//! AQI category classification.
//!
//! Two independent lookup tables: six tiers that drive label and color, and a
//! binary threshold that drives advisory text. The advisory split is coarser
//! than the tiers; keep the tables separate.

use std::fmt;

use serde::Serialize;

use crate::aqi::AqiValue;

/// Ordered AQI tiers, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    Severe,
    Hazardous,
}

/// Display tokens for one tier.
#[derive(Debug, PartialEq, Eq)]
pub struct TierDescriptor {
    pub category: AqiCategory,
    /// Inclusive upper AQI bound
    pub upper_bound: u16,
    pub label: &'static str,
    /// Hex color used for text and map fills
    pub color: &'static str,
    /// Background gradient (from, to)
    pub gradient: (&'static str, &'static str),
}

/// Tier table, ascending by upper bound. The last entry covers up to 500.
pub static TIERS: [TierDescriptor; 6] = [
    TierDescriptor {
        category: AqiCategory::Good,
        upper_bound: 50,
        label: "Good",
        color: "#4ade80",
        gradient: ("#1e3a1f", "#0f1d10"),
    },
    TierDescriptor {
        category: AqiCategory::Moderate,
        upper_bound: 100,
        label: "Moderate",
        color: "#fbbf24",
        gradient: ("#3a2f1e", "#1d170f"),
    },
    TierDescriptor {
        category: AqiCategory::UnhealthyForSensitive,
        upper_bound: 150,
        label: "Unhealthy for Sensitive",
        color: "#f97316",
        gradient: ("#3a221e", "#1d110f"),
    },
    TierDescriptor {
        category: AqiCategory::Unhealthy,
        upper_bound: 200,
        label: "Unhealthy",
        color: "#f43f5e",
        gradient: ("#3a1e22", "#1d0f11"),
    },
    TierDescriptor {
        category: AqiCategory::Severe,
        upper_bound: 300,
        label: "Severe",
        color: "#a855f7",
        gradient: ("#2a1e3a", "#150f1d"),
    },
    TierDescriptor {
        category: AqiCategory::Hazardous,
        upper_bound: 500,
        label: "Hazardous",
        color: "#be123c",
        gradient: ("#310c14", "#19060a"),
    },
];

/// Classify an AQI value into its tier.
#[must_use]
pub fn classify(aqi: AqiValue) -> AqiCategory {
    TIERS
        .iter()
        .find(|tier| aqi.get() <= tier.upper_bound)
        .map_or(AqiCategory::Hazardous, |tier| tier.category)
}

impl AqiCategory {
    #[must_use]
    pub fn descriptor(self) -> &'static TierDescriptor {
        // TIERS is ordered by the enum's discriminants
        &TIERS[self as usize]
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        self.descriptor().color
    }

    #[must_use]
    pub fn gradient(self) -> (&'static str, &'static str) {
        self.descriptor().gradient
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory copy selected by the caution threshold.
#[derive(Debug, PartialEq, Eq)]
pub struct Advisory {
    pub message: &'static str,
    /// "elevated" or "stable" particulate levels
    pub particulate_level: &'static str,
}

/// Values strictly above this get the caution advisory.
pub const CAUTION_THRESHOLD: u16 = 100;

pub static CAUTION_ADVISORY: Advisory = Advisory {
    message: "Atmospheric conditions require caution. Sensitive groups should wear protective equipment.",
    particulate_level: "elevated",
};

pub static FAVORABLE_ADVISORY: Advisory = Advisory {
    message: "Optimal conditions detected for vigorous outdoor cardio and recreational activities.",
    particulate_level: "stable",
};

/// Pick the advisory for an AQI value.
#[must_use]
pub fn advisory(aqi: AqiValue) -> &'static Advisory {
    if aqi.get() > CAUTION_THRESHOLD {
        &CAUTION_ADVISORY
    } else {
        &FAVORABLE_ADVISORY
    }
}
