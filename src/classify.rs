use serde::{Deserialize, Serialize};

pub const DEFAULT_LOW: f64 = 2.0;
pub const DEFAULT_HIGH: f64 = 5.0;

/// Cut points partitioning predicted yield into three categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    low: f64,
    high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
        }
    }
}

impl Thresholds {
    /// Returns `None` unless both values are finite and `low < high`.
    pub fn new(low: f64, high: f64) -> Option<Self> {
        if low.is_finite() && high.is_finite() && low < high {
            Some(Self { low, high })
        } else {
            None
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Low below `low`, Medium on `[low, high)`, High from `high` up.
    pub fn classify(&self, value: f64) -> YieldCategory {
        if value < self.low {
            YieldCategory::Low
        } else if value < self.high {
            YieldCategory::Medium
        } else {
            YieldCategory::High
        }
    }

    /// Position of `value` on a bar whose full width is 1.2x the high cut.
    /// A bar with no positive width reads as empty.
    pub fn progress(&self, value: f64) -> f64 {
        let full = self.high * 1.2;
        if !(full.is_finite() && full > 0.0) || !value.is_finite() {
            return 0.0;
        }
        (value / full).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YieldCategory {
    Low,
    Medium,
    High,
}

impl YieldCategory {
    pub fn label(self) -> &'static str {
        match self {
            YieldCategory::Low => "Low Yield",
            YieldCategory::Medium => "Medium Yield",
            YieldCategory::High => "High Yield",
        }
    }

    pub fn advisory(self) -> &'static str {
        match self {
            YieldCategory::Low => {
                "⚠️ Yield is low. Improve irrigation, fertilizer usage, or crop selection."
            }
            YieldCategory::Medium => {
                "✅ Yield is moderate. Optimize water, temperature, and soil conditions."
            }
            YieldCategory::High => "🚀 High yield expected! Farming practices are well optimized.",
        }
    }

    /// Traffic-light marker shown next to the label.
    pub fn marker(self) -> &'static str {
        match self {
            YieldCategory::Low => "🔴",
            YieldCategory::Medium => "🟡",
            YieldCategory::High => "🟢",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            YieldCategory::Low => "low",
            YieldCategory::Medium => "medium",
            YieldCategory::High => "high",
        }
    }
}
