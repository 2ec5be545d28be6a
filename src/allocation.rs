// 💰 Allocation Model - savings goals, seed state and derived amounts
//
// A category's percentage is always stored clamped to [0, 100].
// The total amount is kept as the raw text the user typed and is only
// parsed when an allocation is derived from it.

use serde::{Deserialize, Serialize};

use crate::record::{id_from_string_or_number, percentage_or_zero};

/// Default goals used when nothing has been persisted yet (name, percentage).
pub const SEED_CATEGORIES: [(&str, f64); 3] = [
    ("Buy Phone", 30.0),
    ("Travel", 25.0),
    ("Mutual Funds", 45.0),
];

// ============================================================================
// CATEGORY
// ============================================================================

/// A named bucket receiving a percentage share of the total amount.
///
/// Identity: `id` (assigned at creation, never changes)
/// Values: `name`, `percentage` (edited by the user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,

    pub name: String,

    #[serde(default, deserialize_with = "percentage_or_zero")]
    pub percentage: f64,
}

impl Category {
    /// Create a category with a fresh UUID
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            percentage: clamp_percentage(percentage),
        }
    }
}

// ============================================================================
// ALLOCATION STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationState {
    /// Insertion order is display order
    pub categories: Vec<Category>,

    /// Raw total as entered; blank means "unset"
    pub total_amount: String,
}

impl AllocationState {
    /// The three default goals and a blank total
    pub fn seed() -> Self {
        AllocationState {
            categories: SEED_CATEGORIES
                .iter()
                .map(|(name, percentage)| Category::new(*name, *percentage))
                .collect(),
            total_amount: String::new(),
        }
    }

    /// True when the goal names and percentages match the seed, ignoring ids.
    pub fn is_seed(&self) -> bool {
        self.total_amount.is_empty()
            && self.categories.len() == SEED_CATEGORIES.len()
            && self
                .categories
                .iter()
                .zip(SEED_CATEGORIES.iter())
                .all(|(c, (name, pct))| c.name == *name && c.percentage == *pct)
    }

    pub fn find(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// Resolve a full id or an unambiguous id prefix to the stored id.
    pub fn resolve_id(&self, needle: &str) -> Option<&str> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }

        if let Some(exact) = self.find(needle) {
            return Some(exact.id.as_str());
        }

        let mut matches = self.categories.iter().filter(|c| c.id.starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.id.as_str()),
            _ => None,
        }
    }

    /// Parsed total, `None` when blank, non-numeric or not positive
    pub fn total_value(&self) -> Option<f64> {
        parse_total(&self.total_amount)
    }

    // ========================================================================
    // DERIVED VALUES (pure)
    // ========================================================================

    /// Money assigned to `category`, rounded to 2 decimals.
    pub fn allocation_for(&self, category: &Category) -> f64 {
        match self.total_value() {
            Some(total) => round2(total * category.percentage / 100.0),
            None => 0.0,
        }
    }

    /// Sum of all percentages, not rounded.
    pub fn total_percentage(&self) -> f64 {
        self.categories.iter().map(|c| c.percentage).sum()
    }

    /// Exact comparison with 100, no tolerance.
    pub fn is_balanced(&self) -> bool {
        self.total_percentage() == 100.0
    }

    /// Sum of the rounded per-category allocations.
    pub fn allocated_amount(&self) -> f64 {
        self.categories.iter().map(|c| self.allocation_for(c)).sum()
    }

    /// Total minus everything allocated; negative when over-allocated.
    pub fn remaining_amount(&self) -> f64 {
        let total = self.total_value().unwrap_or(0.0);
        round2(total - self.allocated_amount())
    }

    pub fn status(&self) -> AllocationStatus {
        AllocationStatus::classify(self.total_percentage())
    }
}

impl Default for AllocationState {
    fn default() -> Self {
        Self::seed()
    }
}

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStatus {
    Balanced,
    OverAllocated,
    UnderAllocated,
}

impl AllocationStatus {
    pub fn classify(total_percentage: f64) -> Self {
        if total_percentage == 100.0 {
            AllocationStatus::Balanced
        } else if total_percentage > 100.0 {
            AllocationStatus::OverAllocated
        } else {
            AllocationStatus::UnderAllocated
        }
    }
}

// ============================================================================
// INPUT PARSING
// ============================================================================

/// Parse a total amount; blank and non-positive values both collapse to `None`.
pub fn parse_total(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Parse a percentage; anything that is not a finite number becomes 0.
pub fn parse_percentage(raw: &str) -> f64 {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    clamp_percentage(value)
}

pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        // also folds -0.0 into 0.0
        return 0.0;
    }
    value.min(100.0)
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
