// 📈 Allocation Summary - display-ready snapshot shared by the TUI and the CLI

use crate::allocation::{round2, AllocationState, AllocationStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct GoalRow {
    pub id: String,
    pub name: String,
    pub percentage: f64,
    pub allocated: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSummary {
    pub rows: Vec<GoalRow>,
    /// Parsed total, `None` when blank or not positive
    pub total_amount: Option<f64>,
    pub total_percentage: f64,
    /// Sum of the per-goal allocations
    pub allocated_total: f64,
    pub remaining: f64,
    pub status: AllocationStatus,
}

impl AllocationSummary {
    pub fn from_state(state: &AllocationState) -> Self {
        let rows = state
            .categories
            .iter()
            .map(|c| GoalRow {
                id: c.id.clone(),
                name: c.name.clone(),
                percentage: c.percentage,
                allocated: state.allocation_for(c),
            })
            .collect();

        AllocationSummary {
            rows,
            total_amount: state.total_value(),
            total_percentage: state.total_percentage(),
            allocated_total: round2(state.allocated_amount()),
            remaining: state.remaining_amount(),
            status: state.status(),
        }
    }

    pub fn has_total(&self) -> bool {
        self.total_amount.is_some()
    }

    /// Status and breakdown table are only meaningful once a total is entered
    pub fn shows_breakdown(&self) -> bool {
        self.has_total() && !self.rows.is_empty()
    }

    /// Distance from 100%, always positive
    pub fn gap_percentage(&self) -> f64 {
        (100.0 - self.total_percentage).abs()
    }

    pub fn status_message(&self) -> String {
        match self.status {
            AllocationStatus::Balanced => "✓ Perfectly Balanced!".to_string(),
            AllocationStatus::OverAllocated => {
                format!("⚠ Over Allocated by {:.2}%", self.gap_percentage())
            }
            AllocationStatus::UnderAllocated => {
                format!("⚠ Under Allocated by {:.2}%", self.gap_percentage())
            }
        }
    }

    /// Label of the extra table row shown when not balanced
    pub fn imbalance_label(&self) -> Option<&'static str> {
        match self.status {
            AllocationStatus::Balanced => None,
            AllocationStatus::OverAllocated => Some("Over Allocated"),
            AllocationStatus::UnderAllocated => Some("Unallocated"),
        }
    }

    /// "(30% of ₹1000.00)" under a goal, when a total is set
    pub fn share_line(&self, row: &GoalRow, currency: &str) -> Option<String> {
        self.total_amount.map(|total| {
            format!(
                "({}% of {})",
                format_percentage(row.percentage),
                format_money(currency, total)
            )
        })
    }
}

pub fn format_money(currency: &str, amount: f64) -> String {
    format!("{}{:.2}", currency, amount)
}

/// Percentages print like the user typed them: 30 → "30", 12.5 → "12.5"
pub fn format_percentage(percentage: f64) -> String {
    format!("{}", percentage)
}
