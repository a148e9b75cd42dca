// # Dry-Run Target
//
// Records what a live run would do without touching the cloud.

use serde::Serialize;
use std::fmt::Write as _;

use crate::engine::Delta;

/// A change a live run would have applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    /// Record name
    pub record: String,
    /// Planned delta
    pub delta: Delta,
    /// Fields that differ from the actual record
    pub changed_fields: Vec<&'static str>,
}

/// Render target that only collects planned changes
#[derive(Debug, Default)]
pub struct DryRunTarget {
    changes: Vec<PlannedChange>,
}

impl DryRunTarget {
    /// Create an empty dry-run target
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a planned change
    pub fn record(&mut self, change: PlannedChange) {
        self.changes.push(change);
    }

    /// Planned changes in render order
    pub fn changes(&self) -> &[PlannedChange] {
        &self.changes
    }

    /// Human-readable summary
    pub fn report(&self) -> String {
        if self.changes.is_empty() {
            return "No changes need to be applied\n".to_string();
        }

        let mut out = String::new();
        for change in &self.changes {
            let verb = match change.delta {
                Delta::Create => "create",
                Delta::Update => "update",
                Delta::NoOp | Delta::Absent => continue,
            };
            let _ = write!(out, "Will {} DNSName/{}", verb, change.record);
            if !change.changed_fields.is_empty() {
                let _ = write!(out, " (changed: {})", change.changed_fields.join(", "));
            }
            out.push('\n');
        }
        out
    }
}
