use chrono::{DateTime, Utc};

use crate::analyzer::{DashboardSnapshot, Selection};
use crate::parser::RawRow;

/// What the dashboard remembers between cycles. Replaced wholesale by a
/// successful refresh; a failed one leaves it untouched.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub rows: Vec<RawRow>,
    pub selection: Selection,
    pub last_snapshot: Option<DashboardSnapshot>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl DashboardState {
    /// Observed unit labels of the last snapshot, in display order.
    pub fn filter_options(&self) -> &[String] {
        match &self.last_snapshot {
            Some(s) => &s.filter_options,
            None => &[],
        }
    }
}
