//! Rendering collaborators. The orchestrator hands them a full snapshot
//! after a refresh, or only the selection cards after a filter change.

pub mod json;
pub mod table;

use crate::analyzer::{DashboardSnapshot, SelectionView};
use crate::error::AppError;

pub use json::JsonPublisher;
pub use table::TablePublisher;

pub trait Publisher: Send {
    fn publish(&mut self, snapshot: &DashboardSnapshot) -> Result<(), AppError>;

    fn publish_selection(&mut self, view: &SelectionView) -> Result<(), AppError>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, snapshot: &DashboardSnapshot) -> Result<(), AppError> {
        (**self).publish(snapshot)
    }

    fn publish_selection(&mut self, view: &SelectionView) -> Result<(), AppError> {
        (**self).publish_selection(view)
    }
}

/// Integers print without decimals; anything else keeps up to two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
