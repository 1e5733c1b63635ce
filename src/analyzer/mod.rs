pub mod conversion;
pub mod dashboard;
pub mod stats;
pub mod totals;
pub mod units;

pub use conversion::{conversion_percent, ConversionPercent};
pub use dashboard::{
    build_selection_view, build_snapshot, DashboardOptions, DashboardSnapshot, Selection,
    SelectionView,
};
pub use totals::{aggregate_rows, MetricSet};
pub use units::{group_by_unit, sort_for_display, UnitAggregate};
