use std::fmt;

use serde::Serialize;

use crate::analyzer::totals::MetricSet;
use crate::config::MetricSchema;

/// Conversion percentage, already rounded to one decimal.
/// Displays as `"30.0"`; the `%` sign is left to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct ConversionPercent(f64);

impl ConversionPercent {
    pub const ZERO: ConversionPercent = ConversionPercent(0.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for ConversionPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Half-up rounding to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0 + 0.5).floor() / 10.0
}

/// `numerator / denominator * 100`, rounded to one decimal.
///
/// A denominator of zero (or below) yields exactly 0.0. Ratios above 100%
/// are returned as is.
pub fn ratio_percent(numerator: f64, denominator: f64) -> ConversionPercent {
    if denominator <= 0.0 {
        return ConversionPercent::ZERO;
    }
    let pct = round1(numerator * 100.0 / denominator);
    if pct.is_finite() {
        ConversionPercent(pct + 0.0)
    } else {
        ConversionPercent::ZERO
    }
}

/// Conversion % of a metric set using the schema's numerator/denominator pair
/// (Respostas ÷ Directs by default).
pub fn conversion_percent(metrics: &MetricSet, schema: &MetricSchema) -> ConversionPercent {
    ratio_percent(
        metrics.get(&schema.conversion_numerator),
        metrics.get(&schema.conversion_denominator),
    )
}
