//! Reusable statistical helpers for the dashboard.

use crate::analyzer::totals::MetricSet;
use crate::analyzer::units::UnitAggregate;
use crate::config::MetricSchema;

/// Round to the nearest integer, halves going up (2.5 → 3, -2.5 → -2).
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor() + 0.0
}

/// Per-unit average of every metric, rounded to an integer.
/// All zeros when there are no units.
pub fn unit_averages(units: &[UnitAggregate], schema: &MetricSchema) -> MetricSet {
    if units.is_empty() {
        return MetricSet::zeroed(schema);
    }
    let count = units.len() as f64;
    let mut sums = MetricSet::zeroed(schema);
    for u in units {
        sums.merge(&u.metrics);
    }
    sums.map_values(|total| round_half_up(total / count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::units::group_by_unit;
    use crate::parser::RawRow;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.49), 2.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(0.0), 0.0);
    }

    #[test]
    fn test_unit_averages() {
        let schema = MetricSchema::default();
        let rows: Vec<RawRow> = vec![
            [("Unidade", "A"), ("Directs", "10"), ("Vendas", "1")]
                .into_iter()
                .collect(),
            [("Unidade", "B"), ("Directs", "15"), ("Vendas", "2")]
                .into_iter()
                .collect(),
        ];
        let units = group_by_unit(&rows, &schema, "Unassigned");
        let avg = unit_averages(&units, &schema);
        // 25 / 2 = 12.5 → 13 ; 3 / 2 = 1.5 → 2
        assert_eq!(avg.get("Directs"), 13.0);
        assert_eq!(avg.get("Vendas"), 2.0);
        assert_eq!(avg.get("Respostas"), 0.0);
    }

    #[test]
    fn test_unit_averages_no_units() {
        let schema = MetricSchema::default();
        assert_eq!(unit_averages(&[], &schema), MetricSet::zeroed(&schema));
    }
}
