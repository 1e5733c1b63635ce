use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::analyzer::totals::{aggregate_rows, MetricSet};
use crate::config::MetricSchema;
use crate::parser::{resolve_field, RawRow};

pub const ALL_UNITS_LABEL: &str = "All Units";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitAggregate {
    pub unit: String,
    pub metrics: MetricSet,
}

/// Trimmed unit label of a row, or `unassigned_label` when blank or absent.
pub fn unit_label<'a>(row: &'a RawRow, schema: &MetricSchema, unassigned_label: &'a str) -> &'a str {
    let label = resolve_field(row, &schema.unit_candidates).trim();
    if label.is_empty() {
        unassigned_label
    } else {
        label
    }
}

/// Partition rows by trimmed unit label and aggregate each group.
///
/// Groups come out in first-seen order; use `sort_for_display` before
/// showing them.
pub fn group_by_unit(
    rows: &[RawRow],
    schema: &MetricSchema,
    unassigned_label: &str,
) -> Vec<UnitAggregate> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&RawRow>)> = Vec::new();

    for row in rows {
        let label = unit_label(row, schema, unassigned_label);
        match index.get(label) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(label, groups.len());
                groups.push((label, vec![row]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(label, members)| UnitAggregate {
            unit: label.to_string(),
            metrics: aggregate_rows(members, schema),
        })
        .collect()
}

/// Descending by the schema's ranking metric, ties broken by label ascending.
pub fn display_order(a: &UnitAggregate, b: &UnitAggregate, schema: &MetricSchema) -> Ordering {
    let rank = schema.rank_by.as_str();
    b.metrics
        .get(rank)
        .total_cmp(&a.metrics.get(rank))
        .then_with(|| a.unit.cmp(&b.unit))
}

pub fn sort_for_display(units: &mut [UnitAggregate], schema: &MetricSchema) {
    units.sort_by(|a, b| display_order(a, b, schema));
}

/// The synthetic aggregate covering every unit.
pub fn all_units(units: &[UnitAggregate], schema: &MetricSchema) -> UnitAggregate {
    let metrics = units.iter().fold(MetricSet::zeroed(schema), |mut acc, u| {
        acc.merge(&u.metrics);
        acc
    });
    UnitAggregate {
        unit: ALL_UNITS_LABEL.to_string(),
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNASSIGNED: &str = "Unassigned";

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells.iter().copied().collect()
    }

    fn find<'a>(units: &'a [UnitAggregate], label: &str) -> &'a UnitAggregate {
        units
            .iter()
            .find(|u| u.unit == label)
            .unwrap_or_else(|| panic!("unit {label:?} not found"))
    }

    #[test]
    fn test_whitespace_variants_group_together() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Unidade", "Loja A"), ("Directs", "1")]),
            row(&[("Unidade", " Loja A "), ("Directs", "2")]),
            row(&[("Unidade", "Loja A"), ("Directs", "3")]),
        ];
        let units = group_by_unit(&rows, &schema, UNASSIGNED);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit, "Loja A");
        assert_eq!(units[0].metrics.get("Directs"), 6.0);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Unidade", "Loja A")]),
            row(&[("Unidade", "LOJA A")]),
        ];
        assert_eq!(group_by_unit(&rows, &schema, UNASSIGNED).len(), 2);
    }

    #[test]
    fn test_missing_and_blank_units_go_to_sentinel() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Directs", "4")]),
            row(&[("Unidade", ""), ("Directs", "1")]),
            row(&[("Unidade", "   "), ("Directs", "2")]),
            row(&[("Unidade", "B"), ("Directs", "8")]),
        ];
        let units = group_by_unit(&rows, &schema, UNASSIGNED);
        assert_eq!(units.len(), 2);
        assert_eq!(find(&units, UNASSIGNED).metrics.get("Directs"), 7.0);
        assert!(units.iter().all(|u| !u.unit.is_empty()));
    }

    #[test]
    fn test_unit_column_spellings() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("UNIDADE", "A"), ("Directs", "1")]),
            row(&[("unidade", "A"), ("Directs", "1")]),
        ];
        let units = group_by_unit(&rows, &schema, UNASSIGNED);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].metrics.get("Directs"), 2.0);
    }

    #[test]
    fn test_unit_sums_match_grand_total() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Unidade", "A"), ("Directs", "10"), ("Respostas", "5"), ("Vendas", "x")]),
            row(&[("Unidade", "B"), ("DIRECTS", "20"), ("Respostas", "4,5")]),
            row(&[("Directs", "3"), ("Agendamentos", "2")]),
            row(&[("Unidade", " A"), ("Comparecimentos", "1"), ("Vendas", "2")]),
        ];
        let units = group_by_unit(&rows, &schema, UNASSIGNED);
        let totals = aggregate_rows(&rows, &schema);
        assert_eq!(all_units(&units, &schema).metrics, totals);
    }

    #[test]
    fn test_first_seen_order_before_sort() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Unidade", "Z")]),
            row(&[("Unidade", "A")]),
            row(&[("Unidade", "Z")]),
        ];
        let labels: Vec<String> = group_by_unit(&rows, &schema, UNASSIGNED)
            .into_iter()
            .map(|u| u.unit)
            .collect();
        assert_eq!(labels, vec!["Z", "A"]);
    }

    #[test]
    fn test_sort_desc_by_directs_then_label() {
        let schema = MetricSchema::default();
        let rows = vec![
            row(&[("Unidade", "C"), ("Directs", "5")]),
            row(&[("Unidade", "A"), ("Directs", "10")]),
            row(&[("Unidade", "B"), ("Directs", "20")]),
            row(&[("Unidade", "D"), ("Directs", "10")]),
        ];
        let mut units = group_by_unit(&rows, &schema, UNASSIGNED);
        sort_for_display(&mut units, &schema);
        let labels: Vec<&str> = units.iter().map(|u| u.unit.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "D", "C"]);
    }

    #[test]
    fn test_all_units_of_nothing_is_zero() {
        let schema = MetricSchema::default();
        let all = all_units(&[], &schema);
        assert_eq!(all.unit, ALL_UNITS_LABEL);
        assert_eq!(all.metrics, MetricSet::zeroed(&schema));
    }
}
