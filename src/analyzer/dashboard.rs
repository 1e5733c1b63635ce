//! Dashboard snapshot: everything a renderer needs after one refresh cycle.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::conversion::{conversion_percent, ConversionPercent};
use super::stats::unit_averages;
use super::totals::{aggregate_rows, MetricSet};
use super::units::{all_units, group_by_unit, sort_for_display, UnitAggregate, ALL_UNITS_LABEL};
use crate::config::{AppConfig, MetricSchema};
use crate::parser::RawRow;

// ─── Data Structures ─────────────────────────────────────────────────────────

/// Value of the unit filter: every unit, or one observed label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "unit")]
pub enum Selection {
    #[default]
    All,
    Unit(String),
}

impl Selection {
    /// Label as typed in a filter box; blank means All.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            Selection::All
        } else {
            Selection::Unit(label.to_string())
        }
    }
}

/// Knobs for the snapshot builder, taken from `AppConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOptions {
    pub unassigned_label: String,
    pub top_n: usize,
    pub distribution_limit: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DashboardOptions {
    fn from(config: &AppConfig) -> Self {
        DashboardOptions {
            unassigned_label: config.unassigned_label.clone(),
            top_n: config.top_n,
            distribution_limit: config.distribution_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub meta: SnapshotMeta,
    pub totals: MetricSet,
    pub conversion: ConversionPercent,
    pub averages: MetricSet,
    /// Display order: descending ranking metric, then label.
    pub units: Vec<UnitSummary>,
    pub charts: ChartData,
    pub filter_options: Vec<String>,
    pub selection: SelectionView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub total_rows: usize,
    pub unit_count: usize,
    pub computed_at: DateTime<Utc>,
    pub calcul_duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSummary {
    pub unit: String,
    pub metrics: MetricSet,
    pub conversion: ConversionPercent,
}

/// Selection-scoped cards: one unit, or the All Units aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub selection: Selection,
    pub label: String,
    pub metrics: MetricSet,
    pub conversion: ConversionPercent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    /// Labels of the top-N units by ranking metric.
    pub top_labels: Vec<String>,
    pub top_series: Vec<ChartSeries>,
    /// Share of the conversion numerator across the first units in display order.
    pub distribution: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub metric: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

// ─── Builder Functions ───────────────────────────────────────────────────────

fn summarize(unit: &UnitAggregate, schema: &MetricSchema) -> UnitSummary {
    UnitSummary {
        unit: unit.unit.clone(),
        metrics: unit.metrics.clone(),
        conversion: conversion_percent(&unit.metrics, schema),
    }
}

/// Units for the current rows, sorted for display.
pub fn sorted_units(
    rows: &[RawRow],
    schema: &MetricSchema,
    options: &DashboardOptions,
) -> Vec<UnitAggregate> {
    let mut units = group_by_unit(rows, schema, &options.unassigned_label);
    sort_for_display(&mut units, schema);
    units
}

/// Cards for `selection`. A unit that is no longer present falls back to All.
pub fn build_selection_view(
    units: &[UnitAggregate],
    schema: &MetricSchema,
    selection: &Selection,
) -> SelectionView {
    if let Selection::Unit(label) = selection {
        if let Some(u) = units.iter().find(|u| &u.unit == label) {
            return SelectionView {
                selection: selection.clone(),
                label: u.unit.clone(),
                metrics: u.metrics.clone(),
                conversion: conversion_percent(&u.metrics, schema),
            };
        }
    }
    let all = all_units(units, schema);
    SelectionView {
        selection: Selection::All,
        label: ALL_UNITS_LABEL.to_string(),
        conversion: conversion_percent(&all.metrics, schema),
        metrics: all.metrics,
    }
}

fn build_charts(
    units: &[UnitAggregate],
    schema: &MetricSchema,
    options: &DashboardOptions,
) -> ChartData {
    let top: Vec<&UnitAggregate> = units.iter().take(options.top_n).collect();

    let mut series_metrics = vec![schema.rank_by.as_str()];
    if schema.conversion_numerator != schema.rank_by {
        series_metrics.push(schema.conversion_numerator.as_str());
    }

    let top_series = series_metrics
        .into_iter()
        .map(|metric| ChartSeries {
            metric: metric.to_string(),
            values: top.iter().map(|u| u.metrics.get(metric)).collect(),
        })
        .collect();

    let distribution = units
        .iter()
        .take(options.distribution_limit)
        .map(|u| ChartPoint {
            label: u.unit.clone(),
            value: u.metrics.get(&schema.conversion_numerator),
        })
        .collect();

    ChartData {
        top_labels: top.iter().map(|u| u.unit.clone()).collect(),
        top_series,
        distribution,
    }
}

/// Run the whole pipeline over one row set.
///
/// Grand totals come straight from the rows; units are grouped, sorted and
/// summarised; `selection` falls back to All when its unit is gone.
pub fn build_snapshot(
    rows: &[RawRow],
    schema: &MetricSchema,
    options: &DashboardOptions,
    selection: &Selection,
) -> DashboardSnapshot {
    let start = Instant::now();

    let totals = aggregate_rows(rows, schema);
    let units = sorted_units(rows, schema, options);

    DashboardSnapshot {
        conversion: conversion_percent(&totals, schema),
        averages: unit_averages(&units, schema),
        charts: build_charts(&units, schema, options),
        filter_options: units.iter().map(|u| u.unit.clone()).collect(),
        selection: build_selection_view(&units, schema, selection),
        units: units.iter().map(|u| summarize(u, schema)).collect(),
        totals,
        meta: SnapshotMeta {
            total_rows: rows.len(),
            unit_count: units.len(),
            computed_at: Utc::now(),
            calcul_duration_ms: start.elapsed().as_millis() as u64,
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
