use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::MetricSchema;
use crate::parser::{coerce_number, resolve_field, RawRow};

/// One summed counter per schema metric, kept in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    names: Vec<String>,
    values: Vec<f64>,
}

impl MetricSet {
    pub fn zeroed(schema: &MetricSchema) -> Self {
        MetricSet {
            names: schema.names().map(str::to_string).collect(),
            values: vec![0.0; schema.metrics.len()],
        }
    }

    /// Value of a metric by name; 0 for a name the schema does not know.
    pub fn get(&self, name: &str) -> f64 {
        self.names
            .iter()
            .position(|n| n == name)
            .map_or(0.0, |i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add one row's coerced values. Missing columns and unreadable cells add 0.
    pub fn add_row(&mut self, row: &RawRow, schema: &MetricSchema) {
        for (slot, field) in self.values.iter_mut().zip(&schema.metrics) {
            *slot += coerce_number(resolve_field(row, &field.candidates));
        }
    }

    /// Element-wise sum with a set built from the same schema.
    pub fn merge(&mut self, other: &MetricSet) {
        for (slot, v) in self.values.iter_mut().zip(&other.values) {
            *slot += v;
        }
    }

    pub(crate) fn map_values(&self, f: impl Fn(f64) -> f64) -> MetricSet {
        MetricSet {
            names: self.names.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }
}

impl Serialize for MetricSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Grand totals: every metric summed over every row. Empty input gives zeros.
pub fn aggregate_rows<'a, I>(rows: I, schema: &MetricSchema) -> MetricSet
where
    I: IntoIterator<Item = &'a RawRow>,
{
    rows.into_iter().fold(MetricSet::zeroed(schema), |mut acc, row| {
        acc.add_row(row, schema);
        acc
    })
}
