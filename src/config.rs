use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// One tracked counter and the column spellings it may appear under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricField {
    pub name: String,
    pub candidates: Vec<String>,
}

impl MetricField {
    /// `Name`, `NAME`, `name`: the spellings seen across the published sheets.
    pub fn with_case_variants(name: &str) -> Self {
        MetricField {
            name: name.to_string(),
            candidates: vec![name.to_string(), name.to_uppercase(), name.to_lowercase()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSchema {
    pub metrics: Vec<MetricField>,
    pub unit_candidates: Vec<String>,
    /// Conversion % = numerator / denominator * 100.
    pub conversion_numerator: String,
    pub conversion_denominator: String,
    /// Metric used to order units for tables and top-N charts.
    pub rank_by: String,
}

impl Default for MetricSchema {
    fn default() -> Self {
        MetricSchema {
            metrics: ["Directs", "Respostas", "Agendamentos", "Comparecimentos", "Vendas"]
                .iter()
                .map(|name| MetricField::with_case_variants(name))
                .collect(),
            unit_candidates: vec!["Unidade".into(), "UNIDADE".into(), "unidade".into()],
            conversion_numerator: "Respostas".into(),
            conversion_denominator: "Directs".into(),
            rank_by: "Directs".into(),
        }
    }
}

impl MetricSchema {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.name.as_str())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.metrics.is_empty() {
            return Err(AppError::Config("at least one metric is required".into()));
        }
        if self.unit_candidates.is_empty() {
            return Err(AppError::Config(
                "at least one unit column spelling is required".into(),
            ));
        }
        for (role, name) in [
            ("conversionNumerator", &self.conversion_numerator),
            ("conversionDenominator", &self.conversion_denominator),
            ("rankBy", &self.rank_by),
        ] {
            if self.index_of(name).is_none() {
                return Err(AppError::Config(format!(
                    "{role} refers to unknown metric {name:?}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub cache_bust_param: String,
    pub timeout_secs: u64,
    /// `None` = detect from the header line.
    pub delimiter: Option<char>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: None,
            path: None,
            cache_bust_param: "_".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delimiter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub refresh_interval_secs: u64,
    pub schema: MetricSchema,
    pub unassigned_label: String,
    pub top_n: usize,
    pub distribution_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceConfig::default(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            schema: MetricSchema::default(),
            unassigned_label: "Unassigned".into(),
            top_n: 10,
            distribution_limit: 12,
        }
    }
}

impl AppConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    /// Without a path the built-in defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(AppConfig::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.schema.validate()?;
        if self.refresh_interval_secs == 0 {
            return Err(AppError::Config("refreshIntervalSecs must be > 0".into()));
        }
        if self.source.url.is_none() && self.source.path.is_none() {
            return Err(AppError::Config(
                "either source.url or source.path must be set".into(),
            ));
        }
        if self.unassigned_label.trim().is_empty() {
            return Err(AppError::Config("unassignedLabel must not be blank".into()));
        }
        Ok(())
    }
}
