//! Startup artifacts: the model, its feature schema and the yield thresholds.

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

use crate::classify::Thresholds;
use crate::config::AppConfig;
use crate::error::ArtifactError;
use crate::model;
use crate::pipeline::AppContext;

/// Ordered column names the model was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::EmptySchema);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(ArtifactError::DuplicateColumn(c.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaJson {
    List(Vec<String>),
    Meta {
        feat_list: Vec<String>,
        in_dim: Option<usize>,
    },
}

pub fn load_schema(path: &Path) -> Result<FeatureSchema, ArtifactError> {
    let txt = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: SchemaJson = serde_json::from_str(&txt).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let columns = match parsed {
        SchemaJson::List(columns) => columns,
        SchemaJson::Meta { feat_list, in_dim } => {
            if let Some(in_dim) = in_dim.filter(|&d| d != feat_list.len()) {
                tracing::warn!(
                    "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                    in_dim,
                    feat_list.len()
                );
            }
            feat_list
        }
    };
    FeatureSchema::new(columns)
}

// ---------- Thresholds ----------

/// Where the active thresholds came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    File,
    Default,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThresholdsJson {
    Pair([f64; 2]),
    Named { low: f64, high: f64 },
}

/// Never fails: any problem with the file yields the default cut points.
pub fn load_thresholds(path: &Path) -> (Thresholds, ThresholdSource) {
    match read_thresholds(path) {
        Ok(t) => (t, ThresholdSource::File),
        Err(reason) => {
            let t = Thresholds::default();
            tracing::warn!(
                path = %path.display(),
                %reason,
                "using default yield thresholds ({}, {})",
                t.low(),
                t.high()
            );
            (t, ThresholdSource::Default)
        }
    }
}

fn read_thresholds(path: &Path) -> Result<Thresholds, String> {
    let txt = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let (low, high) = match serde_json::from_str(&txt).map_err(|e| e.to_string())? {
        ThresholdsJson::Pair([low, high]) => (low, high),
        ThresholdsJson::Named { low, high } => (low, high),
    };
    Thresholds::new(low, high).ok_or_else(|| format!("invalid thresholds ({low}, {high})"))
}

// ---------- Context ----------

/// Loads every artifact named by `cfg` and warms the model up once.
pub fn load_context(cfg: &AppConfig) -> Result<AppContext, ArtifactError> {
    let schema = load_schema(&cfg.features_path)?;
    let model = model::load(&cfg.model_path, schema.len())?;
    let (thresholds, source) = load_thresholds(&cfg.thresholds_path);

    // Warm-up forward so a broken model fails at startup, not on first click.
    model.predict(&vec![0.0; schema.len()])?;
    tracing::info!("warmup forward ok");

    Ok(AppContext::new(model, schema, thresholds, cfg.encoding_policy)
        .with_threshold_source(source)
        .with_feature_logging(cfg.log_pred))
}
