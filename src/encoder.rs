//! One-hot encoding of a [`CropInput`] into a schema-aligned feature row.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::artifacts::FeatureSchema;
use crate::types::{CropInput, CATEGORICAL_FIELDS};

/// How categorical fields are expanded before alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingPolicy {
    /// Fixed per-field vocabulary; the baseline level is the one the schema omits.
    #[default]
    #[serde(alias = "fixed")]
    FixedVocabulary,
    /// Per-row drop-first expansion. A single row only ever observes one
    /// level per field and that level is always the one dropped, so every
    /// indicator ends up 0. Kept for parity with the legacy form only.
    #[serde(alias = "legacy")]
    SingleRowDropFirst,
}

impl std::str::FromStr for EncodingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed_vocabulary" | "fixed" => Ok(EncodingPolicy::FixedVocabulary),
            "single_row_drop_first" | "legacy" => Ok(EncodingPolicy::SingleRowDropFirst),
            other => Err(format!("unknown encoding policy {other:?}")),
        }
    }
}

pub fn column_name(field: &str, level: &str) -> String {
    format!("{field}_{level}")
}

/// Encodes input rows against one feature schema.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    policy: EncodingPolicy,
    baselines: HashMap<&'static str, Option<&'static str>>,
}

impl FeatureEncoder {
    /// Derives each field's baseline level from which indicator column the
    /// schema leaves out. A field whose every level has a column has no
    /// baseline.
    pub fn new(schema: &FeatureSchema, policy: EncodingPolicy) -> Self {
        let mut baselines = HashMap::with_capacity(CATEGORICAL_FIELDS.len());
        for field in CATEGORICAL_FIELDS {
            let missing: Vec<&'static str> = field
                .levels
                .iter()
                .copied()
                .filter(|level| !schema.contains(&column_name(field.name, level)))
                .collect();

            let baseline = match missing.as_slice() {
                [] => None,
                [only] => Some(*only),
                _ => {
                    // Only a level without a column may stand in as the baseline.
                    let first = missing.iter().copied().min();
                    tracing::warn!(
                        field = field.name,
                        missing = ?missing,
                        "schema does not pin a single baseline level; using {first:?}"
                    );
                    first
                }
            };
            baselines.insert(field.name, baseline);
        }
        Self { policy, baselines }
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    pub fn baseline(&self, field: &str) -> Option<&'static str> {
        self.baselines.get(field).copied().flatten()
    }

    /// Named columns the encoding produces before alignment.
    pub fn expand(&self, input: &CropInput) -> HashMap<String, f32> {
        let mut cols = HashMap::new();
        for (name, value) in input.numeric_values() {
            cols.insert(name.to_string(), value as f32);
        }
        if self.policy == EncodingPolicy::FixedVocabulary {
            for (field, level) in input.categorical_levels() {
                if self.baseline(field) != Some(level) {
                    cols.insert(column_name(field, level), 1.0);
                }
            }
        }
        cols
    }

    /// Expands `input` and reindexes it against `schema`.
    pub fn encode(&self, input: &CropInput, schema: &FeatureSchema) -> Vec<f32> {
        align_to_schema(&self.expand(input), schema)
    }
}

/// Schema columns the map lacks become 0; extra map entries are dropped.
pub fn align_to_schema(map: &HashMap<String, f32>, schema: &FeatureSchema) -> Vec<f32> {
    let mut v = Vec::with_capacity(schema.len());
    for k in schema.columns() {
        v.push(*map.get(k).unwrap_or(&0.0));
    }
    v
}
