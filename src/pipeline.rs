use crate::artifacts::{FeatureSchema, ThresholdSource};
use crate::classify::Thresholds;
use crate::encoder::{EncodingPolicy, FeatureEncoder};
use crate::error::PredictError;
use crate::model::Regressor;
use crate::types::{CropInput, PredictionReport, NUMERIC_FIELDS};

/// Everything loaded at startup, shared read-only by every request.
pub struct AppContext {
    model: Box<dyn Regressor>,
    schema: FeatureSchema,
    encoder: FeatureEncoder,
    thresholds: Thresholds,
    threshold_source: ThresholdSource,
    log_features: bool,
}

impl AppContext {
    pub fn new(
        model: Box<dyn Regressor>,
        schema: FeatureSchema,
        thresholds: Thresholds,
        policy: EncodingPolicy,
    ) -> Self {
        let encoder = FeatureEncoder::new(&schema, policy);
        Self {
            model,
            schema,
            encoder,
            thresholds,
            threshold_source: ThresholdSource::File,
            log_features: false,
        }
    }

    pub fn with_threshold_source(mut self, source: ThresholdSource) -> Self {
        self.threshold_source = source;
        self
    }

    /// Log the numeric values and active indicators of every encoded row.
    pub fn with_feature_logging(mut self, on: bool) -> Self {
        self.log_features = on;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn threshold_source(&self) -> ThresholdSource {
        self.threshold_source
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }
}

/// Validate, encode, predict and classify one submission.
pub fn run(ctx: &AppContext, input: &CropInput) -> Result<PredictionReport, PredictError> {
    input.validate()?;

    let vec = ctx.encoder.encode(input, &ctx.schema);
    if ctx.log_features {
        log_encoded_row(&vec, ctx.schema.columns());
    }

    let value = ctx.model.predict(&vec)?;
    let category = ctx.thresholds.classify(value);

    Ok(PredictionReport {
        yield_tons_per_hectare: value,
        category,
        label: category.label(),
        advisory: category.advisory(),
        progress: ctx.thresholds.progress(value),
    })
}

/// Indicator columns switched on in an encoded row, in schema order.
fn active_indicators<'a>(vec: &[f32], names: &'a [String]) -> Vec<&'a str> {
    names
        .iter()
        .zip(vec)
        .filter(|(name, v)| **v != 0.0 && !NUMERIC_FIELDS.contains(&name.as_str()))
        .map(|(name, _)| name.as_str())
        .collect()
}

// An empty indicator list means the model sees only the baseline levels.
fn log_encoded_row(vec: &[f32], names: &[String]) {
    let numeric: Vec<String> = names
        .iter()
        .zip(vec)
        .filter(|(name, _)| NUMERIC_FIELDS.contains(&name.as_str()))
        .map(|(name, v)| format!("{name}={v}"))
        .collect();
    tracing::info!(
        width = vec.len(),
        numeric = %numeric.join(" "),
        indicators = ?active_indicators(vec, names),
        "encoded row"
    );
}
