//! Crop yield prediction: one-hot encoding of a single form submission,
//! inference with a pre-trained regressor, and Low/Medium/High classification.

pub mod artifacts;
pub mod classify;
pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod presenter;
pub mod server;
pub mod types;

pub use artifacts::{FeatureSchema, ThresholdSource};
pub use classify::{Thresholds, YieldCategory};
pub use config::AppConfig;
pub use encoder::{EncodingPolicy, FeatureEncoder};
pub use error::{ArtifactError, InputError, ModelError, PredictError};
pub use model::Regressor;
pub use pipeline::AppContext;
pub use types::{CropInput, PredictionReport};
