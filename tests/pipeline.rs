/// End-to-end pipeline tests with substitute models.
///
/// Run with: cargo test --test pipeline -- --nocapture
use std::sync::{Arc, Mutex};

use crop_yield::artifacts::load_thresholds;
use crop_yield::types::{Crop, Region, SoilType, WeatherCondition};
use crop_yield::{
    pipeline, AppContext, CropInput, EncodingPolicy, FeatureSchema, ModelError, Regressor,
    ThresholdSource, Thresholds, YieldCategory,
};

/// Returns a fixed value and remembers the last row it saw.
struct Recorder {
    value: f64,
    seen: Arc<Mutex<Vec<f32>>>,
}

impl Regressor for Recorder {
    fn predict(&self, x: &[f32]) -> Result<f64, ModelError> {
        *self.seen.lock().unwrap() = x.to_vec();
        Ok(self.value)
    }
}

fn schema() -> FeatureSchema {
    let txt = include_str!("../artifacts/model_features.json");
    FeatureSchema::new(serde_json::from_str(txt).unwrap()).unwrap()
}

fn context(value: f64) -> (AppContext, Arc<Mutex<Vec<f32>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let model = Recorder {
        value,
        seen: seen.clone(),
    };
    let ctx = AppContext::new(
        Box::new(model),
        schema(),
        Thresholds::new(2.0, 5.0).unwrap(),
        EncodingPolicy::FixedVocabulary,
    );
    (ctx, seen)
}

fn scenario_input() -> CropInput {
    CropInput {
        region: Region::West,
        soil_type: SoilType::Loamy,
        crop: Crop::Wheat,
        rainfall_mm: 100.0,
        temperature_celsius: 25.0,
        fertilizer_used: true,
        irrigation_used: true,
        weather_condition: WeatherCondition::Sunny,
        days_to_harvest: 90,
    }
}

#[test]
fn test_high_yield_scenario() {
    let (ctx, _) = context(6.0);
    let report = pipeline::run(&ctx, &scenario_input()).unwrap();

    assert_eq!(report.yield_tons_per_hectare, 6.0);
    assert_eq!(report.category, YieldCategory::High);
    assert_eq!(report.progress, 1.0);
    println!("✓ 6.0 -> {} ({:.2})", report.label, report.progress);
}

#[test]
fn test_low_yield_scenario() {
    let (ctx, _) = context(1.5);
    let report = pipeline::run(&ctx, &scenario_input()).unwrap();

    assert_eq!(report.category, YieldCategory::Low);
    assert!((report.progress - 0.25).abs() < 1e-12);
    assert_eq!(report.advisory, YieldCategory::Low.advisory());
}

#[test]
fn test_medium_yield_scenario() {
    let (ctx, _) = context(3.0);
    let report = pipeline::run(&ctx, &scenario_input()).unwrap();
    assert_eq!(report.category, YieldCategory::Medium);
    assert_eq!(report.label, "Medium Yield");
}

#[test]
fn test_model_sees_schema_aligned_row() {
    let (ctx, seen) = context(3.0);
    pipeline::run(&ctx, &scenario_input()).unwrap();

    let row = seen.lock().unwrap().clone();
    assert_eq!(
        row,
        vec![100.0, 25.0, 90.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0]
    );
}

#[test]
fn test_every_input_yields_schema_width() {
    let (ctx, seen) = context(3.0);
    let width = ctx.schema().len();
    let mut count = 0;

    for &region in Region::ALL {
        for &soil_type in SoilType::ALL {
            for &crop in Crop::ALL {
                for &weather_condition in WeatherCondition::ALL {
                    for (fertilizer_used, irrigation_used) in
                        [(true, true), (true, false), (false, true), (false, false)]
                    {
                        let input = CropInput {
                            region,
                            soil_type,
                            crop,
                            weather_condition,
                            fertilizer_used,
                            irrigation_used,
                            ..scenario_input()
                        };
                        pipeline::run(&ctx, &input).unwrap();
                        let row = seen.lock().unwrap();
                        assert_eq!(row.len(), width);
                        // One indicator per non-baseline level, never more.
                        let ones = row[3..].iter().filter(|v| **v == 1.0).count();
                        assert!(ones <= 6);
                        count += 1;
                    }
                }
            }
        }
    }
    println!("✓ {} combinations encoded to {} columns", count, width);
}

#[test]
fn test_legacy_policy_drops_every_indicator() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let ctx = AppContext::new(
        Box::new(Recorder {
            value: 3.0,
            seen: seen.clone(),
        }),
        schema(),
        Thresholds::default(),
        EncodingPolicy::SingleRowDropFirst,
    );
    pipeline::run(&ctx, &scenario_input()).unwrap();

    let row = seen.lock().unwrap();
    assert_eq!(&row[..3], &[100.0, 25.0, 90.0]);
    assert!(row[3..].iter().all(|v| *v == 0.0));
}

#[test]
fn test_missing_thresholds_use_defaults() {
    let (t, source) = load_thresholds(std::path::Path::new("does/not/exist.json"));
    assert_eq!(t.low(), 2.0);
    assert_eq!(t.high(), 5.0);
    assert_eq!(source, ThresholdSource::Default);
}
