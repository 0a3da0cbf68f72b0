use serde::{Deserialize, Serialize};

use crate::classify::YieldCategory;
use crate::error::InputError;

// ---------- Categorical levels ----------

macro_rules! level_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Levels in the order the form offers them.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            pub fn from_level(s: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

level_enum!(Region { West, East, North, South });
level_enum!(SoilType { Sandy, Loamy, Clay });
level_enum!(Crop { Wheat, Rice, Cotton, Maize });
level_enum!(WeatherCondition { Sunny, Cloudy, Rainy });

// ---------- Column names ----------

pub const REGION: &str = "Region";
pub const SOIL_TYPE: &str = "Soil_Type";
pub const CROP: &str = "Crop";
pub const RAINFALL_MM: &str = "Rainfall_mm";
pub const TEMPERATURE_CELSIUS: &str = "Temperature_Celsius";
pub const FERTILIZER_USED: &str = "Fertilizer_Used";
pub const IRRIGATION_USED: &str = "Irrigation_Used";
pub const WEATHER_CONDITION: &str = "Weather_Condition";
pub const DAYS_TO_HARVEST: &str = "Days_to_Harvest";

/// A one-hot encoded input field and every level it can take.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalField {
    pub name: &'static str,
    pub levels: &'static [&'static str],
}

/// Boolean fields are coerced to 0/1 and then expanded like any other category.
const BOOL_LEVELS: &[&str] = &["0", "1"];

/// Categorical fields in expansion order.
pub const CATEGORICAL_FIELDS: [CategoricalField; 6] = [
    CategoricalField { name: REGION, levels: Region::NAMES },
    CategoricalField { name: SOIL_TYPE, levels: SoilType::NAMES },
    CategoricalField { name: CROP, levels: Crop::NAMES },
    CategoricalField { name: FERTILIZER_USED, levels: BOOL_LEVELS },
    CategoricalField { name: IRRIGATION_USED, levels: BOOL_LEVELS },
    CategoricalField { name: WEATHER_CONDITION, levels: WeatherCondition::NAMES },
];

/// Columns passed through to the model unchanged.
pub const NUMERIC_FIELDS: [&str; 3] = [RAINFALL_MM, TEMPERATURE_CELSIUS, DAYS_TO_HARVEST];

// ---------- Request/Response types ----------

/// One row of user input, keyed by the training-time column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropInput {
    #[serde(rename = "Region")]
    pub region: Region,
    #[serde(rename = "Soil_Type")]
    pub soil_type: SoilType,
    #[serde(rename = "Crop")]
    pub crop: Crop,
    #[serde(rename = "Rainfall_mm")]
    pub rainfall_mm: f64,
    #[serde(rename = "Temperature_Celsius")]
    pub temperature_celsius: f64,
    #[serde(rename = "Fertilizer_Used")]
    pub fertilizer_used: bool,
    #[serde(rename = "Irrigation_Used")]
    pub irrigation_used: bool,
    #[serde(rename = "Weather_Condition")]
    pub weather_condition: WeatherCondition,
    #[serde(rename = "Days_to_Harvest")]
    pub days_to_harvest: u32,
}

impl Default for CropInput {
    fn default() -> Self {
        Self {
            region: Region::West,
            soil_type: SoilType::Sandy,
            crop: Crop::Wheat,
            rainfall_mm: 0.0,
            temperature_celsius: 0.0,
            fertilizer_used: true,
            irrigation_used: true,
            weather_condition: WeatherCondition::Sunny,
            days_to_harvest: 1,
        }
    }
}

impl CropInput {
    /// Enforces the form's bounds; serde only guarantees the types.
    pub fn validate(&self) -> Result<(), InputError> {
        check_min(RAINFALL_MM, self.rainfall_mm, 0.0)?;
        check_min(TEMPERATURE_CELSIUS, self.temperature_celsius, 0.0)?;
        check_min(DAYS_TO_HARVEST, f64::from(self.days_to_harvest), 1.0)?;
        Ok(())
    }

    /// Level of each categorical field, booleans already coerced to "0"/"1".
    pub fn categorical_levels(&self) -> [(&'static str, &'static str); 6] {
        [
            (REGION, self.region.as_str()),
            (SOIL_TYPE, self.soil_type.as_str()),
            (CROP, self.crop.as_str()),
            (FERTILIZER_USED, bool_level(self.fertilizer_used)),
            (IRRIGATION_USED, bool_level(self.irrigation_used)),
            (WEATHER_CONDITION, self.weather_condition.as_str()),
        ]
    }

    /// Best-effort form state from raw key/value pairs. Fields that are
    /// missing or do not parse keep their default, so a rejected submission
    /// can be shown back with the user's choices intact.
    pub fn prefill(pairs: &[(String, String)]) -> Self {
        let mut input = Self::default();
        for (key, value) in pairs {
            let v = value.trim();
            match key.as_str() {
                REGION => set(&mut input.region, Region::from_level(v)),
                SOIL_TYPE => set(&mut input.soil_type, SoilType::from_level(v)),
                CROP => set(&mut input.crop, Crop::from_level(v)),
                WEATHER_CONDITION => {
                    set(&mut input.weather_condition, WeatherCondition::from_level(v))
                }
                RAINFALL_MM => set(&mut input.rainfall_mm, v.parse().ok()),
                TEMPERATURE_CELSIUS => set(&mut input.temperature_celsius, v.parse().ok()),
                DAYS_TO_HARVEST => set(&mut input.days_to_harvest, v.parse().ok()),
                FERTILIZER_USED => set(&mut input.fertilizer_used, v.parse().ok()),
                IRRIGATION_USED => set(&mut input.irrigation_used, v.parse().ok()),
                _ => {}
            }
        }
        input
    }

    pub fn numeric_values(&self) -> [(&'static str, f64); 3] {
        [
            (RAINFALL_MM, self.rainfall_mm),
            (TEMPERATURE_CELSIUS, self.temperature_celsius),
            (DAYS_TO_HARVEST, f64::from(self.days_to_harvest)),
        ]
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn bool_level(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

fn check_min(field: &'static str, value: f64, min: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < min {
        return Err(InputError::BelowMinimum { field, min, value });
    }
    Ok(())
}

/// Everything the presenter shows for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub yield_tons_per_hectare: f64,
    pub category: YieldCategory,
    pub label: &'static str,
    pub advisory: &'static str,
    pub progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_defaults_are_valid() {
        assert_eq!(CropInput::default().validate(), Ok(()));
    }

    #[test]
    fn test_negative_rainfall_rejected() {
        let input = CropInput { rainfall_mm: -1.0, ..CropInput::default() };
        assert_eq!(
            input.validate(),
            Err(InputError::BelowMinimum { field: RAINFALL_MM, min: 0.0, value: -1.0 })
        );
    }

    #[test]
    fn test_zero_days_rejected() {
        let input = CropInput { days_to_harvest: 0, ..CropInput::default() };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_nan_temperature_rejected() {
        let input = CropInput { temperature_celsius: f64::NAN, ..CropInput::default() };
        assert_eq!(
            input.validate(),
            Err(InputError::NotFinite { field: TEMPERATURE_CELSIUS })
        );
    }

    #[test]
    fn test_levels_match_field_table() {
        let input = CropInput::default();
        for ((name, level), field) in input.categorical_levels().iter().zip(CATEGORICAL_FIELDS) {
            assert_eq!(*name, field.name);
            assert!(field.levels.contains(level), "{level} not a level of {name}");
        }
        assert_eq!(Region::ALL.len(), CATEGORICAL_FIELDS[0].levels.len());
        assert_eq!(Crop::ALL[2].as_str(), "Cotton");
    }

    #[test]
    fn test_prefill_keeps_parsable_fields() {
        let pairs: Vec<(String, String)> = [
            ("Region", "South"),
            ("Crop", "Maize"),
            ("Rainfall_mm", "12.5"),
            ("Days_to_Harvest", "1.5"),
            ("Irrigation_Used", "false"),
            ("Soil_Type", "Peat"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let input = CropInput::prefill(&pairs);
        assert_eq!(input.region, Region::South);
        assert_eq!(input.crop, Crop::Maize);
        assert_eq!(input.rainfall_mm, 12.5);
        assert!(!input.irrigation_used);
        // unparsable values fall back to the form defaults
        assert_eq!(input.days_to_harvest, 1);
        assert_eq!(input.soil_type, SoilType::Sandy);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(CropInput::default()).unwrap();
        assert_eq!(json["Soil_Type"], "Sandy");
        assert_eq!(json["Days_to_Harvest"], 1);
        assert_eq!(json["Fertilizer_Used"], true);
    }
}
