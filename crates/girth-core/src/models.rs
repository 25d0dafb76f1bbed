//! Core data models for girth prediction

use crate::error::{GirthError, Result};
use serde::{de, Deserialize, Deserializer, Serialize};

/// One of the seven measurements the girth model is trained on.
///
/// The declaration order is the canonical training column order. Packages
/// may reorder columns, in which case the assembler follows the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureField {
    HeightCm,
    LeafCount,
    SoilMoisture,
    SoilPh,
    Temperature,
    Humidity,
    SunShade,
}

impl FeatureField {
    pub const ALL: [FeatureField; 7] = [
        FeatureField::HeightCm,
        FeatureField::LeafCount,
        FeatureField::SoilMoisture,
        FeatureField::SoilPh,
        FeatureField::Temperature,
        FeatureField::Humidity,
        FeatureField::SunShade,
    ];

    /// Canonical column name
    pub fn column(&self) -> &'static str {
        match self {
            FeatureField::HeightCm => "height_cm",
            FeatureField::LeafCount => "leaf_count",
            FeatureField::SoilMoisture => "soil_moisture",
            FeatureField::SoilPh => "soil_ph",
            FeatureField::Temperature => "temperature",
            FeatureField::Humidity => "humidity",
            FeatureField::SunShade => "sun_shade",
        }
    }

    /// Human readable label, as shown next to the input control
    pub fn label(&self) -> &'static str {
        match self {
            FeatureField::HeightCm => "Plant Height",
            FeatureField::LeafCount => "Leaf Count",
            FeatureField::SoilMoisture => "Soil Moisture",
            FeatureField::SoilPh => "Soil pH",
            FeatureField::Temperature => "Temperature",
            FeatureField::Humidity => "Humidity",
            FeatureField::SunShade => "Sun Shade",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            FeatureField::HeightCm => "cm",
            FeatureField::LeafCount => "count",
            FeatureField::SoilMoisture | FeatureField::Humidity | FeatureField::SunShade => "%",
            FeatureField::SoilPh => "pH",
            FeatureField::Temperature => "°C",
        }
    }

    /// Inclusive valid range
    pub fn range(&self) -> (f64, f64) {
        match self {
            FeatureField::HeightCm => (50.0, 500.0),
            FeatureField::LeafCount => (1.0, 20.0),
            FeatureField::SoilMoisture | FeatureField::Humidity | FeatureField::SunShade => {
                (0.0, 100.0)
            }
            FeatureField::SoilPh => (3.0, 9.0),
            FeatureField::Temperature => (10.0, 45.0),
        }
    }

    /// Starting value of the input control
    pub fn default_value(&self) -> f64 {
        match self {
            FeatureField::HeightCm => 200.0,
            FeatureField::LeafCount => 5.0,
            FeatureField::SoilMoisture => 60.0,
            FeatureField::SoilPh => 6.5,
            FeatureField::Temperature => 28.0,
            FeatureField::Humidity => 70.0,
            FeatureField::SunShade => 60.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FeatureField::LeafCount)
    }

    /// Normalised spellings accepted in a model package's column list
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            FeatureField::HeightCm => &["heightcm", "height", "plantheight", "plantheightcm"],
            FeatureField::LeafCount => &["leafcount", "leaves", "numleaves", "leafno"],
            FeatureField::SoilMoisture => &["soilmoisture", "moisture", "soilmoisturepct"],
            FeatureField::SoilPh => &["soilph", "ph"],
            FeatureField::Temperature => &["temperature", "temp", "temperaturec"],
            FeatureField::Humidity => &["humidity", "relativehumidity", "humiditypct"],
            FeatureField::SunShade => &["sunshade", "shade", "sunshadepct"],
        }
    }

    /// Resolve a model column name to a field.
    ///
    /// Matching ignores case and any non-alphanumeric characters, so
    /// `"Soil pH"`, `"soil_pH"` and `"soilph"` all resolve to [`FeatureField::SoilPh`].
    pub fn from_column_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&normalized.as_str()))
    }
}

impl std::fmt::Display for FeatureField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Plant and environmental measurements for one prediction.
///
/// Fields missing from a deserialized payload take the same defaults as the
/// input controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureVector {
    #[serde(alias = "height")]
    pub height_cm: f64,
    #[serde(deserialize_with = "deserialize_whole_count")]
    pub leaf_count: u32,
    #[serde(alias = "moisture")]
    pub soil_moisture: f64,
    #[serde(alias = "soil_pH")]
    pub soil_ph: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub sun_shade: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            height_cm: FeatureField::HeightCm.default_value(),
            leaf_count: FeatureField::LeafCount.default_value() as u32,
            soil_moisture: FeatureField::SoilMoisture.default_value(),
            soil_ph: FeatureField::SoilPh.default_value(),
            temperature: FeatureField::Temperature.default_value(),
            humidity: FeatureField::Humidity.default_value(),
            sun_shade: FeatureField::SunShade.default_value(),
        }
    }
}

impl FeatureVector {
    pub fn get(&self, field: FeatureField) -> f64 {
        match field {
            FeatureField::HeightCm => self.height_cm,
            FeatureField::LeafCount => f64::from(self.leaf_count),
            FeatureField::SoilMoisture => self.soil_moisture,
            FeatureField::SoilPh => self.soil_ph,
            FeatureField::Temperature => self.temperature,
            FeatureField::Humidity => self.humidity,
            FeatureField::SunShade => self.sun_shade,
        }
    }

    /// Check every field against its valid range.
    ///
    /// Prediction itself never calls this; it is the input layer's job to
    /// reject out-of-domain values before they reach the model.
    pub fn validate(&self) -> Result<()> {
        for field in FeatureField::ALL {
            check_range(field, self.get(field))?;
        }
        Ok(())
    }
}

/// Accepts `5` as well as `5.0`; rejects fractions and negatives.
fn deserialize_whole_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "expected a whole non-negative number, got {}",
            value
        )));
    }
    Ok(value as u32)
}

/// Range-check a single value for `field`. NaN is always out of range.
pub fn check_range(field: FeatureField, value: f64) -> Result<()> {
    let (min, max) = field.range();
    if !(min..=max).contains(&value) {
        return Err(GirthError::OutOfRange {
            field: field.column(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Predicted girth output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted girth in centimetres, never below the configured floor
    pub girth_cm: f64,
    /// Raw estimator output before the target transform was inverted
    pub predicted_log: f64,
    pub model_version: String,
    pub generated_at: i64,
}

/// Importance score of one model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub score: f64,
}

/// Description of one input, used by the features listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub label: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub integer: bool,
}

impl From<FeatureField> for FeatureSpec {
    fn from(field: FeatureField) -> Self {
        let (min, max) = field.range();
        Self {
            name: field.column().to_string(),
            label: field.label().to_string(),
            unit: field.unit().to_string(),
            min,
            max,
            default: field.default_value(),
            integer: field.is_integer(),
        }
    }
}

/// All inputs in canonical order
pub fn feature_specs() -> Vec<FeatureSpec> {
    FeatureField::ALL.into_iter().map(FeatureSpec::from).collect()
}
