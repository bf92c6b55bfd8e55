//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema.**
//!
//! The scaler and classifier artifacts were fitted on exactly this column
//! order. Reordering silently corrupts predictions, so:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Total number of features
pub const FEATURE_COUNT: usize = 13;

/// Accepted values of a single feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Whole number in `[min, max]`
    Integer { min: i64, max: i64 },
    /// Any number in `[min, max]`
    Continuous { min: f64, max: f64 },
    /// One of a fixed set of codes
    Categorical(&'static [i64]),
}

impl Domain {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Domain::Integer { min, max } => {
                value.fract() == 0.0 && value >= min as f64 && value <= max as f64
            }
            Domain::Continuous { min, max } => value >= min && value <= max,
            Domain::Categorical(codes) => {
                value.fract() == 0.0 && codes.iter().any(|&c| c as f64 == value)
            }
        }
    }

    /// Whether the feature only takes whole numbers
    pub fn is_integral(&self) -> bool {
        !matches!(self, Domain::Continuous { .. })
    }

    /// Human readable description used in validation messages
    pub fn describe(&self) -> String {
        match *self {
            Domain::Integer { min, max } => format!("an integer between {} and {}", min, max),
            Domain::Continuous { min, max } => format!("a number between {:.1} and {:.1}", min, max),
            Domain::Categorical(codes) => {
                let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
                format!("one of {}", codes.join(", "))
            }
        }
    }
}

/// One column of the layout
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub domain: Domain,
}

/// Features in the exact order they appear in the model input vector.
/// This is the SINGLE SOURCE OF TRUTH for feature layout.
pub const FEATURE_SCHEMA: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        name: "age",
        description: "Age in years",
        domain: Domain::Integer { min: 18, max: 100 },
    },
    FeatureSpec {
        name: "sex",
        description: "Sex (0=Female, 1=Male)",
        domain: Domain::Categorical(&[0, 1]),
    },
    FeatureSpec {
        name: "cp",
        description: "Chest pain type (0=Typical angina, 1=Atypical angina, 2=Non-anginal pain, 3=Asymptomatic)",
        domain: Domain::Categorical(&[0, 1, 2, 3]),
    },
    FeatureSpec {
        name: "trestbps",
        description: "Resting blood pressure (mm Hg)",
        domain: Domain::Integer { min: 90, max: 200 },
    },
    FeatureSpec {
        name: "chol",
        description: "Serum cholesterol (mg/dl)",
        domain: Domain::Integer { min: 100, max: 600 },
    },
    FeatureSpec {
        name: "fbs",
        description: "Fasting blood sugar > 120 mg/dl (0=No, 1=Yes)",
        domain: Domain::Categorical(&[0, 1]),
    },
    FeatureSpec {
        name: "restecg",
        description: "Resting ECG results (0=Normal, 1=ST-T wave abnormality, 2=Left ventricular hypertrophy)",
        domain: Domain::Categorical(&[0, 1, 2]),
    },
    FeatureSpec {
        name: "thalach",
        description: "Maximum heart rate achieved (bpm)",
        domain: Domain::Integer { min: 60, max: 220 },
    },
    FeatureSpec {
        name: "exang",
        description: "Exercise induced angina (0=No, 1=Yes)",
        domain: Domain::Categorical(&[0, 1]),
    },
    FeatureSpec {
        name: "oldpeak",
        description: "ST depression induced by exercise relative to rest",
        domain: Domain::Continuous { min: 0.0, max: 6.2 },
    },
    FeatureSpec {
        name: "slope",
        description: "Slope of peak exercise ST segment (0=Upsloping, 1=Flat, 2=Downsloping)",
        domain: Domain::Categorical(&[0, 1, 2]),
    },
    FeatureSpec {
        name: "ca",
        description: "Number of major vessels colored by fluoroscopy",
        domain: Domain::Categorical(&[0, 1, 2, 3, 4]),
    },
    FeatureSpec {
        name: "thal",
        description: "Thalassemia (0=Normal, 1=Fixed defect, 2=Reversible defect, 3=Not normal)",
        domain: Domain::Categorical(&[0, 1, 2, 3]),
    },
];

/// Feature names in layout order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    FEATURE_SCHEMA.map(|spec| spec.name)
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the layout version and the ordered feature names.
/// Artifacts record it so a reordered schema is caught at load time.
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for spec in &FEATURE_SCHEMA {
        hasher.update(spec.name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: feature_names().iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_SCHEMA.iter().position(|spec| spec.name == name)
}

/// Get feature spec by name
pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    FEATURE_SCHEMA.iter().find(|spec| spec.name == name)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_SCHEMA.len(), FEATURE_COUNT);
        assert_eq!(feature_names().len(), 13);
    }

    #[test]
    fn test_feature_order() {
        assert_eq!(
            feature_names(),
            [
                "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg",
                "thalach", "exang", "oldpeak", "slope", "ca", "thal",
            ]
        );
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout_hash(), layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("age"), Some(0));
        assert_eq!(feature_index("oldpeak"), Some(9));
        assert_eq!(feature_index("thal"), Some(12));
        assert_eq!(feature_index("nonexistent"), None);
    }

    #[test]
    fn test_domain_bounds_inclusive() {
        let age = feature_spec("age").unwrap().domain;
        assert!(age.contains(18.0));
        assert!(age.contains(100.0));
        assert!(!age.contains(17.0));
        assert!(!age.contains(101.0));
        assert!(!age.contains(55.5));

        let oldpeak = feature_spec("oldpeak").unwrap().domain;
        assert!(oldpeak.contains(0.0));
        assert!(oldpeak.contains(6.2));
        assert!(!oldpeak.contains(6.3));
        assert!(!oldpeak.contains(-0.1));
    }

    #[test]
    fn test_categorical_domain() {
        let ca = feature_spec("ca").unwrap().domain;
        assert!(ca.contains(4.0));
        assert!(!ca.contains(5.0));
        assert!(!ca.contains(1.5));
        assert_eq!(ca.describe(), "one of 0, 1, 2, 3, 4");
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.hash, layout_hash());
        assert_eq!(info.feature_names.len(), FEATURE_COUNT);
    }
}
