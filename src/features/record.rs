//! Feature Record - one patient's model input
//!
//! Records are built from untyped JSON by name (never by position) and every
//! bad field is reported, not just the first one.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::layout::{feature_index, FeatureSpec, FEATURE_COUNT, FEATURE_SCHEMA};

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    /// "missing", "type" or "range"
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Every field-level problem found in one record, in layout order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    /// Error for input that is not an object at all
    pub fn body(message: &str) -> Self {
        Self(vec![FieldError::new("__root__", "type", message)])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .map(|(field, _)| {
                let field = field.to_string();
                let message = match feature_index(&field) {
                    Some(i) => format!("must be {}", FEATURE_SCHEMA[i].domain.describe()),
                    None => "invalid value".to_string(),
                };
                FieldError::new(&field, "range", message)
            })
            .collect();

        fields.sort_by_key(|e| feature_index(&e.field).unwrap_or(usize::MAX));
        FieldErrors(fields)
    }
}

// ============================================================================
// FEATURE RECORD
// ============================================================================

/// Patient health data, one field per layout column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Validate)]
pub struct FeatureRecord {
    #[validate(range(min = 18, max = 100))]
    pub age: u16,
    #[validate(range(min = 0, max = 1))]
    pub sex: u8,
    #[validate(range(min = 0, max = 3))]
    pub cp: u8,
    #[validate(range(min = 90, max = 200))]
    pub trestbps: u16,
    #[validate(range(min = 100, max = 600))]
    pub chol: u16,
    #[validate(range(min = 0, max = 1))]
    pub fbs: u8,
    #[validate(range(min = 0, max = 2))]
    pub restecg: u8,
    #[validate(range(min = 60, max = 220))]
    pub thalach: u16,
    #[validate(range(min = 0, max = 1))]
    pub exang: u8,
    #[validate(range(min = 0.0, max = 6.2))]
    pub oldpeak: f64,
    #[validate(range(min = 0, max = 2))]
    pub slope: u8,
    #[validate(range(min = 0, max = 4))]
    pub ca: u8,
    #[validate(range(min = 0, max = 3))]
    pub thal: u8,
}

impl FeatureRecord {
    /// Build a record from an untyped JSON value
    pub fn from_value(value: &Value) -> Result<Self, FieldErrors> {
        match value.as_object() {
            Some(map) => Self::from_map(map),
            None => Err(FieldErrors::body("expected a JSON object of patient features")),
        }
    }

    /// Build a record from a field-name → value mapping.
    ///
    /// Unknown keys are ignored. On failure every missing, mistyped or
    /// out-of-domain field is listed.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut values = [0.0f64; FEATURE_COUNT];
        let mut errors = Vec::new();

        for (slot, spec) in values.iter_mut().zip(FEATURE_SCHEMA.iter()) {
            match read_field(spec, map.get(spec.name)) {
                Ok(v) => *slot = v,
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(FieldErrors(errors));
        }

        Ok(Self::from_checked(&values))
    }

    /// Re-check a record that may have been constructed directly
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::default(),
            Err(e) => FieldErrors::from(e),
        };

        // NaN slips through range comparisons
        if !self.oldpeak.is_finite() && !errors.field_names().contains(&"oldpeak") {
            errors.0.push(FieldError::new("oldpeak", "range", "must be a finite number"));
            errors.0.sort_by_key(|e| feature_index(&e.field).unwrap_or(usize::MAX));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Project into the model input vector, in layout order
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age as f64,
            self.sex as f64,
            self.cp as f64,
            self.trestbps as f64,
            self.chol as f64,
            self.fbs as f64,
            self.restecg as f64,
            self.thalach as f64,
            self.exang as f64,
            self.oldpeak,
            self.slope as f64,
            self.ca as f64,
            self.thal as f64,
        ]
    }

    /// Values already passed `read_field`, so the narrowing casts are exact.
    fn from_checked(v: &[f64; FEATURE_COUNT]) -> Self {
        Self {
            age: v[0] as u16,
            sex: v[1] as u8,
            cp: v[2] as u8,
            trestbps: v[3] as u16,
            chol: v[4] as u16,
            fbs: v[5] as u8,
            restecg: v[6] as u8,
            thalach: v[7] as u16,
            exang: v[8] as u8,
            oldpeak: v[9],
            slope: v[10] as u8,
            ca: v[11] as u8,
            thal: v[12] as u8,
        }
    }
}

fn read_field(spec: &FeatureSpec, value: Option<&Value>) -> Result<f64, FieldError> {
    let value = value.ok_or_else(|| FieldError::new(spec.name, "missing", "field required"))?;

    let number = value.as_f64().ok_or_else(|| {
        let expected = if spec.domain.is_integral() { "an integer" } else { "a number" };
        FieldError::new(spec.name, "type", format!("must be {}", expected))
    })?;

    if spec.domain.is_integral() && number.fract() != 0.0 {
        return Err(FieldError::new(spec.name, "type", "must be an integer"));
    }

    if !spec.domain.contains(number) {
        return Err(FieldError::new(
            spec.name,
            "range",
            format!("must be {}", spec.domain.describe()),
        ));
    }

    Ok(number)
}

// ============================================================================
// TESTS
// ============================================================================
