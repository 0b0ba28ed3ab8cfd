// Error types for scene generation

use thiserror::Error;

// A generator parameter that would produce garbage geometry.
//
// Raised by constructors and setters before any generation runs, so
// regeneration itself never has to fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: i64,
        value: i64,
    },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo { field: &'static str, value: usize },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },

    #[error("at most {max} branch levels are supported, got {value}")]
    TooManyLevels { value: usize, max: usize },
}

// Top-level error for scene configuration handling
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

// Result type alias for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

impl From<toml::de::Error> for SceneError {
    fn from(err: toml::de::Error) -> Self {
        SceneError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for SceneError {
    fn from(err: toml::ser::Error) -> Self {
        SceneError::TomlSer(err.to_string())
    }
}

// Small validation helpers shared by every generator.

pub(crate) fn require_finite(field: &'static str, value: f32) -> std::result::Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::NotFinite { field })
    }
}

pub(crate) fn require_positive(field: &'static str, value: f32) -> std::result::Result<(), ConfigurationError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NotPositive { field, value })
    }
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: f32,
) -> std::result::Result<(), ConfigurationError> {
    require_range(field, value, 0.0, f32::MAX)
}

pub(crate) fn require_at_least(
    field: &'static str,
    value: usize,
    min: usize,
) -> std::result::Result<(), ConfigurationError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigurationError::BelowMinimum {
            field,
            min: min as i64,
            value: value as i64,
        })
    }
}

pub(crate) fn require_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> std::result::Result<(), ConfigurationError> {
    require_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
