//! Error taxonomy of the radiation engine.
//!
//! Every variant is permanent for the given input: the computation is pure
//! and deterministic, so callers should fix the input instead of retrying.

use std::fmt;

use thiserror::Error;

/// Which geometry input an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Sensor,
    Context,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Sensor => write!(f, "sensor"),
            GeometryKind::Context => write!(f, "context"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RadiationError {
    #[error("Invalid time series at record {index}: {reason}")]
    InvalidTimeSeries { index: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid ground reflectance {0}: must be within [0, 1]")]
    InvalidReflectance(f64),

    #[error("Dome mismatch: sky has {sky} patches, ground has {ground}")]
    DomeMismatch { sky: usize, ground: usize },

    #[error("Malformed {kind} geometry at element {index}: {reason}")]
    MalformedGeometry {
        kind: GeometryKind,
        index: usize,
        reason: String,
    },

    #[error("Evaluation cancelled after {evaluated} sensors")]
    Cancelled { evaluated: usize },
}

impl RadiationError {
    pub(crate) fn time_series(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidTimeSeries {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    pub(crate) fn geometry(kind: GeometryKind, index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedGeometry {
            kind,
            index,
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RadiationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let e = RadiationError::time_series(42, "hour 25 out of range");
        assert_eq!(
            e.to_string(),
            "Invalid time series at record 42: hour 25 out of range"
        );

        let e = RadiationError::geometry(GeometryKind::Context, 7, "zero area");
        assert_eq!(
            e.to_string(),
            "Malformed context geometry at element 7: zero area"
        );

        let e = RadiationError::DomeMismatch { sky: 145, ground: 577 };
        assert!(e.to_string().contains("145"));
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(RadiationError::InvalidReflectance(1.5))?
        }
        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<RadiationError>().is_some());
    }
}
