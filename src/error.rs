//! ## Errors for geoknn
//!
//! This module defines the error taxonomy used internally by geoknn. There is no retry logic
//! anywhere in the crate: a failure is returned synchronously from `build` or from a stream's
//! `next`, and a stream that has produced an error is left exhausted.

use crate::provider::ShapeId;
use std::error::Error;
use std::fmt;

/// Errors that can occur while building or querying an index.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKnnError {
    /// A `BuildParams` value violates one of its documented constraints.
    InvalidParameter {
        /// Human-readable description of which parameter and why.
        message: String,
    },
    /// A shape's bounding box contains a NaN or infinite coordinate.
    ///
    /// The index cannot host non-finite bboxes, since lower-bound soundness depends on ordered
    /// float comparisons that NaN breaks silently.
    NonFiniteCoordinate {
        /// The offending shape.
        shape: ShapeId,
    },
    /// The geometry collaborator (`bbox`/`distance`) failed. Propagated without transformation.
    Geometry(String),
}

impl fmt::Display for GeoKnnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoKnnError::InvalidParameter { message } => {
                write!(f, "invalid build parameter: {message}")
            }
            GeoKnnError::NonFiniteCoordinate { shape } => {
                write!(
                    f,
                    "shape {shape:?} has a non-finite coordinate; the index cannot host it"
                )
            }
            GeoKnnError::Geometry(message) => write!(f, "geometry collaborator failed: {message}"),
        }
    }
}

impl Error for GeoKnnError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let err = GeoKnnError::InvalidParameter {
            message: "max_fanout must be >= 2".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "invalid build parameter: max_fanout must be >= 2"
        );
    }

    #[test]
    fn test_non_finite_coordinate_display() {
        let err = GeoKnnError::NonFiniteCoordinate { shape: 7 };
        assert_eq!(
            format!("{err}"),
            "shape 7 has a non-finite coordinate; the index cannot host it"
        );
    }
}
