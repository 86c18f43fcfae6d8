//! Grid configuration, validation, and error types.
//!
//! [`GridConfig`] carries everything the boundary/config collaborator
//! decides for the grid: the boundary policy, the bound cuboid used by
//! closed and periodic domains, an optional fixed box length, and the box
//! budget. Loading it from a file is the caller's business.

use thiserror::Error;

use crate::boundary::BoundaryPolicy;

/// Default upper limit on the number of boxes in one grid (2^26).
pub const DEFAULT_MAX_BOX_COUNT: usize = 1 << 26;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`GridConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// `min_bound`/`max_bound` are non-finite or not strictly ordered.
    #[error("bounds must be finite with min_bound < max_bound, got [{min_bound}, {max_bound}]")]
    InvalidBounds {
        /// Configured lower bound.
        min_bound: f64,
        /// Configured upper bound.
        max_bound: f64,
    },
    /// A fixed box length is zero, negative, or non-finite.
    #[error("box length must be finite and positive, got {value}")]
    InvalidBoxLength {
        /// The rejected value.
        value: f64,
    },
    /// `max_box_count` is zero.
    #[error("max_box_count must be at least 1")]
    ZeroBoxBudget,
}

// ── GridConfig ─────────────────────────────────────────────────────

/// Configuration for a [`UniformGrid`](crate::UniformGrid).
#[derive(Clone, Debug, PartialEq)]
pub struct GridConfig {
    /// Domain boundary policy. Default: [`BoundaryPolicy::Open`].
    pub policy: BoundaryPolicy,
    /// Lower bound of the cuboid on every axis (Closed/Torus only). Default: 0.
    pub min_bound: f64,
    /// Upper bound of the cuboid on every axis (Closed/Torus only). Default: 100.
    pub max_bound: f64,
    /// Fixed box length. `None` derives it from the largest agent
    /// diameter on every rebuild. Default: `None`.
    pub box_length: Option<f64>,
    /// Maximum number of boxes a rebuild may allocate.
    /// Default: [`DEFAULT_MAX_BOX_COUNT`].
    pub max_box_count: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            policy: BoundaryPolicy::Open,
            min_bound: 0.0,
            max_bound: 100.0,
            box_length: None,
            max_box_count: DEFAULT_MAX_BOX_COUNT,
        }
    }
}

impl GridConfig {
    /// Closed (reflecting) cuboid `[min_bound, max_bound]^3`.
    pub fn closed(min_bound: f64, max_bound: f64) -> Self {
        Self {
            policy: BoundaryPolicy::Closed,
            min_bound,
            max_bound,
            ..Self::default()
        }
    }

    /// Periodic cuboid `[min_bound, max_bound]^3`.
    pub fn torus(min_bound: f64, max_bound: f64) -> Self {
        Self {
            policy: BoundaryPolicy::Torus,
            min_bound,
            max_bound,
            ..Self::default()
        }
    }

    /// Return a copy with a fixed box length.
    pub fn with_box_length(mut self, box_length: f64) -> Self {
        self.box_length = Some(box_length);
        self
    }

    /// Check structural invariants.
    ///
    /// Bounds are only checked for bounded policies; an open grid ignores them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.is_bounded()
            && !(self.min_bound.is_finite()
                && self.max_bound.is_finite()
                && self.min_bound < self.max_bound)
        {
            return Err(ConfigError::InvalidBounds {
                min_bound: self.min_bound,
                max_bound: self.max_bound,
            });
        }
        if let Some(value) = self.box_length {
            validate_box_length(value)?;
        }
        if self.max_box_count == 0 {
            return Err(ConfigError::ZeroBoxBudget);
        }
        Ok(())
    }

    /// Length of the bound cuboid along each axis.
    pub fn period(&self) -> f64 {
        self.max_bound - self.min_bound
    }
}

pub(crate) fn validate_box_length(value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidBoxLength { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = GridConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.policy, BoundaryPolicy::Open);
        assert_eq!(cfg.box_length, None);
    }

    #[test]
    fn open_ignores_bounds() {
        let cfg = GridConfig {
            min_bound: 10.0,
            max_bound: -10.0,
            ..GridConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let cfg = GridConfig::closed(99.0, 1.0);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidBounds {
                min_bound: 99.0,
                max_bound: 1.0
            })
        );
        assert!(GridConfig::torus(0.0, f64::INFINITY).validate().is_err());
        assert!(GridConfig::torus(5.0, 5.0).validate().is_err());
    }

    #[test]
    fn bad_box_length_rejected() {
        for value in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let cfg = GridConfig::default().with_box_length(value);
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidBoxLength { .. })
            ));
        }
        assert!(GridConfig::default().with_box_length(15.0).validate().is_ok());
    }

    #[test]
    fn zero_budget_rejected() {
        let cfg = GridConfig {
            max_box_count: 0,
            ..GridConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBoxBudget));
    }

    #[test]
    fn period_is_bound_span() {
        assert_eq!(GridConfig::torus(-50.0, 50.0).period(), 100.0);
    }
}
