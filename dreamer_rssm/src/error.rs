//! Error types for the latent dynamics core.
//!
//! Every operation in this crate is a pure function of its inputs and fresh
//! noise, so the only failures are malformed shapes and invalid configuration.
//! Both are surfaced synchronously to the caller.

/// Result type for this crate.
pub type Result<T> = core::result::Result<T, DreamerError>;

/// Errors raised by configuration, dynamics and distribution construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DreamerError {
    /// A tensor dimension disagrees with the configured sizes or with its
    /// sibling inputs. Incompatible shapes are never broadcast.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A configuration value is out of its valid domain.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfiguration {
        field: &'static str,
        message: String,
    },
}

impl DreamerError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }
}

/// Fail with [`DreamerError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_dims<const D: usize>(
    what: &'static str,
    expected: [usize; D],
    actual: [usize; D],
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DreamerError::shape(what, &expected, &actual))
    }
}
