use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input detected before any simulation runs.
    #[error("invalid `{field}` = {value}: {constraint}")]
    Configuration { field: String, value: String, constraint: String },

    #[error("unrecognised goal `{0}`")]
    InvalidGoal(String),

    /// Every candidate of an evaluation batch failed.
    #[error("optimisation failed after {evaluations} evaluations: {reason}")]
    OptimisationFailed { evaluations: usize, reason: String },

    /// A single candidate could not be evaluated.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl Error {
    pub fn configuration(
        field: impl Into<String>,
        value: impl Display,
        constraint: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            field: field.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Fail with a configuration error unless the condition holds.
macro_rules! ensure_config {
    ($condition:expr, $field:expr, $value:expr, $constraint:expr $(,)?) => {
        if !$condition {
            return Err($crate::error::Error::configuration($field, $value, $constraint));
        }
    };
}

pub(crate) use ensure_config;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message() {
        let error = Error::configuration("costs.lifetime_years", -1.0, "must be positive");
        assert_eq!(error.to_string(), "invalid `costs.lifetime_years` = -1: must be positive");
        assert!(error.is_configuration());
    }

    #[test]
    fn test_optimisation_failed_message() {
        let error =
            Error::OptimisationFailed { evaluations: 12, reason: "all infeasible".to_string() };
        assert_eq!(error.to_string(), "optimisation failed after 12 evaluations: all infeasible");
    }
}
