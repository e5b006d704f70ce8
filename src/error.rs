//! Error types for the dashboard engine.
//!
//! Load-time failures ([`StoreError`]) are fatal. Per-event failures
//! ([`SelectionError`]) reject a single input signal and leave the session
//! untouched. [`AggregateError`] signals a malformed slice reaching the
//! aggregation functions, which the composer is expected to prevent.

/// Errors raised while admitting records into the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A record violates the value domain or uniqueness of the store.
    #[error("invalid record #{index}: {reason}")]
    Validation {
        /// Position of the offending record in the input sequence.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors raised by the aggregation functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    /// A mean was requested over no records.
    #[error("cannot aggregate an empty record set")]
    EmptySet,

    /// The slice does not have the shape the function requires.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// A relative change was requested against a zero baseline.
    #[error("relative change from a zero baseline is undefined")]
    DivideByZero,
}

/// Errors raised when applying an input signal to the selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The value is not part of the dataset's domain.
    #[error("unknown {signal} value '{value}'")]
    UnknownKey {
        /// Signal that carried the value.
        signal: String,
        /// Offending value as received.
        value: String,
    },

    /// The signal name is not one the dashboard recognizes.
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),
}

impl SelectionError {
    pub(crate) fn unknown_key(signal: impl Into<String>, value: impl ToString) -> Self {
        Self::UnknownKey {
            signal: signal.into(),
            value: value.to_string(),
        }
    }
}

/// Errors surfaced by a dashboard session transaction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    /// The input signal was rejected.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A view could not be built; indicates a composer bug.
    #[error("internal error while composing views: {0}")]
    Internal(#[from] AggregateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SelectionError::unknown_key("year", 1800);
        assert_eq!(err.to_string(), "unknown year value '1800'");

        let err = SelectionError::UnknownSignal("zoom".to_string());
        assert_eq!(err.to_string(), "unknown signal 'zoom'");

        let err = StoreError::Validation {
            index: 3,
            reason: "negative rate".to_string(),
        };
        assert_eq!(err.to_string(), "invalid record #3: negative rate");
    }

    #[test]
    fn test_dashboard_error_from_selection() {
        let err: DashboardError = SelectionError::UnknownSignal("x".to_string()).into();
        assert!(matches!(err, DashboardError::Selection(_)));
        assert_eq!(err.to_string(), "unknown signal 'x'");
    }
}
