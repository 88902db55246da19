use crate::StrError;
use std::fmt;

/// Defines the outcome of a failed contact operation
///
/// Local difficulties at a single integration point (e.g., no projection found) are not errors;
/// they are absorbed by the [super::ContactStatus] state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum ContactError {
    /// The current step failed but may succeed with a smaller increment
    ///
    /// Examples: degenerate (collapsed or inverted) facets; augmentations that did not converge.
    Recoverable(String),

    /// The analysis cannot proceed
    ///
    /// Examples: empty surfaces; mismatched species; exhausted retry budget.
    Fatal(String),
}

impl ContactError {
    /// Returns true if the outer driver may cut the step back and retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            ContactError::Recoverable(_) => true,
            ContactError::Fatal(_) => false,
        }
    }

    /// Returns the diagnostic message
    pub fn message(&self) -> &str {
        match self {
            ContactError::Recoverable(msg) => msg,
            ContactError::Fatal(msg) => msg,
        }
    }
}

impl From<StrError> for ContactError {
    fn from(err: StrError) -> Self {
        ContactError::Fatal(err.to_string())
    }
}

impl fmt::Display for ContactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactError::Recoverable(msg) => write!(f, "recoverable step failure: {}", msg),
            ContactError::Fatal(msg) => write!(f, "fatal error: {}", msg),
        }
    }
}

impl std::error::Error for ContactError {}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
