// Error definitions
//
// Parse and eager-resolution errors reach the caller. Everything else is
// logged and the engine carries on.

use crate::types::RequestId;
use thiserror::Error;

pub type BreakpointResult<T> = Result<T, BreakpointError>;
pub type TargetResult<T> = Result<T, TargetError>;

/// Failures reported by the target collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Target disconnected")]
    Disconnected,

    #[error("Absent debug information")]
    AbsentInformation,

    #[error("Class not prepared")]
    ClassNotPrepared,

    #[error("Invalid event request {0}")]
    InvalidRequest(RequestId),

    #[error("Target error: {0}")]
    Other(String),
}

impl TargetError {
    pub fn is_disconnect(&self) -> bool {
        matches!(self, TargetError::Disconnected)
    }
}

/// A syntactically valid breakpoint that cannot be bound to the target
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} has no line number information")]
    AbsentLineInfo(String),

    #[error("No code at line {line} in {class}")]
    LineNotFound { class: String, line: u32 },

    #[error("No such method {method} in {class}")]
    NoSuchMethod { class: String, method: String },

    #[error("Method {method} in {class} is overloaded, specify argument types")]
    AmbiguousMethod { class: String, method: String },

    #[error("{0} is not a class")]
    InvalidTypeKind(String),

    #[error("Cannot resolve field: {0}")]
    FieldLookup(String),

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// A malformed textual breakpoint specification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing specification")]
    Empty,

    #[error("{pattern}: invalid part = {part}")]
    InvalidPattern { pattern: String, part: String },

    #[error("invalid method: {0}")]
    MalformedMember(String),

    #[error("class name required")]
    MissingClass,

    #[error("invalid line number: {0}")]
    InvalidLine(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure evaluating an expression in the target
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("evaluation failed: {0}")]
pub struct EvalError(pub String);

/// Failure executing a monitor command
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("command failed: {0}")]
pub struct MonitorError(pub String);

#[derive(Debug, Error)]
pub enum BreakpointError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("No such breakpoint: {0}")]
    NotFound(u32),

    #[error("No such breakpoint group: {0}")]
    GroupNotFound(String),

    #[error("Cannot remove the default group")]
    RootGroup,

    #[error("Breakpoint {0} must be disabled to change its filters")]
    FiltersWhileEnabled(u32),

    #[error("Not a valid suspend policy: {0}")]
    InvalidSuspendPolicy(String),

    #[error("No such {kind} at index {index}")]
    NoSuchEntry { kind: &'static str, index: usize },

    #[error("Session is not active")]
    NotActive,

    #[error("Persistence error: {0}")]
    Persist(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_wraps_target() {
        let err: ResolveError = TargetError::AbsentInformation.into();
        assert_eq!(err.to_string(), "Absent debug information");

        let err: BreakpointError = ResolveError::LineNotFound {
            class: "com.example.Foo".into(),
            line: 42,
        }
        .into();
        assert_eq!(err.to_string(), "No code at line 42 in com.example.Foo");
    }

    #[test]
    fn test_disconnect_detection() {
        assert!(TargetError::Disconnected.is_disconnect());
        assert!(!TargetError::AbsentInformation.is_disconnect());
    }
}
