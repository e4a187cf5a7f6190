// Exception breakpoints

use crate::error::ResolveError;
use crate::events::{EventKind, TargetEvent};
use crate::pattern::ReferenceTypeSpec;
use crate::target::SubscriptionKind;
use crate::types::{TypeInfo, TypeKind};
use serde::{Deserialize, Serialize};

/// Platform signal raised in a thread being stopped; never a user error
pub const THREAD_DEATH: &str = "java.lang.ThreadDeath";

/// Stop when an exception matching the pattern is thrown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionBreakpoint {
    pub pattern: ReferenceTypeSpec,
    pub caught: bool,
    pub uncaught: bool,
}

impl ExceptionBreakpoint {
    pub fn new(pattern: ReferenceTypeSpec, caught: bool, uncaught: bool) -> Self {
        Self {
            pattern,
            caught,
            uncaught,
        }
    }

    pub(crate) fn resolve_type(&self, ty: &TypeInfo) -> Result<SubscriptionKind, ResolveError> {
        if ty.kind != TypeKind::Class {
            return Err(ResolveError::InvalidTypeKind(ty.name.clone()));
        }
        Ok(SubscriptionKind::Exception {
            type_id: Some(ty.type_id),
            caught: self.caught,
            uncaught: self.uncaught,
        })
    }

    pub(crate) fn accepts(&self, event: &TargetEvent) -> bool {
        match &event.kind {
            EventKind::Exception { catch_location, .. } => {
                if catch_location.is_some() {
                    self.caught
                } else {
                    self.uncaught
                }
            }
            _ => true,
        }
    }
}

/// Subscription of the session-wide uncaught exception breakpoint
pub(crate) fn uncaught_subscription() -> SubscriptionKind {
    SubscriptionKind::Exception {
        type_id: None,
        caught: false,
        uncaught: true,
    }
}

pub(crate) fn uncaught_accepts(event: &TargetEvent) -> bool {
    match &event.kind {
        EventKind::Exception { exception_type, .. } => exception_type != THREAD_DEATH,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, ThreadRef};

    fn thrown(name: &str, caught: bool) -> TargetEvent {
        let location = Location {
            type_id: 1,
            method_id: 1,
            index: 4,
            line: Some(7),
        };
        TargetEvent {
            request_id: 3,
            owner: None,
            thread: Some(ThreadRef {
                id: 1,
                name: "main".into(),
            }),
            kind: EventKind::Exception {
                exception_type: name.to_string(),
                catch_location: caught.then(|| location.clone()),
                location,
            },
        }
    }

    #[test]
    fn test_caught_flags() {
        let spec = ReferenceTypeSpec::new("java.io.IOException").unwrap();
        let only_uncaught = ExceptionBreakpoint::new(spec, false, true);
        assert!(!only_uncaught.accepts(&thrown("java.io.IOException", true)));
        assert!(only_uncaught.accepts(&thrown("java.io.IOException", false)));
    }

    #[test]
    fn test_uncaught_ignores_thread_death() {
        assert!(!uncaught_accepts(&thrown(THREAD_DEATH, false)));
        assert!(uncaught_accepts(&thrown("java.lang.IllegalStateException", false)));
    }

    #[test]
    fn test_interfaces_cannot_be_thrown() {
        let spec = ReferenceTypeSpec::new("*Exception").unwrap();
        let bp = ExceptionBreakpoint::new(spec, true, true);
        let iface = TypeInfo {
            type_id: 5,
            name: "com.FooException".into(),
            kind: TypeKind::Interface,
            prepared: true,
        };
        assert!(matches!(
            bp.resolve_type(&iface),
            Err(ResolveError::InvalidTypeKind(_))
        ));
    }
}
