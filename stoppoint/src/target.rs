// Target collaborator interface
//
// Everything the engine needs from the debuggee: type queries, global
// suspend/resume and event subscriptions (EventRequest.Set / Clear).

use crate::error::{BreakpointError, TargetResult};
use crate::types::{
    FieldInfo, Location, MethodInfo, ObjectId, ReferenceTypeId, RequestId, TypeInfo,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suspend policy for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SuspendPolicy {
    None = 0,
    EventThread = 1,
    #[default]
    All = 2,
}

impl fmt::Display for SuspendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SuspendPolicy::None => "suspend none",
            SuspendPolicy::EventThread => "suspend thread",
            SuspendPolicy::All => "suspend all",
        };
        f.write_str(label)
    }
}

impl FromStr for SuspendPolicy {
    type Err = BreakpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SuspendPolicy::All),
            "thread" | "event_thread" | "eventthread" => Ok(SuspendPolicy::EventThread),
            "none" => Ok(SuspendPolicy::None),
            other => Err(BreakpointError::InvalidSuspendPolicy(other.to_string())),
        }
    }
}

/// Opaque owner tag attached to a subscription and echoed on its events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Breakpoint(u32),
    UncaughtException,
}

/// What a subscription watches for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Breakpoint {
        location: Location,
    },
    Exception {
        /// None = any throwable
        type_id: Option<ReferenceTypeId>,
        caught: bool,
        uncaught: bool,
    },
    ClassPrepare {
        pattern: Option<String>,
    },
    ClassUnload {
        pattern: Option<String>,
    },
    FieldAccess {
        field: FieldInfo,
        instance: Option<ObjectId>,
    },
    FieldModify {
        field: FieldInfo,
        instance: Option<ObjectId>,
    },
    ThreadStart,
    ThreadDeath,
    MethodEntry,
    MethodExit,
}

/// Parameters of a new subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub kind: SubscriptionKind,
    pub suspend_policy: SuspendPolicy,
    pub thread_filters: Vec<String>,
    pub class_filters: Vec<String>,
    pub owner: Owner,
    pub enabled: bool,
}

impl SubscriptionRequest {
    pub fn new(kind: SubscriptionKind, owner: Owner) -> Self {
        Self {
            kind,
            suspend_policy: SuspendPolicy::All,
            thread_filters: Vec::new(),
            class_filters: Vec::new(),
            owner,
            enabled: true,
        }
    }
}

/// The debuggee as seen by the engine.
///
/// Implementations are shared between the command thread and the event
/// delivery thread, so every method takes `&self`.
pub trait Target: Send + Sync {
    /// Loaded types with exactly this name
    fn classes_by_name(&self, name: &str) -> TargetResult<Vec<TypeInfo>>;

    /// Every loaded type. Callers suspend the target around this query.
    fn all_classes(&self) -> TargetResult<Vec<TypeInfo>>;

    fn nested_types(&self, type_id: ReferenceTypeId) -> TargetResult<Vec<TypeInfo>>;

    fn suspend(&self) -> TargetResult<()>;

    fn resume(&self) -> TargetResult<()>;

    fn has_line_info(&self, type_id: ReferenceTypeId) -> bool;

    /// Fails with `AbsentInformation` when the type carries no line table
    fn locations_of_line(
        &self,
        type_id: ReferenceTypeId,
        line: u32,
    ) -> TargetResult<Vec<Location>>;

    fn methods(&self, type_id: ReferenceTypeId) -> TargetResult<Vec<MethodInfo>>;

    fn can_use_instance_filters(&self) -> bool;

    fn create_subscription(&self, request: &SubscriptionRequest) -> TargetResult<RequestId>;

    fn set_subscription_enabled(&self, id: RequestId, enabled: bool) -> TargetResult<()>;

    fn set_subscription_suspend_policy(
        &self,
        id: RequestId,
        policy: SuspendPolicy,
    ) -> TargetResult<()>;

    fn delete_subscription(&self, id: RequestId) -> TargetResult<()>;
}
