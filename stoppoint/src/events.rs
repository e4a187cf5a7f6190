// Target event handling
//
// Events are pushed by the target to report breakpoint hits, exceptions,
// class loads, etc. Each carries the owner tag of its subscription.

use crate::target::{Owner, SuspendPolicy};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Single event delivered by the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub request_id: RequestId,
    pub owner: Option<Owner>,
    pub thread: Option<ThreadRef>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    Breakpoint {
        location: Location,
    },
    Exception {
        exception_type: String,
        location: Location,
        catch_location: Option<Location>,
    },
    ClassPrepare {
        type_info: TypeInfo,
    },
    ClassUnload {
        type_name: String,
    },
    ThreadStart,
    ThreadDeath,
    FieldAccess {
        field: FieldInfo,
        object: Option<ObjectId>,
        location: Location,
        current: Value,
    },
    FieldModify {
        field: FieldInfo,
        object: Option<ObjectId>,
        location: Location,
        current: Value,
        new_value: Value,
    },
    MethodEntry {
        location: Location,
        method: String,
    },
    MethodExit {
        location: Location,
        method: String,
    },
}

impl TargetEvent {
    /// Frame the event can be evaluated against, if it happened on a thread
    /// at a code location.
    pub fn frame_context(&self) -> Option<FrameContext> {
        let thread = self.thread.as_ref()?;
        match self.kind {
            EventKind::ClassPrepare { .. }
            | EventKind::ClassUnload { .. }
            | EventKind::ThreadStart
            | EventKind::ThreadDeath => None,
            _ => Some(FrameContext {
                thread: thread.id,
                frame: 0,
            }),
        }
    }

    /// One-line summary used in stop notices
    pub fn describe(&self) -> String {
        match &self.kind {
            EventKind::Breakpoint { location } => format!("hit at {}", describe_location(location)),
            EventKind::Exception {
                exception_type,
                catch_location,
                ..
            } => {
                let state = if catch_location.is_some() { "caught" } else { "uncaught" };
                format!("{} thrown ({})", exception_type, state)
            }
            EventKind::ClassPrepare { type_info } => format!("class prepared {}", type_info.name),
            EventKind::ClassUnload { type_name } => format!("class unloaded {}", type_name),
            EventKind::ThreadStart => format!("thread started {}", self.thread_label()),
            EventKind::ThreadDeath => format!("thread died {}", self.thread_label()),
            EventKind::FieldAccess { field, object, current, .. } => {
                format!("accessed {}, {}, {}", field.name, object_label(*object), current)
            }
            EventKind::FieldModify {
                field, object, new_value, ..
            } => format!("modified {}, {}, {}", field.name, object_label(*object), new_value),
            EventKind::MethodEntry { method, location } => {
                format!("entered {} {}", method, describe_location(location))
            }
            EventKind::MethodExit { method, location } => {
                format!("exited {} {}", method, describe_location(location))
            }
        }
    }

    fn thread_label(&self) -> String {
        match &self.thread {
            Some(t) if !t.name.is_empty() => format!("\"{}\"", t.name),
            Some(t) => t.id.to_string(),
            None => "?".to_string(),
        }
    }
}

fn describe_location(location: &Location) -> String {
    match location.line {
        Some(line) => format!("line {}", line),
        None => format!("index {}", location.index),
    }
}

fn object_label(object: Option<ObjectId>) -> String {
    object.map_or_else(|| "static".to_string(), |id| format!("@{:x}", id))
}

/// Outcome of handing an event to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the target continue
    Resume,
    /// Keep the target stopped per the given policy
    Suspend(SuspendPolicy),
}

impl Decision {
    pub fn should_resume(self) -> bool {
        matches!(self, Decision::Resume)
    }
}
