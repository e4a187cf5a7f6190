// Thread breakpoints

use crate::events::TargetEvent;
use crate::target::SubscriptionKind;
use serde::{Deserialize, Serialize};

/// Stop when a thread starts and/or dies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadBreakpoint {
    /// Only threads with exactly this name; None = any thread
    #[serde(default)]
    pub thread_name: Option<String>,
    pub on_start: bool,
    pub on_death: bool,
}

impl ThreadBreakpoint {
    pub fn new(thread_name: Option<String>, on_start: bool, on_death: bool) -> Self {
        Self {
            thread_name,
            on_start,
            on_death,
        }
    }

    pub(crate) fn subscriptions(&self) -> Vec<SubscriptionKind> {
        let mut kinds = Vec::new();
        if self.on_start {
            kinds.push(SubscriptionKind::ThreadStart);
        }
        if self.on_death {
            kinds.push(SubscriptionKind::ThreadDeath);
        }
        kinds
    }

    /// Name filter, applied before the hit is counted
    pub(crate) fn accepts(&self, event: &TargetEvent) -> bool {
        match (&self.thread_name, &event.thread) {
            (None, _) => true,
            (Some(wanted), Some(thread)) => *wanted == thread.name,
            (Some(_), None) => false,
        }
    }
}
