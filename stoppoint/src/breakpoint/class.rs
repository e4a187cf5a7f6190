// Class breakpoints
//
// Fire when a class matching the breakpoint's class filters is prepared or
// unloaded. The subscription itself is the class-prepare request, so there
// is nothing to resolve.

use crate::target::SubscriptionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBreakpoint {
    pub on_prepare: bool,
    pub on_unload: bool,
}

impl ClassBreakpoint {
    pub fn new(on_prepare: bool, on_unload: bool) -> Self {
        Self {
            on_prepare,
            on_unload,
        }
    }

    pub(crate) fn subscriptions(&self) -> Vec<SubscriptionKind> {
        let mut kinds = Vec::new();
        if self.on_prepare {
            kinds.push(SubscriptionKind::ClassPrepare { pattern: None });
        }
        if self.on_unload {
            kinds.push(SubscriptionKind::ClassUnload { pattern: None });
        }
        kinds
    }
}
