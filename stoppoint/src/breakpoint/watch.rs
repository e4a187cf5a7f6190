// Watch breakpoints
//
// A field name only means something relative to a suspended frame, so a
// watch stays unresolved until the session supplies a current frame.

use crate::condition::Evaluator;
use crate::error::ResolveError;
use crate::target::{SubscriptionKind, Target};
use crate::types::{FieldInfo, FrameContext, ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchBreakpoint {
    pub field_name: String,
    /// Instance filter; object ids do not survive a session
    #[serde(skip)]
    pub object: Option<ObjectId>,
    pub on_access: bool,
    pub on_modify: bool,
}

impl WatchBreakpoint {
    pub fn new(field_name: impl Into<String>, on_access: bool, on_modify: bool) -> Self {
        Self {
            field_name: field_name.into(),
            object: None,
            on_access,
            on_modify,
        }
    }

    pub fn with_object(mut self, object: ObjectId) -> Self {
        self.object = Some(object);
        self
    }

    /// True when the instance filter has to be dropped on this target
    pub(crate) fn loses_instance_filter(&self, target: &dyn Target) -> bool {
        self.object.is_some() && !target.can_use_instance_filters()
    }

    /// Look the field up from the given frame. Returns the field together
    /// with the subscriptions to create for it.
    pub(crate) fn resolve(
        &self,
        target: &dyn Target,
        evaluator: &dyn Evaluator,
        frame: &FrameContext,
    ) -> Result<(FieldInfo, Vec<SubscriptionKind>), ResolveError> {
        let field = evaluator
            .locate_field(&self.field_name, frame)
            .map_err(|e| ResolveError::FieldLookup(e.0))?;
        let instance = if self.loses_instance_filter(target) {
            None
        } else {
            self.object
        };

        let mut kinds = Vec::new();
        if self.on_access {
            kinds.push(SubscriptionKind::FieldAccess {
                field: field.clone(),
                instance,
            });
        }
        if self.on_modify {
            kinds.push(SubscriptionKind::FieldModify {
                field: field.clone(),
                instance,
            });
        }
        Ok((field, kinds))
    }
}
