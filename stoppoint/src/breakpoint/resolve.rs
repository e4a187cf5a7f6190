// Eager resolution support
//
// Finds the loaded, prepared types a pattern currently matches.

use crate::error::TargetError;
use crate::pattern::ReferenceTypeSpec;
use crate::target::Target;
use crate::types::TypeInfo;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Loaded types matching `spec`, nested types included.
///
/// An exact pattern is a direct lookup. Anything else needs the full class
/// list, which is only consistent while the target is suspended.
pub(crate) fn matching_types(
    target: &dyn Target,
    spec: &ReferenceTypeSpec,
) -> Result<Vec<TypeInfo>, TargetError> {
    let candidates = if spec.is_exact() {
        target.classes_by_name(spec.identifier())?
    } else {
        target.suspend()?;
        let all = target.all_classes();
        target.resume()?;
        all?
    };
    debug!("{} candidate types for {}", candidates.len(), spec);

    let mut seen = HashSet::new();
    let mut queue: VecDeque<TypeInfo> = candidates.into();
    let mut matches = Vec::new();
    while let Some(ty) = queue.pop_front() {
        if !seen.insert(ty.type_id) {
            continue;
        }
        queue.extend(target.nested_types(ty.type_id)?);
        if ty.prepared && spec.matches(&ty.name) {
            matches.push(ty);
        }
    }
    Ok(matches)
}
