// Breakpoint groups
//
// Groups form a tree rooted at the "Default" group. The tree is stored as an
// arena keyed by GroupId so children can point back at their parent without
// shared ownership. Breakpoints are referenced by number; the manager owns
// the breakpoints themselves.

use crate::error::{BreakpointError, BreakpointResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

pub const DEFAULT_GROUP_NAME: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct BreakpointGroup {
    id: GroupId,
    name: String,
    enabled: bool,
    /// Display state only, persisted for the UI
    expanded: bool,
    parent: Option<GroupId>,
    breakpoints: Vec<u32>,
    groups: Vec<GroupId>,
}

impl BreakpointGroup {
    fn new(id: GroupId, name: String, parent: Option<GroupId>) -> Self {
        Self {
            id,
            name,
            enabled: true,
            expanded: true,
            parent,
            breakpoints: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's own flag, ignoring ancestors
    pub fn is_enabled_flag(&self) -> bool {
        self.enabled
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Breakpoint numbers directly in this group, insertion order
    pub fn breakpoints(&self) -> &[u32] {
        &self.breakpoints
    }

    /// Direct sub-groups, insertion order
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }
}

impl fmt::Display for BreakpointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct GroupTree {
    root: GroupId,
    next_id: u32,
    groups: HashMap<GroupId, BreakpointGroup>,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    pub fn new() -> Self {
        let root = GroupId(0);
        let mut groups = HashMap::new();
        groups.insert(
            root,
            BreakpointGroup::new(root, DEFAULT_GROUP_NAME.to_string(), None),
        );
        Self {
            root,
            next_id: 1,
            groups,
        }
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    pub fn get(&self, id: GroupId) -> Option<&BreakpointGroup> {
        self.groups.get(&id)
    }

    fn get_mut(&mut self, id: GroupId) -> BreakpointResult<&mut BreakpointGroup> {
        self.groups
            .get_mut(&id)
            .ok_or_else(|| BreakpointError::GroupNotFound(id.to_string()))
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// First group with this name, breadth-first from the root
    pub fn find_by_name(&self, name: &str) -> Option<GroupId> {
        self.groups_under(self.root, true)
            .into_iter()
            .find(|id| self.groups[id].name == name)
    }

    pub fn add_group(&mut self, name: &str, parent: GroupId) -> BreakpointResult<GroupId> {
        let id = GroupId(self.next_id);
        self.get_mut(parent)?.groups.push(id);
        self.next_id += 1;
        self.groups
            .insert(id, BreakpointGroup::new(id, name.to_string(), Some(parent)));
        Ok(id)
    }

    /// Detach a group and its whole subtree from the tree. Returns the
    /// removed group ids (the group itself first) and every breakpoint number
    /// they contained.
    pub fn remove_group(&mut self, id: GroupId) -> BreakpointResult<(Vec<GroupId>, Vec<u32>)> {
        if id == self.root {
            return Err(BreakpointError::RootGroup);
        }
        let parent = self
            .get(id)
            .ok_or_else(|| BreakpointError::GroupNotFound(id.to_string()))?
            .parent;
        let removed_groups = self.groups_under(id, true);
        let removed_breakpoints = self.breakpoints_under(id, true);

        if let Some(parent) = parent {
            self.get_mut(parent)?.groups.retain(|g| *g != id);
        }
        for gid in &removed_groups {
            self.groups.remove(gid);
        }
        Ok((removed_groups, removed_breakpoints))
    }

    pub fn rename(&mut self, id: GroupId, name: &str) -> BreakpointResult<()> {
        self.get_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_enabled(&mut self, id: GroupId, enabled: bool) -> BreakpointResult<()> {
        self.get_mut(id)?.enabled = enabled;
        Ok(())
    }

    pub fn set_expanded(&mut self, id: GroupId, expanded: bool) -> BreakpointResult<()> {
        self.get_mut(id)?.expanded = expanded;
        Ok(())
    }

    /// Effective state: the group's own flag and every ancestor's flag
    pub fn is_enabled(&self, id: GroupId) -> bool {
        let mut current = Some(id);
        while let Some(gid) = current {
            match self.groups.get(&gid) {
                Some(group) if group.enabled => current = group.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn attach_breakpoint(&mut self, id: GroupId, number: u32) -> BreakpointResult<()> {
        self.get_mut(id)?.breakpoints.push(number);
        Ok(())
    }

    pub fn detach_breakpoint(&mut self, id: GroupId, number: u32) {
        if let Some(group) = self.groups.get_mut(&id) {
            group.breakpoints.retain(|n| *n != number);
        }
    }

    /// Breakpoint numbers in a group. Recursive listing is breadth-first:
    /// a group's own breakpoints come before those of its sub-groups.
    pub fn breakpoints_under(&self, id: GroupId, recurse: bool) -> Vec<u32> {
        let Some(start) = self.groups.get(&id) else {
            return Vec::new();
        };
        if !recurse {
            return start.breakpoints.clone();
        }
        self.groups_under(id, true)
            .into_iter()
            .flat_map(|gid| self.groups[&gid].breakpoints.iter().copied())
            .collect()
    }

    /// Group ids breadth-first. Recursive listing starts with the group
    /// itself; flat listing returns only the direct sub-groups.
    pub fn groups_under(&self, id: GroupId, recurse: bool) -> Vec<GroupId> {
        let Some(start) = self.groups.get(&id) else {
            return Vec::new();
        };
        if !recurse {
            return start.groups.clone();
        }
        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(gid) = queue.pop_front() {
            out.push(gid);
            queue.extend(self.groups[&gid].groups.iter().copied());
        }
        out
    }

    pub fn breakpoint_count(&self, id: GroupId, recurse: bool) -> usize {
        self.breakpoints_under(id, recurse).len()
    }

    /// Number of sub-groups, excluding the group itself
    pub fn group_count(&self, id: GroupId, recurse: bool) -> usize {
        if recurse {
            self.groups_under(id, true).len().saturating_sub(1)
        } else {
            self.groups_under(id, false).len()
        }
    }
}
