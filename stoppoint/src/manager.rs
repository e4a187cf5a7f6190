// Breakpoint manager
//
// Owns the group tree and the number table, drives resolution from target
// class-prepare events and decides what every breakpoint event means for
// the target. Callers share one manager behind a single lock
// (SharedBreakpointManager); every mutation and every firing pass happens
// under it, so condition and monitor lists are never changed mid-iteration.

use crate::breakpoint::{Breakpoint, BreakpointKind, FireContext, WatchBreakpoint};
use crate::condition::{Condition, Evaluator};
use crate::config::EngineConfig;
use crate::error::{BreakpointError, BreakpointResult, ParseError, ResolveError};
use crate::events::{Decision, EventKind, TargetEvent};
use crate::group::{GroupId, GroupTree};
use crate::monitor::{CommandInterpreter, Monitor};
use crate::notify::{BreakpointChange, GroupChange, ManagerEvent, Notifier};
use crate::parse::parse_location_spec;
use crate::pattern::{is_identifier, split_list, ReferenceTypeSpec};
use crate::persist::{decode, BreakpointRecord, GroupRecord};
use crate::target::{Owner, SuspendPolicy, Target};
use crate::types::{FrameContext, ObjectId, TypeInfo};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub type SharedBreakpointManager = Arc<Mutex<BreakpointManager>>;

/// Collaborators of an active debugging session
#[derive(Clone)]
pub struct SessionContext {
    pub target: Arc<dyn Target>,
    pub evaluator: Option<Arc<dyn Evaluator>>,
    pub interpreter: Option<Arc<dyn CommandInterpreter>>,
}

impl SessionContext {
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self {
            target,
            evaluator: None,
            interpreter: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn CommandInterpreter>) -> Self {
        self.interpreter = Some(interpreter);
        self
    }
}

pub struct BreakpointManager {
    config: EngineConfig,
    groups: GroupTree,
    breakpoints: BTreeMap<u32, Breakpoint>,
    /// Highest number handed out; back to 0 once the table empties
    last_number: u32,
    session: Option<SessionContext>,
    current_frame: Option<FrameContext>,
    uncaught: Option<Breakpoint>,
    notifier: Notifier,
}

impl Default for BreakpointManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl BreakpointManager {
    pub fn new(config: EngineConfig) -> Self {
        let notifier = Notifier::new(config.notify_capacity);
        Self {
            config,
            groups: GroupTree::new(),
            breakpoints: BTreeMap::new(),
            last_number: 0,
            session: None,
            current_frame: None,
            uncaught: None,
            notifier,
        }
    }

    /// Create a manager and restore the configured breakpoints file, if any
    pub fn open(config: EngineConfig) -> BreakpointResult<Self> {
        let file = config.breakpoints_file.clone();
        let mut manager = Self::new(config);
        if let Some(path) = file.filter(|p| p.exists()) {
            manager.load(&path)?;
        }
        Ok(manager)
    }

    pub fn shared(self) -> SharedBreakpointManager {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Change notification feed
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.notifier.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_frame(&self) -> Option<FrameContext> {
        self.current_frame
    }

    fn target(&self) -> Option<Arc<dyn Target>> {
        self.session.as_ref().map(|s| Arc::clone(&s.target))
    }

    // ---- lookup ----

    pub fn groups(&self) -> &GroupTree {
        &self.groups
    }

    pub fn root_group(&self) -> GroupId {
        self.groups.root()
    }

    pub fn get(&self, number: u32) -> Option<&Breakpoint> {
        self.breakpoints.get(&number)
    }

    pub fn breakpoint(&self, number: u32) -> BreakpointResult<&Breakpoint> {
        self.breakpoints
            .get(&number)
            .ok_or(BreakpointError::NotFound(number))
    }

    fn breakpoint_mut(&mut self, number: u32) -> BreakpointResult<&mut Breakpoint> {
        self.breakpoints
            .get_mut(&number)
            .ok_or(BreakpointError::NotFound(number))
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Every breakpoint, breadth-first through the group tree
    pub fn breakpoints(&self) -> Vec<&Breakpoint> {
        self.groups
            .breakpoints_under(self.groups.root(), true)
            .into_iter()
            .filter_map(|n| self.breakpoints.get(&n))
            .collect()
    }

    /// Effective state: own flag and every enclosing group
    pub fn is_enabled(&self, number: u32) -> bool {
        self.breakpoints.get(&number).is_some_and(|bp| {
            bp.is_enabled_flag() && bp.group().is_some_and(|g| self.groups.is_enabled(g))
        })
    }

    pub fn uncaught_breakpoint(&self) -> Option<&Breakpoint> {
        self.uncaught.as_ref()
    }

    /// Line breakpoint at `line` whose pattern covers `class`
    pub fn find_line_breakpoint(&self, class: &str, line: u32) -> Option<&Breakpoint> {
        self.breakpoints.values().find(|bp| match bp.kind() {
            BreakpointKind::Line(l) => {
                l.line == line && (l.pattern.identifier() == class || l.pattern.matches(class))
            }
            _ => false,
        })
    }

    /// One listing line: number, state, resolution, description, group
    pub fn describe(&self, number: u32) -> BreakpointResult<String> {
        let bp = self.breakpoint(number)?;
        let state = if self.is_enabled(number) {
            "enabled"
        } else {
            "disabled"
        };
        let resolution = if bp.is_resolved() {
            "resolved"
        } else {
            "pending"
        };
        let group = bp
            .group()
            .and_then(|g| self.groups.get(g))
            .map(|g| g.name().to_string())
            .unwrap_or_default();
        Ok(format!(
            "{:>3} [{}, {}] {} ({}, {}, hits {})",
            number,
            state,
            resolution,
            bp,
            group,
            bp.suspend_policy(),
            bp.stopped_count()
        ))
    }

    // ---- creation ----

    fn with_default_policy(&self, mut bp: Breakpoint) -> Breakpoint {
        if !matches!(bp.kind(), BreakpointKind::Trace) {
            bp.set_suspend_policy(self.config.default_suspend_policy, None);
        }
        bp
    }

    /// Parse `Class:line`, `Class.method(args)` and friends, then add
    pub fn create_location_breakpoint(
        &mut self,
        spec: &str,
        current_type: Option<&str>,
    ) -> BreakpointResult<u32> {
        let bp = parse_location_spec(spec, current_type)?.into_breakpoint();
        let bp = self.with_default_policy(bp);
        self.add_breakpoint(bp)
    }

    pub fn create_exception_breakpoint(
        &mut self,
        pattern: &str,
        caught: bool,
        uncaught: bool,
    ) -> BreakpointResult<u32> {
        let bp = Breakpoint::exception(ReferenceTypeSpec::new(pattern)?, caught, uncaught);
        let bp = self.with_default_policy(bp);
        self.add_breakpoint(bp)
    }

    pub fn create_class_breakpoint(
        &mut self,
        patterns: &str,
        on_prepare: bool,
        on_unload: bool,
    ) -> BreakpointResult<u32> {
        let list = split_list(patterns);
        if list.is_empty() {
            return Err(ParseError::Empty.into());
        }
        for pattern in &list {
            ReferenceTypeSpec::new(pattern)?;
        }
        let bp = Breakpoint::class(&list.join(","), on_prepare, on_unload);
        let bp = self.with_default_policy(bp);
        self.add_breakpoint(bp)
    }

    pub fn create_thread_breakpoint(
        &mut self,
        name: Option<&str>,
        on_start: bool,
        on_death: bool,
    ) -> BreakpointResult<u32> {
        let bp = Breakpoint::thread(name.map(String::from), on_start, on_death);
        let bp = self.with_default_policy(bp);
        self.add_breakpoint(bp)
    }

    pub fn create_watch_breakpoint(
        &mut self,
        field: &str,
        object: Option<ObjectId>,
        on_access: bool,
        on_modify: bool,
    ) -> BreakpointResult<u32> {
        if field.is_empty() || !field.split('.').all(is_identifier) {
            return Err(ParseError::MalformedMember(field.to_string()).into());
        }
        if !on_access && !on_modify {
            return Err(ParseError::InvalidArgument(format!(
                "watch on {} needs access or modify",
                field
            ))
            .into());
        }
        let mut watch = WatchBreakpoint::new(field, on_access, on_modify);
        watch.object = object;
        let bp = self.with_default_policy(Breakpoint::watch(watch));
        self.add_breakpoint(bp)
    }

    pub fn create_trace_breakpoint(
        &mut self,
        class_filters: Option<&str>,
        thread_filters: Option<&str>,
    ) -> BreakpointResult<u32> {
        let bp = Breakpoint::trace(
            class_filters.map(String::from),
            thread_filters.map(String::from),
        );
        self.add_breakpoint(bp)
    }

    // ---- add / remove ----

    pub fn add_breakpoint(&mut self, bp: Breakpoint) -> BreakpointResult<u32> {
        let root = self.groups.root();
        self.add_to_group(bp, root)
    }

    /// Number the breakpoint, place it in `group` and try to resolve it.
    /// A resolution error undoes the whole add.
    pub fn add_to_group(&mut self, mut bp: Breakpoint, group: GroupId) -> BreakpointResult<u32> {
        if matches!(bp.kind(), BreakpointKind::UncaughtException) {
            return Err(ParseError::InvalidArgument(
                "the uncaught exception breakpoint belongs to the session".to_string(),
            )
            .into());
        }
        if !self.groups.contains(group) {
            return Err(BreakpointError::GroupNotFound(group.to_string()));
        }
        let number = self.last_number + 1;
        self.last_number = number;
        bp.set_number(number);
        bp.set_group(Some(group));
        self.groups.attach_breakpoint(group, number)?;
        self.breakpoints.insert(number, bp);

        if let Err(e) = self.resolve_breakpoint(number) {
            let target = self.target();
            if let Some(mut bp) = self.breakpoints.remove(&number) {
                bp.release(target.as_deref());
            }
            self.groups.detach_breakpoint(group, number);
            if self.breakpoints.is_empty() {
                self.last_number = 0;
            } else if self.last_number == number {
                self.last_number -= 1;
            }
            warn!("Breakpoint could not be added: {}", e);
            return Err(e.into());
        }

        if let Some(bp) = self.breakpoints.get(&number) {
            info!("Added breakpoint {}: {}", number, bp);
        }
        self.notifier.breakpoint(number, BreakpointChange::Added);
        Ok(number)
    }

    fn resolve_breakpoint(&mut self, number: u32) -> Result<(), ResolveError> {
        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        let frame = self.current_frame;
        let Some(bp) = self.breakpoints.get_mut(&number) else {
            return Ok(());
        };
        bp.resolve(
            session.target.as_ref(),
            session.evaluator.as_deref(),
            frame.as_ref(),
        )
    }

    /// Resolve without failing the caller; problems become warnings
    fn try_resolve(&mut self, number: u32) {
        let was_resolved = self.get(number).is_some_and(|bp| bp.is_resolved());
        match self.resolve_breakpoint(number) {
            Ok(()) => {
                let now_resolved = self.get(number).is_some_and(|bp| bp.is_resolved());
                if now_resolved && !was_resolved {
                    self.notifier.breakpoint(number, BreakpointChange::Modified);
                }
            }
            Err(e) => self.warn(format!("Breakpoint {} not resolved: {}", number, e)),
        }
    }

    fn warn(&self, message: String) {
        warn!("{}", message);
        self.notifier.warning(message);
    }

    /// Remove and destroy a breakpoint. Listeners hear about it first.
    pub fn remove_breakpoint(&mut self, number: u32) -> BreakpointResult<()> {
        let group = self.breakpoint(number)?.group();
        self.notifier.breakpoint(number, BreakpointChange::Removed);

        if let Some(group) = group {
            self.groups.detach_breakpoint(group, number);
        }
        let mut bp = self
            .breakpoints
            .remove(&number)
            .ok_or(BreakpointError::NotFound(number))?;
        if self.breakpoints.is_empty() {
            self.last_number = 0;
        }
        let target = self.target();
        bp.set_enabled(false, target.as_deref());
        bp.release(target.as_deref());
        info!("Removed breakpoint {}: {}", number, bp);
        Ok(())
    }

    pub fn remove_all(&mut self) {
        let numbers: Vec<u32> = self.breakpoints.keys().copied().collect();
        for number in numbers {
            if let Err(e) = self.remove_breakpoint(number) {
                debug!("{}", e);
            }
        }
    }

    pub fn set_enabled(&mut self, number: u32, enabled: bool) -> BreakpointResult<()> {
        let target = self.target();
        self.breakpoint_mut(number)?
            .set_enabled(enabled, target.as_deref());
        info!(
            "Breakpoint {} {}",
            number,
            if enabled { "enabled" } else { "disabled" }
        );
        self.notifier.breakpoint(number, BreakpointChange::Modified);
        Ok(())
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        let numbers: Vec<u32> = self.breakpoints.keys().copied().collect();
        for number in numbers {
            if let Err(e) = self.set_enabled(number, enabled) {
                debug!("{}", e);
            }
        }
    }

    // ---- groups ----

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups.find_by_name(name)
    }

    pub fn create_group(&mut self, name: &str, parent: Option<GroupId>) -> BreakpointResult<GroupId> {
        let parent = parent.unwrap_or_else(|| self.groups.root());
        let id = self.groups.add_group(name, parent)?;
        info!("Added group {} ({})", name, id);
        self.notifier.group(id, name, GroupChange::Added);
        Ok(id)
    }

    /// Remove a group with every sub-group and breakpoint beneath it
    pub fn remove_group(&mut self, id: GroupId) -> BreakpointResult<()> {
        if id == self.groups.root() {
            return Err(BreakpointError::RootGroup);
        }
        if !self.groups.contains(id) {
            return Err(BreakpointError::GroupNotFound(id.to_string()));
        }
        for number in self.groups.breakpoints_under(id, true) {
            self.remove_breakpoint(number)?;
        }
        let doomed: Vec<(GroupId, String)> = self
            .groups
            .groups_under(id, true)
            .into_iter()
            .rev()
            .filter_map(|g| self.groups.get(g).map(|group| (g, group.name().to_string())))
            .collect();
        for (gid, name) in &doomed {
            self.notifier.group(*gid, name, GroupChange::Removed);
        }
        self.groups.remove_group(id)?;
        info!("Removed group {} and {} sub-groups", id, doomed.len() - 1);
        Ok(())
    }

    pub fn rename_group(&mut self, id: GroupId, name: &str) -> BreakpointResult<()> {
        self.groups.rename(id, name)?;
        info!("Renamed group {} to {}", id, name);
        Ok(())
    }

    /// Toggle a group. Each breakpoint beneath it changes effective state,
    /// so each one is announced before the group itself.
    pub fn set_group_enabled(&mut self, id: GroupId, enabled: bool) -> BreakpointResult<()> {
        self.groups.set_enabled(id, enabled)?;
        for number in self.groups.breakpoints_under(id, true) {
            self.notifier.breakpoint(number, BreakpointChange::Modified);
        }
        let name = self
            .groups
            .get(id)
            .map(|g| g.name().to_string())
            .unwrap_or_default();
        let change = if enabled {
            GroupChange::Enabled
        } else {
            GroupChange::Disabled
        };
        info!("Group {} {:?}", name, change);
        self.notifier.group(id, &name, change);
        Ok(())
    }

    pub fn set_group_expanded(&mut self, id: GroupId, expanded: bool) -> BreakpointResult<()> {
        self.groups.set_expanded(id, expanded)
    }

    pub fn move_breakpoint(&mut self, number: u32, group: GroupId) -> BreakpointResult<()> {
        if !self.groups.contains(group) {
            return Err(BreakpointError::GroupNotFound(group.to_string()));
        }
        let old = self.breakpoint(number)?.group();
        if let Some(old) = old {
            self.groups.detach_breakpoint(old, number);
        }
        self.groups.attach_breakpoint(group, number)?;
        self.breakpoint_mut(number)?.set_group(Some(group));
        self.notifier.breakpoint(number, BreakpointChange::Modified);
        Ok(())
    }

    // ---- attributes ----

    fn modify<T>(
        &mut self,
        number: u32,
        edit: impl FnOnce(&mut Breakpoint) -> BreakpointResult<T>,
    ) -> BreakpointResult<T> {
        let out = edit(self.breakpoint_mut(number)?)?;
        self.notifier.breakpoint(number, BreakpointChange::Modified);
        Ok(out)
    }

    pub fn add_condition(&mut self, number: u32, condition: Condition) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            bp.add_condition(condition);
            Ok(())
        })
    }

    pub fn remove_condition(&mut self, number: u32, index: usize) -> BreakpointResult<Condition> {
        self.modify(number, |bp| {
            bp.remove_condition(index)
                .ok_or(BreakpointError::NoSuchEntry {
                    kind: "condition",
                    index,
                })
        })
    }

    pub fn add_monitor(&mut self, number: u32, monitor: Monitor) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            bp.add_monitor(monitor);
            Ok(())
        })
    }

    pub fn remove_monitor(&mut self, number: u32, index: usize) -> BreakpointResult<Monitor> {
        self.modify(number, |bp| {
            bp.remove_monitor(index).ok_or(BreakpointError::NoSuchEntry {
                kind: "monitor",
                index,
            })
        })
    }

    pub fn suspend_policy(&self, number: u32) -> BreakpointResult<SuspendPolicy> {
        Ok(self.breakpoint(number)?.suspend_policy())
    }

    pub fn set_suspend_policy(&mut self, number: u32, policy: SuspendPolicy) -> BreakpointResult<()> {
        let target = self.target();
        self.modify(number, |bp| {
            bp.set_suspend_policy(policy, target.as_deref());
            Ok(())
        })
    }

    pub fn skip_count(&self, number: u32) -> BreakpointResult<u32> {
        Ok(self.breakpoint(number)?.skip_count())
    }

    pub fn set_skip_count(&mut self, number: u32, count: u32) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            bp.set_skip_count(count);
            Ok(())
        })
    }

    pub fn expire_count(&self, number: u32) -> BreakpointResult<u32> {
        Ok(self.breakpoint(number)?.expire_count())
    }

    pub fn set_expire_count(&mut self, number: u32, count: u32) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            bp.set_expire_count(count);
            Ok(())
        })
    }

    pub fn set_delete_on_expire(&mut self, number: u32, delete: bool) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            bp.set_delete_on_expire(delete);
            Ok(())
        })
    }

    pub fn class_filters(&self, number: u32) -> BreakpointResult<Option<String>> {
        Ok(self.breakpoint(number)?.class_filters().map(String::from))
    }

    pub fn thread_filters(&self, number: u32) -> BreakpointResult<Option<String>> {
        Ok(self.breakpoint(number)?.thread_filters().map(String::from))
    }

    /// Filters are baked into subscriptions, so they only change while the
    /// breakpoint is disabled.
    pub fn set_class_filters(&mut self, number: u32, filters: Option<String>) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            if bp.is_enabled_flag() {
                return Err(BreakpointError::FiltersWhileEnabled(number));
            }
            bp.set_class_filters(filters);
            Ok(())
        })?;
        self.refresh(number);
        Ok(())
    }

    pub fn set_thread_filters(&mut self, number: u32, filters: Option<String>) -> BreakpointResult<()> {
        self.modify(number, |bp| {
            if bp.is_enabled_flag() {
                return Err(BreakpointError::FiltersWhileEnabled(number));
            }
            bp.set_thread_filters(filters);
            Ok(())
        })?;
        self.refresh(number);
        Ok(())
    }

    /// Move a line breakpoint to another line
    pub fn set_line(&mut self, number: u32, line: u32) -> BreakpointResult<()> {
        if line == 0 {
            return Err(ParseError::InvalidLine(line.to_string()).into());
        }
        self.modify(number, |bp| match bp.kind_mut() {
            BreakpointKind::Line(l) => {
                l.line = line;
                Ok(())
            }
            _ => Err(ParseError::InvalidArgument(format!("breakpoint {} is not a line breakpoint", number)).into()),
        })?;
        self.refresh(number);
        Ok(())
    }

    /// Point a method breakpoint at another method or overload
    pub fn set_method(
        &mut self,
        number: u32,
        name: &str,
        args: Option<Vec<String>>,
    ) -> BreakpointResult<()> {
        if !(is_identifier(name) || name == "<init>" || name == "<clinit>") {
            return Err(ParseError::MalformedMember(name.to_string()).into());
        }
        self.modify(number, |bp| match bp.kind_mut() {
            BreakpointKind::Method(m) => {
                m.method = name.to_string();
                m.args = args;
                Ok(())
            }
            _ => Err(ParseError::InvalidArgument(format!("breakpoint {} is not a method breakpoint", number)).into()),
        })?;
        self.refresh(number);
        Ok(())
    }

    /// Drop live subscriptions and resolve again
    fn refresh(&mut self, number: u32) {
        let target = self.target();
        if let Some(bp) = self.breakpoints.get_mut(&number) {
            bp.release_resolution(target.as_deref());
        }
        self.try_resolve(number);
    }

    // ---- events ----

    /// Decide what an event from the target means. Class-prepare events for
    /// pending breakpoints drive resolution and always resume.
    pub fn handle_event(&mut self, event: &TargetEvent) -> Decision {
        debug!("Event {}: {}", event.request_id, event.describe());
        let number = match event.owner {
            Some(Owner::Breakpoint(number)) => number,
            Some(Owner::UncaughtException) => return self.fire_uncaught(event),
            None => {
                debug!("Event {} has no owner", event.request_id);
                return Decision::Resume;
            }
        };

        let Some(bp) = self.breakpoints.get(&number) else {
            debug!("Event for unknown breakpoint {}", number);
            return Decision::Resume;
        };
        if bp.prepare_request() == Some(event.request_id) {
            if let EventKind::ClassPrepare { type_info } = &event.kind {
                self.resolve_against(number, type_info);
            }
            return Decision::Resume;
        }

        let effective_enabled = self.is_enabled(number);
        let session = self.session.clone();
        let ctx = FireContext {
            effective_enabled,
            evaluator: session.as_ref().and_then(|s| s.evaluator.as_deref()),
            interpreter: session.as_ref().and_then(|s| s.interpreter.as_deref()),
            notifier: &self.notifier,
        };
        let Some(bp) = self.breakpoints.get_mut(&number) else {
            return Decision::Resume;
        };
        let outcome = bp.fire(event, &ctx);

        if outcome.remove {
            info!("Deleting expired breakpoint {}", number);
            if let Err(e) = self.remove_breakpoint(number) {
                debug!("{}", e);
            }
        } else if outcome.counted {
            self.notifier.breakpoint(number, BreakpointChange::Modified);
        }
        outcome.decision
    }

    fn fire_uncaught(&mut self, event: &TargetEvent) -> Decision {
        let session = self.session.clone();
        let ctx = FireContext {
            effective_enabled: true,
            evaluator: session.as_ref().and_then(|s| s.evaluator.as_deref()),
            interpreter: session.as_ref().and_then(|s| s.interpreter.as_deref()),
            notifier: &self.notifier,
        };
        match self.uncaught.as_mut() {
            Some(bp) => bp.fire(event, &ctx).decision,
            None => Decision::Resume,
        }
    }

    fn resolve_against(&mut self, number: u32, ty: &TypeInfo) {
        let Some(target) = self.target() else { return };
        let Some(bp) = self.breakpoints.get_mut(&number) else {
            return;
        };
        match bp.resolve_type(target.as_ref(), ty) {
            Ok(true) => self.notifier.breakpoint(number, BreakpointChange::Modified),
            Ok(false) => {}
            Err(e) => self.warn(format!(
                "Breakpoint {} could not be resolved against {}: {}",
                number, ty.name, e
            )),
        }
    }

    // ---- session lifecycle ----

    /// Bind to a live target: resolve what is pending, re-enable the root
    /// group, create the uncaught exception breakpoint and, if configured,
    /// a one-shot breakpoint on the program's entry method.
    pub fn activate(&mut self, session: SessionContext) {
        if self.is_active() {
            debug!("Already active, releasing the previous session first");
            self.deactivate();
        }
        info!("Activating {} breakpoints", self.breakpoints.len());
        let target = Arc::clone(&session.target);
        self.session = Some(session);

        let root = self.groups.root();
        if !self.groups.is_enabled(root) {
            if let Err(e) = self.set_group_enabled(root, true) {
                debug!("{}", e);
            }
        }

        let pending: Vec<u32> = self
            .breakpoints
            .iter()
            .filter(|(_, bp)| bp.needs_resolution())
            .map(|(n, _)| *n)
            .collect();
        for number in pending {
            self.try_resolve(number);
        }

        let mut uncaught = Breakpoint::uncaught();
        if let Err(e) = uncaught.resolve(target.as_ref(), None, None) {
            self.warn(format!("Uncaught exception breakpoint unavailable: {}", e));
        }
        self.uncaught = Some(uncaught);

        self.install_entry_breakpoint();
    }

    fn install_entry_breakpoint(&mut self) {
        if !self.config.stop_on_main {
            return;
        }
        let Some(main_class) = self.config.main_class.clone() else {
            return;
        };
        let method = self.config.entry_method.clone();
        let args = self.config.entry_args.clone();
        let exists = self.breakpoints.values().any(|bp| match bp.kind() {
            BreakpointKind::Method(m) => {
                m.pattern.identifier() == main_class
                    && m.method == method
                    && m.args.as_ref() == Some(&args)
            }
            _ => false,
        });
        if exists {
            return;
        }
        let pattern = match ReferenceTypeSpec::new(&main_class) {
            Ok(pattern) => pattern,
            Err(e) => {
                self.warn(format!("Invalid main class {}: {}", main_class, e));
                return;
            }
        };
        let mut bp = Breakpoint::method(pattern, &method, Some(args));
        bp.set_expire_count(1);
        bp.set_delete_on_expire(true);
        let bp = self.with_default_policy(bp);
        match self.add_breakpoint(bp) {
            Ok(number) => info!("Entry breakpoint {} on {}.{}", number, main_class, method),
            Err(e) => self.warn(format!("Cannot stop in {}.{}: {}", main_class, method, e)),
        }
    }

    /// Unbind from the target. Breakpoints keep their configuration but
    /// lose hit counts and subscriptions.
    pub fn deactivate(&mut self) {
        let target = self.target();
        for bp in self.breakpoints.values_mut() {
            bp.reset(target.as_deref());
        }
        let numbers: Vec<u32> = self.breakpoints.keys().copied().collect();
        for number in numbers {
            self.notifier.breakpoint(number, BreakpointChange::Modified);
        }
        if let Some(mut uncaught) = self.uncaught.take() {
            uncaught.release(target.as_deref());
        }
        self.session = None;
        self.current_frame = None;
        info!("Deactivated breakpoints");
    }

    /// Record where the target is stopped. Pending watches need this to
    /// look their field up.
    pub fn set_current_frame(&mut self, frame: Option<FrameContext>) {
        self.current_frame = frame;
        if frame.is_none() || self.session.is_none() {
            return;
        }
        let watches: Vec<u32> = self
            .breakpoints
            .iter()
            .filter(|(_, bp)| matches!(bp.kind(), BreakpointKind::Watch(_)) && !bp.is_resolved())
            .map(|(n, _)| *n)
            .collect();
        for number in watches {
            self.try_resolve(number);
        }
    }

    /// Save the tree if configured, unbind and release everything
    pub fn close(&mut self) -> BreakpointResult<()> {
        if let Some(path) = self.config.breakpoints_file.clone() {
            self.save(&path)?;
        }
        if self.is_active() {
            self.deactivate();
        }
        let root = self.groups.root();
        for group in self.groups.groups_under(root, false) {
            self.remove_group(group)?;
        }
        self.remove_all();
        Ok(())
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> BreakpointResult<GroupRecord> {
        self.group_record(self.groups.root())
    }

    fn group_record(&self, id: GroupId) -> BreakpointResult<GroupRecord> {
        let group = self
            .groups
            .get(id)
            .ok_or_else(|| BreakpointError::GroupNotFound(id.to_string()))?;
        let mut breakpoints = Vec::new();
        for number in group.breakpoints() {
            if let Some(bp) = self.breakpoints.get(number) {
                breakpoints.push(serde_json::to_value(BreakpointRecord::from_breakpoint(bp)?)?);
            }
        }
        let mut groups = Vec::new();
        for child in group.groups() {
            groups.push(serde_json::to_value(self.group_record(*child)?)?);
        }
        Ok(GroupRecord {
            name: group.name().to_string(),
            enabled: group.is_enabled_flag(),
            expanded: group.is_expanded(),
            breakpoints,
            groups,
        })
    }

    /// Merge a saved tree into the root group. Returns a warning for every
    /// node that had to be skipped.
    pub fn restore(&mut self, record: GroupRecord) -> Vec<String> {
        let mut warnings = Vec::new();
        let root = self.groups.root();
        let fresh = self.breakpoints.is_empty();
        self.restore_group(root, record, fresh, &mut warnings);
        for warning in &warnings {
            warn!("{}", warning);
            self.notifier.warning(warning.clone());
        }
        warnings
    }

    fn restore_group(
        &mut self,
        id: GroupId,
        record: GroupRecord,
        fresh: bool,
        warnings: &mut Vec<String>,
    ) {
        if let Err(e) = self
            .groups
            .set_enabled(id, record.enabled)
            .and_then(|_| self.groups.set_expanded(id, record.expanded))
        {
            warnings.push(e.to_string());
            return;
        }

        for node in record.breakpoints {
            let Some(bp_record) = decode::<BreakpointRecord>(node, "breakpoint", warnings) else {
                continue;
            };
            if bp_record.kind == BreakpointKind::UncaughtException {
                warnings.push("Skipping saved uncaught exception breakpoint".to_string());
                continue;
            }
            let hint = bp_record.number;
            let bp = bp_record.into_breakpoint(warnings);
            // freed numbers stay retired while other breakpoints exist
            let hint = hint.filter(|n| fresh || *n > self.last_number);
            self.insert_restored(bp, id, hint, warnings);
        }

        for node in record.groups {
            let Some(sub) = decode::<GroupRecord>(node, "group", warnings) else {
                continue;
            };
            match self.create_group(&sub.name, Some(id)) {
                Ok(child) => self.restore_group(child, sub, fresh, warnings),
                Err(e) => warnings.push(e.to_string()),
            }
        }
    }

    /// Keep the saved number when it is free
    fn insert_restored(
        &mut self,
        mut bp: Breakpoint,
        group: GroupId,
        hint: Option<u32>,
        warnings: &mut Vec<String>,
    ) {
        let number = match hint {
            Some(n) if n > 0 && !self.breakpoints.contains_key(&n) => n,
            _ => self.last_number + 1,
        };
        self.last_number = self.last_number.max(number);
        bp.set_number(number);
        bp.set_group(Some(group));
        if let Err(e) = self.groups.attach_breakpoint(group, number) {
            warnings.push(e.to_string());
            return;
        }
        self.breakpoints.insert(number, bp);
        if let Err(e) = self.resolve_breakpoint(number) {
            warnings.push(format!("Breakpoint {} not resolved: {}", number, e));
        }
        self.notifier.breakpoint(number, BreakpointChange::Added);
    }

    pub fn save(&self, path: &Path) -> BreakpointResult<()> {
        let record = self.snapshot()?;
        std::fs::write(path, serde_json::to_string_pretty(&record)?)?;
        info!("Saved {} breakpoints to {}", self.breakpoints.len(), path.display());
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> BreakpointResult<Vec<String>> {
        let text = std::fs::read_to_string(path)?;
        let record: GroupRecord = serde_json::from_str(&text)?;
        let warnings = self.restore(record);
        info!(
            "Loaded breakpoints from {} ({} skipped)",
            path.display(),
            warnings.len()
        );
        Ok(warnings)
    }
}
