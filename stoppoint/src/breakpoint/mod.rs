// Breakpoints
//
// A breakpoint is the shared base state (number, counters, conditions,
// monitors, filters) plus one of a closed set of kinds. Kinds carry only
// their configuration; everything learned from the target (subscriptions,
// resolved field) lives on the breakpoint and is dropped by reset().

pub mod class;
pub mod exception;
pub mod location;
pub(crate) mod resolve;
pub mod thread;
pub mod watch;

pub use class::ClassBreakpoint;
pub use exception::ExceptionBreakpoint;
pub use location::{LineBreakpoint, MethodBreakpoint};
pub use thread::ThreadBreakpoint;
pub use watch::WatchBreakpoint;

use crate::condition::{Condition, Evaluator};
use crate::error::{ResolveError, TargetError};
use crate::events::{Decision, TargetEvent};
use crate::group::GroupId;
use crate::monitor::{CommandInterpreter, Monitor};
use crate::notify::Notifier;
use crate::pattern::{simple_name, split_list, ReferenceTypeSpec};
use crate::target::{Owner, SubscriptionKind, SubscriptionRequest, SuspendPolicy, Target};
use crate::types::{FieldInfo, FrameContext, ReferenceTypeId, RequestId, TypeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BreakpointKind {
    Line(LineBreakpoint),
    Method(MethodBreakpoint),
    Exception(ExceptionBreakpoint),
    Class(ClassBreakpoint),
    Thread(ThreadBreakpoint),
    Watch(WatchBreakpoint),
    /// Method entry/exit tracing; reports but never stops
    Trace,
    /// Session singleton, never persisted
    UncaughtException,
}

impl BreakpointKind {
    /// Pattern for kinds resolved against loaded classes
    pub fn pattern(&self) -> Option<&ReferenceTypeSpec> {
        match self {
            BreakpointKind::Line(bp) => Some(&bp.pattern),
            BreakpointKind::Method(bp) => Some(&bp.pattern),
            BreakpointKind::Exception(bp) => Some(&bp.pattern),
            _ => None,
        }
    }

    /// Short name used in listings
    pub fn tag(&self) -> &'static str {
        match self {
            BreakpointKind::Line(_) => "line",
            BreakpointKind::Method(_) => "method",
            BreakpointKind::Exception(_) => "exception",
            BreakpointKind::Class(_) => "class",
            BreakpointKind::Thread(_) => "thread",
            BreakpointKind::Watch(_) => "watch",
            BreakpointKind::Trace => "trace",
            BreakpointKind::UncaughtException => "uncaught",
        }
    }
}

/// A live subscription held by a breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: RequestId,
    /// Type the subscription was resolved against, if any
    pub type_id: Option<ReferenceTypeId>,
    pub request: SubscriptionRequest,
}

/// Collaborators available while firing
pub struct FireContext<'a> {
    /// Own flag combined with every ancestor group's flag
    pub effective_enabled: bool,
    pub evaluator: Option<&'a dyn Evaluator>,
    pub interpreter: Option<&'a dyn CommandInterpreter>,
    pub notifier: &'a Notifier,
}

/// Result of firing a breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireOutcome {
    pub decision: Decision,
    /// Expired with delete-on-expire set; the owner must remove it
    pub remove: bool,
    /// The hit moved a skip or expire count along
    pub counted: bool,
}

impl FireOutcome {
    fn resume() -> Self {
        Self {
            decision: Decision::Resume,
            remove: false,
            counted: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Breakpoint {
    number: u32,
    group: Option<GroupId>,
    enabled: bool,
    suspend_policy: SuspendPolicy,
    stopped_count: u32,
    expire_count: u32,
    skip_count: u32,
    conditions: Vec<Condition>,
    monitors: Vec<Monitor>,
    class_filters: Option<String>,
    thread_filters: Option<String>,
    delete_on_expire: bool,
    kind: BreakpointKind,

    subscriptions: Vec<Subscription>,
    /// Standing class-prepare request of a resolvable breakpoint
    prepare_request: Option<RequestId>,
    field: Option<FieldInfo>,
}

impl Breakpoint {
    pub fn new(kind: BreakpointKind) -> Self {
        let suspend_policy = match kind {
            BreakpointKind::Trace => SuspendPolicy::None,
            _ => SuspendPolicy::All,
        };
        Self {
            number: 0,
            group: None,
            enabled: true,
            suspend_policy,
            stopped_count: 0,
            expire_count: 0,
            skip_count: 0,
            conditions: Vec::new(),
            monitors: Vec::new(),
            class_filters: None,
            thread_filters: None,
            delete_on_expire: false,
            kind,
            subscriptions: Vec::new(),
            prepare_request: None,
            field: None,
        }
    }

    pub fn line(pattern: ReferenceTypeSpec, line: u32) -> Self {
        Self::new(BreakpointKind::Line(LineBreakpoint::new(pattern, line)))
    }

    pub fn method(pattern: ReferenceTypeSpec, name: &str, args: Option<Vec<String>>) -> Self {
        Self::new(BreakpointKind::Method(MethodBreakpoint::new(pattern, name, args)))
    }

    pub fn exception(pattern: ReferenceTypeSpec, caught: bool, uncaught: bool) -> Self {
        Self::new(BreakpointKind::Exception(ExceptionBreakpoint::new(
            pattern, caught, uncaught,
        )))
    }

    /// Class breakpoint over a comma-separated pattern list
    pub fn class(patterns: &str, on_prepare: bool, on_unload: bool) -> Self {
        let mut bp = Self::new(BreakpointKind::Class(ClassBreakpoint::new(
            on_prepare, on_unload,
        )));
        bp.class_filters = Some(patterns.to_string());
        bp
    }

    pub fn thread(name: Option<String>, on_start: bool, on_death: bool) -> Self {
        Self::new(BreakpointKind::Thread(ThreadBreakpoint::new(
            name, on_start, on_death,
        )))
    }

    pub fn watch(watch: WatchBreakpoint) -> Self {
        Self::new(BreakpointKind::Watch(watch))
    }

    pub fn trace(class_filters: Option<String>, thread_filters: Option<String>) -> Self {
        let mut bp = Self::new(BreakpointKind::Trace);
        bp.class_filters = class_filters;
        bp.thread_filters = thread_filters;
        bp
    }

    pub(crate) fn uncaught() -> Self {
        Self::new(BreakpointKind::UncaughtException)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: Option<GroupId>) {
        self.group = group;
    }

    pub fn kind(&self) -> &BreakpointKind {
        &self.kind
    }

    /// The breakpoint's own flag; groups may still disable it
    pub fn is_enabled_flag(&self) -> bool {
        self.enabled
    }

    pub fn suspend_policy(&self) -> SuspendPolicy {
        self.suspend_policy
    }

    pub fn stopped_count(&self) -> u32 {
        self.stopped_count
    }

    pub fn expire_count(&self) -> u32 {
        self.expire_count
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn delete_on_expire(&self) -> bool {
        self.delete_on_expire
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn class_filters(&self) -> Option<&str> {
        self.class_filters.as_deref()
    }

    pub fn thread_filters(&self) -> Option<&str> {
        self.thread_filters.as_deref()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn prepare_request(&self) -> Option<RequestId> {
        self.prepare_request
    }

    /// Field a watch breakpoint resolved to
    pub fn resolved_field(&self) -> Option<&FieldInfo> {
        self.field.as_ref()
    }

    pub fn has_expired(&self) -> bool {
        self.expire_count > 0 && self.stopped_count > self.expire_count
    }

    pub fn is_skipping(&self) -> bool {
        self.skip_count > 0 && self.skip_count >= self.stopped_count
    }

    /// Whether the breakpoint is bound to the target.
    ///
    /// Kinds that need no lookup count as resolved from the start.
    pub fn is_resolved(&self) -> bool {
        match self.kind {
            BreakpointKind::Line(_)
            | BreakpointKind::Method(_)
            | BreakpointKind::Exception(_)
            | BreakpointKind::Watch(_) => !self.subscriptions.is_empty(),
            _ => true,
        }
    }

    /// Nothing is subscribed yet, not even a standing class-prepare request
    pub(crate) fn needs_resolution(&self) -> bool {
        self.subscriptions.is_empty() && self.prepare_request.is_none()
    }

    /// Hits carried over from a saved tree
    pub(crate) fn set_stopped_count(&mut self, count: u32) {
        self.stopped_count = count;
    }

    pub fn set_expire_count(&mut self, count: u32) {
        self.expire_count = count;
    }

    pub fn set_skip_count(&mut self, count: u32) {
        self.skip_count = count;
    }

    pub fn set_delete_on_expire(&mut self, delete: bool) {
        self.delete_on_expire = delete;
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn add_monitor(&mut self, monitor: Monitor) {
        self.monitors.push(monitor);
    }

    pub fn remove_monitor(&mut self, index: usize) -> Option<Monitor> {
        (index < self.monitors.len()).then(|| self.monitors.remove(index))
    }

    pub(crate) fn set_class_filters(&mut self, filters: Option<String>) {
        self.class_filters = filters.filter(|f| !f.trim().is_empty());
    }

    pub(crate) fn set_thread_filters(&mut self, filters: Option<String>) {
        self.thread_filters = filters.filter(|f| !f.trim().is_empty());
    }

    /// Replace the kind configuration. Live subscriptions no longer match
    /// and have to be torn down by the caller.
    pub(crate) fn kind_mut(&mut self) -> &mut BreakpointKind {
        &mut self.kind
    }

    pub fn set_enabled(&mut self, enabled: bool, target: Option<&dyn Target>) {
        self.enabled = enabled;
        let Some(target) = target else { return };
        for sub in &mut self.subscriptions {
            sub.request.enabled = enabled;
            if let Err(e) = target.set_subscription_enabled(sub.id, enabled) {
                log_teardown_error(self.number, &e);
            }
        }
    }

    pub fn set_suspend_policy(&mut self, policy: SuspendPolicy, target: Option<&dyn Target>) {
        self.suspend_policy = policy;
        let Some(target) = target else { return };
        for sub in &mut self.subscriptions {
            sub.request.suspend_policy = policy;
            if let Err(e) = target.set_subscription_suspend_policy(sub.id, policy) {
                log_teardown_error(self.number, &e);
            }
        }
    }

    fn owner(&self) -> Owner {
        match self.kind {
            BreakpointKind::UncaughtException => Owner::UncaughtException,
            _ => Owner::Breakpoint(self.number),
        }
    }

    fn request_for(&self, kind: SubscriptionKind) -> SubscriptionRequest {
        let mut request = SubscriptionRequest::new(kind, self.owner());
        request.suspend_policy = self.suspend_policy;
        request.enabled = self.enabled;
        if let Some(filters) = &self.class_filters {
            request.class_filters = split_list(filters);
        }
        if let Some(filters) = &self.thread_filters {
            request.thread_filters = split_list(filters);
        }
        request
    }

    fn subscribe(
        &mut self,
        target: &dyn Target,
        kind: SubscriptionKind,
        type_id: Option<ReferenceTypeId>,
    ) -> Result<(), TargetError> {
        let request = self.request_for(kind);
        let id = target.create_subscription(&request)?;
        debug!("Breakpoint {} subscribed as request {}", self.number, id);
        self.subscriptions.push(Subscription {
            id,
            type_id,
            request,
        });
        Ok(())
    }

    /// Bind the breakpoint to the target as far as currently possible.
    ///
    /// Pattern-based kinds register a standing class-prepare request and
    /// resolve against every matching loaded type; an error here is fatal
    /// for the caller. Watches resolve only when a frame is available.
    /// Everything else subscribes directly.
    pub(crate) fn resolve(
        &mut self,
        target: &dyn Target,
        evaluator: Option<&dyn Evaluator>,
        frame: Option<&FrameContext>,
    ) -> Result<(), ResolveError> {
        match &self.kind {
            BreakpointKind::Line(_) | BreakpointKind::Method(_) | BreakpointKind::Exception(_) => {
                self.resolve_eagerly(target)
            }
            BreakpointKind::Watch(_) => match (evaluator, frame) {
                (Some(evaluator), Some(frame)) => self.resolve_watch(target, evaluator, frame),
                _ => {
                    debug!("Breakpoint {} waits for a frame to resolve", self.number);
                    Ok(())
                }
            },
            BreakpointKind::Class(class) => {
                let kinds = class.subscriptions();
                self.subscribe_all(target, kinds)
            }
            BreakpointKind::Thread(thread) => {
                let kinds = thread.subscriptions();
                self.subscribe_all(target, kinds)
            }
            BreakpointKind::Trace => self.subscribe_all(
                target,
                vec![SubscriptionKind::MethodEntry, SubscriptionKind::MethodExit],
            ),
            BreakpointKind::UncaughtException => {
                self.subscribe_all(target, vec![exception::uncaught_subscription()])
            }
        }
    }

    fn subscribe_all(
        &mut self,
        target: &dyn Target,
        kinds: Vec<SubscriptionKind>,
    ) -> Result<(), ResolveError> {
        if !self.subscriptions.is_empty() {
            return Ok(());
        }
        for kind in kinds {
            self.subscribe(target, kind, None)?;
        }
        Ok(())
    }

    fn resolve_eagerly(&mut self, target: &dyn Target) -> Result<(), ResolveError> {
        let Some(spec) = self.kind.pattern().cloned() else {
            return Ok(());
        };
        if self.prepare_request.is_none() {
            let mut request = SubscriptionRequest::new(
                SubscriptionKind::ClassPrepare {
                    pattern: Some(spec.identifier().to_string()),
                },
                self.owner(),
            );
            request.suspend_policy = SuspendPolicy::All;
            self.prepare_request = Some(target.create_subscription(&request)?);
        }

        for ty in resolve::matching_types(target, &spec)? {
            self.resolve_type(target, &ty)?;
        }
        Ok(())
    }

    /// Resolve against one prepared type. Returns false when the type does
    /// not match or was already resolved.
    pub(crate) fn resolve_type(
        &mut self,
        target: &dyn Target,
        ty: &TypeInfo,
    ) -> Result<bool, ResolveError> {
        let matches = self.kind.pattern().is_some_and(|p| p.matches(&ty.name));
        if !matches || self.subscriptions.iter().any(|s| s.type_id == Some(ty.type_id)) {
            return Ok(false);
        }
        let kind = match &self.kind {
            BreakpointKind::Line(bp) => SubscriptionKind::Breakpoint {
                location: bp.resolve_type(target, ty)?,
            },
            BreakpointKind::Method(bp) => SubscriptionKind::Breakpoint {
                location: bp.resolve_type(target, ty)?,
            },
            BreakpointKind::Exception(bp) => bp.resolve_type(ty)?,
            _ => return Ok(false),
        };
        self.subscribe(target, kind, Some(ty.type_id))?;
        info!("Breakpoint {} resolved against {}", self.number, ty.name);
        Ok(true)
    }

    fn resolve_watch(
        &mut self,
        target: &dyn Target,
        evaluator: &dyn Evaluator,
        frame: &FrameContext,
    ) -> Result<(), ResolveError> {
        let BreakpointKind::Watch(watch) = &self.kind else {
            return Ok(());
        };
        if !self.subscriptions.is_empty() {
            return Ok(());
        }
        if watch.loses_instance_filter(target) {
            warn!(
                "Target cannot filter by instance, breakpoint {} watches every object",
                self.number
            );
        }
        let (field, kinds) = watch.resolve(target, evaluator, frame)?;
        for kind in kinds {
            self.subscribe(target, kind, Some(field.declaring_type))?;
        }
        info!("Breakpoint {} watching field {}", self.number, field.name);
        self.field = Some(field);
        Ok(())
    }

    /// Tear down every subscription. Safe to call repeatedly and after the
    /// target has gone away.
    pub(crate) fn release(&mut self, target: Option<&dyn Target>) {
        let ids: Vec<RequestId> = self
            .subscriptions
            .drain(..)
            .map(|s| s.id)
            .chain(self.prepare_request.take())
            .collect();
        self.field = None;
        let Some(target) = target else { return };
        for id in ids {
            if let Err(e) = target.delete_subscription(id) {
                log_teardown_error(self.number, &e);
            }
        }
    }

    /// Drop the resolution but keep listening for class loads
    pub(crate) fn release_resolution(&mut self, target: Option<&dyn Target>) {
        let prepare = self.prepare_request.take();
        self.release(target);
        self.prepare_request = prepare;
    }

    /// Clear the hit count and everything bound to the target; the
    /// configuration stays.
    pub fn reset(&mut self, target: Option<&dyn Target>) {
        self.stopped_count = 0;
        self.release(target);
        debug!("Breakpoint {} reset", self.number);
    }

    /// Run the stop pipeline for an event delivered to this breakpoint
    pub fn fire(&mut self, event: &TargetEvent, ctx: &FireContext<'_>) -> FireOutcome {
        let accepted = match &self.kind {
            BreakpointKind::Thread(bp) => bp.accepts(event),
            BreakpointKind::Exception(bp) => bp.accepts(event),
            BreakpointKind::UncaughtException => exception::uncaught_accepts(event),
            _ => true,
        };
        if !accepted {
            debug!("Breakpoint {} filtered out {}", self.number, event.describe());
            return FireOutcome::resume();
        }

        self.stopped_count += 1;
        let mut outcome = self.process_hit(event, ctx);
        outcome.counted = self.skip_count > 0 || self.expire_count > 0;
        outcome
    }

    fn process_hit(&self, event: &TargetEvent, ctx: &FireContext<'_>) -> FireOutcome {
        if !ctx.effective_enabled || self.has_expired() || self.is_skipping() {
            debug!(
                "Breakpoint {} passing hit {} (enabled={}, expired={}, skipping={})",
                self.number,
                self.stopped_count,
                ctx.effective_enabled,
                self.has_expired(),
                self.is_skipping()
            );
            return FireOutcome::resume();
        }

        for condition in &self.conditions {
            let satisfied = match ctx.evaluator {
                Some(evaluator) => condition.is_satisfied(event, evaluator),
                None => Err(crate::error::EvalError("no evaluator".to_string())),
            };
            match satisfied {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Breakpoint {} condition not met: {}", self.number, condition);
                    return FireOutcome::resume();
                }
                // TODO: decide whether a failing condition should stop instead;
                // a condition error currently suppresses the stop.
                Err(e) => {
                    let message = format!(
                        "Breakpoint {} condition {} failed: {}",
                        self.number, condition, e
                    );
                    warn!("{}", message);
                    ctx.notifier.warning(message);
                    return FireOutcome::resume();
                }
            }
        }

        ctx.notifier
            .notice(format!("{} {}: {}", self.label(), self, event.describe()));
        let frame = event.frame_context();
        for monitor in &self.monitors {
            if let Err(e) = monitor.perform(frame.as_ref(), ctx.interpreter, ctx.notifier) {
                warn!("Breakpoint {} monitor {} failed: {}", self.number, monitor, e);
            }
        }

        let remove =
            self.delete_on_expire && self.expire_count > 0 && self.stopped_count >= self.expire_count;
        let decision = match (&self.kind, self.suspend_policy) {
            (BreakpointKind::Trace, _) | (_, SuspendPolicy::None) => Decision::Resume,
            (_, policy) => Decision::Suspend(policy),
        };
        debug!("Breakpoint {} decided {:?}", self.number, decision);
        FireOutcome {
            decision,
            remove,
            counted: false,
        }
    }

    fn label(&self) -> String {
        match self.kind {
            BreakpointKind::UncaughtException => "Uncaught exception".to_string(),
            BreakpointKind::Trace => format!("Trace {}", self.number),
            _ => format!("Breakpoint {} hit", self.number),
        }
    }
}

fn log_teardown_error(number: u32, e: &TargetError) {
    if e.is_disconnect() {
        debug!("Breakpoint {}: target already gone", number);
    } else {
        warn!("Breakpoint {}: {}", number, e);
    }
}

fn on_off(flag: bool, label: &str) -> Option<&str> {
    flag.then_some(label)
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BreakpointKind::Line(bp) => write!(f, "{}:{}", bp.pattern, bp.line),
            BreakpointKind::Method(bp) => {
                write!(f, "{}.{}", bp.pattern, bp.method)?;
                if let Some(args) = &bp.args {
                    write!(f, "({})", args.join(", "))?;
                }
                Ok(())
            }
            BreakpointKind::Exception(bp) => {
                write!(f, "catch {}", bp.pattern)?;
                match (bp.caught, bp.uncaught) {
                    (true, false) => write!(f, " (caught)"),
                    (false, true) => write!(f, " (uncaught)"),
                    _ => Ok(()),
                }
            }
            BreakpointKind::Class(bp) => {
                write!(f, "class {}", self.class_filters.as_deref().unwrap_or("*"))?;
                for flag in [on_off(bp.on_prepare, "prepare"), on_off(bp.on_unload, "unload")]
                    .into_iter()
                    .flatten()
                {
                    write!(f, " {}", flag)?;
                }
                Ok(())
            }
            BreakpointKind::Thread(bp) => {
                write!(f, "thread {}", bp.thread_name.as_deref().unwrap_or("*"))?;
                for flag in [on_off(bp.on_start, "start"), on_off(bp.on_death, "death")]
                    .into_iter()
                    .flatten()
                {
                    write!(f, " {}", flag)?;
                }
                Ok(())
            }
            BreakpointKind::Watch(bp) => {
                write!(f, "watch {}", bp.field_name)?;
                if let Some(object) = bp.object {
                    write!(f, " @{:x}", object)?;
                }
                for flag in [on_off(bp.on_access, "access"), on_off(bp.on_modify, "modify")]
                    .into_iter()
                    .flatten()
                {
                    write!(f, " {}", flag)?;
                }
                Ok(())
            }
            BreakpointKind::Trace => {
                f.write_str("trace")?;
                if let Some(classes) = &self.class_filters {
                    write!(f, " {}", classes)?;
                }
                Ok(())
            }
            BreakpointKind::UncaughtException => f.write_str("all uncaught exceptions"),
        }
    }
}

/// Terse label: `Foo:42` rather than `com.example.Foo:42`
pub fn short_description(bp: &Breakpoint) -> String {
    match bp.kind() {
        BreakpointKind::Line(line) => {
            format!("{}:{}", simple_name(line.pattern.identifier()), line.line)
        }
        BreakpointKind::Method(method) => format!(
            "{}.{}",
            simple_name(method.pattern.identifier()),
            method.signature()
        ),
        _ => bp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::types::{Location, ThreadRef};

    fn spec(s: &str) -> ReferenceTypeSpec {
        ReferenceTypeSpec::new(s).unwrap()
    }

    fn hit() -> TargetEvent {
        TargetEvent {
            request_id: 1,
            owner: Some(Owner::Breakpoint(1)),
            thread: Some(ThreadRef {
                id: 1,
                name: "main".into(),
            }),
            kind: EventKind::Breakpoint {
                location: Location {
                    type_id: 1,
                    method_id: 1,
                    index: 0,
                    line: Some(42),
                },
            },
        }
    }

    fn fire(bp: &mut Breakpoint, notifier: &Notifier) -> FireOutcome {
        let ctx = FireContext {
            effective_enabled: bp.is_enabled_flag(),
            evaluator: None,
            interpreter: None,
            notifier,
        };
        bp.fire(&hit(), &ctx)
    }

    #[test]
    fn test_skip_window() {
        let notifier = Notifier::new(16);
        let mut bp = Breakpoint::line(spec("com.Foo"), 42);
        bp.set_skip_count(2);
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert_eq!(
            fire(&mut bp, &notifier).decision,
            Decision::Suspend(SuspendPolicy::All)
        );
        assert!(!bp.is_skipping());
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let notifier = Notifier::new(16);
        let mut bp = Breakpoint::line(spec("com.Foo"), 42);
        bp.set_expire_count(2);
        assert!(!fire(&mut bp, &notifier).decision.should_resume());
        assert!(!fire(&mut bp, &notifier).decision.should_resume());
        assert!(!bp.has_expired());
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert!(bp.has_expired());
        fire(&mut bp, &notifier);
        assert!(bp.has_expired());
        assert_eq!(bp.stopped_count(), 4);
    }

    #[test]
    fn test_disabled_still_counts() {
        let notifier = Notifier::new(16);
        let mut bp = Breakpoint::line(spec("com.Foo"), 42);
        bp.set_enabled(false, None);
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert_eq!(bp.stopped_count(), 1);
    }

    #[test]
    fn test_condition_without_evaluator_resumes_with_warning() {
        let notifier = Notifier::new(16);
        let mut rx = notifier.subscribe();
        let mut bp = Breakpoint::line(spec("com.Foo"), 42);
        bp.add_condition(Condition::expr("x > 1"));
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert!(matches!(
            rx.try_recv().unwrap(),
            crate::notify::ManagerEvent::Warning { .. }
        ));
    }

    #[test]
    fn test_delete_on_expire_flag() {
        let notifier = Notifier::new(16);
        let mut bp = Breakpoint::method(spec("Main"), "main", None);
        bp.set_expire_count(1);
        bp.set_delete_on_expire(true);
        let outcome = fire(&mut bp, &notifier);
        assert!(outcome.remove);
        assert!(!outcome.decision.should_resume());
    }

    #[test]
    fn test_trace_never_stops() {
        let notifier = Notifier::new(16);
        let mut bp = Breakpoint::trace(None, None);
        assert_eq!(bp.suspend_policy(), SuspendPolicy::None);
        bp.set_suspend_policy(SuspendPolicy::All, None);
        assert!(fire(&mut bp, &notifier).decision.should_resume());
        assert_eq!(bp.stopped_count(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Breakpoint::line(spec("com.Foo"), 42).to_string(), "com.Foo:42");
        assert_eq!(
            Breakpoint::method(spec("com.Foo"), "bar", Some(vec!["int".into()])).to_string(),
            "com.Foo.bar(int)"
        );
        assert_eq!(
            Breakpoint::exception(spec("java.io.IOException"), true, true).to_string(),
            "catch java.io.IOException"
        );
        assert_eq!(
            Breakpoint::thread(Some("worker".into()), true, true).to_string(),
            "thread worker start death"
        );
        assert_eq!(Breakpoint::class("com.*", true, false).to_string(), "class com.* prepare");
        assert_eq!(
            Breakpoint::watch(WatchBreakpoint::new("count", true, true)).to_string(),
            "watch count access modify"
        );
        assert_eq!(Breakpoint::trace(None, None).to_string(), "trace");
        assert_eq!(Breakpoint::uncaught().to_string(), "all uncaught exceptions");
        assert_eq!(
            short_description(&Breakpoint::line(spec("com.example.Foo"), 7)),
            "Foo:7"
        );
    }
}
