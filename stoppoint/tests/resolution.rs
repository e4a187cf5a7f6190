// Resolution scenarios against the in-memory target

use std::sync::Arc;
use stoppoint::error::ResolveError;
use stoppoint::mock::{MockClass, MockTarget};
use stoppoint::target::SubscriptionKind;
use stoppoint::types::ThreadRef;
use stoppoint::{
    BreakpointError, BreakpointManager, Decision, EngineConfig, ManagerEvent, SessionContext,
    SuspendPolicy,
};

fn config() -> EngineConfig {
    EngineConfig {
        stop_on_main: false,
        ..EngineConfig::default()
    }
}

fn active(target: &Arc<MockTarget>) -> BreakpointManager {
    let mut manager = BreakpointManager::new(config());
    manager.activate(SessionContext::new(target.clone()));
    manager
}

fn main_thread() -> ThreadRef {
    ThreadRef {
        id: 1,
        name: "main".into(),
    }
}

fn breakpoint_line(manager: &BreakpointManager, number: u32) -> Option<u32> {
    manager
        .get(number)?
        .subscriptions()
        .iter()
        .find_map(|s| match &s.request.kind {
            SubscriptionKind::Breakpoint { location } => location.line,
            _ => None,
        })
}

#[test]
fn test_wildcard_line_resolves_on_class_load() {
    let target = Arc::new(MockTarget::new());
    let mut manager = active(&target);

    let n = manager.create_location_breakpoint("*.Foo:42", None).unwrap();
    manager.set_suspend_policy(n, SuspendPolicy::None).unwrap();
    assert!(!manager.get(n).unwrap().is_resolved());

    let events = target.load_class(MockClass::new("com.example.Foo").with_lines(&[40, 42]));
    assert_eq!(events.len(), 1);
    for event in &events {
        assert_eq!(manager.handle_event(event), Decision::Resume);
    }
    assert!(manager.get(n).unwrap().is_resolved());
    assert_eq!(breakpoint_line(&manager, n), Some(42));

    let hits = target.hit_line("com.example.Foo", 42, &main_thread());
    assert_eq!(hits.len(), 1);
    assert_eq!(manager.handle_event(&hits[0]), Decision::Resume);
    assert_eq!(manager.get(n).unwrap().stopped_count(), 1);
}

#[test]
fn test_loaded_class_resolves_immediately() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[10]));
    let mut manager = active(&target);

    let n = manager.create_location_breakpoint("com.Foo:10", None).unwrap();
    assert!(manager.get(n).unwrap().is_resolved());
    assert_eq!(breakpoint_line(&manager, n), Some(10));
    // exact names are looked up without suspending the target
    assert_eq!(target.suspend_counts(), (0, 0));
}

#[test]
fn test_wildcard_lookup_suspends_around_query() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[10]));
    let mut manager = active(&target);

    manager.create_location_breakpoint("com.*:10", None).unwrap();
    assert_eq!(target.suspend_counts(), (1, 1));
}

#[test]
fn test_nested_types_are_matched() {
    let target = Arc::new(MockTarget::new());
    target.install(
        MockClass::new("com.Outer")
            .with_lines(&[1])
            .with_nested(MockClass::new("com.Outer$Inner").with_lines(&[7])),
    );
    let mut manager = active(&target);

    let n = manager.create_location_breakpoint("com.Outer$Inner:7", None).unwrap();
    assert!(manager.get(n).unwrap().is_resolved());
}

#[test]
fn test_one_subscription_per_matching_type() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("a.Foo").with_lines(&[5]));
    target.install(MockClass::new("b.Foo").with_lines(&[5]));
    let mut manager = active(&target);

    let n = manager.create_location_breakpoint("*.Foo:5", None).unwrap();
    assert_eq!(manager.get(n).unwrap().subscriptions().len(), 2);

    // a later class load adds a third
    for event in target.load_class(MockClass::new("c.Foo").with_lines(&[5])) {
        manager.handle_event(&event);
    }
    assert_eq!(manager.get(n).unwrap().subscriptions().len(), 3);
}

#[test]
fn test_unprepared_types_are_skipped() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[3]).unprepared());
    let mut manager = active(&target);

    let n = manager.create_location_breakpoint("com.Foo:3", None).unwrap();
    assert!(!manager.get(n).unwrap().is_resolved());
}

#[test]
fn test_eager_failure_rolls_back() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[10]));
    let mut manager = active(&target);
    let baseline = target.subscription_count();

    let err = manager.create_location_breakpoint("com.Foo:11", None).unwrap_err();
    assert!(matches!(
        err,
        BreakpointError::Resolve(ResolveError::LineNotFound { line: 11, .. })
    ));
    assert!(manager.is_empty());
    assert_eq!(target.subscription_count(), baseline);

    // the number was released
    assert_eq!(manager.create_location_breakpoint("com.Foo:10", None).unwrap(), 1);
}

#[test]
fn test_missing_line_info_is_fatal() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").without_line_info());
    let mut manager = active(&target);

    assert!(matches!(
        manager.create_location_breakpoint("com.Foo:10", None),
        Err(BreakpointError::Resolve(ResolveError::AbsentLineInfo(_)))
    ));
}

#[test]
fn test_interface_is_not_resolvable() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Api").interface());
    let mut manager = active(&target);

    assert!(matches!(
        manager.create_exception_breakpoint("com.Api", true, true),
        Err(BreakpointError::Resolve(ResolveError::InvalidTypeKind(_)))
    ));
}

#[test]
fn test_late_failure_is_a_warning() {
    let target = Arc::new(MockTarget::new());
    let mut manager = active(&target);
    let n = manager.create_location_breakpoint("*.Foo:10", None).unwrap();
    let mut rx = manager.subscribe();

    for event in target.load_class(MockClass::new("a.Foo").with_lines(&[1])) {
        assert_eq!(manager.handle_event(&event), Decision::Resume);
    }
    assert!(matches!(rx.try_recv(), Ok(ManagerEvent::Warning { .. })));
    assert!(!manager.get(n).unwrap().is_resolved());

    for event in target.load_class(MockClass::new("b.Foo").with_lines(&[10])) {
        manager.handle_event(&event);
    }
    assert!(manager.get(n).unwrap().is_resolved());
}

#[test]
fn test_method_overloads() {
    let target = Arc::new(MockTarget::new());
    target.install(
        MockClass::new("com.Calc")
            .with_method("add", &["int", "int"], Some(10))
            .with_method("add", &["double", "double"], Some(20))
            .with_method("clear", &[], Some(30)),
    );
    let mut manager = active(&target);

    assert!(matches!(
        manager.create_location_breakpoint("com.Calc.add", None),
        Err(BreakpointError::Resolve(ResolveError::AmbiguousMethod { .. }))
    ));
    let n = manager
        .create_location_breakpoint("com.Calc.add(java.lang.Integer, int)", None)
        .unwrap();
    assert_eq!(breakpoint_line(&manager, n), Some(10));

    let m = manager.create_location_breakpoint("clear", Some("com.Calc")).unwrap();
    assert_eq!(breakpoint_line(&manager, m), Some(30));

    assert!(matches!(
        manager.create_location_breakpoint("com.Calc.mul", None),
        Err(BreakpointError::Resolve(ResolveError::NoSuchMethod { .. }))
    ));
}

#[test]
fn test_relocation_moves_subscription() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[10, 12]));
    let mut manager = active(&target);
    let n = manager.create_location_breakpoint("com.Foo:10", None).unwrap();

    manager.set_line(n, 12).unwrap();
    assert_eq!(breakpoint_line(&manager, n), Some(12));
    assert!(target.hit_line("com.Foo", 10, &main_thread()).is_empty());
    assert_eq!(target.hit_line("com.Foo", 12, &main_thread()).len(), 1);
}

#[test]
fn test_pending_breakpoints_resolve_on_activation() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[4]));
    let mut manager = BreakpointManager::new(config());

    let n = manager.create_location_breakpoint("com.Foo:4", None).unwrap();
    assert!(!manager.get(n).unwrap().is_resolved());

    manager.activate(SessionContext::new(target.clone()));
    assert!(manager.get(n).unwrap().is_resolved());
}

#[test]
fn test_deactivation_resets_and_releases() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[4]));
    let mut manager = active(&target);
    let n = manager.create_location_breakpoint("com.Foo:4", None).unwrap();
    manager.set_skip_count(n, 5).unwrap();
    manager.set_enabled(n, false).unwrap();
    manager.set_enabled(n, true).unwrap();
    for event in target.hit_line("com.Foo", 4, &main_thread()) {
        manager.handle_event(&event);
    }
    assert_eq!(manager.get(n).unwrap().stopped_count(), 1);

    manager.deactivate();
    let bp = manager.get(n).unwrap();
    assert_eq!(bp.stopped_count(), 0);
    assert!(!bp.is_resolved());
    assert_eq!(bp.skip_count(), 5);
    assert!(bp.is_enabled_flag());
    assert_eq!(target.subscription_count(), 0);
    assert!(manager.uncaught_breakpoint().is_none());
}

#[test]
fn test_teardown_tolerates_disconnect() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[4]));
    let mut manager = active(&target);
    let n = manager.create_location_breakpoint("com.Foo:4", None).unwrap();

    target.disconnect();
    manager.remove_breakpoint(n).unwrap();
    manager.deactivate();
    assert!(manager.is_empty());
}

#[test]
fn test_reactivation_replaces_session_state() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[4]));
    let mut manager = active(&target);
    let n = manager.create_location_breakpoint("com.Foo:4", None).unwrap();
    manager.activate(SessionContext::new(target.clone()));

    // uncaught request, plus the line breakpoint's class-prepare and location requests
    assert_eq!(target.subscription_count(), 3);
    let events = target.throw_exception("java.lang.IllegalStateException", false, &main_thread());
    assert_eq!(events.len(), 1);
    let decisions: Vec<_> = events.iter().map(|e| manager.handle_event(e)).collect();
    assert_eq!(decisions, vec![Decision::Suspend(SuspendPolicy::All)]);
    assert!(manager.get(n).unwrap().is_resolved());

    manager.deactivate();
    assert_eq!(target.subscription_count(), 0);
}
