// Saving and restoring the breakpoint tree

use serde_json::json;
use std::sync::Arc;
use stoppoint::mock::{MockClass, MockTarget};
use stoppoint::persist::GroupRecord;
use stoppoint::types::ThreadRef;
use stoppoint::{
    BreakpointKind, BreakpointManager, Condition, Decision, EngineConfig, Monitor, SessionContext,
    SuspendPolicy,
};

fn config() -> EngineConfig {
    EngineConfig {
        stop_on_main: false,
        ..EngineConfig::default()
    }
}

/// One breakpoint of every persistable kind, each with a condition and a
/// monitor, one of them in a collapsed sub-group
fn populated() -> BreakpointManager {
    let mut manager = BreakpointManager::new(config());
    let numbers = vec![
        manager.create_location_breakpoint("com.Foo:42", None).unwrap(),
        manager
            .create_location_breakpoint("com.Foo.bar(int, java.lang.String)", None)
            .unwrap(),
        manager
            .create_exception_breakpoint("java.io.IOException", true, false)
            .unwrap(),
        manager.create_class_breakpoint("com.*, org.*", true, true).unwrap(),
        manager.create_thread_breakpoint(Some("worker"), true, false).unwrap(),
        manager.create_watch_breakpoint("count", None, true, true).unwrap(),
        manager.create_trace_breakpoint(Some("com.*"), Some("main")).unwrap(),
    ];
    for n in &numbers {
        manager
            .add_condition(*n, Condition::expr(format!("hits > {}", n)))
            .unwrap();
        manager
            .add_monitor(*n, Monitor::log(format!("breakpoint {}", n)))
            .unwrap();
    }
    manager.set_skip_count(numbers[0], 2).unwrap();
    manager.set_expire_count(numbers[0], 5).unwrap();
    manager.set_delete_on_expire(numbers[0], true).unwrap();
    manager
        .set_suspend_policy(numbers[1], SuspendPolicy::EventThread)
        .unwrap();
    manager.set_enabled(numbers[2], false).unwrap();
    manager
        .set_class_filters(numbers[2], Some("com.example.*".into()))
        .unwrap();

    let outer = manager.create_group("outer", None).unwrap();
    let inner = manager.create_group("inner", Some(outer)).unwrap();
    manager.move_breakpoint(numbers[4], inner).unwrap();
    manager.set_group_enabled(inner, false).unwrap();
    manager.set_group_expanded(outer, false).unwrap();
    manager
}

#[test]
fn test_round_trip_through_file() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[42]));
    let mut original = populated();
    original.activate(SessionContext::new(target.clone()));
    let thread = ThreadRef {
        id: 1,
        name: "main".to_string(),
    };
    for event in target.hit_line("com.Foo", 42, &thread) {
        assert_eq!(original.handle_event(&event), Decision::Resume);
    }
    let line = original.find_line_breakpoint("com.Foo", 42).unwrap().number();
    assert_eq!(original.get(line).unwrap().stopped_count(), 1);

    let file = tempfile::NamedTempFile::new().unwrap();
    original.save(file.path()).unwrap();

    let mut restored = BreakpointManager::new(config());
    let warnings = restored.load(file.path()).unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);

    assert_eq!(restored.snapshot().unwrap(), original.snapshot().unwrap());
    assert_eq!(restored.len(), original.len());

    let describe = |m: &BreakpointManager| -> Vec<String> {
        m.breakpoints().iter().map(|bp| bp.to_string()).collect()
    };
    assert_eq!(describe(&restored), describe(&original));

    // one hit spent against skip 2 / expire 5
    assert_eq!(restored.get(line).unwrap().stopped_count(), 1);

    let inner = restored.find_group("inner").unwrap();
    let worker = restored.groups().get(inner).unwrap().breakpoints()[0];
    assert!(!restored.is_enabled(worker));
    assert!(restored.get(worker).unwrap().is_enabled_flag());

    let outer = restored.find_group("outer").unwrap();
    assert!(!restored.groups().get(outer).unwrap().is_expanded());
}

#[test]
fn test_restored_numbers_continue() {
    let original = populated();
    let mut restored = BreakpointManager::new(config());
    restored.restore(original.snapshot().unwrap());
    let n = restored.create_location_breakpoint("com.Bar:1", None).unwrap();
    assert_eq!(n as usize, original.len() + 1);
}

#[test]
fn test_restore_into_live_table_keeps_freed_numbers_retired() {
    let mut saved = BreakpointManager::new(config());
    saved.create_location_breakpoint("com.Saved:1", None).unwrap();
    let record = saved.snapshot().unwrap();

    let mut manager = BreakpointManager::new(config());
    manager.create_location_breakpoint("com.A:1", None).unwrap();
    manager.create_location_breakpoint("com.B:1", None).unwrap();
    manager.remove_breakpoint(1).unwrap();

    assert!(manager.restore(record).is_empty());
    let listed: Vec<(u32, String)> = manager
        .breakpoints()
        .iter()
        .map(|bp| (bp.number(), bp.to_string()))
        .collect();
    assert_eq!(
        listed,
        vec![(2, "com.B:1".to_string()), (3, "com.Saved:1".to_string())]
    );
    assert_eq!(manager.create_location_breakpoint("com.C:1", None).unwrap(), 4);
}

#[test]
fn test_bad_nodes_are_skipped() {
    let record: GroupRecord = serde_json::from_value(json!({
        "name": "Default",
        "breakpoints": [
            {"type": "Line", "pattern": "com.Foo", "line": 3},
            {"type": "Teleport", "where": "anywhere"},
            {"type": "Line", "pattern": "com..Foo", "line": 3},
            {"type": "UncaughtException"},
            {
                "type": "Method",
                "pattern": "com.Foo",
                "method": "run",
                "conditions": [{"type": "Expr"}],
                "monitors": [{"type": "Command", "command": "where"}]
            }
        ],
        "groups": [
            {"name": "kept", "breakpoints": [{"type": "Trace"}]},
            {"enabled": false}
        ]
    }))
    .unwrap();

    let mut manager = BreakpointManager::new(config());
    let mut rx = manager.subscribe();
    let warnings = manager.restore(record);
    assert_eq!(warnings.len(), 5, "{:?}", warnings);
    assert_eq!(manager.len(), 3);

    let method = manager
        .breakpoints()
        .into_iter()
        .find(|bp| matches!(bp.kind(), BreakpointKind::Method(_)))
        .unwrap();
    assert!(method.conditions().is_empty());
    assert_eq!(method.monitors().len(), 1);

    let mut warned = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, stoppoint::ManagerEvent::Warning { .. }) {
            warned += 1;
        }
    }
    assert_eq!(warned, 5);
}

#[test]
fn test_restore_resolves_when_active() {
    let target = Arc::new(MockTarget::new());
    target.install(MockClass::new("com.Foo").with_lines(&[42]));
    let original = populated();

    let mut manager = BreakpointManager::new(config());
    manager.activate(SessionContext::new(target.clone()));
    manager.restore(original.snapshot().unwrap());

    let line = manager.find_line_breakpoint("com.Foo", 42).unwrap();
    assert!(line.is_resolved());
    // com.Foo has no bar method, so this one stays pending
    let method = manager
        .breakpoints()
        .into_iter()
        .find(|bp| matches!(bp.kind(), BreakpointKind::Method(_)))
        .unwrap();
    assert!(!method.is_resolved());
}

#[test]
fn test_open_and_close_use_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("breakpoints.json");
    let config = EngineConfig {
        stop_on_main: false,
        breakpoints_file: Some(path.clone()),
        ..EngineConfig::default()
    };

    let mut manager = BreakpointManager::open(config.clone()).unwrap();
    assert!(manager.is_empty());
    manager.create_location_breakpoint("com.Foo:1", None).unwrap();
    manager.create_group("later", None).unwrap();
    manager.close().unwrap();
    assert!(manager.is_empty());
    assert!(path.exists());

    let reopened = BreakpointManager::open(config).unwrap();
    assert_eq!(reopened.len(), 1);
    assert!(reopened.find_group("later").is_some());
}
