// In-memory target for tests and dry runs
//
// MockTarget keeps a table of "loaded" classes and the subscriptions the
// engine created. Simulation methods (load_class, hit_line, throw_exception,
// ...) return the events a real VM would deliver for the current
// subscriptions, so tests can feed them back into the manager.

use crate::condition::Evaluator;
use crate::error::{EvalError, MonitorError, TargetError, TargetResult};
use crate::events::{EventKind, TargetEvent};
use crate::monitor::CommandInterpreter;
use crate::pattern::ReferenceTypeSpec;
use crate::target::{SubscriptionKind, SubscriptionRequest, SuspendPolicy, Target};
use crate::types::{
    FieldInfo, FrameContext, Location, MethodId, MethodInfo, ObjectId, ReferenceTypeId,
    RequestId, ThreadRef, TypeInfo, TypeKind, Value,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

/// Method description for a mock class
#[derive(Debug, Clone)]
pub struct MockMethod {
    pub name: String,
    pub args: Vec<String>,
    /// First line; None for native or abstract methods
    pub line: Option<u32>,
}

/// Class definition handed to the mock before "loading" it
#[derive(Debug, Clone)]
pub struct MockClass {
    pub name: String,
    pub kind: TypeKind,
    pub prepared: bool,
    /// None = compiled without line tables
    pub lines: Option<Vec<u32>>,
    pub methods: Vec<MockMethod>,
    pub nested: Vec<MockClass>,
}

impl MockClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            prepared: true,
            lines: Some(Vec::new()),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: &[u32]) -> Self {
        self.lines = Some(lines.to_vec());
        self
    }

    pub fn without_line_info(mut self) -> Self {
        self.lines = None;
        self
    }

    pub fn with_method(mut self, name: &str, args: &[&str], line: Option<u32>) -> Self {
        self.methods.push(MockMethod {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            line,
        });
        self
    }

    pub fn with_nested(mut self, nested: MockClass) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn interface(mut self) -> Self {
        self.kind = TypeKind::Interface;
        self
    }

    pub fn unprepared(mut self) -> Self {
        self.prepared = false;
        self
    }
}

#[derive(Debug, Clone)]
struct LoadedClass {
    info: TypeInfo,
    lines: Option<Vec<u32>>,
    methods: Vec<MethodInfo>,
    nested: Vec<ReferenceTypeId>,
}

#[derive(Debug, Default)]
struct MockState {
    classes: BTreeMap<ReferenceTypeId, LoadedClass>,
    subscriptions: BTreeMap<RequestId, SubscriptionRequest>,
    last_type_id: ReferenceTypeId,
    last_method_id: MethodId,
    last_request_id: RequestId,
    suspends: usize,
    resumes: usize,
    disconnected: bool,
    no_instance_filters: bool,
}

impl MockState {
    /// Register a class and its nested types; returns every new type
    /// breadth-first, outer class first.
    fn install(&mut self, class: MockClass) -> Vec<TypeInfo> {
        let mut installed = Vec::new();
        let mut queue = VecDeque::from([(class, None::<ReferenceTypeId>)]);
        while let Some((class, parent)) = queue.pop_front() {
            self.last_type_id += 1;
            let type_id = self.last_type_id;
            let info = TypeInfo {
                type_id,
                name: class.name.clone(),
                kind: class.kind,
                prepared: class.prepared,
            };
            let mut methods = Vec::new();
            for method in &class.methods {
                self.last_method_id += 1;
                methods.push(MethodInfo {
                    method_id: self.last_method_id,
                    name: method.name.clone(),
                    argument_type_names: method.args.clone(),
                    location: method.line.map(|line| Location {
                        type_id,
                        method_id: self.last_method_id,
                        index: 0,
                        line: Some(line),
                    }),
                });
            }
            self.classes.insert(
                type_id,
                LoadedClass {
                    info: info.clone(),
                    lines: class.lines.clone(),
                    methods,
                    nested: Vec::new(),
                },
            );
            if let Some(parent) = parent.and_then(|p| self.classes.get_mut(&p)) {
                parent.nested.push(type_id);
            }
            installed.push(info);
            for nested in class.nested {
                queue.push_back((nested, Some(type_id)));
            }
        }
        installed
    }

    fn class_named(&self, name: &str) -> Option<&LoadedClass> {
        self.classes.values().find(|c| c.info.name == name)
    }

    fn check(&self) -> TargetResult<()> {
        if self.disconnected {
            Err(TargetError::Disconnected)
        } else {
            Ok(())
        }
    }

    /// Events for every enabled subscription accepting the occurrence
    fn deliver(
        &self,
        thread: Option<&ThreadRef>,
        class_name: Option<&str>,
        kind: &EventKind,
        accept: impl Fn(&SubscriptionKind) -> bool,
    ) -> Vec<TargetEvent> {
        self.subscriptions
            .iter()
            .filter(|(_, request)| request.enabled && accept(&request.kind))
            .filter(|(_, request)| thread_allowed(request, thread))
            .filter(|(_, request)| class_allowed(request, class_name))
            .map(|(id, request)| TargetEvent {
                request_id: *id,
                owner: Some(request.owner),
                thread: thread.cloned(),
                kind: kind.clone(),
            })
            .collect()
    }
}

fn pattern_matches(pattern: &str, name: &str) -> bool {
    ReferenceTypeSpec::new(pattern).is_ok_and(|spec| spec.matches(name))
}

fn thread_allowed(request: &SubscriptionRequest, thread: Option<&ThreadRef>) -> bool {
    if request.thread_filters.is_empty() {
        return true;
    }
    thread.is_some_and(|t| request.thread_filters.iter().any(|f| *f == t.name))
}

fn class_allowed(request: &SubscriptionRequest, class_name: Option<&str>) -> bool {
    match class_name {
        Some(name) if !request.class_filters.is_empty() => request
            .class_filters
            .iter()
            .any(|f| pattern_matches(f, name)),
        _ => true,
    }
}

fn line_location(type_id: ReferenceTypeId, line: u32) -> Location {
    Location {
        type_id,
        method_id: 0,
        index: line as u64,
        line: Some(line),
    }
}

/// Deterministic in-memory target
#[derive(Debug, Default)]
pub struct MockTarget {
    state: Mutex<MockState>,
}

impl MockTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that instance filters are unsupported
    pub fn without_instance_filters(self) -> Self {
        self.state.lock().no_instance_filters = true;
        self
    }

    /// Make a class loaded without announcing it
    pub fn install(&self, class: MockClass) -> ReferenceTypeId {
        let installed = self.state.lock().install(class);
        installed.first().map_or(0, |info| info.type_id)
    }

    /// Load a class and return the class-prepare events it triggers
    pub fn load_class(&self, class: MockClass) -> Vec<TargetEvent> {
        let mut state = self.state.lock();
        let installed = state.install(class);
        let mut events = Vec::new();
        for info in installed.into_iter().filter(|info| info.prepared) {
            let name = info.name.clone();
            let kind = EventKind::ClassPrepare { type_info: info };
            events.extend(state.deliver(None, Some(name.as_str()), &kind, |k| match k {
                SubscriptionKind::ClassPrepare { pattern } => {
                    pattern.as_deref().map_or(true, |p| pattern_matches(p, &name))
                }
                _ => false,
            }));
        }
        debug!("Loaded class, {} prepare events", events.len());
        events
    }

    pub fn unload_class(&self, name: &str) -> Vec<TargetEvent> {
        let mut state = self.state.lock();
        state.classes.retain(|_, c| c.info.name != name);
        let kind = EventKind::ClassUnload {
            type_name: name.to_string(),
        };
        state.deliver(None, Some(name), &kind, |k| match k {
            SubscriptionKind::ClassUnload { pattern } => {
                pattern.as_deref().map_or(true, |p| pattern_matches(p, name))
            }
            _ => false,
        })
    }

    pub fn type_id(&self, name: &str) -> Option<ReferenceTypeId> {
        self.state.lock().class_named(name).map(|c| c.info.type_id)
    }

    /// Execute the given line of a loaded class
    pub fn hit_line(&self, class: &str, line: u32, thread: &ThreadRef) -> Vec<TargetEvent> {
        let Some(type_id) = self.type_id(class) else {
            return Vec::new();
        };
        self.hit_location(&line_location(type_id, line), thread)
    }

    /// Enter a method of a loaded class at its first location
    pub fn call_method(&self, class: &str, method: &str, thread: &ThreadRef) -> Vec<TargetEvent> {
        let location = {
            let state = self.state.lock();
            state
                .class_named(class)
                .and_then(|c| c.methods.iter().find(|m| m.name == method))
                .and_then(|m| m.location.clone())
        };
        match location {
            Some(location) => self.hit_location(&location, thread),
            None => Vec::new(),
        }
    }

    pub fn hit_location(&self, location: &Location, thread: &ThreadRef) -> Vec<TargetEvent> {
        let state = self.state.lock();
        let class_name = state
            .classes
            .get(&location.type_id)
            .map(|c| c.info.name.clone());
        let kind = EventKind::Breakpoint {
            location: location.clone(),
        };
        state.deliver(Some(thread), class_name.as_deref(), &kind, |k| {
            matches!(k, SubscriptionKind::Breakpoint { location: l } if l == location)
        })
    }

    pub fn throw_exception(
        &self,
        exception_type: &str,
        caught: bool,
        thread: &ThreadRef,
    ) -> Vec<TargetEvent> {
        let state = self.state.lock();
        let type_id = state.class_named(exception_type).map(|c| c.info.type_id);
        let location = line_location(type_id.unwrap_or(0), 1);
        let kind = EventKind::Exception {
            exception_type: exception_type.to_string(),
            location: location.clone(),
            catch_location: caught.then(|| location.clone()),
        };
        state.deliver(Some(thread), Some(exception_type), &kind, |k| match k {
            SubscriptionKind::Exception {
                type_id: wanted,
                caught: on_caught,
                uncaught: on_uncaught,
            } => {
                (wanted.is_none() || *wanted == type_id)
                    && if caught { *on_caught } else { *on_uncaught }
            }
            _ => false,
        })
    }

    pub fn start_thread(&self, thread: &ThreadRef) -> Vec<TargetEvent> {
        let state = self.state.lock();
        state.deliver(Some(thread), None, &EventKind::ThreadStart, |k| {
            matches!(k, SubscriptionKind::ThreadStart)
        })
    }

    pub fn end_thread(&self, thread: &ThreadRef) -> Vec<TargetEvent> {
        let state = self.state.lock();
        state.deliver(Some(thread), None, &EventKind::ThreadDeath, |k| {
            matches!(k, SubscriptionKind::ThreadDeath)
        })
    }

    pub fn access_field(
        &self,
        field: &FieldInfo,
        object: Option<ObjectId>,
        current: Value,
        thread: &ThreadRef,
    ) -> Vec<TargetEvent> {
        let state = self.state.lock();
        let kind = EventKind::FieldAccess {
            field: field.clone(),
            object,
            location: line_location(field.declaring_type, 1),
            current,
        };
        state.deliver(Some(thread), None, &kind, |k| match k {
            SubscriptionKind::FieldAccess { field: f, instance } => {
                f == field && (instance.is_none() || *instance == object)
            }
            _ => false,
        })
    }

    pub fn modify_field(
        &self,
        field: &FieldInfo,
        object: Option<ObjectId>,
        current: Value,
        new_value: Value,
        thread: &ThreadRef,
    ) -> Vec<TargetEvent> {
        let state = self.state.lock();
        let kind = EventKind::FieldModify {
            field: field.clone(),
            object,
            location: line_location(field.declaring_type, 1),
            current,
            new_value,
        };
        state.deliver(Some(thread), None, &kind, |k| match k {
            SubscriptionKind::FieldModify { field: f, instance } => {
                f == field && (instance.is_none() || *instance == object)
            }
            _ => false,
        })
    }

    pub fn enter_method(&self, class: &str, method: &str, thread: &ThreadRef) -> Vec<TargetEvent> {
        self.method_event(class, method, thread, true)
    }

    pub fn exit_method(&self, class: &str, method: &str, thread: &ThreadRef) -> Vec<TargetEvent> {
        self.method_event(class, method, thread, false)
    }

    fn method_event(
        &self,
        class: &str,
        method: &str,
        thread: &ThreadRef,
        entry: bool,
    ) -> Vec<TargetEvent> {
        let state = self.state.lock();
        let type_id = state.class_named(class).map_or(0, |c| c.info.type_id);
        let location = line_location(type_id, 1);
        let method = format!("{}.{}", class, method);
        let kind = if entry {
            EventKind::MethodEntry { location, method }
        } else {
            EventKind::MethodExit { location, method }
        };
        state.deliver(Some(thread), Some(class), &kind, |k| {
            if entry {
                matches!(k, SubscriptionKind::MethodEntry)
            } else {
                matches!(k, SubscriptionKind::MethodExit)
            }
        })
    }

    pub fn subscription(&self, id: RequestId) -> Option<SubscriptionRequest> {
        self.state.lock().subscriptions.get(&id).cloned()
    }

    pub fn subscriptions(&self) -> Vec<(RequestId, SubscriptionRequest)> {
        self.state
            .lock()
            .subscriptions
            .iter()
            .map(|(id, request)| (*id, request.clone()))
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// (suspend, resume) call counts
    pub fn suspend_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.suspends, state.resumes)
    }

    /// Every later call fails with `Disconnected`
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }
}

impl Target for MockTarget {
    fn classes_by_name(&self, name: &str) -> TargetResult<Vec<TypeInfo>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state
            .classes
            .values()
            .filter(|c| c.info.name == name)
            .map(|c| c.info.clone())
            .collect())
    }

    fn all_classes(&self) -> TargetResult<Vec<TypeInfo>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state.classes.values().map(|c| c.info.clone()).collect())
    }

    fn nested_types(&self, type_id: ReferenceTypeId) -> TargetResult<Vec<TypeInfo>> {
        let state = self.state.lock();
        state.check()?;
        let class = state
            .classes
            .get(&type_id)
            .ok_or_else(|| TargetError::Other(format!("unknown type {}", type_id)))?;
        Ok(class
            .nested
            .iter()
            .filter_map(|id| state.classes.get(id))
            .map(|c| c.info.clone())
            .collect())
    }

    fn suspend(&self) -> TargetResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        state.suspends += 1;
        Ok(())
    }

    fn resume(&self) -> TargetResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        state.resumes += 1;
        Ok(())
    }

    fn has_line_info(&self, type_id: ReferenceTypeId) -> bool {
        self.state
            .lock()
            .classes
            .get(&type_id)
            .is_some_and(|c| c.lines.is_some())
    }

    fn locations_of_line(&self, type_id: ReferenceTypeId, line: u32) -> TargetResult<Vec<Location>> {
        let state = self.state.lock();
        state.check()?;
        let lines = state
            .classes
            .get(&type_id)
            .and_then(|c| c.lines.as_ref())
            .ok_or(TargetError::AbsentInformation)?;
        Ok(lines
            .iter()
            .filter(|l| **l == line)
            .map(|l| line_location(type_id, *l))
            .collect())
    }

    fn methods(&self, type_id: ReferenceTypeId) -> TargetResult<Vec<MethodInfo>> {
        let state = self.state.lock();
        state.check()?;
        Ok(state
            .classes
            .get(&type_id)
            .map(|c| c.methods.clone())
            .unwrap_or_default())
    }

    fn can_use_instance_filters(&self) -> bool {
        !self.state.lock().no_instance_filters
    }

    fn create_subscription(&self, request: &SubscriptionRequest) -> TargetResult<RequestId> {
        let mut state = self.state.lock();
        state.check()?;
        state.last_request_id += 1;
        let id = state.last_request_id;
        state.subscriptions.insert(id, request.clone());
        Ok(id)
    }

    fn set_subscription_enabled(&self, id: RequestId, enabled: bool) -> TargetResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        let request = state
            .subscriptions
            .get_mut(&id)
            .ok_or(TargetError::InvalidRequest(id))?;
        request.enabled = enabled;
        Ok(())
    }

    fn set_subscription_suspend_policy(
        &self,
        id: RequestId,
        policy: SuspendPolicy,
    ) -> TargetResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        let request = state
            .subscriptions
            .get_mut(&id)
            .ok_or(TargetError::InvalidRequest(id))?;
        request.suspend_policy = policy;
        Ok(())
    }

    fn delete_subscription(&self, id: RequestId) -> TargetResult<()> {
        let mut state = self.state.lock();
        state.check()?;
        state
            .subscriptions
            .remove(&id)
            .map(|_| ())
            .ok_or(TargetError::InvalidRequest(id))
    }
}

/// Evaluator answering from a table of scripted results
#[derive(Debug, Default)]
pub struct MockEvaluator {
    values: Mutex<HashMap<String, Result<Value, String>>>,
    fields: Mutex<HashMap<String, FieldInfo>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, expression: &str, value: Value) -> Self {
        self.set_value(expression, value);
        self
    }

    pub fn with_error(self, expression: &str, message: &str) -> Self {
        self.values
            .lock()
            .insert(expression.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_field(self, name: &str, field: FieldInfo) -> Self {
        self.fields.lock().insert(name.to_string(), field);
        self
    }

    /// Change a result between hits
    pub fn set_value(&self, expression: &str, value: Value) {
        self.values.lock().insert(expression.to_string(), Ok(value));
    }
}

impl Evaluator for MockEvaluator {
    fn evaluate(&self, expression: &str, _frame: &FrameContext) -> Result<Value, EvalError> {
        match self.values.lock().get(expression) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(EvalError(message.clone())),
            None => Err(EvalError(format!("cannot evaluate {}", expression))),
        }
    }

    fn locate_field(&self, name: &str, _frame: &FrameContext) -> Result<FieldInfo, EvalError> {
        self.fields
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError(format!("no field {}", name)))
    }
}

/// Interpreter recording every command it is asked to run
#[derive(Debug, Default)]
pub struct MockInterpreter {
    executed: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever this command is executed
    pub fn failing_on(command: &str) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail_on: Some(command.to_string()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

impl CommandInterpreter for MockInterpreter {
    fn execute(&self, command: &str, _frame: Option<&FrameContext>) -> Result<(), MonitorError> {
        self.executed.lock().push(command.to_string());
        if self.fail_on.as_deref() == Some(command) {
            return Err(MonitorError(format!("{} failed", command)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Owner;

    fn main_thread() -> ThreadRef {
        ThreadRef {
            id: 1,
            name: "main".into(),
        }
    }

    #[test]
    fn test_nested_types_registered() {
        let target = MockTarget::new();
        let outer = target.install(
            MockClass::new("com.Foo").with_nested(MockClass::new("com.Foo$Inner")),
        );
        let nested = target.nested_types(outer).unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].name, "com.Foo$Inner");
        assert_eq!(target.classes_by_name("com.Foo$Inner").unwrap().len(), 1);
    }

    #[test]
    fn test_only_enabled_subscriptions_deliver() {
        let target = MockTarget::new();
        target.install(MockClass::new("com.Foo").with_lines(&[10]));
        let type_id = target.type_id("com.Foo").unwrap();
        let request = SubscriptionRequest::new(
            SubscriptionKind::Breakpoint {
                location: line_location(type_id, 10),
            },
            Owner::Breakpoint(1),
        );
        let id = target.create_subscription(&request).unwrap();
        assert_eq!(target.hit_line("com.Foo", 10, &main_thread()).len(), 1);
        assert!(target.hit_line("com.Foo", 11, &main_thread()).is_empty());

        target.set_subscription_enabled(id, false).unwrap();
        assert!(target.hit_line("com.Foo", 10, &main_thread()).is_empty());
    }

    #[test]
    fn test_missing_line_info() {
        let target = MockTarget::new();
        let id = target.install(MockClass::new("com.Foo").without_line_info());
        assert!(!target.has_line_info(id));
        assert_eq!(
            target.locations_of_line(id, 3),
            Err(TargetError::AbsentInformation)
        );
    }

    #[test]
    fn test_disconnect() {
        let target = MockTarget::new();
        target.disconnect();
        assert!(target.all_classes().unwrap_err().is_disconnect());
        assert!(target.delete_subscription(1).unwrap_err().is_disconnect());
    }
}
