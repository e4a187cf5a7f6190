// Persisted breakpoint tree
//
// The group tree is written as nested JSON nodes. Breakpoint, condition and
// monitor nodes carry a "type" tag and are decoded one at a time, so a single
// bad node is dropped with a warning instead of failing the whole load.

use crate::breakpoint::{Breakpoint, BreakpointKind};
use crate::condition::Condition;
use crate::monitor::Monitor;
use crate::target::SuspendPolicy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub expanded: bool,
    #[serde(default)]
    pub breakpoints: Vec<Value>,
    #[serde(default)]
    pub groups: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(flatten)]
    pub kind: BreakpointKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub suspend_policy: SuspendPolicy,
    #[serde(default)]
    pub stopped_count: u32,
    #[serde(default)]
    pub expire_count: u32,
    #[serde(default)]
    pub skip_count: u32,
    #[serde(default)]
    pub delete_on_expire: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_filters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_filters: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Value>,
    #[serde(default)]
    pub monitors: Vec<Value>,
}

impl BreakpointRecord {
    pub fn from_breakpoint(bp: &Breakpoint) -> serde_json::Result<Self> {
        Ok(Self {
            number: Some(bp.number()),
            kind: bp.kind().clone(),
            enabled: bp.is_enabled_flag(),
            suspend_policy: bp.suspend_policy(),
            stopped_count: bp.stopped_count(),
            expire_count: bp.expire_count(),
            skip_count: bp.skip_count(),
            delete_on_expire: bp.delete_on_expire(),
            class_filters: bp.class_filters().map(String::from),
            thread_filters: bp.thread_filters().map(String::from),
            conditions: bp
                .conditions()
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?,
            monitors: bp
                .monitors()
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Build the breakpoint. Undecodable conditions and monitors are
    /// skipped and described in `warnings`.
    pub fn into_breakpoint(self, warnings: &mut Vec<String>) -> Breakpoint {
        let mut bp = Breakpoint::new(self.kind);
        bp.set_enabled(self.enabled, None);
        bp.set_suspend_policy(self.suspend_policy, None);
        bp.set_stopped_count(self.stopped_count);
        bp.set_expire_count(self.expire_count);
        bp.set_skip_count(self.skip_count);
        bp.set_delete_on_expire(self.delete_on_expire);
        bp.set_class_filters(self.class_filters);
        bp.set_thread_filters(self.thread_filters);
        for condition in decode_all::<Condition>(self.conditions, "condition", warnings) {
            bp.add_condition(condition);
        }
        for monitor in decode_all::<Monitor>(self.monitors, "monitor", warnings) {
            bp.add_monitor(monitor);
        }
        bp
    }
}

/// Decode one node, recording a warning on failure
pub fn decode<T: DeserializeOwned>(
    value: Value,
    what: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warnings.push(format!("Skipping unreadable {}: {}", what, e));
            None
        }
    }
}

fn decode_all<T: DeserializeOwned>(
    values: Vec<Value>,
    what: &str,
    warnings: &mut Vec<String>,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| decode(value, what, warnings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::ReferenceTypeSpec;
    use serde_json::json;

    #[test]
    fn test_breakpoint_node_layout() {
        let mut bp = Breakpoint::line(ReferenceTypeSpec::new("com.Foo").unwrap(), 42);
        bp.set_skip_count(3);
        bp.set_stopped_count(2);
        bp.add_condition(Condition::expr("i == 2"));
        let value = serde_json::to_value(BreakpointRecord::from_breakpoint(&bp).unwrap()).unwrap();
        assert_eq!(value["type"], "Line");
        assert_eq!(value["pattern"], "com.Foo");
        assert_eq!(value["line"], 42);
        assert_eq!(value["skip_count"], 3);
        assert_eq!(value["stopped_count"], 2);
        assert_eq!(value["conditions"][0]["type"], "Expr");
    }

    #[test]
    fn test_bad_condition_is_skipped() {
        let node = json!({
            "type": "Thread",
            "on_start": true,
            "on_death": false,
            "conditions": [
                {"type": "Bogus"},
                {"type": "Value", "variable": "n", "value": "1"}
            ],
            "monitors": [{"type": "Log"}]
        });
        let record: BreakpointRecord = serde_json::from_value(node).unwrap();
        let mut warnings = Vec::new();
        let bp = record.into_breakpoint(&mut warnings);
        assert_eq!(bp.conditions().len(), 1);
        assert!(bp.monitors().is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(bp.is_enabled_flag());
        assert_eq!(bp.stopped_count(), 0);
    }

    #[test]
    fn test_bad_breakpoint_node_reports() {
        let mut warnings = Vec::new();
        let decoded: Option<BreakpointRecord> =
            decode(json!({"type": "Line", "pattern": "a..b", "line": 1}), "breakpoint", &mut warnings);
        assert!(decoded.is_none());
        assert_eq!(warnings.len(), 1);
    }
}
