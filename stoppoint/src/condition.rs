// Breakpoint conditions
//
// A condition is evaluated against the suspended thread when a breakpoint is
// hit; the breakpoint only stops if every condition holds.

use crate::error::EvalError;
use crate::events::TargetEvent;
use crate::types::{FieldInfo, FrameContext, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression evaluator collaborator
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, frame: &FrameContext) -> Result<Value, EvalError>;

    /// Resolve a (possibly qualified) field name visible from the frame
    fn locate_field(&self, name: &str, frame: &FrameContext) -> Result<FieldInfo, EvalError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    /// Boolean expression
    Expr { expression: String },
    /// Variable compared against a literal
    Value { variable: String, value: String },
}

impl Condition {
    pub fn expr(expression: impl Into<String>) -> Self {
        Condition::Expr {
            expression: expression.into(),
        }
    }

    /// Parse `name = literal` (the first unescaped `=` splits)
    pub fn value_from_str(text: &str) -> Result<Self, EvalError> {
        let idx = index_of_unescaped(text, '=')
            .filter(|idx| *idx > 0)
            .ok_or_else(|| EvalError("missing = separator".to_string()))?;
        Ok(Condition::Value {
            variable: text[..idx].trim().to_string(),
            value: text[idx + 1..].trim().to_string(),
        })
    }

    /// Events without a thread at a code location can never satisfy a
    /// condition.
    pub fn is_satisfied(
        &self,
        event: &TargetEvent,
        evaluator: &dyn Evaluator,
    ) -> Result<bool, EvalError> {
        let Some(frame) = event.frame_context() else {
            return Ok(false);
        };
        match self {
            Condition::Expr { expression } => match evaluator.evaluate(expression, &frame)? {
                Value::Boolean(b) => Ok(b),
                other => Err(EvalError(format!(
                    "condition did not evaluate to a boolean: {}",
                    other
                ))),
            },
            Condition::Value { variable, value } => {
                let actual = evaluator.evaluate(variable, &frame)?;
                value_matches(&actual, value)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Expr { expression } => write!(f, "ExprCondition=[{}]", expression),
            Condition::Value { variable, value } => {
                write!(f, "ValueCondition=[{} = {}]", variable, value)
            }
        }
    }
}

fn value_matches(actual: &Value, literal: &str) -> Result<bool, EvalError> {
    let bad = |e: &dyn fmt::Display| EvalError(format!("cannot compare with '{}': {}", literal, e));
    Ok(match actual {
        Value::Null => literal == "null",
        Value::Void => false,
        Value::Boolean(b) => literal.eq_ignore_ascii_case("true") == *b,
        Value::Byte(v) => literal.parse::<i8>().map_err(|e| bad(&e))? == *v,
        Value::Short(v) => literal.parse::<i16>().map_err(|e| bad(&e))? == *v,
        Value::Int(v) => literal.parse::<i32>().map_err(|e| bad(&e))? == *v,
        Value::Long(v) => literal.parse::<i64>().map_err(|e| bad(&e))? == *v,
        Value::Float(v) => literal.parse::<f32>().map_err(|e| bad(&e))? == *v,
        Value::Double(v) => literal.parse::<f64>().map_err(|e| bad(&e))? == *v,
        Value::Char(c) => literal.chars().next() == Some(*c),
        Value::String(s) => literal == s,
        Value::Object { type_name, .. } => {
            return Err(EvalError(format!("type is not supported: {}", type_name)))
        }
    })
}

fn index_of_unescaped(text: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return Some(idx);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::types::{Location, ThreadRef};

    struct FixedEvaluator(Result<Value, EvalError>);

    impl Evaluator for FixedEvaluator {
        fn evaluate(&self, _: &str, _: &FrameContext) -> Result<Value, EvalError> {
            self.0.clone()
        }

        fn locate_field(&self, name: &str, _: &FrameContext) -> Result<FieldInfo, EvalError> {
            Err(EvalError(format!("no field {}", name)))
        }
    }

    fn hit(thread: bool) -> TargetEvent {
        TargetEvent {
            request_id: 1,
            owner: None,
            thread: thread.then(|| ThreadRef {
                id: 1,
                name: "main".into(),
            }),
            kind: EventKind::Breakpoint {
                location: Location {
                    type_id: 1,
                    method_id: 1,
                    index: 0,
                    line: Some(10),
                },
            },
        }
    }

    #[test]
    fn test_expr_condition() {
        let cond = Condition::expr("x > 3");
        let yes = FixedEvaluator(Ok(Value::Boolean(true)));
        let no = FixedEvaluator(Ok(Value::Boolean(false)));
        let weird = FixedEvaluator(Ok(Value::Int(1)));
        assert!(cond.is_satisfied(&hit(true), &yes).unwrap());
        assert!(!cond.is_satisfied(&hit(true), &no).unwrap());
        assert!(cond.is_satisfied(&hit(true), &weird).is_err());
    }

    #[test]
    fn test_threadless_event_never_satisfies() {
        let cond = Condition::expr("true");
        let yes = FixedEvaluator(Ok(Value::Boolean(true)));
        assert!(!cond.is_satisfied(&hit(false), &yes).unwrap());
    }

    #[test]
    fn test_value_condition_literals() {
        assert!(value_matches(&Value::Int(5), "5").unwrap());
        assert!(!value_matches(&Value::Int(5), "6").unwrap());
        assert!(value_matches(&Value::Int(5), "five").is_err());
        assert!(value_matches(&Value::Null, "null").unwrap());
        assert!(value_matches(&Value::Boolean(true), "TRUE").unwrap());
        assert!(value_matches(&Value::Char('q'), "q").unwrap());
        assert!(value_matches(&Value::String("abc".into()), "abc").unwrap());
        assert!(!value_matches(&Value::Void, "anything").unwrap());
        assert!(value_matches(
            &Value::Object {
                id: 1,
                type_name: "Foo".into()
            },
            "x"
        )
        .is_err());
    }

    #[test]
    fn test_value_condition_parse() {
        assert_eq!(
            Condition::value_from_str("count = 3").unwrap(),
            Condition::Value {
                variable: "count".into(),
                value: "3".into()
            }
        );
        assert_eq!(
            Condition::value_from_str(r"s\=t = u").unwrap(),
            Condition::Value {
                variable: r"s\=t".into(),
                value: "u".into()
            }
        );
        assert!(Condition::value_from_str("=3").is_err());
        assert!(Condition::value_from_str("count").is_err());
    }
}
