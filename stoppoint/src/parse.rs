// Location specification parser
//
// Accepted forms:
//   Class:line
//   line                   (in the current type)
//   Class.method
//   Class.method(arg, ...)
//   method / method(...)   (in the current type)

use crate::breakpoint::{Breakpoint, BreakpointKind, LineBreakpoint, MethodBreakpoint};
use crate::error::ParseError;
use crate::pattern::{is_identifier, ReferenceTypeSpec};

/// Parsed location breakpoint, ready to hand to the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSpec {
    Line(LineBreakpoint),
    Method(MethodBreakpoint),
}

impl LocationSpec {
    pub fn into_breakpoint(self) -> Breakpoint {
        match self {
            LocationSpec::Line(bp) => Breakpoint::new(BreakpointKind::Line(bp)),
            LocationSpec::Method(bp) => Breakpoint::new(BreakpointKind::Method(bp)),
        }
    }
}

pub fn parse_location_spec(
    text: &str,
    current_type: Option<&str>,
) -> Result<LocationSpec, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some((class, line)) = text.split_once(':') {
        let class = class.trim();
        if class.is_empty() {
            return Err(ParseError::MissingClass);
        }
        return Ok(LocationSpec::Line(LineBreakpoint::new(
            ReferenceTypeSpec::new(class)?,
            parse_line(line)?,
        )));
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        let class = current_type.ok_or(ParseError::MissingClass)?;
        return Ok(LocationSpec::Line(LineBreakpoint::new(
            ReferenceTypeSpec::new(class)?,
            parse_line(text)?,
        )));
    }

    let (member, args) = match text.find('(') {
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| ParseError::MalformedMember(text.to_string()))?;
            (&text[..open], Some(parse_args(inner)?))
        }
        None => (text, None),
    };

    let (class, method) = match member.rfind('.') {
        Some(dot) => (&member[..dot], &member[dot + 1..]),
        None => (current_type.ok_or(ParseError::MissingClass)?, member),
    };
    let method = method.trim();
    if !is_method_name(method) {
        return Err(ParseError::MalformedMember(method.to_string()));
    }
    Ok(LocationSpec::Method(MethodBreakpoint::new(
        ReferenceTypeSpec::new(class)?,
        method,
        args,
    )))
}

fn parse_line(text: &str) -> Result<u32, ParseError> {
    let text = text.trim();
    match text.parse::<u32>() {
        Ok(line) if line > 0 => Ok(line),
        _ => Err(ParseError::InvalidLine(text.to_string())),
    }
}

fn is_method_name(name: &str) -> bool {
    name == "<init>" || name == "<clinit>" || is_identifier(name)
}

fn parse_args(inner: &str) -> Result<Vec<String>, ParseError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|arg| {
            let arg = arg.trim();
            if is_type_name(arg) {
                Ok(arg.to_string())
            } else {
                Err(ParseError::InvalidArgument(arg.to_string()))
            }
        })
        .collect()
}

/// `int`, `java.lang.String`, `byte[][]`
fn is_type_name(name: &str) -> bool {
    let mut base = name;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
    }
    !base.is_empty() && base.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(spec: &LocationSpec) -> (String, u32) {
        match spec {
            LocationSpec::Line(bp) => (bp.pattern.to_string(), bp.line),
            other => panic!("expected line, got {:?}", other),
        }
    }

    fn method(spec: &LocationSpec) -> (String, String, Option<Vec<String>>) {
        match spec {
            LocationSpec::Method(bp) => (bp.pattern.to_string(), bp.method.clone(), bp.args.clone()),
            other => panic!("expected method, got {:?}", other),
        }
    }

    #[test]
    fn test_class_and_line() {
        let spec = parse_location_spec("com.example.Foo:42", None).unwrap();
        assert_eq!(line(&spec), ("com.example.Foo".to_string(), 42));
        let spec = parse_location_spec("*.Foo : 7", None).unwrap();
        assert_eq!(line(&spec), ("*.Foo".to_string(), 7));
    }

    #[test]
    fn test_bare_line_uses_current_type() {
        let spec = parse_location_spec("12", Some("com.Bar")).unwrap();
        assert_eq!(line(&spec), ("com.Bar".to_string(), 12));
        assert_eq!(parse_location_spec("12", None), Err(ParseError::MissingClass));
    }

    #[test]
    fn test_methods() {
        let spec = parse_location_spec("com.Foo.bar", None).unwrap();
        assert_eq!(method(&spec), ("com.Foo".into(), "bar".into(), None));

        let spec = parse_location_spec("com.Foo.bar(int, java.lang.String[])", None).unwrap();
        assert_eq!(
            method(&spec).2,
            Some(vec!["int".to_string(), "java.lang.String[]".to_string()])
        );

        let spec = parse_location_spec("run()", Some("com.Foo")).unwrap();
        assert_eq!(method(&spec), ("com.Foo".into(), "run".into(), Some(vec![])));

        let spec = parse_location_spec("com.Foo.<init>", None).unwrap();
        assert_eq!(method(&spec).1, "<init>");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_location_spec("  ", None), Err(ParseError::Empty));
        assert!(matches!(
            parse_location_spec("com.Foo:abc", None),
            Err(ParseError::InvalidLine(_))
        ));
        assert!(matches!(
            parse_location_spec("com.Foo:0", None),
            Err(ParseError::InvalidLine(_))
        ));
        assert!(matches!(
            parse_location_spec(":5", None),
            Err(ParseError::MissingClass)
        ));
        assert!(matches!(
            parse_location_spec("com.Foo.1bar", None),
            Err(ParseError::MalformedMember(_))
        ));
        assert!(matches!(
            parse_location_spec("com.Foo.bar(int", None),
            Err(ParseError::MalformedMember(_))
        ));
        assert!(matches!(
            parse_location_spec("com.Foo.bar(in t)", None),
            Err(ParseError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_location_spec("com..Foo:3", None),
            Err(ParseError::InvalidPattern { .. })
        ));
    }
}
