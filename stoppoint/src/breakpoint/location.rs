// Location breakpoints
//
// Line and method breakpoints resolve a class pattern plus a member to a
// concrete code location in each matching loaded class.

use crate::error::{ResolveError, TargetError};
use crate::pattern::{simple_name, ReferenceTypeSpec};
use crate::target::Target;
use crate::types::{Location, MethodInfo, TypeInfo, TypeKind};
use serde::{Deserialize, Serialize};

/// Stop at a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBreakpoint {
    pub pattern: ReferenceTypeSpec,
    pub line: u32,
}

/// Stop on entry to a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBreakpoint {
    pub pattern: ReferenceTypeSpec,
    pub method: String,
    /// None matches any overload, as long as there is only one
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

impl LineBreakpoint {
    pub fn new(pattern: ReferenceTypeSpec, line: u32) -> Self {
        Self { pattern, line }
    }

    pub(crate) fn resolve_type(
        &self,
        target: &dyn Target,
        ty: &TypeInfo,
    ) -> Result<Location, ResolveError> {
        require_line_info(target, ty)?;
        let locations = target
            .locations_of_line(ty.type_id, self.line)
            .map_err(|e| match e {
                TargetError::AbsentInformation => ResolveError::AbsentLineInfo(ty.name.clone()),
                other => other.into(),
            })?;
        // The first location for a line is the one the compiler emits first
        locations
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::LineNotFound {
                class: ty.name.clone(),
                line: self.line,
            })
    }
}

impl MethodBreakpoint {
    pub fn new(pattern: ReferenceTypeSpec, method: impl Into<String>, args: Option<Vec<String>>) -> Self {
        Self {
            pattern,
            method: method.into(),
            args,
        }
    }

    /// `name(arg, ...)` as shown to the user
    pub fn signature(&self) -> String {
        match &self.args {
            Some(args) => format!("{}({})", self.method, args.join(", ")),
            None => self.method.clone(),
        }
    }

    pub(crate) fn resolve_type(
        &self,
        target: &dyn Target,
        ty: &TypeInfo,
    ) -> Result<Location, ResolveError> {
        require_line_info(target, ty)?;
        let methods = target.methods(ty.type_id)?;
        let method = find_method(&methods, &ty.name, &self.method, self.args.as_deref())?;
        method
            .location
            .clone()
            .ok_or_else(|| ResolveError::AbsentLineInfo(format!("{}.{}", ty.name, method.name)))
    }
}

fn require_line_info(target: &dyn Target, ty: &TypeInfo) -> Result<(), ResolveError> {
    if ty.kind != TypeKind::Class {
        return Err(ResolveError::InvalidTypeKind(ty.name.clone()));
    }
    if !target.has_line_info(ty.type_id) {
        return Err(ResolveError::AbsentLineInfo(ty.name.clone()));
    }
    Ok(())
}

/// Pick the method a breakpoint refers to.
///
/// With an argument list the match must be exact (modulo boxing and
/// unqualified `java.lang` names). Without one, the name alone must be
/// unambiguous.
pub(crate) fn find_method<'a>(
    methods: &'a [MethodInfo],
    class: &str,
    name: &str,
    args: Option<&[String]>,
) -> Result<&'a MethodInfo, ResolveError> {
    let mut candidates = methods.iter().filter(|m| m.name == name);
    match args {
        Some(args) => candidates
            .find(|m| {
                m.argument_type_names.len() == args.len()
                    && m
                        .argument_type_names
                        .iter()
                        .zip(args)
                        .all(|(actual, wanted)| argument_matches(actual, wanted))
            })
            .ok_or_else(|| ResolveError::NoSuchMethod {
                class: class.to_string(),
                method: format!("{}({})", name, args.join(", ")),
            }),
        None => {
            let first = candidates.next().ok_or_else(|| ResolveError::NoSuchMethod {
                class: class.to_string(),
                method: name.to_string(),
            })?;
            if candidates.next().is_some() {
                return Err(ResolveError::AmbiguousMethod {
                    class: class.to_string(),
                    method: name.to_string(),
                });
            }
            Ok(first)
        }
    }
}

fn argument_matches(actual: &str, wanted: &str) -> bool {
    if actual == wanted {
        return true;
    }
    if boxed(actual) == Some(wanted) || boxed(wanted) == Some(actual) {
        return true;
    }
    // "String" for "java.lang.String"
    !wanted.contains('.') && simple_name(actual) == wanted
}

fn boxed(primitive: &str) -> Option<&'static str> {
    Some(match primitive {
        "boolean" => "java.lang.Boolean",
        "byte" => "java.lang.Byte",
        "char" => "java.lang.Character",
        "short" => "java.lang.Short",
        "int" => "java.lang.Integer",
        "long" => "java.lang.Long",
        "float" => "java.lang.Float",
        "double" => "java.lang.Double",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(id: u64, name: &str, args: &[&str]) -> MethodInfo {
        MethodInfo {
            method_id: id,
            name: name.to_string(),
            argument_type_names: args.iter().map(|s| s.to_string()).collect(),
            location: Some(Location {
                type_id: 1,
                method_id: id,
                index: 0,
                line: Some(10 + id as u32),
            }),
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unique_name_needs_no_arguments() {
        let methods = vec![method(1, "run", &[]), method(2, "stop", &["int"])];
        let found = find_method(&methods, "Foo", "stop", None).unwrap();
        assert_eq!(found.method_id, 2);
    }

    #[test]
    fn test_overloads_require_arguments() {
        let methods = vec![method(1, "put", &["int"]), method(2, "put", &["java.lang.String"])];
        assert!(matches!(
            find_method(&methods, "Foo", "put", None),
            Err(ResolveError::AmbiguousMethod { .. })
        ));
        let found = find_method(&methods, "Foo", "put", Some(&args(&["String"]))).unwrap();
        assert_eq!(found.method_id, 2);
    }

    #[test]
    fn test_boxing_equivalence() {
        let methods = vec![method(1, "put", &["int"])];
        let found = find_method(&methods, "Foo", "put", Some(&args(&["java.lang.Integer"]))).unwrap();
        assert_eq!(found.method_id, 1);
        assert!(find_method(&methods, "Foo", "put", Some(&args(&["long"]))).is_err());
    }

    #[test]
    fn test_missing_method() {
        let methods = vec![method(1, "run", &[])];
        assert!(matches!(
            find_method(&methods, "Foo", "walk", None),
            Err(ResolveError::NoSuchMethod { .. })
        ));
        assert!(find_method(&methods, "Foo", "run", Some(&args(&["int"]))).is_err());
    }

    #[test]
    fn test_signature() {
        let spec = ReferenceTypeSpec::new("com.Foo").unwrap();
        let bp = MethodBreakpoint::new(spec.clone(), "bar", Some(args(&["int", "long"])));
        assert_eq!(bp.signature(), "bar(int, long)");
        assert_eq!(MethodBreakpoint::new(spec, "bar", None).signature(), "bar");
    }
}
