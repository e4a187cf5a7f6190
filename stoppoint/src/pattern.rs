// Class-name patterns
//
// A pattern is an exact fully-qualified name, or a name with a single
// leading or trailing `*`. Validation is eager: a malformed pattern would
// otherwise wait forever for a class that can never load.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

const WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceTypeSpec {
    pattern: String,
    stem: String,
    pre_wild: bool,
    post_wild: bool,
}

impl ReferenceTypeSpec {
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        let pattern = pattern.trim();
        let pre_wild = pattern.starts_with(WILDCARD);
        let post_wild = !pre_wild && pattern.ends_with(WILDCARD);
        let stem = if pre_wild {
            &pattern[1..]
        } else if post_wild {
            &pattern[..pattern.len() - 1]
        } else {
            pattern
        };

        if stem.contains(WILDCARD) {
            return Err(ParseError::InvalidPattern {
                pattern: pattern.to_string(),
                part: stem.to_string(),
            });
        }
        if stem.is_empty() && !pre_wild {
            return Err(ParseError::InvalidPattern {
                pattern: pattern.to_string(),
                part: String::new(),
            });
        }

        let segments: Vec<&str> = stem.split('.').collect();
        let last = segments.len() - 1;
        for (idx, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                // "*.Foo" and "com.example.*" leave an empty end segment
                if (pre_wild && idx == 0) || (post_wild && idx == last) {
                    continue;
                }
            }
            if !is_identifier(segment) {
                return Err(ParseError::InvalidPattern {
                    pattern: pattern.to_string(),
                    part: segment.to_string(),
                });
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            stem: stem.to_string(),
            pre_wild,
            post_wild,
        })
    }

    /// The pattern as written, wildcard included
    pub fn identifier(&self) -> &str {
        &self.pattern
    }

    /// True when the pattern names exactly one type, allowing a direct lookup
    pub fn is_exact(&self) -> bool {
        !self.pre_wild && !self.post_wild
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.pre_wild {
            name.ends_with(&self.stem)
        } else if self.post_wild {
            name.starts_with(&self.stem)
        } else {
            name == self.stem
        }
    }
}

impl fmt::Display for ReferenceTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl TryFrom<String> for ReferenceTypeSpec {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ReferenceTypeSpec> for String {
    fn from(spec: ReferenceTypeSpec) -> Self {
        spec.pattern
    }
}

/// Java identifier check; `$` covers synthetic and nested class names
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Last dot-separated component of a qualified name
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Split a comma-separated filter list, dropping blanks
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
