//! Pre-rendered route path patterns.
//!
//! # Syntax
//! ```text
//! /api/users            literal segments (matched case-insensitively)
//! /api/users/{id}       a parameter captures exactly one segment
//! /static/{**path}      a trailing catch-all captures the rest (may be empty)
//! ```
//!
//! # Design Decisions
//! - Only pattern strings are accepted; there is no AST input
//! - No regex: matching is a single left-to-right segment walk
//! - A trailing slash on the request path is ignored

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Pattern substituted for routes configured without a path.
pub const CATCH_ALL_PATTERN: &str = "/{**catch-all}";

/// Values captured by parameters while matching a path.
pub type RouteValues = BTreeMap<String, String>;

/// Errors produced while parsing a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern '{pattern}' has an unbalanced brace in segment '{segment}'")]
    UnbalancedBrace { pattern: String, segment: String },

    #[error("pattern '{0}' has a parameter without a name")]
    EmptyParameterName(String),

    #[error("pattern '{0}' has a catch-all parameter that is not the last segment")]
    CatchAllNotLast(String),

    #[error("pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParameter { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter(String),
    CatchAll(String),
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern string. An empty string yields the catch-all pattern.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Ok(Self::catch_all());
        }
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let segment = parse_segment(raw, part)?;
            if let Segment::CatchAll(_) = segment {
                if index + 1 != parts.len() {
                    return Err(PatternError::CatchAllNotLast(raw.to_string()));
                }
            }
            if let Segment::Parameter(name) | Segment::CatchAll(name) = &segment {
                let duplicate = segments.iter().any(|s| {
                    matches!(s, Segment::Parameter(n) | Segment::CatchAll(n) if n.eq_ignore_ascii_case(name))
                });
                if duplicate {
                    return Err(PatternError::DuplicateParameter {
                        pattern: raw.to_string(),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The catch-all pattern matching every path.
    pub fn catch_all() -> Self {
        Self {
            raw: CATCH_ALL_PATTERN.to_string(),
            segments: vec![Segment::CatchAll("catch-all".to_string())],
        }
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if this pattern matches any path.
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::CatchAll(_)])
    }

    /// Match a request path, returning the captured values on success.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let mut values = RouteValues::new();
        let mut remaining = path.trim_start_matches('/');

        for segment in &self.segments {
            match segment {
                Segment::CatchAll(name) => {
                    values.insert(name.clone(), remaining.trim_end_matches('/').to_string());
                    return Some(values);
                }
                Segment::Literal(literal) => {
                    let (head, tail) = split_first(remaining)?;
                    if !head.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                    remaining = tail;
                }
                Segment::Parameter(name) => {
                    let (head, tail) = split_first(remaining)?;
                    values.insert(name.clone(), head.to_string());
                    remaining = tail;
                }
            }
        }

        remaining.is_empty().then_some(values)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split off the first non-empty segment. Returns None once the path is exhausted.
fn split_first(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    let (head, tail) = match path.find('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (path, ""),
    };
    if head.is_empty() {
        return None;
    }
    Some((head, tail))
}

fn parse_segment(pattern: &str, part: &str) -> Result<Segment, PatternError> {
    let opens = part.matches('{').count();
    let closes = part.matches('}').count();

    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(part.to_string()));
    }
    if opens != 1 || closes != 1 || !part.starts_with('{') || !part.ends_with('}') {
        return Err(PatternError::UnbalancedBrace {
            pattern: pattern.to_string(),
            segment: part.to_string(),
        });
    }

    let inner = &part[1..part.len() - 1];
    let (catch_all, name) = match inner.strip_prefix("**") {
        Some(name) => (true, name),
        None => match inner.strip_prefix('*') {
            Some(name) => (true, name),
            None => (false, inner),
        },
    };

    if name.is_empty() {
        return Err(PatternError::EmptyParameterName(pattern.to_string()));
    }

    Ok(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Parameter(name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_catch_all() {
        let pattern = RoutePattern::parse("").unwrap();
        assert!(pattern.is_catch_all());
        assert_eq!(pattern.as_str(), CATCH_ALL_PATTERN);

        for path in ["/", "", "/a", "/a/b/c", "/images/logo.png"] {
            assert!(pattern.match_path(path).is_some(), "catch-all should match {path}");
        }
    }

    #[test]
    fn test_literal_match() {
        let pattern = RoutePattern::parse("/api/users").unwrap();
        assert!(pattern.match_path("/api/users").is_some());
        assert!(pattern.match_path("/API/Users/").is_some());
        assert!(pattern.match_path("/api").is_none());
        assert!(pattern.match_path("/api/users/1").is_none());
    }

    #[test]
    fn test_parameter_capture() {
        let pattern = RoutePattern::parse("/api/users/{id}/orders/{orderId}").unwrap();
        let values = pattern.match_path("/api/users/42/orders/7").unwrap();
        assert_eq!(values.get("id").map(String::as_str), Some("42"));
        assert_eq!(values.get("orderId").map(String::as_str), Some("7"));

        assert!(pattern.match_path("/api/users//orders/7").is_none());
    }

    #[test]
    fn test_catch_all_suffix() {
        let pattern = RoutePattern::parse("/static/{**path}").unwrap();
        let values = pattern.match_path("/static/css/site.css").unwrap();
        assert_eq!(values.get("path").map(String::as_str), Some("css/site.css"));

        let values = pattern.match_path("/static").unwrap();
        assert_eq!(values.get("path").map(String::as_str), Some(""));

        assert!(pattern.match_path("/other/site.css").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RoutePattern::parse("api"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/api/{id"),
            Err(PatternError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/api/{}"),
            Err(PatternError::EmptyParameterName(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{**rest}/tail"),
            Err(PatternError::CatchAllNotLast(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{id}/{ID}"),
            Err(PatternError::DuplicateParameter { .. })
        ));
    }
}
