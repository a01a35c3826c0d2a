//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile a configured path (`/api/users/:id`) into segments
//! - Match a request path segment by segment, binding `:name` segments
//!
//! # Design Decisions
//! - Exact segment count: no wildcards, no prefix matching
//! - Literal segments are case-sensitive
//! - Empty segments are ignored, so a trailing slash does not matter
//! - Bound values are percent-decoded

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled endpoint path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Shape used to detect duplicate registrations: parameter names do not
    /// change which requests a pattern accepts.
    pub(crate) fn shape(&self) -> Vec<Option<&str>> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => Some(lit.as_str()),
                Segment::Param(_) => None,
            })
            .collect()
    }

    /// Match a request path, returning the bound parameters.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut parts = split(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), percent_decode(part));
                }
            }
        }

        // Must consume entire path
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Decode `%XX` escapes. Invalid escapes are kept as-is; `+` is not a space
/// in a path.
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = PathPattern::parse("/api/test");
        assert_eq!(pattern.matches("/api/test"), Some(HashMap::new()));
        assert!(pattern.matches("/api/test/").is_some());
        assert!(pattern.matches("/api/Test").is_none());
        assert!(pattern.matches("/api").is_none());
        assert!(pattern.matches("/api/test/extra").is_none());
    }

    #[test]
    fn test_param_binding() {
        let pattern = PathPattern::parse("/api/users/:id/posts/:postId");
        let params = pattern.matches("/api/users/123/posts/abc").unwrap();
        assert_eq!(params["id"], "123");
        assert_eq!(params["postId"], "abc");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_param_is_percent_decoded() {
        let pattern = PathPattern::parse("/files/:name");
        let params = pattern.matches("/files/hello%20world%2Btxt").unwrap();
        assert_eq!(params["name"], "hello world+txt");

        let params = pattern.matches("/files/100%").unwrap();
        assert_eq!(params["name"], "100%");
    }

    #[test]
    fn test_root_path() {
        let pattern = PathPattern::parse("/");
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_shape_ignores_param_names() {
        assert_eq!(
            PathPattern::parse("/users/:id").shape(),
            PathPattern::parse("/users/:userId/").shape()
        );
        assert_ne!(
            PathPattern::parse("/users/:id").shape(),
            PathPattern::parse("/users/me").shape()
        );
    }
}
