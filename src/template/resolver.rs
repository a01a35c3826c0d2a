//! Placeholder resolution over structured response templates.
//!
//! # Responsibilities
//! - Walk a template value (strings, arrays, objects) and replace `{{expr}}`
//! - Resolve `now`, `random.number` and dotted context paths
//!
//! # Design Decisions
//! - Total: an expression that cannot be resolved leaves its placeholder
//!   text in place, it never errors or substitutes an empty string
//! - A string that is exactly one placeholder keeps the resolved value's
//!   JSON type; embedded placeholders are stringified
//! - "Absent" is a distinct outcome from a present `null`

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::template::context::TemplateContext;

/// Upper bound (inclusive) of `{{random.number}}`.
pub const RANDOM_NUMBER_MAX: u64 = 1_000_000;

/// Outcome of resolving a single expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The expression named a value, possibly `null`.
    Resolved(Value),
    /// The expression named nothing in the context.
    Unresolved,
}

/// Resolves placeholders against a request context.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    placeholder: Regex,
    whole: Regex,
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self {
            placeholder: Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"),
            whole: Regex::new(r"^\{\{([^}]+)\}\}$").expect("placeholder pattern is valid"),
        }
    }

    /// Resolve every placeholder inside `template`.
    pub fn resolve(&self, template: &Value, context: &TemplateContext) -> Value {
        match template {
            Value::String(s) => self.resolve_str(s, context),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.resolve(v, context)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v, context)))
                    .collect::<Map<_, _>>(),
            ),
            // null, numbers and booleans carry no placeholders
            other => other.clone(),
        }
    }

    fn resolve_str(&self, template: &str, context: &TemplateContext) -> Value {
        if let Some(caps) = self.whole.captures(template) {
            return match resolve_expression(&caps[1], context) {
                Resolution::Resolved(value) => value,
                Resolution::Unresolved => Value::String(template.to_string()),
            };
        }

        let rendered = self.placeholder.replace_all(template, |caps: &Captures| {
            match resolve_expression(&caps[1], context) {
                Resolution::Resolved(value) => display(&value),
                Resolution::Unresolved => caps[0].to_string(),
            }
        });
        Value::String(rendered.into_owned())
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one expression (the text between the braces).
pub fn resolve_expression(expr: &str, context: &TemplateContext) -> Resolution {
    let expr = expr.trim();
    match expr {
        "now" => Resolution::Resolved(Value::String(
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        "random.number" => {
            let n = rand::thread_rng().gen_range(1..=RANDOM_NUMBER_MAX);
            Resolution::Resolved(Value::from(n))
        }
        _ => lookup(expr, context),
    }
}

fn lookup(expr: &str, context: &TemplateContext) -> Resolution {
    let segments: Vec<&str> = expr.split('.').collect();
    let Some((root, rest)) = segments.split_first() else {
        return Resolution::Unresolved;
    };

    match *root {
        "params" => match rest {
            [] => Resolution::Resolved(Value::Object(
                context
                    .path_params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )),
            [name] => match context.path_params.get(*name) {
                Some(value) => Resolution::Resolved(Value::String(value.clone())),
                None => Resolution::Unresolved,
            },
            // a path parameter is a plain string, there is nothing below it
            _ => Resolution::Unresolved,
        },
        "query" => walk_map(&context.query_params, rest),
        "headers" => walk_map(&context.headers, rest),
        "body" => walk(&context.body, rest),
        _ => Resolution::Unresolved,
    }
}

fn walk_map(map: &Map<String, Value>, path: &[&str]) -> Resolution {
    match path.split_first() {
        None => Resolution::Resolved(Value::Object(map.clone())),
        Some((key, rest)) => match map.get(*key) {
            Some(value) => walk(value, rest),
            None => Resolution::Unresolved,
        },
    }
}

fn walk(mut current: &Value, path: &[&str]) -> Resolution {
    for segment in path {
        let next = match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Resolution::Unresolved,
        }
    }
    Resolution::Resolved(current.clone())
}

/// String form used when a placeholder is embedded in surrounding text.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> TemplateContext {
        TemplateContext::new()
            .with_param("id", "123")
            .with_query("page", "2")
            .with_query("tag", json!(["a", "b"]))
            .with_header("user-agent", "test-client")
            .with_body(json!({
                "message": "Hello",
                "user": { "name": "Ada", "age": 36, "nickname": null },
                "items": [{ "sku": "x-1" }, { "sku": "x-2" }]
            }))
    }

    #[test]
    fn test_path_params() {
        let resolver = TemplateResolver::new();
        let out = resolver.resolve(
            &json!({ "id": "{{params.id}}", "name": "User {{params.id}}" }),
            &context(),
        );
        assert_eq!(out, json!({ "id": "123", "name": "User 123" }));
    }

    #[test]
    fn test_query_headers_and_body() {
        let resolver = TemplateResolver::new();
        let out = resolver.resolve(
            &json!({
                "page": "{{query.page}}",
                "agent": "{{ headers.user-agent }}",
                "echo": "{{body.message}}",
                "who": "{{body.user.name}} ({{body.user.age}})"
            }),
            &context(),
        );
        assert_eq!(
            out,
            json!({ "page": "2", "agent": "test-client", "echo": "Hello", "who": "Ada (36)" })
        );
    }

    #[test]
    fn test_whole_placeholder_keeps_native_type() {
        let resolver = TemplateResolver::new();
        let ctx = context();
        assert_eq!(resolver.resolve(&json!("{{body.user.age}}"), &ctx), json!(36));
        assert_eq!(
            resolver.resolve(&json!("{{body.user}}"), &ctx),
            json!({ "name": "Ada", "age": 36, "nickname": null })
        );
        assert_eq!(resolver.resolve(&json!("{{query.tag}}"), &ctx), json!(["a", "b"]));
    }

    #[test]
    fn test_missing_values_keep_placeholder() {
        let resolver = TemplateResolver::new();
        let ctx = context();
        assert_eq!(
            resolver.resolve(&json!("{{params.missing}}"), &ctx),
            json!("{{params.missing}}")
        );
        assert_eq!(
            resolver.resolve(&json!("Hi {{body.user.email}} / {{params.id}}"), &ctx),
            json!("Hi {{body.user.email}} / 123")
        );
        assert_eq!(resolver.resolve(&json!("{{cookies.session}}"), &ctx), json!("{{cookies.session}}"));
        assert_eq!(resolver.resolve(&json!("{{params.id.length}}"), &ctx), json!("{{params.id.length}}"));
    }

    #[test]
    fn test_present_null_is_resolved() {
        let resolver = TemplateResolver::new();
        let ctx = context();
        assert_eq!(
            resolve_expression("body.user.nickname", &ctx),
            Resolution::Resolved(Value::Null)
        );
        assert_eq!(resolver.resolve(&json!("{{body.user.nickname}}"), &ctx), Value::Null);
        assert_eq!(
            resolver.resolve(&json!("nick: {{body.user.nickname}}"), &ctx),
            json!("nick: null")
        );
        assert_eq!(resolve_expression("body.user.email", &ctx), Resolution::Unresolved);
    }

    #[test]
    fn test_array_index_segments() {
        let ctx = context();
        assert_eq!(
            resolve_expression("body.items.1.sku", &ctx),
            Resolution::Resolved(json!("x-2"))
        );
        assert_eq!(resolve_expression("body.items.9.sku", &ctx), Resolution::Unresolved);
    }

    #[test]
    fn test_random_number_range() {
        let resolver = TemplateResolver::new();
        for _ in 0..100 {
            let n = resolver
                .resolve(&json!("{{random.number}}"), &TemplateContext::new())
                .as_u64()
                .unwrap();
            assert!((1..=RANDOM_NUMBER_MAX).contains(&n));
        }
    }

    #[test]
    fn test_now_is_iso8601() {
        let resolver = TemplateResolver::new();
        let out = resolver.resolve(&json!("{{now}}"), &TemplateContext::new());
        let text = out.as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok(), "{}", text);
        assert!(text.ends_with('Z'));
    }

    #[test]
    fn test_arrays_and_primitives() {
        let resolver = TemplateResolver::new();
        let out = resolver.resolve(
            &json!([{ "id": "{{params.id}}" }, 7, true, null, "plain"]),
            &context(),
        );
        assert_eq!(out, json!([{ "id": "123" }, 7, true, null, "plain"]));
    }

    #[test]
    fn test_literal_object_round_trips() {
        let resolver = TemplateResolver::new();
        let literal = json!({
            "z": 1,
            "a": { "nested": ["x", 2.5, false] },
            "m": "no braces here",
            "half": "{not a placeholder}"
        });
        let out = resolver.resolve(&literal, &context());
        assert_eq!(out, literal);
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m", "half"]);
    }
}
