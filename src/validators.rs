//! Declarative attribute validators.
//!
//! Two kinds of validation run before any mutating API call:
//!
//! - Per-attribute [`Constraint`]s declared in the schema, enforced by
//!   [`check`] on the raw JSON value. These run as part of
//!   [`validate`](crate::validation::validate).
//! - Cross-field consistency helpers ([`conflicts`], [`requires`],
//!   [`exclusive_toggles`]) used by struct-level `validate` functions on
//!   typed config structs, operating on tri-state [`Attr`] values.
//!
//! Null and unknown values always pass: validation is deferred until the
//! value resolves. A wrong-typed value also passes here, because the schema
//! type check reports it separately and one mistake should produce one
//! diagnostic. Validators never short-circuit one another; each violated
//! constraint contributes its own diagnostic.

use crate::schema::{Constraint, Diagnostic};
use crate::value::Attr;
use serde_json::Value;

/// Check a single constraint against an attribute value.
///
/// Returns `None` when the constraint holds, is deferred (null value), or
/// does not apply to the value's type.
pub fn check(constraint: &Constraint, path: &str, value: &Value) -> Option<Diagnostic> {
    if value.is_null() {
        return None;
    }

    match constraint {
        Constraint::IntBetween { min, max } => {
            let n = value.as_i64()?;
            (n < *min || n > *max).then(|| {
                Diagnostic::error(format!("Value for '{}' out of range", path))
                    .with_detail(format!("Must be between {} and {}, got {}", min, max, n))
                    .with_attribute(path)
            })
        },
        Constraint::LengthBetween { min, max } => {
            let s = value.as_str()?;
            let len = s.chars().count();
            (len < *min || len > *max).then(|| {
                Diagnostic::error(format!("Invalid length for '{}'", path))
                    .with_detail(format!(
                        "Must be between {} and {} characters, got {}",
                        min, max, len
                    ))
                    .with_attribute(path)
            })
        },
        Constraint::OneOf(allowed) => {
            let s = value.as_str()?;
            (!allowed.iter().any(|a| a == s)).then(|| {
                Diagnostic::error(format!("Invalid value for '{}'", path))
                    .with_detail(format!("Must be one of [{}], got '{}'", allowed.join(", "), s))
                    .with_attribute(path)
            })
        },
        Constraint::SubsetOf(allowed) => {
            let items = value.as_array()?;
            let invalid: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !allowed.iter().any(|a| a == s))
                .collect();
            (!invalid.is_empty()).then(|| {
                Diagnostic::error(format!("Invalid value(s) for '{}'", path))
                    .with_detail(format!(
                        "Allowed values are [{}], got [{}]",
                        allowed.join(", "),
                        invalid.join(", ")
                    ))
                    .with_attribute(path)
            })
        },
        Constraint::SizeAtLeast(min) => {
            let len = collection_len(value)?;
            (len < *min).then(|| {
                Diagnostic::error(format!("'{}' has too few elements", path))
                    .with_detail(format!("Requires at least {} element(s), got {}", min, len))
                    .with_attribute(path)
            })
        },
        Constraint::SizeAtMost(max) => {
            let len = collection_len(value)?;
            (len > *max).then(|| {
                Diagnostic::error(format!("'{}' has too many elements", path))
                    .with_detail(format!("Allows at most {} element(s), got {}", max, len))
                    .with_attribute(path)
            })
        },
    }
}

fn collection_len(value: &Value) -> Option<usize> {
    match value {
        Value::Array(arr) => Some(arr.len()),
        Value::Object(obj) => Some(obj.len()),
        _ => None,
    }
}

/// Cross-field: `a` and `b` may not both be set.
///
/// Set means [`Attr::Known`]; unknown values defer validation.
pub fn conflicts<A, B>(
    a_path: &str,
    a: &Attr<A>,
    b_path: &str,
    b: &Attr<B>,
) -> Option<Diagnostic> {
    (a.is_known() && b.is_known()).then(|| {
        Diagnostic::error(format!("'{}' conflicts with '{}'", b_path, a_path))
            .with_detail(format!(
                "At most one of '{}' and '{}' may be configured",
                a_path, b_path
            ))
            .with_attribute(b_path)
    })
}

/// Cross-field: configuring `dependent` requires `prerequisite` to be set.
///
/// An unknown prerequisite passes, since it may resolve during apply.
pub fn requires<A, B>(
    dependent_path: &str,
    dependent: &Attr<A>,
    prerequisite_path: &str,
    prerequisite: &Attr<B>,
) -> Option<Diagnostic> {
    (dependent.is_known() && prerequisite.is_null()).then(|| {
        Diagnostic::error(format!("'{}' requires '{}'", dependent_path, prerequisite_path))
            .with_detail(format!(
                "'{}' cannot be configured without '{}'",
                dependent_path, prerequisite_path
            ))
            .with_attribute(dependent_path)
    })
}

/// Cross-field: two boolean toggles may not both be enabled.
pub fn exclusive_toggles(
    a_path: &str,
    a: &Attr<bool>,
    b_path: &str,
    b: &Attr<bool>,
) -> Option<Diagnostic> {
    (a.known() == Some(&true) && b.known() == Some(&true)).then(|| {
        Diagnostic::error(format!("'{}' and '{}' are mutually exclusive", a_path, b_path))
            .with_detail(format!(
                "Disable '{}' or '{}'; both cannot be enabled",
                a_path, b_path
            ))
            .with_attribute(b_path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_between() {
        let range = Constraint::IntBetween { min: 1, max: 900 };

        assert!(check(&range, "timeout", &json!(1)).is_none());
        assert!(check(&range, "timeout", &json!(900)).is_none());
        assert!(check(&range, "timeout", &json!(450)).is_none());

        let diag = check(&range, "timeout", &json!(0)).unwrap();
        assert_eq!(diag.attribute, Some("timeout".to_string()));

        assert!(check(&range, "timeout", &json!(901)).is_some());
    }

    #[test]
    fn test_null_is_deferred() {
        let range = Constraint::IntBetween { min: 1, max: 900 };
        assert!(check(&range, "timeout", &Value::Null).is_none());
    }

    #[test]
    fn test_wrong_type_is_skipped() {
        // The schema type check owns this failure; no duplicate diagnostic.
        let range = Constraint::IntBetween { min: 1, max: 900 };
        assert!(check(&range, "timeout", &json!("fast")).is_none());
    }

    #[test]
    fn test_length_between() {
        let len = Constraint::LengthBetween { min: 1, max: 5 };

        assert!(check(&len, "name", &json!("abc")).is_none());
        assert!(check(&len, "name", &json!("")).is_some());

        let diag = check(&len, "name", &json!("toolong")).unwrap();
        assert!(diag.detail.unwrap().contains("got 7"));
    }

    #[test]
    fn test_one_of() {
        let framework = Constraint::one_of(["nextjs", "svelte", "astro"]);

        assert!(check(&framework, "framework", &json!("nextjs")).is_none());

        let diag = check(&framework, "framework", &json!("rails")).unwrap();
        assert!(diag.detail.unwrap().contains("rails"));
    }

    #[test]
    fn test_subset_of() {
        let targets = Constraint::subset_of(["production", "preview", "development"]);

        assert!(check(&targets, "target", &json!(["production", "preview"])).is_none());
        assert!(check(&targets, "target", &json!([])).is_none());

        let diag = check(&targets, "target", &json!(["production", "staging"])).unwrap();
        let detail = diag.detail.unwrap();
        assert!(detail.contains("staging"));
        assert!(!detail.contains("got [production"));
    }

    #[test]
    fn test_size_bounds() {
        let min = Constraint::SizeAtLeast(1);
        let max = Constraint::SizeAtMost(2);

        assert!(check(&min, "domains", &json!(["a.com"])).is_none());
        assert!(check(&min, "domains", &json!([])).is_some());

        assert!(check(&max, "domains", &json!(["a.com", "b.com"])).is_none());
        assert!(check(&max, "domains", &json!(["a.com", "b.com", "c.com"])).is_some());
    }

    #[test]
    fn test_conflicts() {
        let a: Attr<String> = Attr::Known("x".to_string());
        let b: Attr<String> = Attr::Known("y".to_string());
        let diag = conflicts("password_protection", &a, "trusted_ips", &b).unwrap();
        assert_eq!(diag.attribute, Some("trusted_ips".to_string()));

        let null: Attr<String> = Attr::Null;
        assert!(conflicts("password_protection", &a, "trusted_ips", &null).is_none());

        let unknown: Attr<String> = Attr::Unknown;
        assert!(conflicts("password_protection", &unknown, "trusted_ips", &b).is_none());
    }

    #[test]
    fn test_requires() {
        let comments: Attr<bool> = Attr::Known(true);
        let repo: Attr<String> = Attr::Null;
        let diag = requires("git_comments", &comments, "git_repository", &repo).unwrap();
        assert_eq!(diag.attribute, Some("git_comments".to_string()));

        let repo_set: Attr<String> = Attr::Known("vercel/site".to_string());
        assert!(requires("git_comments", &comments, "git_repository", &repo_set).is_none());

        // Unknown prerequisite defers rather than failing.
        let repo_unknown: Attr<String> = Attr::Unknown;
        assert!(requires("git_comments", &comments, "git_repository", &repo_unknown).is_none());
    }

    #[test]
    fn test_exclusive_toggles() {
        let on = Attr::Known(true);
        let off = Attr::Known(false);

        assert!(exclusive_toggles("a", &on, "b", &on).is_some());
        assert!(exclusive_toggles("a", &on, "b", &off).is_none());
        assert!(exclusive_toggles("a", &off, "b", &on).is_none());
        assert!(exclusive_toggles("a", &on, "b", &Attr::Null).is_none());
    }
}
