//! Plan-time state diffing.
//!
//! Before applying, a provider reports what would change: an attribute-level
//! diff between the prior state and the proposed state, plus whether any
//! changed attribute forces replacement of the whole resource.
//!
//! [`plan`] implements the default behavior shared by most resources:
//! carry computed attributes forward from prior state, walk both state
//! objects for changes, and consult the schema's `force_new` flags. Resources
//! with bespoke planning override the trait method instead.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(planned_state: Value, changes: Vec<AttributeChange>, requires_replace: bool) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// Compute the default plan for a resource.
///
/// Computed-only attributes absent from the proposed state are carried
/// forward from prior state before diffing, so a refreshed `id` never shows
/// up as a removal. `requires_replace` is set when any changed path resolves
/// to a `force_new` attribute in the schema.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let planned = carry_computed(schema, prior, proposed);
    let changes = diff_state(prior, &planned);
    // force_new only matters when there is existing state to replace
    let requires_replace = prior.is_some()
        && changes
            .iter()
            .any(|change| is_force_new(schema, &change.path));

    PlanResult {
        planned_state: planned,
        changes,
        requires_replace,
    }
}

/// Compute attribute-level changes between two state objects.
///
/// Paths use dotted notation (`git_repository.repo`). An absent prior state
/// reports every proposed attribute as an addition. Nested objects recurse;
/// any other value kind compares atomically.
pub fn diff_state(prior: Option<&Value>, proposed: &Value) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    let empty = Value::Object(serde_json::Map::new());
    diff_value(prior.unwrap_or(&empty), proposed, "", &mut changes);
    changes
}

fn diff_value(before: &Value, after: &Value, path: &str, changes: &mut Vec<AttributeChange>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let keys: BTreeSet<&String> = b.keys().chain(a.keys()).collect();
            for key in keys {
                let child_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", path, key)
                };
                match (b.get(key.as_str()), a.get(key.as_str())) {
                    (Some(bv), Some(av)) => diff_value(bv, av, &child_path, changes),
                    // Null and absent are the same state
                    (Some(bv), None) if !bv.is_null() => {
                        changes.push(AttributeChange::removed(child_path, bv.clone()))
                    },
                    (None, Some(av)) if !av.is_null() => {
                        changes.push(AttributeChange::added(child_path, av.clone()))
                    },
                    _ => {},
                }
            }
        },
        _ => {
            if before != after {
                changes.push(AttributeChange::modified(path, before.clone(), after.clone()));
            }
        },
    }
}

fn carry_computed(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> Value {
    let (Some(Value::Object(prior_map)), Value::Object(proposed_map)) = (prior, proposed) else {
        return proposed.clone();
    };

    let mut planned = proposed_map.clone();
    for (name, attr) in &schema.block.attributes {
        let computed_only = attr.flags.computed && !attr.flags.optional && !attr.flags.required;
        if !computed_only {
            continue;
        }
        let missing = !planned.contains_key(name) || planned[name].is_null();
        if missing {
            if let Some(value) = prior_map.get(name) {
                planned.insert(name.clone(), value.clone());
            }
        }
    }
    Value::Object(planned)
}

/// Resolve a dotted change path to its schema attribute and report whether it
/// forces replacement. Numeric segments (list indices) are skipped.
fn is_force_new(schema: &Schema, path: &str) -> bool {
    let mut block = &schema.block;
    let mut segments = path
        .split('.')
        .filter(|seg| seg.parse::<usize>().is_err())
        .peekable();

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            return block
                .attributes
                .get(segment)
                .map(|attr| attr.force_new)
                .unwrap_or(false);
        }
        match block.blocks.get(segment) {
            Some(nested) => block = &nested.block,
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, NestedBlock, Schema};
    use serde_json::json;

    fn project_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("framework", Attribute::optional_string())
            .with_block(
                "git_repository",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("repo", Attribute::required_string().with_force_new())
                        .with_attribute("branch", Attribute::optional_string()),
                ),
            )
    }

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("site"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("site")));

        let removed = AttributeChange::removed("name", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("framework", json!("svelte"), json!("nextjs"));
        assert_eq!(modified.before, Some(json!("svelte")));
        assert_eq!(modified.after, Some(json!("nextjs")));
    }

    #[test]
    fn test_diff_state_create() {
        let changes = diff_state(None, &json!({"name": "site", "framework": "nextjs"}));

        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&AttributeChange::added("framework", json!("nextjs"))));
        assert!(changes.contains(&AttributeChange::added("name", json!("site"))));
    }

    #[test]
    fn test_diff_state_no_changes() {
        let state = json!({"name": "site", "framework": "nextjs"});
        assert!(diff_state(Some(&state), &state).is_empty());
    }

    #[test]
    fn test_diff_state_modify_and_remove() {
        let prior = json!({"name": "site", "framework": "svelte"});
        let proposed = json!({"name": "site-2"});

        let changes = diff_state(Some(&prior), &proposed);

        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&AttributeChange::removed("framework", json!("svelte"))));
        assert!(changes.contains(&AttributeChange::modified(
            "name",
            json!("site"),
            json!("site-2")
        )));
    }

    #[test]
    fn test_diff_state_treats_null_as_absent() {
        let prior = json!({"name": "site", "framework": null});
        let proposed = json!({"name": "site"});
        assert!(diff_state(Some(&prior), &proposed).is_empty());

        let prior = json!({"name": "site"});
        let proposed = json!({"name": "site", "framework": null});
        assert!(diff_state(Some(&prior), &proposed).is_empty());
    }

    #[test]
    fn test_diff_state_recurses_into_objects() {
        let prior = json!({"git_repository": {"repo": "vercel/site", "branch": "main"}});
        let proposed = json!({"git_repository": {"repo": "vercel/site", "branch": "canary"}});

        let changes = diff_state(Some(&prior), &proposed);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "git_repository.branch");
    }

    #[test]
    fn test_plan_carries_computed_forward() {
        let schema = project_schema();
        let prior = json!({"id": "prj_123", "name": "site"});
        let proposed = json!({"name": "site"});

        let result = plan(&schema, Some(&prior), &proposed);

        assert_eq!(result.planned_state["id"], "prj_123");
        assert!(result.changes.is_empty());
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_plan_update_in_place() {
        let schema = project_schema();
        let prior = json!({"id": "prj_123", "name": "site", "framework": "svelte"});
        let proposed = json!({"name": "site", "framework": "nextjs"});

        let result = plan(&schema, Some(&prior), &proposed);

        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "framework");
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_plan_force_new_requires_replace() {
        let schema = project_schema();
        let prior = json!({"id": "prj_123", "name": "site"});
        let proposed = json!({"name": "renamed"});

        let result = plan(&schema, Some(&prior), &proposed);

        assert_eq!(result.changes.len(), 1);
        assert!(result.requires_replace);
    }

    #[test]
    fn test_plan_force_new_in_nested_block() {
        let schema = project_schema();
        let prior = json!({
            "id": "prj_123",
            "name": "site",
            "git_repository": {"repo": "vercel/site"}
        });
        let proposed = json!({
            "name": "site",
            "git_repository": {"repo": "vercel/other"}
        });

        let result = plan(&schema, Some(&prior), &proposed);

        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "git_repository.repo");
        assert!(result.requires_replace);
    }

    #[test]
    fn test_plan_create_has_no_replace() {
        let schema = project_schema();
        let result = plan(&schema, None, &json!({"name": "site"}));

        assert_eq!(result.changes.len(), 1);
        // force_new is about replacing existing state; creates never replace
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_plan_result_constructors() {
        let no_change = PlanResult::no_change(json!({"id": "prj_123"}));
        assert!(no_change.changes.is_empty());
        assert!(!no_change.requires_replace);

        let with_changes = PlanResult::with_changes(
            json!({"id": "prj_123", "name": "new"}),
            vec![AttributeChange::modified("name", json!("old"), json!("new"))],
            false,
        );
        assert_eq!(with_changes.changes.len(), 1);
    }
}
