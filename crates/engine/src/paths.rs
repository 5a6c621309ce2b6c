//! Nested result assembly by namespace path.
//!
//! Resolved values land in a nested JSON object keyed by the segments of
//! `fieldContext.fieldName`. Writers auto-vivify intermediate maps; the prune
//! helpers uphold the result invariant that no key ever holds null or an
//! empty map.

use serde_json::{Map as JsonMap, Value};

/// Read the value at a segment path, if every segment exists.
pub fn get_path<'a>(root: &'a JsonMap<String, Value>, segments: &[String]) -> Option<&'a Value> {
    let (leaf, parents) = segments.split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get(segment)?.as_object()?;
    }
    current.get(leaf)
}

/// Create every intermediate map on the path, leaving the leaf untouched.
///
/// A non-object value sitting where an intermediate map belongs is replaced;
/// vivification always wins over a stale scalar.
pub fn vivify_path(root: &mut JsonMap<String, Value>, segments: &[String]) {
    let Some((_, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        if !slot.is_object() {
            *slot = Value::Object(JsonMap::new());
        }
        current = slot.as_object_mut().expect("slot was just made an object");
    }
}

/// Write a value at a segment path, auto-vivifying intermediate maps.
pub fn set_path(root: &mut JsonMap<String, Value>, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    vivify_path(root, segments);
    let mut current = root;
    for segment in parents {
        current = current
            .get_mut(segment)
            .and_then(Value::as_object_mut)
            .expect("vivify_path created the intermediate map");
    }
    current.insert(leaf.clone(), value);
}

/// Prune a path: drop the leaf when it is null or an empty map, then drop
/// ancestors left empty. Populated values are never touched, so pruning a
/// skipped field cannot damage siblings sharing the namespace.
pub fn prune_path(root: &mut JsonMap<String, Value>, segments: &[String]) {
    fn walk(map: &mut JsonMap<String, Value>, segments: &[String]) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            if map.get(head).is_some_and(is_empty_value) {
                map.remove(head);
            }
            return;
        }
        let now_empty = match map.get_mut(head) {
            Some(Value::Object(child)) => {
                walk(child, rest);
                child.is_empty()
            }
            _ => false,
        };
        if now_empty {
            map.remove(head);
        }
    }
    walk(root, segments);
}

/// True for values the result must never contain: null or an empty map.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonMap<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    fn segs(path: &str) -> Vec<String> {
        path.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_set_path_vivifies_intermediates() {
        let mut root = JsonMap::new();
        set_path(&mut root, &segs("network.subnet.id"), json!("subnet-1"));
        assert_eq!(Value::Object(root), json!({"network": {"subnet": {"id": "subnet-1"}}}));
    }

    #[test]
    fn test_set_path_replaces_scalar_intermediate() {
        let mut root = obj(json!({"network": "flat"}));
        set_path(&mut root, &segs("network.vpcId"), json!("vpc-1"));
        assert_eq!(Value::Object(root), json!({"network": {"vpcId": "vpc-1"}}));
    }

    #[test]
    fn test_get_path_reads_nested_values() {
        let root = obj(json!({"a": {"b": {"c": 1}}}));
        assert_eq!(get_path(&root, &segs("a.b.c")), Some(&json!(1)));
        assert_eq!(get_path(&root, &segs("a.b.missing")), None);
        assert_eq!(get_path(&root, &segs("a.x.c")), None);
    }

    #[test]
    fn test_prune_path_removes_empty_leaf_and_ancestors() {
        let mut root = obj(json!({"a": {"b": {"c": {}}}, "keep": true}));
        prune_path(&mut root, &segs("a.b.c"));
        assert_eq!(Value::Object(root), json!({"keep": true}));
    }

    #[test]
    fn test_prune_path_cleans_vivified_namespace_without_leaf() {
        let mut root = obj(json!({"a": {"b": {}}}));
        prune_path(&mut root, &segs("a.b.c"));
        assert_eq!(Value::Object(root), json!({}));
    }

    #[test]
    fn test_prune_path_never_touches_populated_values() {
        let mut root = obj(json!({"a": {"b": {"c": 1, "d": 2}}}));
        prune_path(&mut root, &segs("a.b.c"));
        assert_eq!(Value::Object(root), json!({"a": {"b": {"c": 1, "d": 2}}}));

        let mut shared = obj(json!({"a": {"b": {"c": 1}}}));
        // Pruning a skipped field whose leaf is an ancestor of resolved data.
        prune_path(&mut shared, &segs("a.b"));
        assert_eq!(Value::Object(shared), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!({"k": 1})));
    }
}
