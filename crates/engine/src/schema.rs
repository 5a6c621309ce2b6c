//! Schema compilation.
//!
//! Calling commands hand the engine a flat list of [`FieldSpec`]s.
//! Compilation parses the dependency mini-language into typed expressions,
//! orders fields for processing, and validates that every dependency on a
//! schema field points backwards — the resolution loop evaluates fields in
//! order and performs no topological re-sorting.

use std::collections::HashMap;

use indexmap::IndexSet;
use stratus_types::{DependencyExpr, FieldSpec};

use crate::error::{ResolveError, ResolveResult};

/// Implicit group of fields that carry no `fieldGroup`.
pub const DEFAULT_GROUP: &str = "default";
/// Group always sorted last.
pub const ADVANCED_GROUP: &str = "advanced";

/// A field spec with its dependency expressions parsed.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub spec: FieldSpec,
    pub depends_on: Option<DependencyExpr>,
    pub visible_on: Option<DependencyExpr>,
    pub require_on: Option<DependencyExpr>,
}

impl CompiledField {
    fn compile(spec: FieldSpec) -> ResolveResult<Self> {
        let parse = |raw: &Option<String>, which: &str| -> ResolveResult<Option<DependencyExpr>> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(expression) => DependencyExpr::parse(expression)
                    .map(Some)
                    .map_err(|error| {
                        ResolveError::invalid_schema(format!(
                            "field '{}' has an invalid {} expression: {}",
                            spec.field_name, which, error
                        ))
                    }),
            }
        };

        Ok(Self {
            depends_on: parse(&spec.depends_on_code, "dependsOnCode")?,
            visible_on: parse(&spec.visible_on_code, "visibleOnCode")?,
            require_on: parse(&spec.require_on_code, "requireOnCode")?,
            spec,
        })
    }

    /// All expressions gating or modifying this field.
    fn expressions(&self) -> impl Iterator<Item = &DependencyExpr> {
        [&self.depends_on, &self.visible_on, &self.require_on]
            .into_iter()
            .flatten()
    }
}

/// A compiled, ordered, validated field schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Fields in processing order
    pub fields: Vec<CompiledField>,
    /// Dependency code (and dotted path) → namespace path segments
    code_paths: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Compile a field list: parse dependency expressions, apply the group /
    /// display-order sort, and reject forward dependency references.
    pub fn compile(specs: Vec<FieldSpec>) -> ResolveResult<Self> {
        let mut fields = specs
            .into_iter()
            .map(CompiledField::compile)
            .collect::<ResolveResult<Vec<_>>>()?;
        sort_fields(&mut fields);

        let mut code_paths = HashMap::new();
        for field in &fields {
            let path = field.spec.path();
            code_paths.insert(field.spec.dependency_code(), path.clone());
            code_paths.entry(field.spec.path_string()).or_insert(path);
        }

        validate_reference_order(&fields)?;
        Ok(Self { fields, code_paths })
    }

    /// Dependency code → namespace path mapping for expression evaluation.
    pub fn code_paths(&self) -> &HashMap<String, Vec<String>> {
        &self.code_paths
    }
}

/// Group ordering: implicit `default` group first, custom groups in
/// first-appearance order, `advanced` last; ascending `displayOrder` within a
/// group, declaration order breaking ties (the sort is stable).
fn sort_fields(fields: &mut [CompiledField]) {
    let mut custom_groups: IndexSet<String> = IndexSet::new();
    for field in fields.iter() {
        let group = group_name(&field.spec);
        if group != DEFAULT_GROUP && group != ADVANCED_GROUP {
            custom_groups.insert(group.to_string());
        }
    }

    let rank = |spec: &FieldSpec| -> usize {
        let group = group_name(spec);
        if group == DEFAULT_GROUP {
            0
        } else if group == ADVANCED_GROUP {
            custom_groups.len() + 1
        } else {
            1 + custom_groups.get_index_of(group).expect("group was collected")
        }
    };

    fields.sort_by_key(|field| (rank(&field.spec), field.spec.display_order));
}

fn group_name(spec: &FieldSpec) -> &str {
    spec.field_group
        .as_deref()
        .filter(|group| !group.is_empty())
        .unwrap_or(DEFAULT_GROUP)
}

/// Reject expressions that reference a schema field which has not been
/// processed yet at evaluation time. Codes that are not schema fields at all
/// stay legal — they can be satisfied by supplied options or API parameters.
fn validate_reference_order(fields: &[CompiledField]) -> ResolveResult<()> {
    let mut position: HashMap<String, usize> = HashMap::new();
    for (index, field) in fields.iter().enumerate() {
        position.entry(field.spec.dependency_code()).or_insert(index);
        position.entry(field.spec.path_string()).or_insert(index);
    }

    for (index, field) in fields.iter().enumerate() {
        for expr in field.expressions() {
            for code in expr.referenced_codes() {
                if let Some(&target) = position.get(code)
                    && target >= index
                {
                    return Err(ResolveError::invalid_schema(format!(
                        "field '{}' depends on '{}', which is not resolved before it; \
                         reorder the schema so dependency targets come first",
                        field.spec.field_name, code
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FieldSpec {
        FieldSpec {
            field_name: name.into(),
            ..FieldSpec::default()
        }
    }

    fn grouped(name: &str, group: Option<&str>, order: i64) -> FieldSpec {
        FieldSpec {
            field_name: name.into(),
            field_group: group.map(str::to_string),
            display_order: order,
            ..FieldSpec::default()
        }
    }

    fn names(schema: &Schema) -> Vec<&str> {
        schema.fields.iter().map(|f| f.spec.field_name.as_str()).collect()
    }

    #[test]
    fn test_group_ordering_default_custom_advanced() {
        let schema = Schema::compile(vec![
            grouped("adv", Some("advanced"), 0),
            grouped("net2", Some("network"), 2),
            grouped("plain", None, 5),
            grouped("store1", Some("storage"), 1),
            grouped("net1", Some("network"), 1),
            grouped("first", Some("default"), 1),
        ])
        .unwrap();

        assert_eq!(names(&schema), vec!["first", "plain", "net1", "net2", "store1", "adv"]);
    }

    #[test]
    fn test_display_order_ties_keep_declaration_order() {
        let schema = Schema::compile(vec![
            grouped("b", None, 1),
            grouped("a", None, 1),
            grouped("z", None, 0),
        ])
        .unwrap();

        assert_eq!(names(&schema), vec!["z", "b", "a"]);
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let mut dependent = field("subnet");
        dependent.depends_on_code = Some("vpc".into());
        let result = Schema::compile(vec![dependent, field("vpc")]);

        match result {
            Err(ResolveError::InvalidSchema { reason }) => {
                assert!(reason.contains("subnet"), "reason: {reason}");
                assert!(reason.contains("vpc"), "reason: {reason}");
            }
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_backward_reference_is_accepted() {
        let mut dependent = field("subnet");
        dependent.depends_on_code = Some("vpc".into());
        assert!(Schema::compile(vec![field("vpc"), dependent]).is_ok());
    }

    #[test]
    fn test_reference_outside_schema_is_accepted() {
        let mut dependent = field("subnet");
        dependent.depends_on_code = Some("cliContext".into());
        assert!(Schema::compile(vec![dependent]).is_ok());
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut looped = field("region");
        looped.visible_on_code = Some("region".into());
        assert!(matches!(
            Schema::compile(vec![looped]),
            Err(ResolveError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        let mut broken = field("x");
        broken.depends_on_code = Some(":pattern".into());
        assert!(matches!(
            Schema::compile(vec![broken]),
            Err(ResolveError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_sort_happens_before_reference_validation() {
        // "adv" sorts after "region" despite being declared first, so its
        // dependency is valid once groups are applied.
        let mut adv = grouped("adv", Some("advanced"), 0);
        adv.depends_on_code = Some("region".into());
        assert!(Schema::compile(vec![adv, field("region")]).is_ok());
    }
}
