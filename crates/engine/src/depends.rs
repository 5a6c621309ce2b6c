//! Dependency expression evaluation.
//!
//! Expressions are parsed once at schema load ([`crate::schema::Schema`]);
//! this module evaluates the typed AST against the values known at the point
//! a field comes up for resolution. A referenced code is looked up first in
//! already-resolved results, then in the caller-supplied options bag, then in
//! the API parameters.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map as JsonMap, Value};
use stratus_types::{DependencyClause, DependencyExpr, MatchType};
use tracing::warn;

use crate::coerce::stringify;
use crate::paths::get_path;

/// Lookup surface for clause evaluation.
pub struct EvalContext<'a> {
    /// Values resolved so far this run
    pub resolved: &'a JsonMap<String, Value>,
    /// Caller-supplied options bag
    pub supplied: &'a JsonMap<String, Value>,
    /// Flat API parameters
    pub api_params: &'a JsonMap<String, Value>,
    /// Dependency code → namespace path for fields declared in the schema
    pub code_paths: &'a HashMap<String, Vec<String>>,
}

impl EvalContext<'_> {
    /// Current value of a dependency code, honoring the lookup order.
    fn lookup(&self, code: &str) -> Option<Value> {
        let segments: Vec<String> = match self.code_paths.get(code) {
            Some(path) => path.clone(),
            None => code.split('.').map(str::to_string).collect(),
        };
        if let Some(value) = get_path(self.resolved, &segments) {
            return Some(value.clone());
        }
        if let Some(value) = get_path(self.supplied, &segments) {
            return Some(value.clone());
        }
        self.api_params.get(code).cloned()
    }
}

/// Evaluate a whole expression per its match type.
pub fn evaluate(expr: &DependencyExpr, ctx: &EvalContext<'_>) -> bool {
    match expr.match_type {
        MatchType::Any => expr.clauses.iter().any(|clause| clause_satisfied(clause, ctx)),
        MatchType::All => expr.clauses.iter().all(|clause| clause_satisfied(clause, ctx)),
    }
}

/// A clause is satisfied when the referenced value exists, is non-null, and
/// matches the optional pattern as an unanchored regex.
fn clause_satisfied(clause: &DependencyClause, ctx: &EvalContext<'_>) -> bool {
    let Some(value) = ctx.lookup(&clause.code) else {
        return false;
    };
    if value.is_null() {
        return false;
    }
    let Some(pattern) = &clause.pattern else {
        return true;
    };
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(&stringify(&value)),
        Err(error) => {
            warn!(%pattern, %error, "malformed dependency pattern; clause fails");
            false
        }
    }
}
