//! Dependency expression AST.
//!
//! Field visibility and required-ness are controlled by a compact string
//! mini-language: an optional `matchAll::` prefix followed by whitespace or
//! comma separated `code[:valuePattern]` clauses. Expressions are parsed here
//! once, at schema load, into a typed [`DependencyExpr`]; evaluation against
//! resolved values lives in the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix selecting all-clauses-must-match semantics.
const MATCH_ALL_PREFIX: &str = "matchAll::";

/// How clause results combine into the expression result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// Satisfied when at least one clause is satisfied
    #[default]
    Any,
    /// Satisfied only when every clause is satisfied
    All,
}

/// One `code[:valuePattern]` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyClause {
    /// Dependency handle of the referenced field
    pub code: String,
    /// Optional unanchored regex the referenced value must match
    pub pattern: Option<String>,
}

/// Parsed dependency expression: match type plus ordered clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyExpr {
    pub match_type: MatchType,
    pub clauses: Vec<DependencyClause>,
}

/// Error raised while parsing a dependency expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprParseError {
    #[error("dependency expression is empty")]
    Empty,
    #[error("dependency clause '{clause}' is missing a field code")]
    MissingCode { clause: String },
}

impl DependencyExpr {
    /// Parse the compact string form.
    ///
    /// Grammar: `[matchAll::] code[:valuePattern] (sep code[:valuePattern])*`
    /// where `sep` is any run of whitespace and/or commas. The first `:` in a
    /// clause splits code from pattern; later colons belong to the pattern.
    pub fn parse(raw: &str) -> Result<Self, ExprParseError> {
        let trimmed = raw.trim();
        let (match_type, rest) = match trimmed.strip_prefix(MATCH_ALL_PREFIX) {
            Some(rest) => (MatchType::All, rest),
            None => (MatchType::Any, trimmed),
        };

        let mut clauses = Vec::new();
        for token in rest.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let clause = match token.split_once(':') {
                Some(("", _)) => {
                    return Err(ExprParseError::MissingCode {
                        clause: token.to_string(),
                    });
                }
                Some((code, pattern)) if !pattern.is_empty() => DependencyClause {
                    code: code.to_string(),
                    pattern: Some(pattern.to_string()),
                },
                Some((code, _)) => DependencyClause {
                    code: code.to_string(),
                    pattern: None,
                },
                None => DependencyClause {
                    code: token.to_string(),
                    pattern: None,
                },
            };
            clauses.push(clause);
        }

        if clauses.is_empty() {
            return Err(ExprParseError::Empty);
        }
        Ok(Self { match_type, clauses })
    }

    /// Codes referenced by the expression, in clause order.
    pub fn referenced_codes(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|clause| clause.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_bare_clause() {
        let expr = DependencyExpr::parse("network.vpcId").unwrap();
        assert_eq!(expr.match_type, MatchType::Any);
        assert_eq!(
            expr.clauses,
            vec![DependencyClause {
                code: "network.vpcId".into(),
                pattern: None,
            }]
        );
    }

    #[test]
    fn test_parse_match_all_with_patterns() {
        let expr = DependencyExpr::parse("matchAll::cloud:aws region:eu-.*").unwrap();
        assert_eq!(expr.match_type, MatchType::All);
        assert_eq!(expr.clauses.len(), 2);
        assert_eq!(expr.clauses[0].code, "cloud");
        assert_eq!(expr.clauses[0].pattern.as_deref(), Some("aws"));
        assert_eq!(expr.clauses[1].pattern.as_deref(), Some("eu-.*"));
    }

    #[test]
    fn test_parse_comma_and_space_separators() {
        let expr = DependencyExpr::parse("a:x, b , c:y").unwrap();
        let codes: Vec<&str> = expr.referenced_codes().collect();
        assert_eq!(codes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_pattern_keeps_later_colons() {
        let expr = DependencyExpr::parse("image:ami:legacy.*").unwrap();
        assert_eq!(expr.clauses[0].code, "image");
        assert_eq!(expr.clauses[0].pattern.as_deref(), Some("ami:legacy.*"));
    }

    #[test]
    fn test_trailing_colon_means_no_pattern() {
        let expr = DependencyExpr::parse("cloud:").unwrap();
        assert_eq!(expr.clauses[0].code, "cloud");
        assert_eq!(expr.clauses[0].pattern, None);
    }

    #[test]
    fn test_empty_expression_is_rejected() {
        assert_eq!(DependencyExpr::parse("   "), Err(ExprParseError::Empty));
        assert_eq!(DependencyExpr::parse("matchAll::"), Err(ExprParseError::Empty));
    }

    #[test]
    fn test_clause_without_code_is_rejected() {
        assert_eq!(
            DependencyExpr::parse(":aws"),
            Err(ExprParseError::MissingCode { clause: ":aws".into() })
        );
    }
}
