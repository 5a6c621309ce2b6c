//! Choice prompters: select, radio, multiSelect, typeahead, multiTypeahead.
//!
//! Select-style prompts pre-load their candidate set once; typeahead prompts
//! re-query the source on every attempt with the current input as a filter,
//! trading extra round trips for responsiveness against very large catalogs.

use serde_json::{Map as JsonMap, Value};
use stratus_types::{FieldSpec, SelectOutcome};

use crate::error::ResolveResult;
use crate::matching::{TokenMatch, match_default, match_token, selectable};
use crate::source::{OptionSource, load_candidates};

use super::{Answer, confirm_add_another, print_ambiguous, print_candidates, print_help, prompt_line, read_answer};

/// Single-choice prompt. Returns `None` when an optional field is left blank.
pub async fn prompt_select(
    spec: &FieldSpec,
    resolved: &JsonMap<String, Value>,
    source: &dyn OptionSource,
) -> ResolveResult<Option<SelectOutcome>> {
    let preloaded = if spec.field_type.is_typeahead() {
        Vec::new()
    } else {
        load_candidates(spec, resolved, source, None).await?
    };

    let line = prompt_line(spec);
    loop {
        match read_answer(&line)? {
            Answer::Help => {
                print_help(spec);
                let listing = if spec.field_type.is_typeahead() {
                    load_candidates(spec, resolved, source, None).await?
                } else {
                    preloaded.clone()
                };
                print_candidates(&listing)?;
            }
            Answer::Empty => {
                if let Some(default) = spec.default_value.as_deref()
                    && let Some(option) = match_default(&preloaded, default)
                {
                    return Ok(Some(SelectOutcome::from_option(option)));
                }
                if spec.required {
                    eprintln!("{} is required", spec.label());
                    continue;
                }
                return Ok(None);
            }
            Answer::Text(token) => {
                let candidates = if spec.field_type.is_typeahead() {
                    load_candidates(spec, resolved, source, Some(&token)).await?
                } else {
                    preloaded.clone()
                };
                match match_token(&candidates, &token) {
                    TokenMatch::Value(option) | TokenMatch::Name(option) => {
                        return Ok(Some(SelectOutcome::from_option(option)));
                    }
                    TokenMatch::Ambiguous(matches) => print_ambiguous(&token, &matches),
                    TokenMatch::None => {
                        // A typeahead narrowed to one candidate accepts it.
                        if spec.field_type.is_typeahead() {
                            let mut narrowed = selectable(&candidates);
                            if let (Some(only), None) = (narrowed.next(), narrowed.next()) {
                                return Ok(Some(SelectOutcome::from_option(only)));
                            }
                        }
                        eprintln!("no candidate matches '{token}' (enter ? to list candidates)");
                    }
                }
            }
        }
    }
}

/// Repeated choice prompt for multiSelect/multiTypeahead.
///
/// After each accepted value the operator is asked whether to add another;
/// the confirm defaults to yes while the accumulated count is below the
/// field's recommended count. The loop also ends when no further value is
/// entered.
pub async fn prompt_multi_select(
    spec: &FieldSpec,
    resolved: &JsonMap<String, Value>,
    source: &dyn OptionSource,
) -> ResolveResult<Option<Vec<SelectOutcome>>> {
    let mut follow_up = spec.clone();
    follow_up.required = false;
    follow_up.default_value = None;

    let mut collected: Vec<SelectOutcome> = Vec::new();
    loop {
        let current = if collected.is_empty() { spec } else { &follow_up };
        match prompt_select(current, resolved, source).await? {
            None => break,
            Some(outcome) => collected.push(outcome),
        }
        if !confirm_add_another(spec, collected.len() as u64)? {
            break;
        }
    }
    Ok(if collected.is_empty() { None } else { Some(collected) })
}
