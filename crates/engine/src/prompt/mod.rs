//! Type-specific prompters and shared prompt plumbing.
//!
//! Every prompter honors the same escape hatches: `?` prints inline help
//! (label, CLI flag spelling, description, and for choice prompts a paginated
//! candidate listing), empty input falls back to the field default, and a
//! required field re-prompts where an optional one resolves to nothing.

pub mod file;
pub mod marketplace;
pub mod select;
pub mod text;

use colored::Colorize;
use dialoguer::{Confirm, Input};
use heck::ToKebabCase;
use stratus_types::{FieldSpec, Pagination, SelectOption};

use crate::error::ResolveResult;

/// Rows reserved for the prompt itself when paging candidate listings.
const PAGING_RESERVED_ROWS: u16 = 6;
/// Candidates shown in guidance and disambiguation messages.
const GUIDANCE_CANDIDATE_LIMIT: usize = 10;

/// One line of operator input, with the shared escapes pre-classified.
pub(crate) enum Answer {
    /// `?` — print help and re-prompt
    Help,
    /// Empty input — default / skip handling
    Empty,
    /// Anything else, trimmed
    Text(String),
}

/// Read one line for a field, classifying the shared escapes.
pub(crate) fn read_answer(prompt: &str) -> ResolveResult<Answer> {
    let raw: String = Input::new().with_prompt(prompt).allow_empty(true).interact_text()?;
    let trimmed = raw.trim();
    Ok(match trimmed {
        "?" => Answer::Help,
        "" => Answer::Empty,
        text => Answer::Text(text.to_string()),
    })
}

/// Prompt line for a field: label plus the default hint when one exists.
pub(crate) fn prompt_line(spec: &FieldSpec) -> String {
    match spec.default_value.as_deref().filter(|default| !default.is_empty()) {
        Some(default) => format!("{} [{}]", spec.label(), default),
        None => spec.label().to_string(),
    }
}

/// CLI flag spelling of a field, shown in help and guidance.
pub(crate) fn flag_spelling(spec: &FieldSpec) -> String {
    format!("--{}", spec.field_name.to_kebab_case())
}

/// Inline help: label, flag spelling, wrapped description.
pub(crate) fn print_help(spec: &FieldSpec) {
    println!("{}", spec.label().bold());
    println!("  flag: {}", flag_spelling(spec).cyan());
    if let Some(description) = spec.description.as_deref().filter(|text| !text.is_empty()) {
        for line in textwrap::wrap(description, 76) {
            println!("  {line}");
        }
    }
}

/// Candidate rows per terminal screen: rows minus the space the prompt needs.
pub(crate) fn page_size() -> usize {
    let rows = crossterm::terminal::size().map(|(_, rows)| rows).unwrap_or(24);
    usize::from(rows.saturating_sub(PAGING_RESERVED_ROWS)).max(1)
}

/// Print a candidate listing one terminal screen at a time.
pub(crate) fn print_candidates(options: &[SelectOption]) -> ResolveResult<()> {
    if options.is_empty() {
        println!("  {}", "no candidate values".dimmed());
        return Ok(());
    }
    let mut paging = Pagination::new(page_size(), options.len());
    loop {
        let (start, end) = paging.page_bounds();
        for option in &options[start..end] {
            if option.is_group {
                println!("{}", option.name.bold());
            } else if option.name == option.value {
                println!("  {}", option.name);
            } else {
                println!("  {} {}", option.name, format!("({})", option.value).dimmed());
            }
        }
        if !paging.has_next() {
            return Ok(());
        }
        let more: String = Input::new()
            .with_prompt(format!(
                "-- page {}/{}; ENTER for more, q to stop listing --",
                paging.current_page + 1,
                paging.page_count()
            ))
            .allow_empty(true)
            .interact_text()?;
        if more.trim().eq_ignore_ascii_case("q") {
            return Ok(());
        }
        paging.advance();
    }
}

/// Guidance printed before a missing-required failure: help plus the first
/// candidates an operator could have passed.
pub(crate) fn print_missing_required(spec: &FieldSpec, candidates: &[SelectOption]) {
    eprintln!("{} {}", "missing required option:".red().bold(), spec.label());
    eprintln!("  pass it with {} or add it to the payload", flag_spelling(spec).cyan());
    if let Some(description) = spec.description.as_deref().filter(|text| !text.is_empty()) {
        for line in textwrap::wrap(description, 76) {
            eprintln!("  {line}");
        }
    }
    let values: Vec<&str> = candidates
        .iter()
        .filter(|option| !option.is_group)
        .take(GUIDANCE_CANDIDATE_LIMIT)
        .map(|option| option.value.as_str())
        .collect();
    if !values.is_empty() {
        eprintln!("  candidate values: {}", values.join(", "));
        let shown = values.len();
        let total = candidates.iter().filter(|option| !option.is_group).count();
        if total > shown {
            eprintln!("  ... and {} more", total - shown);
        }
    }
}

/// Disambiguation message for a token matching several candidates by name.
pub(crate) fn print_ambiguous(token: &str, matches: &[&SelectOption]) {
    eprintln!("{} '{}' matches more than one candidate by name:", "ambiguous:".yellow().bold(), token);
    for option in matches.iter().take(GUIDANCE_CANDIDATE_LIMIT) {
        eprintln!("  {} {}", option.name, format!("({})", option.value).dimmed());
    }
    eprintln!("  retype the choice using the value rather than the name");
}

/// Display names of ambiguous matches, for the typed error.
pub(crate) fn ambiguous_names(matches: &[&SelectOption]) -> Vec<String> {
    matches
        .iter()
        .take(GUIDANCE_CANDIDATE_LIMIT)
        .map(|option| option.value.clone())
        .collect()
}

/// Default answer of the "add another?" confirm: yes while the accumulated
/// count is still below the recommended count.
pub(crate) fn add_another_default(accumulated: u64, recommended: u64) -> bool {
    accumulated < recommended
}

/// Ask whether to collect one more value for a multi prompt.
pub(crate) fn confirm_add_another(spec: &FieldSpec, accumulated: u64) -> ResolveResult<bool> {
    let default = add_another_default(accumulated, spec.recommended_count());
    Ok(Confirm::new()
        .with_prompt(format!("Add another {}?", spec.label()))
        .default(default)
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_another_default_bias() {
        // one value accepted, recommended two: keep going by default
        assert!(add_another_default(1, 2));
        assert!(!add_another_default(2, 2));
        assert!(!add_another_default(1, 0));
    }

    #[test]
    fn test_flag_spelling_is_kebab_case() {
        let spec = FieldSpec {
            field_name: "masterInstanceType".into(),
            ..FieldSpec::default()
        };
        assert_eq!(flag_spelling(&spec), "--master-instance-type");
    }

    #[test]
    fn test_prompt_line_shows_default() {
        let spec = FieldSpec {
            field_name: "region".into(),
            default_value: Some("eu-west-1".into()),
            ..FieldSpec::default()
        };
        assert_eq!(prompt_line(&spec), "region [eu-west-1]");
    }
}
